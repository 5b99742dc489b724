//! Executor (C10, spec.md §4.10): per-frame dispatch. Walks the scheduled
//! order, emits each pass's barriers batched by `(src_stage, dst_stage)`,
//! resolves a [`PassResources`] view, and invokes the pass's execute
//! callback. Infallible by contract (spec.md §7): a pass-callback error is
//! logged and the frame continues, matching how the teacher's
//! `ResourceRegistry::get` (`rg/src/resource_registry.rs`) is an infallible
//! lookup rather than a `Result`-returning one.

use std::collections::HashMap;

use crate::barrier::{Barrier, PipelineStage, ResolvedBarrier};
use crate::gfx::{BindlessIndex, CommandEncoder, PhysicalHandle};
use crate::pass::PassInstance;
use crate::resource_instance::ResourceInstance;
use crate::types::{variant_index, PassScope, QueueType};

#[derive(Clone, Copy, Debug)]
pub struct ResolvedTexture {
    pub handle: PhysicalHandle,
    pub bindless: Option<BindlessIndex>,
}

#[derive(Clone, Copy, Debug)]
pub struct ResolvedBuffer {
    pub handle: PhysicalHandle,
}

/// View handed to a pass's execute callback (spec.md §4.10 point 3):
/// resolved handles for every name the instance reads or writes, plus the
/// instance's own scope/index/host-handle identity.
pub struct PassResources {
    scope: PassScope,
    instance_idx: u32,
    camera_handle: Option<u32>,
    light_handle: Option<u32>,
    textures: HashMap<String, ResolvedTexture>,
    buffers: HashMap<String, ResolvedBuffer>,
}

impl PassResources {
    pub fn scope(&self) -> PassScope {
        self.scope
    }

    pub fn instance_index(&self) -> u32 {
        self.instance_idx
    }

    pub fn camera_handle(&self) -> Option<u32> {
        self.camera_handle
    }

    pub fn light_handle(&self) -> Option<u32> {
        self.light_handle
    }

    /// Exact name first; if absent and this instance isn't `Global`, falls
    /// back to the auto-scoped form so an execute callback written against
    /// `"gbuffer_position"` works in every camera instance (spec.md §4.10
    /// point 3).
    pub fn get_texture(&self, name: &str) -> Option<&ResolvedTexture> {
        self.textures.get(name).or_else(|| self.textures.get(&self.auto_scoped(name)))
    }

    pub fn get_buffer(&self, name: &str) -> Option<&ResolvedBuffer> {
        self.buffers.get(name).or_else(|| self.buffers.get(&self.auto_scoped(name)))
    }

    fn auto_scoped(&self, name: &str) -> String {
        self.scope.scoped_name(name, self.instance_idx)
    }
}

fn build_pass_resources(
    inst: &PassInstance,
    resources: &[ResourceInstance],
    decl_index: &HashMap<String, usize>,
    frame_index: u64,
    camera_handles: &[u32],
    light_handles: &[u32],
) -> PassResources {
    let mut textures = HashMap::new();
    let mut buffers = HashMap::new();

    for access in inst.reads.iter().chain(inst.writes.iter()) {
        let Some(&idx) = decl_index.get(&access.name) else {
            continue;
        };
        let resource = &resources[idx];
        let variant = variant_index(frame_index, access.offset, resource.variant_count.max(1));
        match resource.handle(variant) {
            Some(handle) => match resource.kind {
                crate::types::ResourceKind::Buffer => {
                    buffers.insert(access.name.clone(), ResolvedBuffer { handle });
                }
                crate::types::ResourceKind::Texture2D | crate::types::ResourceKind::TextureCube => {
                    textures.insert(
                        access.name.clone(),
                        ResolvedTexture {
                            handle,
                            bindless: resource.bindless_index(variant),
                        },
                    );
                }
            },
            None => {
                log::warn!(
                    "pass `{}`: resource `{}` has no resolved handle this frame (frame {})",
                    inst.name,
                    access.name,
                    frame_index
                );
            }
        }
    }

    let camera_handle = match inst.scope {
        PassScope::PerCamera => camera_handles.get(inst.instance_idx as usize).copied(),
        _ => None,
    };
    let light_handle = match inst.scope {
        PassScope::PerLight => light_handles.get(inst.instance_idx as usize).copied(),
        _ => None,
    };

    PassResources {
        scope: inst.scope,
        instance_idx: inst.instance_idx,
        camera_handle,
        light_handle,
        textures,
        buffers,
    }
}

fn emit_batched_barriers(
    barriers: &[Barrier],
    resources: &[ResourceInstance],
    decl_index: &HashMap<String, usize>,
    frame_index: u64,
    cmd: &mut dyn CommandEncoder,
) {
    let mut groups: Vec<((PipelineStage, PipelineStage), Vec<ResolvedBarrier>)> = Vec::new();

    for barrier in barriers {
        let idx = match decl_index.get(&barrier.resource_name) {
            Some(&idx) => idx,
            None => continue,
        };
        let resource = &resources[idx];
        let variant = variant_index(frame_index, barrier.frame_offset, resource.variant_count.max(1));
        let handle = match resource.handle(variant) {
            Some(handle) => handle,
            None => {
                log::warn!(
                    "skipping barrier for `{}`: no resolved handle this frame",
                    barrier.resource_name
                );
                continue;
            }
        };

        let resolved = ResolvedBarrier {
            handle,
            src_access: barrier.src_access,
            dst_access: barrier.dst_access,
            old_layout: barrier.old_layout,
            new_layout: barrier.new_layout,
            aspect: barrier.aspect,
        };

        let key = (barrier.src_stage, barrier.dst_stage);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, batch)) => batch.push(resolved),
            None => groups.push((key, vec![resolved])),
        }
    }

    for ((src, dst), batch) in groups {
        cmd.pipeline_barrier(src, dst, &batch);
    }
}

/// `run_graph`'s core loop (spec.md §4.10/§4.11): dispatch every scheduled
/// pass in order, against whichever of `graphics_cmd`/`compute_cmd` matches
/// its queue.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    instances: &[PassInstance],
    sorted: &[usize],
    barriers: &[Vec<Barrier>],
    resources: &[ResourceInstance],
    decl_index: &HashMap<String, usize>,
    camera_handles: &[u32],
    light_handles: &[u32],
    frame_index: u64,
    graphics_cmd: &mut dyn CommandEncoder,
    compute_cmd: &mut dyn CommandEncoder,
) {
    for (step, &pass_idx) in sorted.iter().enumerate() {
        let inst = &instances[pass_idx];
        let cmd: &mut dyn CommandEncoder = match inst.queue {
            QueueType::Graphics => graphics_cmd,
            QueueType::Compute => compute_cmd,
        };

        emit_batched_barriers(&barriers[step], resources, decl_index, frame_index, cmd);

        let pass_resources =
            build_pass_resources(inst, resources, decl_index, frame_index, camera_handles, light_handles);

        if let Err(err) = inst.pass.execute(&pass_resources, cmd, frame_index) {
            log::error!("pass `{}` execute failed: {err:#}", inst.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::ResourceAccess;
    use crate::resource::{BufferDesc, BufferUsage};
    use crate::resource_decl::ResourceDecl;
    use crate::types::{AccessMode, FrameOffset, ResourceKind};
    use std::rc::Rc;

    struct NopPass;
    impl crate::pass::Pass for NopPass {
        fn name(&self) -> &str {
            "nop"
        }
        fn scope(&self) -> PassScope {
            PassScope::PerCamera
        }
        fn queue(&self) -> QueueType {
            QueueType::Graphics
        }
        fn setup(&self, _: &mut crate::pass_setup::PassSetup) {}
        fn execute(&self, _: &PassResources, _: &mut dyn CommandEncoder, _: u64) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn buffer_decl(name: &str) -> ResourceDecl {
        ResourceDecl {
            name: name.to_string(),
            kind: ResourceKind::Buffer,
            texture: None,
            buffer: Some(BufferDesc {
                size: 16,
                usage: BufferUsage::STORAGE,
                is_external: false,
                double_buffer: false,
            }),
            scope: PassScope::Global,
            instance_idx: 0,
            declaring_pass: 0,
        }
    }

    #[test]
    fn exact_name_lookup_resolves_before_auto_scoped_fallback() {
        let decls = vec![buffer_decl("gbuffer_position_cam_0")];
        let mut decl_index = HashMap::new();
        decl_index.insert("gbuffer_position_cam_0".to_string(), 0);

        let handle = PhysicalHandle { index: 7, generation: 0 };
        let resource = ResourceInstance::owned(&decls[0], vec![handle], vec![None], 0, 0);
        let resources = vec![resource];

        let inst = PassInstance {
            name: "forward_cam_0".into(),
            scope: PassScope::PerCamera,
            instance_idx: 0,
            queue: QueueType::Graphics,
            pass: Rc::new(NopPass),
            reads: vec![ResourceAccess {
                name: "gbuffer_position_cam_0".into(),
                offset: FrameOffset::Current,
                mode: AccessMode::Read,
            }],
            writes: vec![],
        };

        let resolved = build_pass_resources(&inst, &resources, &decl_index, 0, &[], &[]);
        assert_eq!(resolved.get_buffer("gbuffer_position").unwrap().handle, handle);
    }

    #[test]
    fn per_camera_instance_exposes_its_camera_handle() {
        let decl_index = HashMap::new();
        let resources: Vec<ResourceInstance> = vec![];

        let inst = PassInstance {
            name: "forward_cam_1".into(),
            scope: PassScope::PerCamera,
            instance_idx: 1,
            queue: QueueType::Graphics,
            pass: Rc::new(NopPass),
            reads: vec![],
            writes: vec![],
        };

        let resolved = build_pass_resources(&inst, &resources, &decl_index, 0, &[10, 20, 30], &[]);
        assert_eq!(resolved.camera_handle(), Some(20));
        assert_eq!(resolved.light_handle(), None);
    }
}
