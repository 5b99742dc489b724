//! Barrier synthesizer (C9, spec.md §4.9). Walks passes in scheduled order,
//! tracking the last access to every resource name, and emits a transition
//! barrier whenever a pass's next access to that name differs in stage,
//! access mask, or layout from the one before it. Grounded on `raven-rg`'s
//! `GraphExecutor` barrier pass and SparkyPotato `radiance`'s
//! `SyncBuilder::insert_info` (both examples/other_examples/ render graphs
//! that synthesize barriers from a scheduled pass list rather than requiring
//! the caller to declare them), generalized to the queue/resource-kind/depth
//! access tables spec.md §4.9 spells out.

use std::collections::{HashMap, HashSet};

use crate::pass::PassInstance;
use crate::resource::ImageAspect;
use crate::resource_decl::ResourceDecl;
use crate::types::{FrameOffset, QueueType, ResourceKind};

bitflags::bitflags! {
    pub struct PipelineStage: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const VERTEX_INPUT = 1 << 1;
        const VERTEX_SHADER = 1 << 2;
        const EARLY_FRAGMENT_TESTS = 1 << 3;
        const FRAGMENT_SHADER = 1 << 4;
        const LATE_FRAGMENT_TESTS = 1 << 5;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 6;
        const COMPUTE_SHADER = 1 << 7;
        const ALL_COMMANDS = 1 << 8;
    }
}

bitflags::bitflags! {
    pub struct AccessFlags: u32 {
        const SHADER_READ = 1 << 0;
        const SHADER_WRITE = 1 << 1;
        const VERTEX_ATTRIBUTE_READ = 1 << 2;
        const INDEX_READ = 1 << 3;
        const INDIRECT_COMMAND_READ = 1 << 4;
        const COLOR_ATTACHMENT_READ = 1 << 5;
        const COLOR_ATTACHMENT_WRITE = 1 << 6;
        const DEPTH_STENCIL_ATTACHMENT_READ = 1 << 7;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 8;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    Undefined,
    General,
    ColorAttachmentOptimal,
    DepthStencilAttachmentOptimal,
    DepthStencilReadOnlyOptimal,
    ShaderReadOnlyOptimal,
}

/// One compile-time barrier, keyed by scoped resource name. Resolved into a
/// [`ResolvedBarrier`] at execute time once the executor knows which frame
/// variant's physical handle to transition (spec.md §4.10 point 2: "image
/// handles are resolved now … never baked at compile time").
#[derive(Clone, Debug)]
pub(crate) struct Barrier {
    pub resource_name: String,
    pub frame_offset: FrameOffset,
    pub src_stage: PipelineStage,
    pub dst_stage: PipelineStage,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
    pub aspect: ImageAspect,
}

/// A [`Barrier`] with its resource name replaced by a concrete device
/// handle, ready to hand to [`crate::gfx::CommandEncoder::pipeline_barrier`].
#[derive(Clone, Copy, Debug)]
pub struct ResolvedBarrier {
    pub handle: crate::gfx::PhysicalHandle,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
    pub aspect: ImageAspect,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct AccessState {
    stage: PipelineStage,
    access: AccessFlags,
    layout: ImageLayout,
}

fn decl_is_depth(decl: &ResourceDecl) -> bool {
    decl.texture.map(|t| t.is_depth()).unwrap_or(false)
}

fn decl_aspect(decl: &ResourceDecl) -> ImageAspect {
    decl.texture.map(|t| t.aspect()).unwrap_or(ImageAspect::empty())
}

/// Target access for a read (spec.md §4.9 point 1).
fn target_read_access(queue: QueueType, decl: &ResourceDecl) -> AccessState {
    use AccessFlags as A;
    use PipelineStage as S;

    match (queue, decl.kind, decl_is_depth(decl)) {
        (QueueType::Compute, ResourceKind::Buffer, _) => AccessState {
            stage: S::COMPUTE_SHADER,
            access: A::SHADER_READ,
            layout: ImageLayout::Undefined,
        },
        (QueueType::Compute, _, _) => AccessState {
            stage: S::COMPUTE_SHADER,
            access: A::SHADER_READ,
            layout: ImageLayout::ShaderReadOnlyOptimal,
        },
        (QueueType::Graphics, ResourceKind::Buffer, _) => AccessState {
            stage: S::VERTEX_INPUT,
            access: A::VERTEX_ATTRIBUTE_READ | A::INDEX_READ | A::INDIRECT_COMMAND_READ,
            layout: ImageLayout::Undefined,
        },
        (QueueType::Graphics, _, true) => AccessState {
            stage: S::EARLY_FRAGMENT_TESTS | S::LATE_FRAGMENT_TESTS,
            access: A::DEPTH_STENCIL_ATTACHMENT_READ,
            layout: ImageLayout::DepthStencilReadOnlyOptimal,
        },
        (QueueType::Graphics, _, false) => AccessState {
            stage: S::FRAGMENT_SHADER,
            access: A::SHADER_READ,
            layout: ImageLayout::ShaderReadOnlyOptimal,
        },
    }
}

/// Target access for a write (spec.md §4.9 point 2). `is_rw` adds the
/// matching read-access bit for a resource this same pass also reads
/// (a loaded + stored render attachment).
///
/// spec.md never gives a "graphics + buffer write" case (the read table's
/// graphics+buffer row has no write counterpart). Treated here as a fragment
/// shader storage-buffer write — the only way a graphics-queue pass writes a
/// buffer without going through vertex/index state, which is read-only by
/// definition (decision recorded in DESIGN.md).
fn target_write_access(queue: QueueType, decl: &ResourceDecl, is_rw: bool) -> AccessState {
    use AccessFlags as A;
    use PipelineStage as S;

    match (queue, decl.kind, decl_is_depth(decl)) {
        (QueueType::Compute, ResourceKind::Buffer, _) => AccessState {
            stage: S::COMPUTE_SHADER,
            access: A::SHADER_WRITE,
            layout: ImageLayout::Undefined,
        },
        (QueueType::Compute, _, _) => AccessState {
            stage: S::COMPUTE_SHADER,
            access: A::SHADER_WRITE,
            layout: ImageLayout::General,
        },
        (QueueType::Graphics, ResourceKind::Buffer, _) => AccessState {
            stage: S::FRAGMENT_SHADER,
            access: A::SHADER_WRITE,
            layout: ImageLayout::Undefined,
        },
        (QueueType::Graphics, _, true) => {
            let mut access = A::DEPTH_STENCIL_ATTACHMENT_WRITE;
            if is_rw {
                access |= A::DEPTH_STENCIL_ATTACHMENT_READ;
            }
            AccessState {
                stage: S::EARLY_FRAGMENT_TESTS | S::LATE_FRAGMENT_TESTS,
                access,
                layout: ImageLayout::DepthStencilAttachmentOptimal,
            }
        }
        (QueueType::Graphics, _, false) => {
            let mut access = A::COLOR_ATTACHMENT_WRITE;
            if is_rw {
                access |= A::COLOR_ATTACHMENT_READ;
            }
            AccessState {
                stage: S::COLOR_ATTACHMENT_OUTPUT,
                access,
                layout: ImageLayout::ColorAttachmentOptimal,
            }
        }
    }
}

/// The access a resource is assumed to be in before anything in this build
/// has touched it (spec.md §4.9: "derive initial access").
fn initial_access(decl: &ResourceDecl) -> AccessState {
    if !decl.is_external() {
        return AccessState {
            stage: PipelineStage::TOP_OF_PIPE,
            access: AccessFlags::empty(),
            layout: ImageLayout::Undefined,
        };
    }

    // spec.md §4.9: imported-resource layout is inferred in precedence order
    // color -> sampled -> depth, so an external depth texture that's also
    // `SAMPLED` (e.g. a sampled shadow map) resolves to shader-read-only, not
    // a depth-attachment layout.
    let layout = match &decl.texture {
        Some(t) if t.usage.contains(crate::resource::TextureUsage::COLOR_ATTACHMENT) => {
            ImageLayout::ColorAttachmentOptimal
        }
        Some(t) if t.usage.contains(crate::resource::TextureUsage::SAMPLED) => {
            ImageLayout::ShaderReadOnlyOptimal
        }
        Some(t) if t.is_depth() => ImageLayout::DepthStencilAttachmentOptimal,
        Some(_) => ImageLayout::General,
        None => ImageLayout::Undefined,
    };

    AccessState {
        stage: PipelineStage::TOP_OF_PIPE,
        access: AccessFlags::empty(),
        layout,
    }
}

fn push_if_changed(
    barriers: &mut Vec<Barrier>,
    name: &str,
    offset: FrameOffset,
    source: &AccessState,
    target: &AccessState,
    aspect: ImageAspect,
) {
    if source == target {
        return;
    }

    let (src_stage, dst_stage) = if offset.is_temporal() {
        (PipelineStage::ALL_COMMANDS, PipelineStage::ALL_COMMANDS)
    } else {
        (source.stage, target.stage)
    };

    barriers.push(Barrier {
        resource_name: name.to_string(),
        frame_offset: offset,
        src_stage,
        dst_stage,
        src_access: source.access,
        dst_access: target.access,
        old_layout: source.layout,
        new_layout: target.layout,
        aspect,
    });
}

/// Synthesizes one barrier list per pass in `sorted`, in the same order.
pub(crate) fn synthesize_barriers(
    instances: &[PassInstance],
    sorted: &[usize],
    decls: &[ResourceDecl],
    decl_index: &HashMap<String, usize>,
) -> Vec<Vec<Barrier>> {
    let mut last_access: HashMap<String, AccessState> = HashMap::new();
    let mut out = Vec::with_capacity(sorted.len());

    for &pass_idx in sorted {
        let inst = &instances[pass_idx];
        let mut barriers = Vec::new();

        let write_names: HashSet<&str> = inst.writes.iter().map(|w| w.name.as_str()).collect();

        let mut seen_reads: HashSet<&str> = HashSet::new();
        for read in &inst.reads {
            if write_names.contains(read.name.as_str()) || !seen_reads.insert(read.name.as_str()) {
                continue;
            }
            let decl = &decls[decl_index[&read.name]];
            let target = target_read_access(inst.queue, decl);
            let source = last_access
                .get(&read.name)
                .copied()
                .unwrap_or_else(|| initial_access(decl));
            push_if_changed(&mut barriers, &read.name, read.offset, &source, &target, decl_aspect(decl));
            last_access.insert(read.name.clone(), target);
        }

        let mut seen_writes: HashSet<&str> = HashSet::new();
        for write in &inst.writes {
            if !seen_writes.insert(write.name.as_str()) {
                continue;
            }
            let decl = &decls[decl_index[&write.name]];
            let is_rw = inst.reads.iter().any(|r| r.name == write.name);
            let target = target_write_access(inst.queue, decl, is_rw);
            let source = last_access
                .get(&write.name)
                .copied()
                .unwrap_or_else(|| initial_access(decl));
            push_if_changed(&mut barriers, &write.name, write.offset, &source, &target, decl_aspect(decl));
            last_access.insert(write.name.clone(), target);
        }

        out.push(barriers);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::ResourceAccess;
    use crate::resource::{BufferDesc, BufferUsage, TextureDesc, TextureFormat, TextureUsage};
    use crate::types::{AccessMode, PassScope};
    use std::rc::Rc;

    struct NopPass;
    impl crate::pass::Pass for NopPass {
        fn name(&self) -> &str {
            "nop"
        }
        fn scope(&self) -> PassScope {
            PassScope::Global
        }
        fn queue(&self) -> QueueType {
            QueueType::Graphics
        }
        fn setup(&self, _: &mut crate::pass_setup::PassSetup) {}
        fn execute(
            &self,
            _: &crate::executor::PassResources,
            _: &mut dyn crate::gfx::CommandEncoder,
            _: u64,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn texture_decl(name: &str, usage: TextureUsage, is_external: bool) -> ResourceDecl {
        ResourceDecl {
            name: name.to_string(),
            kind: ResourceKind::Texture2D,
            texture: Some(TextureDesc {
                width: 1920,
                height: 1080,
                format: TextureFormat::Rgba8Unorm,
                usage,
                is_cube: false,
                is_external,
                double_buffer: false,
            }),
            buffer: None,
            scope: PassScope::Global,
            instance_idx: 0,
            declaring_pass: 0,
        }
    }

    fn buffer_decl(name: &str) -> ResourceDecl {
        ResourceDecl {
            name: name.to_string(),
            kind: ResourceKind::Buffer,
            texture: None,
            buffer: Some(BufferDesc {
                size: 1024,
                usage: BufferUsage::STORAGE,
                is_external: false,
                double_buffer: false,
            }),
            scope: PassScope::Global,
            instance_idx: 0,
            declaring_pass: 0,
        }
    }

    fn instance(
        queue: QueueType,
        reads: Vec<(&str, FrameOffset)>,
        writes: Vec<(&str, FrameOffset)>,
    ) -> PassInstance {
        PassInstance {
            name: "p".into(),
            scope: PassScope::Global,
            instance_idx: 0,
            queue,
            pass: Rc::new(NopPass),
            reads: reads
                .into_iter()
                .map(|(n, o)| ResourceAccess {
                    name: n.into(),
                    offset: o,
                    mode: AccessMode::Read,
                })
                .collect(),
            writes: writes
                .into_iter()
                .map(|(n, o)| ResourceAccess {
                    name: n.into(),
                    offset: o,
                    mode: AccessMode::Write,
                })
                .collect(),
        }
    }

    #[test]
    fn color_write_then_read_transitions_attachment_to_shader_read_only() {
        let decls = vec![texture_decl("gbuf", TextureUsage::COLOR_ATTACHMENT | TextureUsage::SAMPLED, false)];
        let mut decl_index = HashMap::new();
        decl_index.insert("gbuf".to_string(), 0);

        let instances = vec![
            instance(QueueType::Graphics, vec![], vec![("gbuf", FrameOffset::Current)]),
            instance(QueueType::Graphics, vec![("gbuf", FrameOffset::Current)], vec![]),
        ];
        let sorted = vec![0, 1];
        let lists = synthesize_barriers(&instances, &sorted, &decls, &decl_index);

        assert_eq!(lists[0].len(), 1);
        assert_eq!(lists[0][0].new_layout, ImageLayout::ColorAttachmentOptimal);

        assert_eq!(lists[1].len(), 1);
        assert_eq!(lists[1][0].old_layout, ImageLayout::ColorAttachmentOptimal);
        assert_eq!(lists[1][0].new_layout, ImageLayout::ShaderReadOnlyOptimal);
        assert_eq!(lists[1][0].src_stage, PipelineStage::COLOR_ATTACHMENT_OUTPUT);
        assert_eq!(lists[1][0].dst_stage, PipelineStage::FRAGMENT_SHADER);
    }

    #[test]
    fn read_write_attachment_skips_the_read_branch() {
        let decls = vec![texture_decl("hdr", TextureUsage::COLOR_ATTACHMENT, false)];
        let mut decl_index = HashMap::new();
        decl_index.insert("hdr".to_string(), 0);

        let instances = vec![instance(
            QueueType::Graphics,
            vec![("hdr", FrameOffset::Current)],
            vec![("hdr", FrameOffset::Current)],
        )];
        let sorted = vec![0];
        let lists = synthesize_barriers(&instances, &sorted, &decls, &decl_index);

        assert_eq!(lists[0].len(), 1);
        assert_eq!(lists[0][0].new_layout, ImageLayout::ColorAttachmentOptimal);
        assert!(lists[0][0].dst_access.contains(AccessFlags::COLOR_ATTACHMENT_READ));
        assert!(lists[0][0].dst_access.contains(AccessFlags::COLOR_ATTACHMENT_WRITE));
    }

    #[test]
    fn temporal_read_forces_all_commands_stages() {
        let decls = vec![texture_decl("history", TextureUsage::SAMPLED, false)];
        let mut decl_index = HashMap::new();
        decl_index.insert("history".to_string(), 0);

        let instances = vec![instance(
            QueueType::Graphics,
            vec![("history", FrameOffset::Prev)],
            vec![],
        )];
        let sorted = vec![0];
        let lists = synthesize_barriers(&instances, &sorted, &decls, &decl_index);

        assert_eq!(lists[0].len(), 1);
        assert_eq!(lists[0][0].src_stage, PipelineStage::ALL_COMMANDS);
        assert_eq!(lists[0][0].dst_stage, PipelineStage::ALL_COMMANDS);
    }

    #[test]
    fn buffer_read_on_graphics_queue_uses_vertex_input_stage() {
        let decls = vec![buffer_decl("verts")];
        let mut decl_index = HashMap::new();
        decl_index.insert("verts".to_string(), 0);

        let instances = vec![instance(QueueType::Graphics, vec![("verts", FrameOffset::Current)], vec![])];
        let sorted = vec![0];
        let lists = synthesize_barriers(&instances, &sorted, &decls, &decl_index);

        assert_eq!(lists[0].len(), 1);
        assert_eq!(lists[0][0].dst_stage, PipelineStage::VERTEX_INPUT);
    }
}
