//! Resource allocator (C8, spec.md §4.8): decides variant count per
//! resource, allocates physical storage through the external `GpuDevice`/
//! `TextureManager` traits, and precomputes `(first_use_step, last_use_step)`
//! lifetimes over the scheduled order for a future aliasing allocator to
//! consume (deliberately not implemented here, per spec.md §4.8/§9).

use std::collections::HashMap;

use crate::gfx::{GpuDevice, PhysicalHandle, TextureManager};
use crate::pass::PassInstance;
use crate::resource_decl::ResourceDecl;
use crate::resource_instance::ResourceInstance;
use crate::types::{CompileError, ResourceKind};

pub(crate) fn allocate_resources(
    decls: &[ResourceDecl],
    decl_index: &HashMap<String, usize>,
    instances: &[PassInstance],
    sorted: &[usize],
    frames_in_flight: u32,
    device: &dyn GpuDevice,
    textures: &dyn TextureManager,
) -> Result<Vec<ResourceInstance>, CompileError> {
    let n = decls.len();

    let mut wants_variants = vec![false; n];
    for inst in instances {
        for access in inst.reads.iter().chain(inst.writes.iter()) {
            if access.offset.is_temporal() {
                if let Some(&idx) = decl_index.get(&access.name) {
                    wants_variants[idx] = true;
                }
            }
        }
    }

    let mut first_use = vec![usize::MAX; n];
    let mut last_use = vec![0usize; n];
    for (step, &pass_idx) in sorted.iter().enumerate() {
        let inst = &instances[pass_idx];
        for access in inst.reads.iter().chain(inst.writes.iter()) {
            if let Some(&idx) = decl_index.get(&access.name) {
                first_use[idx] = first_use[idx].min(step);
                last_use[idx] = last_use[idx].max(step);
            }
        }
    }

    let mut result: Vec<ResourceInstance> = Vec::with_capacity(n);
    for (idx, decl) in decls.iter().enumerate() {
        let first = if first_use[idx] == usize::MAX { 0 } else { first_use[idx] };
        let last = last_use[idx];

        if decl.is_external() {
            result.push(ResourceInstance::external(decl, frames_in_flight.max(1), first, last));
            continue;
        }

        let variant_count = if wants_variants[idx] || decl_double_buffer(decl) {
            frames_in_flight.max(1)
        } else {
            1
        };

        match allocate_variants(decl, variant_count, device, textures) {
            Ok((owned, bindless)) => result.push(ResourceInstance::owned(decl, owned, bindless, first, last)),
            Err(err) => {
                for allocated in &result {
                    free_resource_instance(allocated, device, textures);
                }
                return Err(CompileError::AllocationFailed {
                    resource: decl.name.clone(),
                    source: err,
                });
            }
        }
    }

    Ok(result)
}

#[allow(clippy::type_complexity)]
fn allocate_variants(
    decl: &ResourceDecl,
    variant_count: u32,
    device: &dyn GpuDevice,
    textures: &dyn TextureManager,
) -> anyhow::Result<(Vec<PhysicalHandle>, Vec<Option<crate::gfx::BindlessIndex>>)> {
    let mut owned = Vec::with_capacity(variant_count as usize);
    let mut bindless = Vec::with_capacity(variant_count as usize);

    for variant in 0..variant_count {
        let (handle, bindless_idx) = match decl.kind {
            ResourceKind::Buffer => {
                let h = device.create_buffer(decl.buffer.as_ref().expect("buffer decl carries a BufferDesc"))?;
                (h, None)
            }
            ResourceKind::Texture2D => {
                let (h, b) = textures.allocate_texture_2d(decl.texture.as_ref().expect("texture decl carries a TextureDesc"))?;
                (h, Some(b))
            }
            ResourceKind::TextureCube => {
                let (h, b) = textures.allocate_texture_cube(decl.texture.as_ref().expect("texture decl carries a TextureDesc"))?;
                (h, Some(b))
            }
        };

        owned.push(handle);
        bindless.push(bindless_idx);
        let _ = variant;
    }

    Ok((owned, bindless))
}

fn decl_double_buffer(decl: &ResourceDecl) -> bool {
    decl.texture
        .map(|t| t.double_buffer)
        .or_else(|| decl.buffer.map(|b| b.double_buffer))
        .unwrap_or(false)
}

fn free_one(kind: ResourceKind, device: &dyn GpuDevice, textures: &dyn TextureManager, handle: PhysicalHandle) {
    match kind {
        ResourceKind::Buffer => device.destroy_buffer(handle),
        ResourceKind::Texture2D | ResourceKind::TextureCube => textures.free_texture(handle),
    }
}

pub(crate) fn free_resource_instance(inst: &ResourceInstance, device: &dyn GpuDevice, textures: &dyn TextureManager) {
    if inst.is_external {
        return;
    }
    for &handle in &inst.owned {
        free_one(inst.kind, device, textures, handle);
    }
}
