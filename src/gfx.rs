//! Self-contained GPU-facing seams (spec.md §6.4). The teacher's own device
//! abstraction (`render_core`/`render-hal-vk`) lives outside this workspace,
//! so these traits re-express the same shape the teacher consumes in
//! `resource_registry.rs`/`pipeline_cache.rs`: a handle-returning trait object
//! behind `&dyn Trait`.

use crate::resource::{BufferDesc, TextureDesc};

/// Opaque, generation-tracked GPU object handle. Mirrors the
/// `(index, generation)` shape every handle pool in the teacher crate uses
/// (`render_core::handles::RenderResourceHandle`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct PhysicalHandle {
    pub index: u32,
    pub generation: u32,
}

/// Index into a bindless descriptor table, handed back alongside a texture
/// allocation for shader sampling (spec.md §4.8).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BindlessIndex(pub u32);

/// Device-side buffer/texture lifetime management. Keyed on `PhysicalHandle`
/// so the graph never needs to know how the backend represents a resource.
pub trait GpuDevice {
    fn create_buffer(&self, desc: &BufferDesc) -> anyhow::Result<PhysicalHandle>;
    fn destroy_buffer(&self, handle: PhysicalHandle);
}

/// Bindless-aware texture allocator (spec.md §6.4).
pub trait TextureManager {
    fn allocate_texture_2d(&self, desc: &TextureDesc) -> anyhow::Result<(PhysicalHandle, BindlessIndex)>;
    fn allocate_texture_cube(&self, desc: &TextureDesc) -> anyhow::Result<(PhysicalHandle, BindlessIndex)>;
    fn free_texture(&self, handle: PhysicalHandle);
}

/// Command-buffer sink the executor issues batched pipeline barriers into.
/// Pass-side draw/dispatch recording is entirely opaque to the core; the
/// execute callback owns whatever concrete encoder this trait object wraps.
pub trait CommandEncoder {
    fn pipeline_barrier(
        &mut self,
        src_stage: crate::barrier::PipelineStage,
        dst_stage: crate::barrier::PipelineStage,
        barriers: &[crate::barrier::ResolvedBarrier],
    );
}
