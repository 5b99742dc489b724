mod allocator;
mod barrier;
mod compile;
mod dead_pass;
mod dependency;
mod executor;
mod gfx;
mod graph;
mod instantiate;
mod pass;
mod pass_setup;
mod resource;
mod resource_decl;
mod resource_instance;
mod topo_sort;
mod types;
mod validate;

pub use barrier::{AccessFlags, ImageLayout, PipelineStage, ResolvedBarrier};
pub use compile::CompileContext;
pub use executor::{PassResources, ResolvedBuffer, ResolvedTexture};
pub use gfx::{BindlessIndex, CommandEncoder, GpuDevice, PhysicalHandle, TextureManager};
pub use graph::{build_graph, run_graph, Graph};
pub use pass::{Pass, PassDecl};
pub use pass_setup::PassSetup;
pub use resource::{
    BufferDesc, BufferId, BufferUsage, ImageAspect, ResourceId, TextureDesc, TextureFormat, TextureId,
    TextureUsage,
};
pub use types::{variant_index, AccessMode, CompileError, FrameOffset, PassScope, QueueType, ResourceKind};
