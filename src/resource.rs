//! Resource descriptors and phantom-typed resource IDs (C1, spec.md §4.1,
//! §9). Generalizes the teacher's `def_resource_handles!` macro
//! (`rg/src/resource.rs`) from a single texture-only invocation to one
//! invocation each for `TextureDesc` and `BufferDesc`, so a `TextureId`
//! and a `BufferId` can never be confused at a `PassSetup` call site.

use std::marker::PhantomData;

bitflags::bitflags! {
    pub struct TextureUsage: u32 {
        const SAMPLED = 1 << 0;
        const COLOR_ATTACHMENT = 1 << 1;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 2;
        const STORAGE = 1 << 3;
        const TRANSFER_SRC = 1 << 4;
        const TRANSFER_DST = 1 << 5;
    }
}

bitflags::bitflags! {
    pub struct BufferUsage: u32 {
        const VERTEX = 1 << 0;
        const INDEX = 1 << 1;
        const INDIRECT = 1 << 2;
        const STORAGE = 1 << 3;
        const UNIFORM = 1 << 4;
        const TRANSFER_SRC = 1 << 5;
        const TRANSFER_DST = 1 << 6;
    }
}

bitflags::bitflags! {
    pub struct ImageAspect: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba16Float,
    Rgba32Float,
    R32Float,
    D32Float,
    D24UnormS8Uint,
}

impl TextureFormat {
    /// Depth/stencil aspect is inferred from the format, not a separate flag
    /// (spec.md §4.9: "depth textures are detected by format").
    pub fn aspect(self) -> ImageAspect {
        match self {
            TextureFormat::D32Float => ImageAspect::DEPTH,
            TextureFormat::D24UnormS8Uint => ImageAspect::DEPTH | ImageAspect::STENCIL,
            _ => ImageAspect::COLOR,
        }
    }

    pub fn is_depth(self) -> bool {
        self.aspect().intersects(ImageAspect::DEPTH | ImageAspect::STENCIL)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub is_cube: bool,
    /// Declared via `register_external_texture`; storage is host-managed and
    /// supplied frame-by-frame through `update_external_texture`.
    pub is_external: bool,
    /// Force frame-in-flight variants even if no access uses a non-`Current`
    /// offset (spec.md §4.8).
    pub double_buffer: bool,
}

impl TextureDesc {
    pub fn dims(self) -> [u32; 2] {
        [self.width, self.height]
    }

    pub fn is_depth(self) -> bool {
        self.format.is_depth()
    }

    pub fn aspect(self) -> ImageAspect {
        self.format.aspect()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BufferDesc {
    pub size: u64,
    pub usage: BufferUsage,
    pub is_external: bool,
    pub double_buffer: bool,
}

/// Marker trait every resource descriptor implements; mirrors the teacher's
/// `ResourceDescTraits` blanket impl.
pub trait ResourceDescTraits: std::fmt::Debug {}
impl<DescType> ResourceDescTraits for DescType where DescType: std::fmt::Debug {}

/// Index into the shared `ResourceDecl` list built up during `PassSetup`
/// (spec.md §3). Generation-free: declarations are rebuilt from scratch on
/// every `build_graph` call, so there is nothing for a generation counter to
/// guard against here (unlike `gfx::PhysicalHandle`, which outlives many
/// rebuilds).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct RawResourceId(pub(crate) u32);

impl RawResourceId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Phantom-typed handle over a resource declaration, generic over the
/// descriptor type so `TextureId` and `BufferId` are distinct types that a
/// `PassSetup::read_texture`/`read_buffer` call can't mix up.
#[derive(Debug)]
pub struct ResourceId<DescType>
where
    DescType: ResourceDescTraits,
{
    pub(crate) raw: RawResourceId,
    marker: PhantomData<DescType>,
}

impl<DescType: ResourceDescTraits> ResourceId<DescType> {
    pub(crate) fn new(raw: RawResourceId) -> Self {
        Self {
            raw,
            marker: PhantomData,
        }
    }
}

impl<DescType: ResourceDescTraits> Clone for ResourceId<DescType> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<DescType: ResourceDescTraits> Copy for ResourceId<DescType> {}

impl<DescType: ResourceDescTraits> PartialEq for ResourceId<DescType> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}
impl<DescType: ResourceDescTraits> Eq for ResourceId<DescType> {}

macro_rules! def_resource_id {
    ($id_type:ident, $desc_type:ident) => {
        pub type $id_type = ResourceId<$desc_type>;
    };
}

def_resource_id! { TextureId, TextureDesc }
def_resource_id! { BufferId, BufferDesc }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_id_and_buffer_id_wrap_distinct_raw_ids() {
        let t: TextureId = ResourceId::new(RawResourceId(0));
        let b: BufferId = ResourceId::new(RawResourceId(0));
        assert_eq!(t.raw, RawResourceId(0));
        assert_eq!(b.raw, RawResourceId(0));
    }

    #[test]
    fn depth_format_detected_via_aspect() {
        assert!(TextureFormat::D32Float.is_depth());
        assert!(TextureFormat::D24UnormS8Uint.is_depth());
        assert!(!TextureFormat::Rgba8Unorm.is_depth());
    }
}
