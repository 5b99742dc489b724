//! The shared resource-declaration list built once per `build_graph` call
//! (spec.md §3). Every `PassSetup::create_*`/`register_external_*` call
//! appends to this list; everything downstream (validation, dependency
//! edges, allocation, barrier synthesis) resolves resource names against it.

use crate::resource::{BufferDesc, TextureDesc};
use crate::types::{PassScope, ResourceKind};

pub(crate) struct ResourceDecl {
    pub name: String,
    pub kind: ResourceKind,
    pub texture: Option<TextureDesc>,
    pub buffer: Option<BufferDesc>,
    pub scope: PassScope,
    pub instance_idx: u32,
    /// Index into the pass-instance list of the instance that created it
    /// (spec.md §4.1: "creation scope must equal the declaring pass's own
    /// instance scope").
    pub declaring_pass: usize,
}

impl ResourceDecl {
    pub fn is_external(&self) -> bool {
        match (&self.texture, &self.buffer) {
            (Some(t), None) => t.is_external,
            (None, Some(b)) => b.is_external,
            _ => unreachable!("a resource decl carries exactly one of texture/buffer"),
        }
    }
}
