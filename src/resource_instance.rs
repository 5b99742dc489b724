//! Runtime resource instances (spec.md §3 "ResourceInstance"): the
//! allocator's output, one per `ResourceDecl`, carrying either owned
//! per-variant physical handles or a single host-supplied external handle.

use crate::gfx::{BindlessIndex, PhysicalHandle};
use crate::resource_decl::ResourceDecl;
use crate::types::ResourceKind;

pub(crate) struct ResourceInstance {
    pub name: String,
    pub kind: ResourceKind,
    pub is_external: bool,
    pub variant_count: u32,
    pub owned: Vec<PhysicalHandle>,
    pub bindless: Vec<Option<BindlessIndex>>,
    /// Host-supplied handle, replaced wholesale by `update_external_*` each
    /// frame (spec.md §8/S6: the handle at resolve time is whatever the most
    /// recent `update_external_*` call set, with no per-variant history).
    pub external: Option<PhysicalHandle>,
    pub first_use_step: usize,
    pub last_use_step: usize,
}

impl ResourceInstance {
    pub fn owned(
        decl: &ResourceDecl,
        handles: Vec<PhysicalHandle>,
        bindless: Vec<Option<BindlessIndex>>,
        first_use_step: usize,
        last_use_step: usize,
    ) -> Self {
        ResourceInstance {
            name: decl.name.clone(),
            kind: decl.kind,
            is_external: false,
            variant_count: handles.len() as u32,
            owned: handles,
            bindless,
            external: None,
            first_use_step,
            last_use_step,
        }
    }

    pub fn external(decl: &ResourceDecl, variant_count: u32, first_use_step: usize, last_use_step: usize) -> Self {
        ResourceInstance {
            name: decl.name.clone(),
            kind: decl.kind,
            is_external: true,
            variant_count,
            owned: Vec::new(),
            bindless: Vec::new(),
            external: None,
            first_use_step,
            last_use_step,
        }
    }

    pub fn handle(&self, variant: u32) -> Option<PhysicalHandle> {
        if self.is_external {
            self.external
        } else {
            self.owned.get(variant as usize).copied()
        }
    }

    pub fn bindless_index(&self, variant: u32) -> Option<BindlessIndex> {
        self.bindless.get(variant as usize).copied().flatten()
    }

    pub fn set_external(&mut self, handle: PhysicalHandle) {
        self.external = Some(handle);
    }
}
