//! `PassSetup` (C2, spec.md §4.2): the scratch object passed to every pass's
//! setup callback. Generalizes the teacher's `RenderGraphContext`/
//! `PassBuilder` (`rg/src/context.rs`, `rg/src/pass_builder.rs`) from "one
//! pass, one private resource pool" to "one pass instance, one shared
//! cross-instance declaration list" — every instance's `PassSetup` borrows
//! the same `Vec<ResourceDecl>` so a `PerCamera` pass can `find` a resource a
//! `Global` pass created earlier in the same compile.

use std::collections::HashMap;

use crate::resource::{BufferDesc, BufferId, RawResourceId, ResourceId, TextureDesc, TextureId};
use crate::resource_decl::ResourceDecl;
use crate::types::{AccessMode, CompileError, FrameOffset, PassScope, ResourceKind};

use super::pass::ResourceAccess;

pub struct PassSetup<'a> {
    scope: PassScope,
    instance_idx: u32,
    declaring_pass: usize,
    decls: &'a mut Vec<ResourceDecl>,
    decl_index: &'a mut HashMap<String, usize>,
    reads: Vec<ResourceAccess>,
    writes: Vec<ResourceAccess>,
}

impl<'a> PassSetup<'a> {
    pub(crate) fn new(
        scope: PassScope,
        instance_idx: u32,
        declaring_pass: usize,
        decls: &'a mut Vec<ResourceDecl>,
        decl_index: &'a mut HashMap<String, usize>,
    ) -> Self {
        PassSetup {
            scope,
            instance_idx,
            declaring_pass,
            decls,
            decl_index,
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> (Vec<ResourceAccess>, Vec<ResourceAccess>) {
        (self.reads, self.writes)
    }

    fn scoped(&self, name: &str) -> String {
        self.scope.scoped_name(name, self.instance_idx)
    }

    // -- creation --------------------------------------------------------

    pub fn create_texture(&mut self, name: &str, mut desc: TextureDesc) -> TextureId {
        desc.is_external = false;
        self.declare_texture(name, desc)
    }

    pub fn register_external_texture(&mut self, name: &str, mut desc: TextureDesc) -> TextureId {
        desc.is_external = true;
        self.declare_texture(name, desc)
    }

    fn declare_texture(&mut self, name: &str, desc: TextureDesc) -> TextureId {
        let scoped = self.scoped(name);
        if let Some(&idx) = self.decl_index.get(&scoped) {
            return ResourceId::new(RawResourceId(idx as u32));
        }
        let kind = if desc.is_cube {
            ResourceKind::TextureCube
        } else {
            ResourceKind::Texture2D
        };
        let idx = self.decls.len();
        self.decls.push(ResourceDecl {
            name: scoped.clone(),
            kind,
            texture: Some(desc),
            buffer: None,
            scope: self.scope,
            instance_idx: self.instance_idx,
            declaring_pass: self.declaring_pass,
        });
        self.decl_index.insert(scoped, idx);
        ResourceId::new(RawResourceId(idx as u32))
    }

    pub fn create_buffer(&mut self, name: &str, mut desc: BufferDesc) -> BufferId {
        desc.is_external = false;
        self.declare_buffer(name, desc)
    }

    pub fn register_external_buffer(&mut self, name: &str, mut desc: BufferDesc) -> BufferId {
        desc.is_external = true;
        self.declare_buffer(name, desc)
    }

    fn declare_buffer(&mut self, name: &str, desc: BufferDesc) -> BufferId {
        let scoped = self.scoped(name);
        if let Some(&idx) = self.decl_index.get(&scoped) {
            return ResourceId::new(RawResourceId(idx as u32));
        }
        let idx = self.decls.len();
        self.decls.push(ResourceDecl {
            name: scoped.clone(),
            kind: ResourceKind::Buffer,
            texture: None,
            buffer: Some(desc),
            scope: self.scope,
            instance_idx: self.instance_idx,
            declaring_pass: self.declaring_pass,
        });
        self.decl_index.insert(scoped, idx);
        ResourceId::new(RawResourceId(idx as u32))
    }

    // -- lookup ------------------------------------------------------------

    /// Resolves `name` against this instance's own scope first, falling
    /// back to the unscoped (`Global`) declaration (spec.md §4.2).
    pub fn find_texture(&self, name: &str) -> Result<TextureId, CompileError> {
        self.find_texture_in(name, self.scope, self.instance_idx)
            .or_else(|_| self.find_texture_in(name, PassScope::Global, 0))
    }

    pub fn find_texture_in(
        &self,
        name: &str,
        scope: PassScope,
        instance_idx: u32,
    ) -> Result<TextureId, CompileError> {
        let scoped = scope.scoped_name(name, instance_idx);
        let idx = *self.decl_index.get(&scoped).ok_or_else(|| CompileError::DanglingRead {
            pass: String::new(),
            resource: scoped.clone(),
            detail: "no matching create/register_external call".to_string(),
        })?;
        let actual = self.decls[idx].kind;
        if actual != ResourceKind::Texture2D && actual != ResourceKind::TextureCube {
            return Err(CompileError::TypeMismatch {
                name: scoped,
                expected: ResourceKind::Texture2D,
                actual,
            });
        }
        Ok(ResourceId::new(RawResourceId(idx as u32)))
    }

    pub fn find_buffer(&self, name: &str) -> Result<BufferId, CompileError> {
        self.find_buffer_in(name, self.scope, self.instance_idx)
            .or_else(|_| self.find_buffer_in(name, PassScope::Global, 0))
    }

    pub fn find_buffer_in(
        &self,
        name: &str,
        scope: PassScope,
        instance_idx: u32,
    ) -> Result<BufferId, CompileError> {
        let scoped = scope.scoped_name(name, instance_idx);
        let idx = *self.decl_index.get(&scoped).ok_or_else(|| CompileError::DanglingRead {
            pass: String::new(),
            resource: scoped.clone(),
            detail: "no matching create/register_external call".to_string(),
        })?;
        let actual = self.decls[idx].kind;
        if actual != ResourceKind::Buffer {
            return Err(CompileError::TypeMismatch {
                name: scoped,
                expected: ResourceKind::Buffer,
                actual,
            });
        }
        Ok(ResourceId::new(RawResourceId(idx as u32)))
    }

    // -- access --------------------------------------------------------

    pub fn read_texture(&mut self, id: TextureId) {
        self.read_texture_at(id, FrameOffset::Current)
    }

    pub fn read_texture_at(&mut self, id: TextureId, offset: FrameOffset) {
        self.push_read(id.raw, offset)
    }

    pub fn write_texture(&mut self, id: TextureId) {
        self.write_texture_at(id, FrameOffset::Current)
    }

    pub fn write_texture_at(&mut self, id: TextureId, offset: FrameOffset) {
        self.push_write(id.raw, offset)
    }

    pub fn read_write_texture(&mut self, id: TextureId) {
        self.read_texture(id);
        self.write_texture(id);
    }

    pub fn read_buffer(&mut self, id: BufferId) {
        self.read_buffer_at(id, FrameOffset::Current)
    }

    pub fn read_buffer_at(&mut self, id: BufferId, offset: FrameOffset) {
        self.push_read(id.raw, offset)
    }

    pub fn write_buffer(&mut self, id: BufferId) {
        self.write_buffer_at(id, FrameOffset::Current)
    }

    pub fn write_buffer_at(&mut self, id: BufferId, offset: FrameOffset) {
        self.push_write(id.raw, offset)
    }

    pub fn read_write_buffer(&mut self, id: BufferId) {
        self.read_buffer(id);
        self.write_buffer(id);
    }

    pub fn reads_textures(&mut self, ids: &[TextureId]) {
        for &id in ids {
            self.read_texture(id);
        }
    }

    pub fn writes_textures(&mut self, ids: &[TextureId]) {
        for &id in ids {
            self.write_texture(id);
        }
    }

    pub fn reads_buffers(&mut self, ids: &[BufferId]) {
        for &id in ids {
            self.read_buffer(id);
        }
    }

    pub fn writes_buffers(&mut self, ids: &[BufferId]) {
        for &id in ids {
            self.write_buffer(id);
        }
    }

    fn push_read(&mut self, raw: RawResourceId, offset: FrameOffset) {
        let name = self.decls[raw.index()].name.clone();
        self.reads.push(ResourceAccess {
            name,
            offset,
            mode: AccessMode::Read,
        });
    }

    fn push_write(&mut self, raw: RawResourceId, offset: FrameOffset) {
        let name = self.decls[raw.index()].name.clone();
        self.writes.push(ResourceAccess {
            name,
            offset,
            mode: AccessMode::Write,
        });
    }
}
