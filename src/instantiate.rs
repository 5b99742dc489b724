//! Instantiator (C3, spec.md §4.3): expands each `PassDecl` into one
//! `PassInstance` per active scope target, in declaration order. Reads and
//! writes are left empty here; `PassSetup` fills them in next (C2).

use crate::compile::CompileContext;
use crate::pass::{PassDecl, PassInstance};
use crate::types::PassScope;

pub(crate) fn instantiate_passes(decls: &[PassDecl], ctx: &CompileContext) -> Vec<PassInstance> {
    let mut instances = Vec::new();

    for decl in decls {
        let pass = decl.0.clone();
        let base_name = pass.name().to_string();
        let scope = pass.scope();
        let queue = pass.queue();

        let count = match scope {
            PassScope::Global => 1,
            PassScope::PerCamera => ctx.num_cameras,
            PassScope::PerLight => ctx.num_lights,
        };

        for instance_idx in 0..count {
            instances.push(PassInstance {
                name: scope.scoped_name(&base_name, instance_idx),
                scope,
                instance_idx,
                queue,
                pass: pass.clone(),
                reads: Vec::new(),
                writes: Vec::new(),
            });
        }
    }

    instances
}
