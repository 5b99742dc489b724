//! Validator (C4, spec.md §4.4): runs after every instance's setup callback
//! has populated its reads/writes, before dependency edges are built. Builds
//! the set of names anyone writes (across all frame offsets) once, then for
//! every pass's reads: the name must exist in the declaration set, and a
//! `CURRENT`/`PREV` read of a non-external resource must have a writer
//! somewhere, else `DANGLING_READ` (spec.md §4.4, §8 "a purely-read resource
//! ... must be declared external, otherwise DANGLING_READ"). `NEXT` reads
//! carry no such requirement (spec.md §4.4's writer rule is `CURRENT`/`PREV`
//! only). `FrameOffsetInvalid` is reserved for a future `PREV`-requires-`NEXT`-
//! writer extension (spec.md §4.4) and is not enforced here. Resource-kind
//! mismatches (`CompileError::TypeMismatch`) are caught earlier, at the
//! `PassSetup::find_texture_in`/`find_buffer_in` call site, since that's the
//! only place a name lookup can resolve to the wrong descriptor kind.

use std::collections::{HashMap, HashSet};

use crate::pass::PassInstance;
use crate::resource_decl::ResourceDecl;
use crate::types::{CompileError, FrameOffset};

pub(crate) fn validate(
    instances: &[PassInstance],
    decl_index: &HashMap<String, usize>,
    decls: &[ResourceDecl],
) -> Result<(), CompileError> {
    let mut written: HashSet<&str> = HashSet::new();
    for inst in instances {
        for write in &inst.writes {
            written.insert(write.name.as_str());
        }
    }

    for inst in instances {
        for read in &inst.reads {
            let Some(&idx) = decl_index.get(&read.name) else {
                return Err(CompileError::DanglingRead {
                    pass: inst.name.clone(),
                    resource: read.name.clone(),
                    detail: "read of a resource no pass ever created".to_string(),
                });
            };

            let requires_writer = matches!(read.offset, FrameOffset::Current | FrameOffset::Prev);
            if requires_writer && !decls[idx].is_external() && !written.contains(read.name.as_str()) {
                return Err(CompileError::DanglingRead {
                    pass: inst.name.clone(),
                    resource: read.name.clone(),
                    detail: "read of a resource no pass ever writes; declare it external if the host supplies it"
                        .to_string(),
                });
            }
        }

        for write in &inst.writes {
            if decl_index.get(&write.name).is_none() {
                return Err(CompileError::DanglingRead {
                    pass: inst.name.clone(),
                    resource: write.name.clone(),
                    detail: "write to a resource no pass ever created".to_string(),
                });
            }
        }
    }

    Ok(())
}
