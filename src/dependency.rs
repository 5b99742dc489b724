//! Dependency builder (C5, spec.md §4.5): turns each pass instance's reads
//! and writes into execution edges. Only `Current`-offset reads create an
//! edge — a `Prev`/`Next` read crosses a frame boundary and is satisfied by
//! a resource variant written on an earlier frame, so it must never force
//! same-frame ordering between the two passes.
//!
//! The declaration order a pass's `PassDecl` is registered in carries no
//! ordering guarantee on its own (S5: two passes that each read what the
//! other writes must still surface as a cycle no matter which is declared
//! first). So `last_writer` is resolved against the *whole* instance set
//! before any edge is emitted, not threaded through a single left-to-right
//! scan — otherwise a reader whose writer happens to be declared later
//! would silently see no writer yet and drop the edge instead of forming
//! the cycle spec.md §8/S5 requires `build_graph` to reject.

use std::collections::{HashMap, HashSet};

use crate::pass::PassInstance;
use crate::types::FrameOffset;

/// `(producer_idx, consumer_idx)` pairs into the pass-instance list,
/// de-duplicated, in first-encountered order.
pub(crate) fn build_edges(instances: &[PassInstance]) -> Vec<(usize, usize)> {
    let mut writer_of: HashMap<&str, usize> = HashMap::new();
    for (idx, inst) in instances.iter().enumerate() {
        for write in &inst.writes {
            if write.offset == FrameOffset::Current {
                writer_of.insert(write.name.as_str(), idx);
            }
        }
    }

    let mut edges = Vec::new();
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    for (idx, inst) in instances.iter().enumerate() {
        for read in &inst.reads {
            if read.offset != FrameOffset::Current {
                continue;
            }
            if let Some(&writer) = writer_of.get(read.name.as_str()) {
                if writer != idx && seen.insert((writer, idx)) {
                    edges.push((writer, idx));
                }
            }
        }
    }

    edges
}
