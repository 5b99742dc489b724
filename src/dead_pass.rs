//! Dead-pass eliminator (C6, spec.md §4.6): starts from every pass with no
//! dependent (a sink, zero out-degree among `Current`-offset edges) and
//! propagates liveness backward through *every* read, not just the
//! `Current`-offset ones that produced an edge. A pass whose only consumer
//! reads it at `Prev` has no execution edge pointing at it (spec.md §4.5),
//! but it still has to run every frame to keep writing the history buffer
//! that consumer needs — so it must stay live even though nothing in the
//! same frame depends on it through an edge.

use std::collections::VecDeque;

use crate::pass::PassInstance;

pub(crate) fn eliminate_dead_passes(instances: &[PassInstance], edges: &[(usize, usize)]) -> Vec<bool> {
    let n = instances.len();

    let mut writers_of: std::collections::HashMap<&str, Vec<usize>> = std::collections::HashMap::new();
    for (idx, inst) in instances.iter().enumerate() {
        for write in &inst.writes {
            writers_of.entry(write.name.as_str()).or_default().push(idx);
        }
    }

    let mut out_degree = vec![0u32; n];
    for &(producer, _consumer) in edges {
        out_degree[producer] += 1;
    }

    let mut live = vec![false; n];
    let mut queue: VecDeque<usize> = VecDeque::new();
    for i in 0..n {
        if out_degree[i] == 0 {
            live[i] = true;
            queue.push_back(i);
        }
    }

    while let Some(i) = queue.pop_front() {
        for read in &instances[i].reads {
            if let Some(writers) = writers_of.get(read.name.as_str()) {
                for &w in writers {
                    if !live[w] {
                        live[w] = true;
                        queue.push_back(w);
                    }
                }
            }
        }
    }

    let eliminated = live.iter().filter(|l| !**l).count();
    log::debug!(
        "dead-pass elimination: {} live, {} eliminated of {} instantiated",
        n - eliminated,
        eliminated,
        n
    );

    live
}
