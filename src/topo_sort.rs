//! Topological sorter (C7, spec.md §4.7): Kahn's algorithm restricted to the
//! live subgraph, with a FIFO-ordered ready queue seeded in declaration
//! order so two graphs built from the same pass list always schedule
//! identically (spec.md §8, testable property: determinism).

use std::collections::VecDeque;

use crate::pass::PassInstance;
use crate::types::CompileError;

pub(crate) fn topological_sort(
    instances: &[PassInstance],
    live: &[bool],
    edges: &[(usize, usize)],
) -> Result<Vec<usize>, CompileError> {
    let n = instances.len();
    let mut in_degree = vec![0u32; n];
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];

    for &(producer, consumer) in edges {
        if live[producer] && live[consumer] {
            adjacency[producer].push(consumer);
            in_degree[consumer] += 1;
        }
    }

    let mut ready: VecDeque<usize> = (0..n).filter(|&i| live[i] && in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(i) = ready.pop_front() {
        order.push(i);
        for &consumer in &adjacency[i] {
            in_degree[consumer] -= 1;
            if in_degree[consumer] == 0 {
                ready.push_back(consumer);
            }
        }
    }

    let live_count = live.iter().filter(|l| **l).count();
    if order.len() != live_count {
        let scheduled: std::collections::HashSet<usize> = order.iter().copied().collect();
        let stuck = (0..n)
            .find(|&i| live[i] && !scheduled.contains(&i))
            .expect("fewer passes scheduled than live implies at least one unscheduled live pass");
        return Err(CompileError::CycleDetected {
            pass: instances[stuck].name.clone(),
        });
    }

    Ok(order)
}
