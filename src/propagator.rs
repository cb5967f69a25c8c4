//! The Propagator (§4.5): FIFO fixed-point pruning of Domain State after an
//! observation, generalized from `petgraph`'s `wfc_coloring::propagate`
//! (a `VecDeque` worklist with a dirty-flag revisit guard) from single-color
//! neighbor exclusion to arbitrary per-template, per-position pattern
//! support.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use fixedbitset::FixedBitSet;

use crate::coverage::CoverageIndex;
use crate::domain::DomainState;
use crate::pattern::TemplatePatterns;

/// A domain was pruned to empty while propagating from `at_node`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contradiction<N> {
    pub at_node: N,
}

/// Work queue shared across an observation + its propagation, so repeated
/// enqueues of the same node within one fixed-point pass are no-ops.
pub struct DirtyQueue<N>
where
    N: Eq + Hash + Clone,
{
    queue: VecDeque<N>,
    queued: HashSet<N>,
}

impl<N> DirtyQueue<N>
where
    N: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
        }
    }

    pub fn push(&mut self, node: N) {
        if self.queued.insert(node.clone()) {
            self.queue.push_back(node);
        }
    }

    fn pop(&mut self) -> Option<N> {
        let node = self.queue.pop_front();
        if let Some(n) = &node {
            self.queued.remove(n);
        }
        node
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<N> Default for DirtyQueue<N>
where
    N: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Run the Propagator to a fixed point, or until a domain empties.
///
/// Each iteration strictly reduces the total color count across all
/// domains, so the loop terminates in at most `palette_len * |GO nodes|`
/// pops (§4.5 "Termination").
/// Returns the set of nodes whose domain changed, in the order they were
/// pruned, so a caller (the Observer) can keep its own entropy-ordering
/// structure in sync without rescanning every covered node.
pub fn propagate<N>(
    domains: &mut DomainState<N>,
    coverage: &CoverageIndex<N>,
    patterns: &[TemplatePatterns],
    palette_len: usize,
    queue: &mut DirtyQueue<N>,
) -> Result<Vec<N>, Contradiction<N>>
where
    N: Eq + Hash + Clone + Ord,
{
    let mut touched = Vec::new();

    while let Some(node) = queue.pop() {
        for &(template_index, image_id, _position) in coverage.coverings_of(&node) {
            let image = coverage.image(template_index, image_id);
            let domain_refs: Vec<&FixedBitSet> = image.iter().map(|n| domains.domain(n)).collect();
            let support = patterns[template_index].support(&domain_refs, palette_len);

            for (position, other) in image.iter().enumerate() {
                let (changed, empty) = domains.intersect(other, &support[position]);
                if empty {
                    return Err(Contradiction {
                        at_node: other.clone(),
                    });
                }
                if changed {
                    domains.recompute_entropy(other, coverage, patterns);
                    queue.push(other.clone());
                    touched.push(other.clone());
                }
            }
        }
    }
    Ok(touched)
}
