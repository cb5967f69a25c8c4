//! Partial-mapping bookkeeping for the VF2-class matcher.
//!
//! Grounded on the mapping/generation bookkeeping in the pack's VF2
//! isomorphism references (`petgraph`'s `Vf2State`, `prepona`'s
//! `vf2-state`): besides the `mapping`/`used` partial map, this tracks a
//! `Tin`/`Tout`-style frontier — nodes not yet mapped but adjacent to some
//! already-mapped node — on both the template and host side, tagged with
//! the search depth at which they entered the frontier so a later
//! backtrack can undo exactly the entries a given push introduced.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// The partial mapping from template node index to host node, used while
/// backtracking through the search tree.
#[derive(Debug, Clone)]
pub(crate) struct Vf2State<N> {
    mapping: Vec<Option<N>>,
    used: HashSet<N>,
    /// template index -> search depth at which it entered the frontier.
    query_frontier: Vec<Option<usize>>,
    /// host node -> search depth at which it entered the frontier.
    host_frontier: HashMap<N, usize>,
}

impl<N> Vf2State<N>
where
    N: Eq + Hash + Clone,
{
    pub(crate) fn new(template_len: usize) -> Self {
        Self {
            mapping: vec![None; template_len],
            used: HashSet::new(),
            query_frontier: vec![None; template_len],
            host_frontier: HashMap::new(),
        }
    }

    /// Map `template_index -> host_node` at search depth `depth`, and mark
    /// every unmapped neighbor (on both sides) that newly borders the
    /// mapped set as frontier, tagged with `depth` so `pop` can undo it.
    pub(crate) fn push(
        &mut self,
        template_index: usize,
        host_node: N,
        depth: usize,
        query_neighbors: impl IntoIterator<Item = usize>,
        host_neighbors: impl IntoIterator<Item = N>,
    ) {
        self.used.insert(host_node.clone());
        self.mapping[template_index] = Some(host_node);

        for nq in query_neighbors {
            if self.mapping[nq].is_none() && self.query_frontier[nq].is_none() {
                self.query_frontier[nq] = Some(depth);
            }
        }
        for hn in host_neighbors {
            if !self.used.contains(&hn) {
                self.host_frontier.entry(hn).or_insert(depth);
            }
        }
    }

    /// Undo the mapping made by the `push` at search depth `depth`, along
    /// with every frontier entry it introduced.
    pub(crate) fn pop(&mut self, template_index: usize, depth: usize) {
        if let Some(host_node) = self.mapping[template_index].take() {
            self.used.remove(&host_node);
        }
        for slot in &mut self.query_frontier {
            if *slot == Some(depth) {
                *slot = None;
            }
        }
        self.host_frontier.retain(|_, gen| *gen != depth);
    }

    pub(crate) fn get(&self, template_index: usize) -> Option<&N> {
        self.mapping[template_index].as_ref()
    }

    pub(crate) fn is_used(&self, host_node: &N) -> bool {
        self.used.contains(host_node)
    }

    pub(crate) fn is_query_mapped(&self, template_index: usize) -> bool {
        self.mapping[template_index].is_some()
    }

    pub(crate) fn is_query_frontier(&self, template_index: usize) -> bool {
        self.query_frontier[template_index].is_some()
    }

    pub(crate) fn is_host_frontier(&self, host_node: &N) -> bool {
        self.host_frontier.contains_key(host_node)
    }

    /// The mapped host node for every template index that has one so far,
    /// in template-index order. Used to build the finished `IsoImage`.
    pub(crate) fn snapshot(&self) -> Vec<N> {
        self.mapping
            .iter()
            .map(|m| m.clone().expect("snapshot called on a complete mapping"))
            .collect()
    }
}
