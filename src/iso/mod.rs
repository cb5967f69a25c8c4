//! The Iso-Enumerator (§4.1): a backtracking, VF2-class matcher that
//! enumerates every node-induced subgraph isomorphism of a small [`Template`]
//! into a host [`Graph`], honoring an optional edge-attribute equality
//! constraint.
//!
//! This is hand-rolled rather than delegated to an external isomorphism
//! library, so every enumeration order is fully under this crate's control.

mod state;

use std::fmt::Debug;
use std::hash::Hash;

use state::Vf2State;

use crate::graph::Graph;
use crate::template::Template;

/// An isomorphism image: an ordered tuple of host-node identifiers aligned
/// with the template's fixed node order.
pub type IsoImage<N> = Vec<N>;

struct Frame<N> {
    depth: usize,
    candidates: Vec<N>,
    idx: usize,
}

/// Lazily enumerates isomorphism images of `template` into `host`.
///
/// Enumeration order is a pure function of the host's node identifiers
/// (via `Ord`) and the template's fixed node order, so two runs over
/// identical inputs produce an identical sequence — the determinism
/// `spec.md` §4.1 requires.
pub struct IsoEnumerator<'q, 'h, N, L>
where
    N: Eq + Hash + Clone + Ord,
{
    template: &'q Template<L>,
    host: &'h Graph<N, L>,
    order: Vec<usize>,
    edge_attr_enforced: bool,
    host_sorted: Vec<N>,
    state: Vf2State<N>,
    frames: Vec<Frame<N>>,
    started: bool,
}

impl<'q, 'h, N, L> IsoEnumerator<'q, 'h, N, L>
where
    N: Eq + Hash + Clone + Ord + Debug,
    L: Eq + Clone,
{
    pub fn new(template: &'q Template<L>, host: &'h Graph<N, L>, edge_attr_enforced: bool) -> Self {
        let order = template.match_order();
        let host_sorted = host.sorted_vertices().into_iter().cloned().collect();
        Self {
            template,
            host,
            order,
            edge_attr_enforced,
            host_sorted,
            state: Vf2State::new(template.len()),
            frames: Vec::new(),
            started: false,
        }
    }

    fn compute_candidates(&self, depth: usize) -> Vec<N> {
        let q = self.order[depth];
        let tgraph = self.template.graph();

        if depth > 0 {
            for &placed_q in &self.order[..depth] {
                if tgraph.has_edge(&q, &placed_q) || tgraph.has_edge(&placed_q, &q) {
                    let hm = self.state.get(placed_q).expect("placed node has a mapping");
                    let mut candidates: Vec<N> = self
                        .host
                        .neighbors(hm)
                        .iter()
                        .map(|d| d.destination().clone())
                        .filter(|n| !self.state.is_used(n))
                        .collect();
                    candidates.sort();
                    candidates.dedup();
                    return candidates;
                }
            }
        }

        self.host_sorted
            .iter()
            .filter(|n| !self.state.is_used(n))
            .cloned()
            .collect()
    }

    fn feasible(&self, depth: usize, candidate: &N) -> bool {
        let q = self.order[depth];
        let tgraph = self.template.graph();

        if !self.cardinality_feasible(q, candidate) {
            return false;
        }

        for &placed_q in &self.order[..depth] {
            let hm = self.state.get(placed_q).expect("placed node has a mapping");

            if !self.edge_consistent(tgraph, q, placed_q, candidate, hm) {
                return false;
            }
            if tgraph.is_directed() && !self.edge_consistent(tgraph, placed_q, q, hm, candidate) {
                return false;
            }
        }
        true
    }

    /// Cheap necessary-condition pruning (§4.1 "feasibility pruning by
    /// matched/unmatched/external partition cardinalities"): among `q`'s
    /// template neighbors not yet mapped, count how many are already
    /// frontier nodes (adjacent to some mapped node) versus still fully
    /// external, and require `candidate` to have at least that many
    /// available host neighbors in each partition. A host candidate short
    /// on either count can never accommodate `q`'s remaining structure, so
    /// it is rejected before the more expensive per-placed-node edge check.
    fn cardinality_feasible(&self, q: usize, candidate: &N) -> bool {
        let (q_frontier, q_external) = self.query_partition_counts(q);
        let (h_frontier, h_external) = self.host_partition_counts(candidate);
        q_frontier <= h_frontier && q_external <= h_external
    }

    fn query_partition_counts(&self, q: usize) -> (usize, usize) {
        let mut frontier = 0;
        let mut external = 0;
        for dest in self.template.graph().neighbors(&q) {
            let nq = *dest.destination();
            if self.state.is_query_mapped(nq) {
                continue;
            }
            if self.state.is_query_frontier(nq) {
                frontier += 1;
            } else {
                external += 1;
            }
        }
        (frontier, external)
    }

    fn host_partition_counts(&self, candidate: &N) -> (usize, usize) {
        let mut frontier = 0;
        let mut external = 0;
        for dest in self.host.neighbors(candidate) {
            let hn = dest.destination();
            if self.state.is_used(hn) {
                continue;
            }
            if self.state.is_host_frontier(hn) {
                frontier += 1;
            } else {
                external += 1;
            }
        }
        (frontier, external)
    }

    /// Node-induced + edge-attribute-equality check for the single direction
    /// `a -> b` in template-space / `ha -> hb` in host-space. The outer
    /// `Option` of `edge_attr` tracks whether the edge exists at all; the
    /// inner one is the (optional) attribute value on an existing edge.
    fn edge_consistent(&self, tgraph: &Graph<usize, L>, a: usize, b: usize, ha: &N, hb: &N) -> bool {
        let template_edge = tgraph.edge_attr(&a, &b);
        let host_edge = self.host.edge_attr(ha, hb);

        match (template_edge, host_edge) {
            (None, None) => true,
            (Some(_), None) | (None, Some(_)) => false,
            (Some(t), Some(h)) => !self.edge_attr_enforced || t == h,
        }
    }
}

impl<'q, 'h, N, L> Iterator for IsoEnumerator<'q, 'h, N, L>
where
    N: Eq + Hash + Clone + Ord + Debug,
    L: Eq + Clone,
{
    type Item = IsoImage<N>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.order.is_empty() {
            return None;
        }

        loop {
            if self.frames.is_empty() {
                if self.started {
                    return None;
                }
                self.started = true;
                let candidates = self.compute_candidates(0);
                self.frames.push(Frame {
                    depth: 0,
                    candidates,
                    idx: 0,
                });
            }

            let depth = self.frames.last().unwrap().depth;
            let idx = self.frames.last().unwrap().idx;
            let exhausted = idx >= self.frames.last().unwrap().candidates.len();

            if exhausted {
                self.frames.pop();
                if depth > 0 {
                    self.state.pop(self.order[depth - 1], depth - 1);
                }
                if self.frames.is_empty() {
                    return None;
                }
                continue;
            }

            let candidate = self.frames.last().unwrap().candidates[idx].clone();
            self.frames.last_mut().unwrap().idx += 1;

            if !self.feasible(depth, &candidate) {
                continue;
            }

            let q = self.order[depth];
            let query_neighbors: Vec<usize> = self
                .template
                .graph()
                .neighbors(&q)
                .iter()
                .map(|d| *d.destination())
                .collect();
            let host_neighbors: Vec<N> = self
                .host
                .neighbors(&candidate)
                .iter()
                .map(|d| d.destination().clone())
                .collect();
            self.state.push(q, candidate, depth, query_neighbors, host_neighbors);

            if depth + 1 == self.order.len() {
                let image = self.state.snapshot();
                self.state.pop(q, depth);
                return Some(image);
            }

            let next_candidates = self.compute_candidates(depth + 1);
            self.frames.push(Frame {
                depth: depth + 1,
                candidates: next_candidates,
                idx: 0,
            });
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn path_graph() -> Graph<u32, ()> {
        let mut g = Graph::new(false);
        g.add_edge(1, 2, None);
        g.add_edge(2, 3, None);
        g.add_edge(3, 4, None);
        g
    }

    fn edge_template() -> Template<()> {
        let mut g = Graph::new(false);
        g.add_edge(0, 1, None);
        Template::new(g)
    }

    #[test]
    fn single_edge_into_path_yields_both_orientations_per_edge() {
        let host = path_graph();
        let template = edge_template();
        let images: Vec<_> = IsoEnumerator::new(&template, &host, false).collect();
        // 3 undirected edges, each enumerated in both endpoint orders => 6.
        assert_eq!(images.len(), 6);
        assert!(images.contains(&vec![1, 2]));
        assert!(images.contains(&vec![2, 1]));
    }

    #[test]
    fn triangle_template_has_no_image_in_a_path() {
        let host = path_graph();
        let mut tg = Graph::new(false);
        tg.add_edge(0, 1, None);
        tg.add_edge(1, 2, None);
        tg.add_edge(2, 0, None);
        let template = Template::new(tg);
        let images: Vec<_> = IsoEnumerator::new(&template, &host, false).collect();
        assert!(images.is_empty());
    }

    #[test]
    fn directed_edge_template_respects_direction() {
        let mut host = Graph::new(true);
        host.add_edge(1, 2, None);
        let mut tg = Graph::new(true);
        tg.add_edge(0, 1, None);
        let template = Template::new(tg);
        let images: Vec<_> = IsoEnumerator::new(&template, &host, false).collect();
        assert_eq!(images, vec![vec![1, 2]]);
    }

    #[test]
    fn edge_attribute_mismatch_is_excluded_when_enforced() {
        let mut host: Graph<u32, &str> = Graph::new(false);
        host.add_edge(1, 2, Some("a"));
        host.add_edge(2, 3, Some("b"));
        let mut tg: Graph<usize, &str> = Graph::new(false);
        tg.add_edge(0, 1, Some("a"));
        let template = Template::new(tg);

        let images: Vec<_> = IsoEnumerator::new(&template, &host, true).collect();
        assert_eq!(images, vec![vec![1, 2], vec![2, 1]]);
    }

    #[test]
    fn determinism_across_repeated_runs() {
        let host = path_graph();
        let template = edge_template();
        let first: Vec<_> = IsoEnumerator::new(&template, &host, false).collect();
        let second: Vec<_> = IsoEnumerator::new(&template, &host, false).collect();
        assert_eq!(first, second);
    }
}
