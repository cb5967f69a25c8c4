//! Template graphs (*GL*): small, uncolored query graphs whose fixed node
//! ordering `0..len` is the index space for every [`crate::pattern::Pattern`]
//! extracted against them.

use crate::graph::Graph;

#[derive(Debug, Clone)]
pub struct Template<L> {
    graph: Graph<usize, L>,
}

impl<L> Template<L>
where
    L: Eq + Clone,
{
    pub fn new(graph: Graph<usize, L>) -> Self {
        Template { graph }
    }

    pub fn graph(&self) -> &Graph<usize, L> {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn is_directed(&self) -> bool {
        self.graph.is_directed()
    }

    /// Match order used by the Iso-Enumerator: nodes ordered by descending
    /// degree, ties broken by descending connectivity to the nodes already
    /// placed earlier in the order (§4.1 "highest degree first, then
    /// highest connectivity to already-matched GL-nodes"). Computed once,
    /// since templates are read-only and small.
    pub fn match_order(&self) -> Vec<usize> {
        let n = self.len();
        let mut remaining: Vec<usize> = (0..n).collect();
        let mut order = Vec::with_capacity(n);

        while !remaining.is_empty() {
            let next = *remaining
                .iter()
                .max_by_key(|&&q| {
                    let degree = self.graph.degree(&q);
                    let connectivity = order
                        .iter()
                        .filter(|&&placed| self.graph.has_edge(&q, &placed) || self.graph.has_edge(&placed, &q))
                        .count();
                    (degree, connectivity, std::cmp::Reverse(q))
                })
                .expect("remaining is non-empty");
            order.push(next);
            remaining.retain(|&q| q != next);
        }

        order
    }
}
