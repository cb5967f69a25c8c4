//! Domain State (§3, §4.3): a bitset-per-node palette subset for every
//! covered *GO* node, plus its incrementally maintained entropy.
//!
//! Grounded on the closest existing "WFC on a graph" artifact in the
//! pack, `petgraph`'s unmerged `wfc_coloring` (`FixedBitSet`-per-node
//! domains, an `entropy` vector kept in step with them), generalized from
//! single-color graph coloring to arbitrary per-template pattern supports.

use std::collections::HashMap;
use std::hash::Hash;

use fixedbitset::FixedBitSet;

use crate::color::ColorId;
use crate::coverage::CoverageIndex;
use crate::pattern::TemplatePatterns;

#[derive(Debug, Clone)]
pub struct DomainState<N>
where
    N: Eq + Hash + Clone,
{
    palette_len: usize,
    domains: HashMap<N, FixedBitSet>,
    entropy: HashMap<N, f64>,
}

impl<N> DomainState<N>
where
    N: Eq + Hash + Clone,
{
    /// All covered nodes start with every color allowed.
    pub fn init<'a>(nodes: impl Iterator<Item = &'a N>, palette_len: usize) -> Self
    where
        N: 'a,
    {
        let mut domains = HashMap::new();
        for node in nodes {
            let mut bs = FixedBitSet::with_capacity(palette_len);
            bs.set_range(.., true);
            domains.insert(node.clone(), bs);
        }
        let entropy = domains
            .keys()
            .map(|n| (n.clone(), (palette_len as f64).log2()))
            .collect();
        Self {
            palette_len,
            domains,
            entropy,
        }
    }

    pub fn domain(&self, node: &N) -> &FixedBitSet {
        &self.domains[node]
    }

    pub fn cardinality(&self, node: &N) -> usize {
        self.domains[node].count_ones(..)
    }

    pub fn is_collapsed(&self, node: &N) -> bool {
        self.cardinality(node) == 1
    }

    pub fn single_color(&self, node: &N) -> Option<ColorId> {
        let bs = &self.domains[node];
        if bs.count_ones(..) == 1 {
            bs.ones().next().map(|i| ColorId(i as u32))
        } else {
            None
        }
    }

    pub fn entropy(&self, node: &N) -> f64 {
        self.entropy[node]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.domains.keys()
    }

    /// Intersect `node`'s domain with `mask`. Returns `(changed, empty)`.
    pub fn intersect(&mut self, node: &N, mask: &FixedBitSet) -> (bool, bool) {
        let domain = self.domains.get_mut(node).expect("node must be covered");
        let before = domain.count_ones(..);
        domain.intersect_with(mask);
        let after = domain.count_ones(..);
        (after != before, after == 0)
    }

    /// Collapse `node` to exactly `color`. Returns `(changed, empty)`.
    pub fn collapse_to(&mut self, node: &N, color: ColorId) -> (bool, bool) {
        let mut singleton = FixedBitSet::with_capacity(self.palette_len);
        singleton.insert(color.0 as usize);
        self.intersect(node, &singleton)
    }

    /// Recompute `node`'s entropy from its covering templates' pattern
    /// weights (§4.3). Falls back to uniform-over-domain entropy when no
    /// covering image yet has any pattern-weight evidence consistent with
    /// the current domains (§9 "Entropy choice" — both formulas are
    /// admissible; this selects between them per node rather than per run
    /// only in this narrow no-evidence case, keeping the choice internally
    /// consistent as `spec.md` §4.3 requires).
    pub fn recompute_entropy(
        &mut self,
        node: &N,
        coverage: &CoverageIndex<N>,
        patterns: &[TemplatePatterns],
    ) -> f64
    where
        N: Ord,
    {
        let card = self.cardinality(node);
        if card <= 1 {
            self.entropy.insert(node.clone(), 0.0);
            return 0.0;
        }

        let domain = self.domains[node].clone();
        let mut weight_per_color: HashMap<ColorId, u64> = HashMap::new();

        for &(template_index, image_id, position) in coverage.coverings_of(node) {
            let image = coverage.image(template_index, image_id);
            let domain_refs: Vec<&FixedBitSet> = image.iter().map(|n| &self.domains[n]).collect();
            let store = &patterns[template_index];
            for pattern_id in store.applicable(&domain_refs) {
                let color = store.tuple(pattern_id)[position];
                if domain.contains(color.0 as usize) {
                    *weight_per_color.entry(color).or_insert(0) += store.weight(pattern_id) as u64;
                }
            }
        }

        let total: u64 = weight_per_color.values().sum();
        let h = if total == 0 {
            (card as f64).log2()
        } else {
            let w = total as f64;
            let sum_wlogw: f64 = weight_per_color
                .values()
                .map(|&wi| {
                    let wi = wi as f64;
                    wi * wi.log2()
                })
                .sum();
            w.log2() - sum_wlogw / w
        };

        self.entropy.insert(node.clone(), h);
        h
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn init_gives_full_domain_and_max_entropy() {
        let nodes = vec!["a", "b"];
        let state = DomainState::init(nodes.iter(), 4);
        assert_eq!(state.cardinality(&"a"), 4);
        assert_eq!(state.entropy(&"a"), 2.0);
    }

    #[test]
    fn collapse_to_leaves_singleton() {
        let nodes = vec!["a"];
        let mut state = DomainState::init(nodes.iter(), 4);
        let (changed, empty) = state.collapse_to(&"a", ColorId(2));
        assert!(changed);
        assert!(!empty);
        assert_eq!(state.cardinality(&"a"), 1);
        assert_eq!(state.single_color(&"a"), Some(ColorId(2)));
    }

    #[test]
    fn intersect_with_empty_mask_is_contradiction() {
        let nodes = vec!["a"];
        let mut state = DomainState::init(nodes.iter(), 4);
        let empty_mask = FixedBitSet::with_capacity(4);
        let (changed, empty) = state.intersect(&"a", &empty_mask);
        assert!(changed);
        assert!(empty);
    }
}
