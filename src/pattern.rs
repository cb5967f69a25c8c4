//! Pattern Store (§4.2): per-template mapping from color tuples observed on
//! *GI* isomorphism images to their occurrence weight, plus the
//! position-indexed queries the Observer and Propagator need at solve time.

use std::collections::HashMap;

use fixedbitset::FixedBitSet;

use crate::color::ColorId;

pub type PatternId = usize;

/// The patterns extracted for a single template *GL*.
#[derive(Debug, Clone)]
pub struct TemplatePatterns {
    template_len: usize,
    /// pattern id -> color tuple, in template node order.
    tuples: Vec<Vec<ColorId>>,
    /// pattern id -> occurrence weight (strictly positive, per invariant 3).
    weights: Vec<u32>,
    /// tuple -> pattern id, to fold repeated observations into one weight.
    index: HashMap<Vec<ColorId>, PatternId>,
    /// position -> color -> pattern ids placing that color at that position.
    position_index: Vec<HashMap<ColorId, Vec<PatternId>>>,
}

impl TemplatePatterns {
    pub fn new(template_len: usize) -> Self {
        Self {
            template_len,
            tuples: Vec::new(),
            weights: Vec::new(),
            index: HashMap::new(),
            position_index: vec![HashMap::new(); template_len],
        }
    }

    /// Record one occurrence of `colors` (one entry per template position).
    pub fn record(&mut self, colors: Vec<ColorId>) {
        debug_assert_eq!(colors.len(), self.template_len);

        if let Some(&id) = self.index.get(&colors) {
            self.weights[id] += 1;
            return;
        }

        let id = self.tuples.len();
        for (position, color) in colors.iter().enumerate() {
            self.position_index[position]
                .entry(*color)
                .or_default()
                .push(id);
        }
        self.index.insert(colors.clone(), id);
        self.tuples.push(colors);
        self.weights.push(1);
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn total_weight(&self) -> u64 {
        self.weights.iter().map(|&w| w as u64).sum()
    }

    pub fn tuple(&self, id: PatternId) -> &[ColorId] {
        &self.tuples[id]
    }

    pub fn weight(&self, id: PatternId) -> u32 {
        self.weights[id]
    }

    /// Pattern ids whose every position's color lies in the corresponding
    /// domain, in ascending id order (a fixed, deterministic order, needed
    /// so weighted sampling is reproducible across runs with the same RNG
    /// stream).
    pub fn applicable(&self, domains: &[&FixedBitSet]) -> Vec<PatternId> {
        debug_assert_eq!(domains.len(), self.template_len);

        let mut candidates: Option<Vec<PatternId>> = None;
        for (position, domain) in domains.iter().enumerate() {
            let mut at_position: Vec<PatternId> = self.position_index[position]
                .iter()
                .filter(|(color, _)| domain.contains(color.0 as usize))
                .flat_map(|(_, ids)| ids.iter().copied())
                .collect();
            at_position.sort_unstable();
            at_position.dedup();

            candidates = Some(match candidates {
                None => at_position,
                Some(prev) => intersect_sorted(&prev, &at_position),
            });
        }
        candidates.unwrap_or_default()
    }

    /// Per-position support: for each position, the bitset of colors that
    /// appear at that position in at least one applicable pattern. This is
    /// the Propagator's per-position pruning mask (§4.5).
    pub fn support(&self, domains: &[&FixedBitSet], palette_len: usize) -> Vec<FixedBitSet> {
        let applicable = self.applicable(domains);
        let mut result: Vec<FixedBitSet> = (0..self.template_len)
            .map(|_| FixedBitSet::with_capacity(palette_len))
            .collect();

        for id in applicable {
            for (position, bitset) in result.iter_mut().enumerate() {
                bitset.insert(self.tuples[id][position].0 as usize);
            }
        }
        result
    }
}

fn intersect_sorted(a: &[PatternId], b: &[PatternId]) -> Vec<PatternId> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
