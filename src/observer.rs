//! The Observer (§4.4): picks the next isomorphism image to collapse by
//! minimum total entropy, then samples one whole pattern tuple for it,
//! weighted by the covering template's pattern weights.
//!
//! Selection is keyed by image, not by node — an image is only eligible
//! while *every* one of its nodes still has a positive-entropy domain
//! (§4.4 "whose image nodes all have positive-entropy domains"). The
//! `priority_queue::PriorityQueue` recall structure mirrors the min-degree
//! recall the teacher paired with every `Graph`, generalized from integer
//! degree to `f64` entropy (wrapped in `ordered_float::OrderedFloat` so it
//! can key a priority queue at all, the same fix `ryanxwang-lazylifted`
//! reaches for whenever a float needs to sit in an ordered container).

use std::cmp::Reverse;
use std::collections::HashMap;
use std::hash::Hash;

use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::Rng;

use crate::color::ColorId;
use crate::coverage::{CoverageIndex, ImageId};
use crate::domain::DomainState;
use crate::pattern::TemplatePatterns;

/// Ceiling on the per-image jitter, well below any real entropy gap
/// between two distinct images, so it only breaks exact ties and never
/// reorders images whose entropy genuinely differs.
const JITTER_SCALE: f64 = 1e-9;

type ImageKey = (usize, ImageId);

/// Tracks every eligible isomorphism image's total entropy and yields the
/// minimum. Each image gets one fixed jitter value, drawn once from the
/// caller's RNG at construction, so reproducible tie-breaking survives
/// repeated rescoring without redrawing (§4.4 "a small deterministic
/// jitter seeded by a caller-supplied RNG").
pub struct Observer {
    heap: PriorityQueue<ImageKey, Reverse<(OrderedFloat<f64>, Reverse<ImageKey>)>>,
    jitter: HashMap<ImageKey, f64>,
}

impl Observer {
    /// Seed one jitter value per image across every template, and push
    /// every image whose nodes are all still uncollapsed.
    pub fn new<N, R: Rng + ?Sized>(coverage: &CoverageIndex<N>, domains: &DomainState<N>, rng: &mut R) -> Self
    where
        N: Eq + Hash + Clone + Ord,
    {
        let mut observer = Self {
            heap: PriorityQueue::new(),
            jitter: HashMap::new(),
        };

        for template_index in 0..coverage.templates() {
            for image_id in 0..coverage.images_of(template_index).len() {
                let key = (template_index, image_id);
                observer.jitter.insert(key, rng.gen::<f64>() * JITTER_SCALE);
                observer.refresh(template_index, image_id, coverage, domains);
            }
        }

        observer
    }

    /// Recompute `(template_index, image_id)`'s eligibility and score,
    /// reinserting it, or dropping it from the pool the moment any one of
    /// its nodes collapses.
    pub fn refresh<N>(
        &mut self,
        template_index: usize,
        image_id: ImageId,
        coverage: &CoverageIndex<N>,
        domains: &DomainState<N>,
    ) where
        N: Eq + Hash + Clone + Ord,
    {
        let key = (template_index, image_id);
        let image = coverage.image(template_index, image_id);

        if image.iter().any(|n| domains.is_collapsed(n)) {
            self.heap.remove(&key);
            return;
        }

        let jitter = self.jitter.get(&key).copied().unwrap_or(0.0);
        let total_entropy: f64 = image.iter().map(|n| domains.entropy(n)).sum();
        self.heap.push(
            key,
            Reverse((OrderedFloat(total_entropy + jitter), Reverse(key))),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pop the minimum-total-entropy image still fully uncollapsed, per
    /// invariant 4 generalized from a single node to a whole image.
    pub fn pop(&mut self) -> Option<ImageKey> {
        self.heap.pop().map(|(key, _)| key)
    }
}

impl Default for Observer {
    /// An empty pool, rebuilt by [`Observer::new`] at the start of each
    /// `run` (selection jitter is seeded from that call's RNG, so there is
    /// nothing useful to construct before a run begins).
    fn default() -> Self {
        Self {
            heap: PriorityQueue::new(),
            jitter: HashMap::new(),
        }
    }
}

/// Sample one whole pattern tuple for `image` under `template_index`,
/// weighted by occurrence (§4.4 "Collapse"). Returns `None` if no pattern
/// is consistent with every position's current domain — per §7 this
/// cannot happen after a `Propagator` fixed point, since applicability is
/// re-checked against current domains before sampling, but a caller still
/// treats it as a contradiction rather than panicking.
pub fn sample_pattern<N, R: Rng + ?Sized>(
    image: &[N],
    template_index: usize,
    domains: &DomainState<N>,
    patterns: &[TemplatePatterns],
    rng: &mut R,
) -> Option<Vec<ColorId>>
where
    N: Eq + Hash + Clone,
{
    let store = &patterns[template_index];
    let domain_refs: Vec<_> = image.iter().map(|n| domains.domain(n)).collect();
    let applicable = store.applicable(&domain_refs);
    if applicable.is_empty() {
        return None;
    }

    let weights: Vec<u64> = applicable.iter().map(|&id| store.weight(id) as u64).collect();
    let dist = WeightedIndex::new(&weights).ok()?;
    let pattern_id = applicable[dist.sample(rng)];
    Some(store.tuple(pattern_id).to_vec())
}
