//! The Solver (§5): ties the Iso-Enumerator, Pattern Store, Coverage Index,
//! Domain State, Observer, and Propagator into the two-phase setup/run
//! lifecycle: a read-only setup phase (patterns, coverage) separate from a
//! mutable per-run phase (domains, the observer pool, the propagation
//! queue).

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use rand::Rng;

use crate::color::{ColorId, Palette};
use crate::coverage::CoverageIndex;
use crate::domain::DomainState;
use crate::error::{RunOutcome, SetupError};
use crate::graph::Graph;
use crate::iso::IsoEnumerator;
use crate::observer::{sample_pattern, Observer};
use crate::pattern::TemplatePatterns;
use crate::propagator::{propagate, DirtyQueue};
use crate::template::Template;

/// Everything a [`SolverState`] needs once (setup) plus everything it
/// mutates on every `run` (domains, the Observer pool, the propagation
/// queue, a monotonically increasing step counter).
///
/// Deliberately *not* `Sync`: `Observer`'s internal `PriorityQueue` is not
/// safe to share across threads without external synchronization, and this
/// crate runs one solve at a time per `spec.md` §5 ("single-threaded solve
/// loop; no shared mutable state is exposed across an `.await` or thread
/// boundary").
pub struct SolverState<N, L>
where
    N: Eq + Hash + Clone + Ord + Debug,
    L: Eq + Clone,
{
    templates: Vec<Template<L>>,
    patterns: Vec<TemplatePatterns>,
    coverage: CoverageIndex<N>,
    palette_len: usize,
    domains: DomainState<N>,
    observer: Observer,
    queue: DirtyQueue<N>,
    step: usize,
}

impl<N, L> SolverState<N, L>
where
    N: Eq + Hash + Clone + Ord + Debug,
    L: Eq + Clone,
{
    /// Build every setup-phase artifact: intern *GI*'s colors, extract each
    /// template's patterns against *GI*, enumerate each template's images
    /// into *GO*, and initialize Domain State + the Observer pool over the
    /// resulting coverage.
    pub fn setup<C>(
        example: &Graph<N, L>,
        example_colors: &std::collections::HashMap<N, C>,
        templates: Vec<Template<L>>,
        output: &Graph<N, L>,
        edge_attr_enforced: bool,
    ) -> Result<(Self, Palette<C>), SetupError>
    where
        C: Eq + Hash + Clone,
    {
        if templates.is_empty() {
            return Err(SetupError::NoTemplates);
        }
        if example.is_directed() != output.is_directed() {
            return Err(SetupError::MixedDirectedness);
        }
        for template in &templates {
            if template.is_directed() != example.is_directed() {
                return Err(SetupError::MixedDirectedness);
            }
        }

        let mut palette: Palette<C> = Palette::new();
        let mut colors: std::collections::HashMap<N, ColorId> = std::collections::HashMap::new();
        for node in example.vertices() {
            let color = example_colors
                .get(node)
                .ok_or_else(|| SetupError::MissingColorAttribute {
                    attr: format!("{node:?}"),
                })?;
            colors.insert(node.clone(), palette.intern(color.clone()));
        }

        let mut patterns = Vec::with_capacity(templates.len());
        for (template_index, template) in templates.iter().enumerate() {
            let mut store = TemplatePatterns::new(template.len());
            let mut saw_image = false;
            for image in IsoEnumerator::new(template, example, edge_attr_enforced) {
                saw_image = true;
                let tuple: Vec<ColorId> = image.iter().map(|n| colors[n]).collect();
                store.record(tuple);
            }
            if !saw_image {
                return Err(SetupError::NoIsomorphism { template_index });
            }
            patterns.push(store);
        }

        let go_images = templates
            .iter()
            .map(|template| IsoEnumerator::new(template, output, edge_attr_enforced).collect())
            .collect();
        let coverage = CoverageIndex::build(go_images);
        if coverage.covered_nodes().next().is_none() {
            return Err(SetupError::EmptyCoverage);
        }

        let palette_len = palette.len();
        let mut domains = DomainState::init(coverage.covered_nodes(), palette_len);
        let covered: Vec<N> = domains.nodes().cloned().collect();
        for node in &covered {
            domains.recompute_entropy(node, &coverage, &patterns);
        }

        let state = Self {
            templates,
            patterns,
            coverage,
            palette_len,
            domains,
            observer: Observer::default(),
            queue: DirtyQueue::new(),
            step: 0,
        };
        Ok((state, palette))
    }

    /// Restore Domain State, the Observer pool, and the step counter to
    /// their post-setup values, so a contradiction can be retried (§6
    /// "retry loop") without rebuilding the Pattern Store or Coverage Index.
    pub fn reset(&mut self) {
        self.domains = DomainState::init(self.coverage.covered_nodes(), self.palette_len);
        let covered: Vec<N> = self.domains.nodes().cloned().collect();
        for node in &covered {
            self.domains.recompute_entropy(node, &self.coverage, &self.patterns);
        }
        self.observer = Observer::default();
        self.queue = DirtyQueue::new();
        self.step = 0;
    }

    pub fn templates(&self) -> &[Template<L>] {
        &self.templates
    }

    pub fn domains(&self) -> &DomainState<N> {
        &self.domains
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Drive Observe-Sample-Collapse-Propagate (§4 "Solve loop") to either
    /// every covered node collapsed (`Success`) or a domain emptying
    /// (`Contradiction`). Each Observer step collapses a whole isomorphism
    /// image at once (§4.4), not a single node: an image is only eligible
    /// while every one of its nodes still has a positive-entropy domain.
    pub fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> RunOutcome<N> {
        self.observer = Observer::new(&self.coverage, &self.domains, rng);

        while let Some((template_index, image_id)) = self.observer.pop() {
            let image = self.coverage.image(template_index, image_id).to_vec();
            if image.iter().any(|n| self.domains.is_collapsed(n)) {
                continue;
            }

            let tuple = match sample_pattern(&image, template_index, &self.domains, &self.patterns, rng) {
                Some(t) => t,
                None => {
                    return RunOutcome::Contradiction {
                        at_node: image[0].clone(),
                        step: self.step,
                    }
                }
            };

            for (position, node) in image.iter().enumerate() {
                let (_, empty) = self.domains.collapse_to(node, tuple[position]);
                if empty {
                    return RunOutcome::Contradiction {
                        at_node: node.clone(),
                        step: self.step,
                    };
                }
                self.queue.push(node.clone());
            }
            self.step += 1;

            match propagate(
                &mut self.domains,
                &self.coverage,
                &self.patterns,
                self.palette_len,
                &mut self.queue,
            ) {
                Ok(touched) => {
                    let mut refreshed: HashSet<(usize, usize)> = HashSet::new();
                    for node in image.iter().chain(touched.iter()) {
                        for &(t, img, _position) in self.coverage.coverings_of(node) {
                            if refreshed.insert((t, img)) {
                                self.observer.refresh(t, img, &self.coverage, &self.domains);
                            }
                        }
                    }
                }
                Err(contradiction) => {
                    return RunOutcome::Contradiction {
                        at_node: contradiction.at_node,
                        step: self.step,
                    }
                }
            }
        }

        match self.coverage.covered_nodes().find(|n| !self.domains.is_collapsed(n)) {
            None => RunOutcome::Success,
            // Every remaining eligible image has at least one node some
            // other image already collapsed (§4.4 "no progress is
            // possible"); the driver's retry loop treats this the same as
            // a propagated contradiction.
            Some(stalled) => RunOutcome::Contradiction {
                at_node: stalled.clone(),
                step: self.step,
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::Graph;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    fn edge_template() -> Template<()> {
        let mut g = Graph::new(false);
        g.add_edge(0usize, 1usize, None);
        Template::new(g)
    }

    #[test]
    fn solves_a_two_coloring_on_a_path() {
        let mut example: Graph<&str, ()> = Graph::new(false);
        example.add_edge("r", "g", None);
        let mut example_colors = HashMap::new();
        example_colors.insert("r", "red");
        example_colors.insert("g", "green");

        let mut output: Graph<&str, ()> = Graph::new(false);
        output.add_edge("1", "2", None);
        output.add_edge("2", "3", None);

        let (mut solver, palette) =
            SolverState::setup(&example, &example_colors, vec![edge_template()], &output, false).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let outcome = solver.run(&mut rng);
        assert!(outcome.is_success(), "{outcome:?}");

        for node in ["1", "2", "3"] {
            let color = solver.domains().single_color(&node).expect("fully collapsed");
            assert!(palette.color(color) == &"red" || palette.color(color) == &"green");
        }
        // adjacent nodes must differ, exactly like the GI edge they were
        // patterned on.
        let c1 = solver.domains().single_color(&"1").unwrap();
        let c2 = solver.domains().single_color(&"2").unwrap();
        assert_ne!(c1, c2);
    }

    #[test]
    fn setup_rejects_empty_template_list() {
        let example: Graph<&str, ()> = Graph::new(false);
        let output: Graph<&str, ()> = Graph::new(false);
        let colors: HashMap<&str, &str> = HashMap::new();
        let result = SolverState::setup(&example, &colors, vec![], &output, false);
        assert!(matches!(result, Err(SetupError::NoTemplates)));
    }

    #[test]
    fn setup_rejects_template_with_no_isomorphism_into_example() {
        let mut example: Graph<&str, ()> = Graph::new(false);
        example.add_node("only");
        let mut example_colors = HashMap::new();
        example_colors.insert("only", "red");

        let mut output: Graph<&str, ()> = Graph::new(false);
        output.add_edge("1", "2", None);

        let result = SolverState::setup(&example, &example_colors, vec![edge_template()], &output, false);
        assert!(matches!(result, Err(SetupError::NoIsomorphism { template_index: 0 })));
    }

    #[test]
    fn setup_rejects_empty_coverage() {
        let mut example: Graph<&str, ()> = Graph::new(false);
        example.add_edge("r", "g", None);
        let mut example_colors = HashMap::new();
        example_colors.insert("r", "red");
        example_colors.insert("g", "green");

        let output: Graph<&str, ()> = Graph::new(false);
        let result = SolverState::setup(&example, &example_colors, vec![edge_template()], &output, false);
        assert!(matches!(result, Err(SetupError::EmptyCoverage)));
    }

    #[test]
    fn reset_restores_full_domains() {
        let mut example: Graph<&str, ()> = Graph::new(false);
        example.add_edge("r", "g", None);
        let mut example_colors = HashMap::new();
        example_colors.insert("r", "red");
        example_colors.insert("g", "green");

        let mut output: Graph<&str, ()> = Graph::new(false);
        output.add_edge("1", "2", None);

        let (mut solver, _palette) =
            SolverState::setup(&example, &example_colors, vec![edge_template()], &output, false).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        solver.run(&mut rng);
        solver.reset();
        assert_eq!(solver.domains().cardinality(&"1"), 2);
        assert_eq!(solver.step(), 0);
    }
}
