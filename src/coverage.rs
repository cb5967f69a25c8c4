//! Coverage index (§3 "Coverage index"): for every *GO* node, the list of
//! `(GL-index, image-id, position)` triples of every isomorphism image
//! covering it. Built once at setup, read-only for the rest of the run.

use std::collections::HashMap;
use std::hash::Hash;

use crate::iso::IsoImage;

pub type ImageId = usize;

/// `(template index, image id, position within that image)`.
pub type Covering = (usize, ImageId, usize);

#[derive(Debug, Clone)]
pub struct CoverageIndex<N> {
    /// `images[t][i]` is the `i`th isomorphism image of template `t` into
    /// *GO*.
    images: Vec<Vec<IsoImage<N>>>,
    by_node: HashMap<N, Vec<Covering>>,
}

impl<N> CoverageIndex<N>
where
    N: Eq + Hash + Clone,
{
    pub fn build(images: Vec<Vec<IsoImage<N>>>) -> Self {
        let mut by_node: HashMap<N, Vec<Covering>> = HashMap::new();

        for (template_index, template_images) in images.iter().enumerate() {
            for (image_id, image) in template_images.iter().enumerate() {
                for (position, node) in image.iter().enumerate() {
                    by_node
                        .entry(node.clone())
                        .or_default()
                        .push((template_index, image_id, position));
                }
            }
        }

        Self { images, by_node }
    }

    /// Nodes covered by at least one isomorphism image (invariant 1). This
    /// is exactly the set of nodes that retain a Domain State entry.
    pub fn covered_nodes(&self) -> impl Iterator<Item = &N> {
        self.by_node.keys()
    }

    pub fn is_covered(&self, node: &N) -> bool {
        self.by_node.contains_key(node)
    }

    pub fn coverings_of(&self, node: &N) -> &[Covering] {
        self.by_node.get(node).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn image(&self, template_index: usize, image_id: ImageId) -> &IsoImage<N> {
        &self.images[template_index][image_id]
    }

    pub fn templates(&self) -> usize {
        self.images.len()
    }

    pub fn images_of(&self, template_index: usize) -> &[IsoImage<N>] {
        &self.images[template_index]
    }
}
