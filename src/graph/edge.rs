//! Edge destinations for the adjacency-list `Graph`.

/// The destination side of an edge as stored in the adjacency list: which
/// node it goes to, and the (optional) edge attribute value used for
/// equality checks during isomorphism enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeDestination<N, L> {
    pub(crate) to: N,
    pub(crate) attr: Option<L>,
}

impl<N, L> EdgeDestination<N, L> {
    pub fn init(to: N, attr: Option<L>) -> Self {
        Self { to, attr }
    }

    pub fn destination(&self) -> &N {
        &self.to
    }

    pub fn attr(&self) -> Option<&L> {
        self.attr.as_ref()
    }
}
