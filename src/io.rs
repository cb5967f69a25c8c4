//! File-format collaborators for the core solver (`spec.md` §6). The core
//! never touches a filesystem path; everything here is a thin translation
//! layer between [`crate::graph::Graph`] and the GraphML public standard.

pub mod graphml;
