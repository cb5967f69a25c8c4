//! `graph-wfc`: colors the nodes of an output graph by propagating local
//! coloring patterns mined from a colored example graph, using one or more
//! small template graphs to define "local" — a generalization of
//! WaveFunctionCollapse from regular grids to arbitrary directed or
//! undirected graphs.
//!
//! The programmatic surface is [`solver::SolverState`]: [`solver::SolverState::setup`]
//! builds the read-only Pattern Store and Coverage Index from an example
//! graph, a set of templates, and an output graph; [`solver::SolverState::run`]
//! drives the Observer/Propagator loop to completion; [`solver::SolverState::reset`]
//! rewinds Domain State so a contradiction can be retried.

pub mod cli;
pub mod color;
pub mod coverage;
pub mod domain;
pub mod error;
pub mod graph;
pub mod io;
pub mod iso;
pub mod observer;
pub mod pattern;
pub mod propagator;
pub mod solver;
pub mod template;
