//! Dependsload core library.
//!
//! This library resolves `DependsLoad` directives declared on behaviour
//! scenarios into a single ordered suite in which every dependency runs
//! before the scenarios that need it, and tracks pass state so dependents of
//! a failed scenario are skipped.

pub mod cli;
pub mod config;
pub mod directive;
pub mod graph;
pub mod loader;
pub mod resolver;
pub mod runner;
pub mod scenario;
pub mod suite;
pub mod tracker;
