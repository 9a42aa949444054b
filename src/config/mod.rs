//! Configuration for the shifted solver.

pub mod options;
pub use options::SolverOptions;
