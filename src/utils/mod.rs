//! Convergence bookkeeping and problem loaders.

pub mod convergence;
pub mod io;
