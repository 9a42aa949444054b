//! Core traits, vector kernels and operator wrappers.

pub mod blas;
pub mod traits;
pub mod wrappers;

pub use traits::{BSolve, IdentityB, Indexing, InnerProduct, MatVec};
