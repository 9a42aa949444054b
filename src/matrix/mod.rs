//! Matrix module: packed Hermitian and sparse operator types.

pub mod packed;
pub use packed::{HermitianPacked, PackedCholesky};
pub mod sparse;
pub use sparse::CsrMatrix;
