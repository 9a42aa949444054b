//! Shifted Krylov solver and the inner CG used for B-solves.

pub mod gsminres;
pub use gsminres::{GsMinresSolver, LanczosStatus};

pub mod cg;
pub use cg::{CgBSolve, CgSolver, CgStats};
