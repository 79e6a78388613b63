//! Error types for operator construction, evaluation and orchestration.

use num_complex::Complex64;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VmcError {
    #[error("invalid boundary conditions {found:?} for a {expected}-dimensional lattice")]
    InvalidBoundaryConditions { found: String, expected: usize },

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("invalid lattice: {0}")]
    InvalidLattice(String),

    #[error("site {0} is not a member of the lattice")]
    SiteOutsideLattice(String),

    #[error("no measurement for basic operator {0}")]
    MissingMeasurement(String),

    #[error("invalid operator: {0}")]
    InvalidOperator(String),

    #[error("missing coupling parameter '{0}'")]
    MissingCoupling(&'static str),

    #[error("expected a real value, found {0}")]
    NotReal(Complex64),

    #[error("simulation failed: {0}")]
    SimulationFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VmcError>;
