use crate::Thermodynamics::mixture_api::MixtureError;
use thiserror::Error;

/// Setup-time failures of the flux and source schemes.
///
/// Per-edge and per-cell evaluation never fails: invalid states (zero density,
/// zero sound speed) propagate as NaN into the caller's residual.
#[derive(Debug, Error)]
pub enum NumericsError {
    #[error("unsupported number of spatial dimensions: {0} (expected 2 or 3)")]
    UnsupportedDimension(usize),
    #[error("mixture must contain at least one species")]
    EmptyMixture,
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
    #[error("state vector has length {found}, layout expects {expected}")]
    LayoutMismatch { expected: usize, found: usize },
    #[error(transparent)]
    Mixture(#[from] MixtureError),
}
