//! Convective (inviscid) flux schemes behind one capability trait.
use crate::Numerics::ausm::Ausm;
use crate::Numerics::ausm_plus_up2::AusmPlusUp2;
use crate::Numerics::ausmpw_plus::AusmpwPlus;
use crate::Numerics::centered_lax::CenteredLax;
use crate::Numerics::errors::NumericsError;
use crate::Numerics::msw::Msw;
use crate::Numerics::roe::Roe;
use crate::Numerics::variables::{FlowState, VariableLayout};
use crate::Thermodynamics::mixture_api::MixtureCalculator;
use crate::settings::{ConvectiveKind, NumericsConfig};
use enum_dispatch::enum_dispatch;
use log::info;
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

/// Inputs of one face evaluation.
///
/// `normal` is area-weighted. The neighbour counts and cell spectral radii are
/// read by the centered scheme only; zero radii switch its dissipation off.
#[derive(Debug, Clone, Copy)]
pub struct ConvectiveEdge<'a> {
    pub state_i: &'a FlowState,
    pub state_j: &'a FlowState,
    pub normal: &'a [f64],
    pub neighbors_i: usize,
    pub neighbors_j: usize,
    pub lambda_i: f64,
    pub lambda_j: f64,
}

impl<'a> ConvectiveEdge<'a> {
    pub fn new(state_i: &'a FlowState, state_j: &'a FlowState, normal: &'a [f64]) -> Self {
        Self {
            state_i,
            state_j,
            normal,
            neighbors_i: 1,
            neighbors_j: 1,
            lambda_i: 0.0,
            lambda_j: 0.0,
        }
    }

    pub fn with_neighbors(mut self, neighbors_i: usize, neighbors_j: usize) -> Self {
        self.neighbors_i = neighbors_i;
        self.neighbors_j = neighbors_j;
        self
    }

    pub fn with_spectral_radii(mut self, lambda_i: f64, lambda_j: f64) -> Self {
        self.lambda_i = lambda_i;
        self.lambda_j = lambda_j;
        self
    }
}

/// Caller-owned output of a face evaluation. The residual is always
/// overwritten; the Jacobians only when the scheme is implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxResult {
    pub residual: DVector<f64>,
    pub jacobian_i: DMatrix<f64>,
    pub jacobian_j: DMatrix<f64>,
}

impl FluxResult {
    pub fn new(layout: &VariableLayout) -> Self {
        let n = layout.n_var;
        Self {
            residual: DVector::zeros(n),
            jacobian_i: DMatrix::zeros(n, n),
            jacobian_j: DMatrix::zeros(n, n),
        }
    }
}

#[enum_dispatch]
pub trait ConvectiveFlux {
    fn compute_residual(&mut self, edge: &ConvectiveEdge, out: &mut FluxResult);
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
#[enum_dispatch(ConvectiveFlux)]
pub enum ConvectiveEnum {
    Roe(Roe),
    Msw(Msw),
    Ausm(Ausm),
    AusmPlusUp2(AusmPlusUp2),
    AusmpwPlus(AusmpwPlus),
    CenteredLax(CenteredLax),
}

pub fn create_convective(
    kind: ConvectiveKind,
    layout: VariableLayout,
    mixture: Arc<dyn MixtureCalculator>,
    config: &NumericsConfig,
) -> Result<ConvectiveEnum, NumericsError> {
    if mixture.n_species() != layout.n_species {
        return Err(NumericsError::LayoutMismatch {
            expected: layout.n_species,
            found: mixture.n_species(),
        });
    }
    let scheme = match kind {
        ConvectiveKind::Roe => ConvectiveEnum::Roe(Roe::new(layout, mixture, config.implicit)),
        ConvectiveKind::Msw => ConvectiveEnum::Msw(Msw::new(layout, config.implicit)),
        ConvectiveKind::Ausm => ConvectiveEnum::Ausm(Ausm::new(layout, mixture, config.implicit)),
        ConvectiveKind::AusmPlusUp2 => ConvectiveEnum::AusmPlusUp2(AusmPlusUp2::new(
            layout,
            mixture,
            config.implicit,
            config.mach_inf,
            config.gamma,
        )),
        ConvectiveKind::AusmpwPlus => {
            ConvectiveEnum::AusmpwPlus(AusmpwPlus::new(layout, mixture, config.implicit))
        }
        ConvectiveKind::CenteredLax => ConvectiveEnum::CenteredLax(CenteredLax::new(
            layout,
            mixture,
            config.implicit,
            config.kappa_0,
        )),
    };
    info!(
        "convective scheme {} for {} species in {}D (implicit: {})",
        scheme.name(),
        layout.n_species,
        layout.n_dim,
        config.implicit
    );
    Ok(scheme)
}
