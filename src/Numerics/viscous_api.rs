//! Viscous (diffusive) flux schemes.
use crate::Numerics::avg_grad::{AvgGrad, AvgGradCorrected};
use crate::Numerics::convective_api::FluxResult;
use crate::Numerics::errors::NumericsError;
use crate::Numerics::variables::{FlowState, VariableLayout};
use crate::Thermodynamics::mixture_api::MixtureCalculator;
use crate::settings::{NumericsConfig, ViscousKind};
use enum_dispatch::enum_dispatch;
use log::info;
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

/// Transport coefficients of one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellTransport {
    /// Per-species diffusion coefficients, m²/s.
    pub diffusion: DVector<f64>,
    pub viscosity: f64,
    pub conductivity_tr: f64,
    pub conductivity_ve: f64,
}

impl CellTransport {
    pub fn new(diffusion: DVector<f64>, viscosity: f64, conductivity_tr: f64, conductivity_ve: f64) -> Self {
        Self {
            diffusion,
            viscosity,
            conductivity_tr,
            conductivity_ve,
        }
    }
}

/// Inputs of one viscous face evaluation.
///
/// Gradients are nPrimVar × nDim in the primitive layout, so the species rows
/// hold density gradients.
#[derive(Debug, Clone, Copy)]
pub struct ViscousEdge<'a> {
    pub state_i: &'a FlowState,
    pub state_j: &'a FlowState,
    pub grad_i: &'a DMatrix<f64>,
    pub grad_j: &'a DMatrix<f64>,
    pub transport_i: &'a CellTransport,
    pub transport_j: &'a CellTransport,
    pub coord_i: &'a [f64],
    pub coord_j: &'a [f64],
    pub normal: &'a [f64],
}

#[enum_dispatch]
pub trait ViscousFlux {
    fn compute_residual(&mut self, edge: &ViscousEdge, out: &mut FluxResult);
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
#[enum_dispatch(ViscousFlux)]
pub enum ViscousEnum {
    AvgGrad(AvgGrad),
    AvgGradCorrected(AvgGradCorrected),
}

/// Builds the configured viscous scheme, `None` for inviscid runs.
pub fn create_viscous(
    kind: ViscousKind,
    layout: VariableLayout,
    mixture: Arc<dyn MixtureCalculator>,
    config: &NumericsConfig,
) -> Result<Option<ViscousEnum>, NumericsError> {
    if mixture.n_species() != layout.n_species {
        return Err(NumericsError::LayoutMismatch {
            expected: layout.n_species,
            found: mixture.n_species(),
        });
    }
    if kind != ViscousKind::None && mixture.is_ionized() {
        return Err(NumericsError::UnsupportedConfiguration(
            "viscous fluxes of ionized mixtures are not implemented".to_string(),
        ));
    }
    let scheme = match kind {
        ViscousKind::None => return Ok(None),
        ViscousKind::AvgGrad => ViscousEnum::AvgGrad(AvgGrad::new(layout, mixture, config.implicit)),
        ViscousKind::AvgGradCorrected => {
            ViscousEnum::AvgGradCorrected(AvgGradCorrected::new(layout, mixture, config.implicit))
        }
    };
    info!(
        "viscous scheme {} for {} species in {}D",
        scheme.name(),
        layout.n_species,
        layout.n_dim
    );
    Ok(Some(scheme))
}
