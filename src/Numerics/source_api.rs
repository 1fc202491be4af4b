//! Volumetric source terms of one control volume.
use crate::Numerics::axisymmetric::Axisymmetric;
use crate::Numerics::chemistry::Chemistry;
use crate::Numerics::errors::NumericsError;
use crate::Numerics::variables::{FlowState, VariableLayout};
use crate::Numerics::vib_relaxation::VibRelaxation;
use crate::Thermodynamics::mixture_api::MixtureCalculator;
use crate::settings::NumericsConfig;
use enum_dispatch::enum_dispatch;
use log::info;
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct SourceCell<'a> {
    pub state: &'a FlowState,
    pub volume: f64,
    /// Cell-centre coordinates; the axisymmetric term reads the radius y.
    pub coord: &'a [f64],
}

impl<'a> SourceCell<'a> {
    pub fn new(state: &'a FlowState, volume: f64, coord: &'a [f64]) -> Self {
        Self { state, volume, coord }
    }
}

/// Output of one source evaluation: `residual` is volume-integrated and
/// `source` is residual / volume.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceResult {
    pub residual: DVector<f64>,
    pub source: DVector<f64>,
    pub jacobian: DMatrix<f64>,
}

impl SourceResult {
    pub fn new(layout: &VariableLayout) -> Self {
        let n = layout.n_var;
        Self {
            residual: DVector::zeros(n),
            source: DVector::zeros(n),
            jacobian: DMatrix::zeros(n, n),
        }
    }

    pub(crate) fn finish(&mut self, volume: f64) {
        self.source.copy_from(&self.residual);
        self.source /= volume;
    }
}

#[enum_dispatch]
pub trait SourceTerm {
    fn compute_source(&mut self, cell: &SourceCell, out: &mut SourceResult);
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
#[enum_dispatch(SourceTerm)]
pub enum SourceEnum {
    Chemistry(Chemistry),
    VibRelaxation(VibRelaxation),
    Axisymmetric(Axisymmetric),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Chemistry,
    VibRelaxation,
    Axisymmetric,
}

pub fn create_source(
    kind: SourceKind,
    layout: VariableLayout,
    mixture: Arc<dyn MixtureCalculator>,
    implicit: bool,
) -> Result<SourceEnum, NumericsError> {
    if mixture.n_species() != layout.n_species {
        return Err(NumericsError::LayoutMismatch {
            expected: layout.n_species,
            found: mixture.n_species(),
        });
    }
    let source = match kind {
        SourceKind::Chemistry => SourceEnum::Chemistry(Chemistry::new(layout, mixture, implicit)),
        SourceKind::VibRelaxation => {
            SourceEnum::VibRelaxation(VibRelaxation::new(layout, mixture, implicit))
        }
        SourceKind::Axisymmetric => {
            if layout.n_dim != 2 {
                return Err(NumericsError::UnsupportedConfiguration(format!(
                    "axisymmetric source needs a 2D layout, got {}D",
                    layout.n_dim
                )));
            }
            SourceEnum::Axisymmetric(Axisymmetric::new(layout, implicit))
        }
    };
    info!("source term {} enabled", source.name());
    Ok(source)
}

/// Every source switched on in `config`, in evaluation order.
pub fn create_sources(
    layout: VariableLayout,
    mixture: Arc<dyn MixtureCalculator>,
    config: &NumericsConfig,
) -> Result<Vec<SourceEnum>, NumericsError> {
    let switches = [
        (config.chemistry, SourceKind::Chemistry),
        (config.vib_relaxation, SourceKind::VibRelaxation),
        (config.axisymmetric, SourceKind::Axisymmetric),
    ];
    switches
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, kind)| create_source(kind, layout, mixture.clone(), config.implicit))
        .collect()
}
