//! Interface between the numerical kernels and the gas model.
//!
//! The kernels never evaluate thermodynamic relations themselves; everything
//! temperature-dependent goes through a `MixtureCalculator`. The provider is
//! shared read-only between scheme instances, so implementations must be free
//! of interior mutation.
use crate::Numerics::variables::VariableLayout;
use crate::Thermodynamics::species_data::{Reaction, SpeciesData};
use nalgebra::DVector;
use thiserror::Error;

/// Universal gas constant, J/(kmol K).
pub const RU: f64 = 1000.0 * 8.3144598;
/// Avogadro's number, 1/kmol.
pub const AVOGADRO: f64 = 6.0221415e26;

#[derive(Debug, Error)]
pub enum MixtureError {
    #[error("unknown species '{species}' in reaction '{equation}'")]
    UnknownSpecies { species: String, equation: String },
    #[error("malformed reaction equation '{0}'")]
    MalformedEquation(String),
    #[error("invalid species data for '{name}': {reason}")]
    InvalidSpecies { name: String, reason: String },
    #[error("invalid reaction data for '{equation}': {reason}")]
    InvalidReaction { equation: String, reason: String },
    #[error("unknown bundled mixture '{0}'")]
    UnknownMixture(String),
    #[error("vibrational temperature did not converge after {iterations} iterations (rhoEve = {rho_eve})")]
    TveNotConverged { iterations: usize, rho_eve: f64 },
    #[error("non-positive vibrational energy density {0}")]
    NonPositiveVibrationalEnergy(f64),
    #[error("non-positive translational temperature {0}")]
    NonPositiveTemperature(f64),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait MixtureCalculator: Send + Sync + std::fmt::Debug {
    fn species(&self) -> &[SpeciesData];
    fn reactions(&self) -> &[Reaction];
    fn n_species(&self) -> usize {
        self.species().len()
    }
    /// True when the mixture carries free electrons or charged species.
    fn is_ionized(&self) -> bool;

    /// Specific gas constant R_s, J/(kg K).
    fn gas_constant(&self, species: usize) -> f64;
    /// Translational-rotational specific heat at constant volume, J/(kg K).
    fn cvtr(&self, species: usize) -> f64;
    /// Formation energy at the reference temperature, J/kg.
    fn formation_energy(&self, species: usize) -> f64;

    /// Vibrational-electronic energy of every species at `temperature`.
    fn calc_eve(&self, temperature: f64, eve: &mut DVector<f64>);
    /// d(eve_s)/dT for every species.
    fn calc_cvve(&self, temperature: f64, cvve: &mut DVector<f64>);
    /// d(Cvve_s)/dT for every species.
    fn calc_dcvve(&self, temperature: f64, dcvve: &mut DVector<f64>);
    /// Species enthalpy at translational temperature `t` with the given
    /// vibrational energies.
    fn calc_hs(&self, t: f64, eve: &DVector<f64>, hs: &mut DVector<f64>);

    /// dP/dU. Reads the primitive vector only, so it is valid at averaged states.
    fn calc_dpdu(&self, layout: &VariableLayout, v: &DVector<f64>, dpdu: &mut DVector<f64>);
    /// dT/dU.
    fn calc_dtdu(&self, layout: &VariableLayout, v: &DVector<f64>, dtdu: &mut DVector<f64>);
    /// dTve/dU, `eve` evaluated at Tve.
    fn calc_dtvedu(
        &self,
        layout: &VariableLayout,
        v: &DVector<f64>,
        eve: &DVector<f64>,
        dtvedu: &mut DVector<f64>,
    );

    fn cons_to_prim(
        &self,
        layout: &VariableLayout,
        u: &DVector<f64>,
        v: &mut DVector<f64>,
    ) -> Result<(), MixtureError>;
    fn prim_to_cons(
        &self,
        layout: &VariableLayout,
        rho_s: &[f64],
        velocity: &[f64],
        t: f64,
        tve: f64,
        u: &mut DVector<f64>,
    );
}
