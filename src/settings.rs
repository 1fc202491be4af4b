//! # Settings Module
//!
//! Run-time configuration of the numerical schemes: which convective and
//! viscous fluxes to build, which source terms to switch on, the scheme
//! parameters and the logging setup. Stored as pretty JSON.
//!
//! ```json
//! {
//!   "n_dim": 2,
//!   "mixture": "air5",
//!   "convective": "AusmpwPlus",
//!   "viscous": "AvgGradCorrected",
//!   "chemistry": true,
//!   "vib_relaxation": true
//! }
//! ```
//! Missing keys take their defaults.
use crate::Numerics::errors::NumericsError;
use crate::Numerics::variables::VariableLayout;
use crate::Thermodynamics::mixture_api::{MixtureCalculator, MixtureError};
use crate::Thermodynamics::species_data::MixtureData;
use crate::Thermodynamics::two_temperature_gas::TwoTemperatureGas;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvectiveKind {
    Roe,
    Msw,
    Ausm,
    AusmPlusUp2,
    AusmpwPlus,
    CenteredLax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViscousKind {
    None,
    AvgGrad,
    AvgGradCorrected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericsConfig {
    pub n_dim: usize,
    /// name of a bundled mixture ("air5" or "n2")
    pub mixture: String,
    /// JSON mixture description; takes precedence over `mixture`
    pub mixture_file: Option<String>,
    pub convective: ConvectiveKind,
    pub viscous: ViscousKind,
    /// fill Jacobians
    pub implicit: bool,
    /// first-order dissipation coefficient of the centered scheme
    pub kappa_0: f64,
    /// free-stream Mach number and reference gamma of AUSM+-up2
    pub mach_inf: f64,
    pub gamma: f64,
    pub chemistry: bool,
    pub vib_relaxation: bool,
    pub axisymmetric: bool,
    pub log_level: String,
    pub log_file: Option<String>,
}

impl Default for NumericsConfig {
    fn default() -> Self {
        Self {
            n_dim: 2,
            mixture: "air5".to_string(),
            mixture_file: None,
            convective: ConvectiveKind::Roe,
            viscous: ViscousKind::AvgGrad,
            implicit: true,
            kappa_0: 0.15,
            mach_inf: 0.5,
            gamma: 1.4,
            chemistry: false,
            vib_relaxation: false,
            axisymmetric: false,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl NumericsConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, NumericsError> {
        let content = fs::read_to_string(path.as_ref()).map_err(MixtureError::from)?;
        let config: NumericsConfig =
            serde_json::from_str(&content).map_err(MixtureError::from)?;
        config.validate()?;
        info!("configuration loaded from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), NumericsError> {
        let content = serde_json::to_string_pretty(self).map_err(MixtureError::from)?;
        fs::write(path, content).map_err(MixtureError::from)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), NumericsError> {
        if self.n_dim != 2 && self.n_dim != 3 {
            return Err(NumericsError::UnsupportedDimension(self.n_dim));
        }
        if self.axisymmetric && self.n_dim != 2 {
            return Err(NumericsError::UnsupportedConfiguration(
                "axisymmetric source needs n_dim = 2".to_string(),
            ));
        }
        if self.kappa_0 < 0.0 {
            return Err(NumericsError::UnsupportedConfiguration(format!(
                "kappa_0 must be non-negative, got {}",
                self.kappa_0
            )));
        }
        if !(self.gamma > 1.0) {
            return Err(NumericsError::UnsupportedConfiguration(format!(
                "gamma must exceed 1, got {}",
                self.gamma
            )));
        }
        Ok(())
    }

    /// Gas model named by `mixture_file` or, failing that, `mixture`.
    pub fn build_mixture(&self) -> Result<Arc<dyn MixtureCalculator>, NumericsError> {
        let data = match &self.mixture_file {
            Some(file) => MixtureData::load_from_file(file)?,
            None => MixtureData::bundled(&self.mixture)?,
        };
        Ok(Arc::new(TwoTemperatureGas::new(data)?))
    }

    pub fn layout(&self, mixture: &dyn MixtureCalculator) -> Result<VariableLayout, NumericsError> {
        VariableLayout::new(mixture.n_species(), self.n_dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_fill_missing_keys() {
        let config: NumericsConfig =
            serde_json::from_str(r#"{ "convective": "AusmpwPlus", "chemistry": true }"#).unwrap();
        assert_eq!(config.convective, ConvectiveKind::AusmpwPlus);
        assert!(config.chemistry);
        assert_eq!(config.n_dim, 2);
        assert_eq!(config.viscous, ViscousKind::AvgGrad);
        assert_eq!(config.mixture, "air5");
    }

    #[test]
    fn save_and_load() {
        let mut config = NumericsConfig::default();
        config.n_dim = 3;
        config.viscous = ViscousKind::None;
        config.kappa_0 = 0.25;
        let file = NamedTempFile::new().unwrap();
        config.save_to_file(file.path()).unwrap();
        let loaded = NumericsConfig::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn rejects_axisymmetric_3d() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "n_dim": 3, "axisymmetric": true }}"#).unwrap();
        let err = NumericsConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, NumericsError::UnsupportedConfiguration(_)));
    }

    #[test]
    fn rejects_bad_dimension() {
        let config = NumericsConfig {
            n_dim: 1,
            ..NumericsConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(NumericsError::UnsupportedDimension(1))
        ));
    }

    #[test]
    fn builds_bundled_mixture() {
        let config = NumericsConfig {
            mixture: "n2".to_string(),
            ..NumericsConfig::default()
        };
        let gas = config.build_mixture().unwrap();
        assert_eq!(gas.n_species(), 2);
        let layout = config.layout(gas.as_ref()).unwrap();
        assert_eq!(layout.n_var, 2 + 2 + 2);
    }
}
