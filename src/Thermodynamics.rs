/// # Gas model of the two-temperature kernels
/// `MixtureCalculator` is everything the numerical schemes ask of the gas:
/// species and reaction data, energies and heat capacities as functions of
/// temperature, conversions between conserved and primitive variables and the
/// derivatives of P, T and Tve with respect to the conserved variables.
pub mod mixture_api;
/// serde data of species and reactions, bundled Park air mixtures
/// # Examples
/// ```
/// use tne2_numerics::Thermodynamics::species_data::MixtureData;
/// let air = MixtureData::bundled("air5").unwrap();
/// assert_eq!(air.species.len(), 5);
/// assert_eq!(air.species[0].name, "N2");
/// ```
pub mod species_data;
/// rigid-rotor/harmonic-oscillator two-temperature gas
/// # Examples
/// ```
/// use tne2_numerics::Numerics::variables::VariableLayout;
/// use tne2_numerics::Thermodynamics::mixture_api::MixtureCalculator;
/// use tne2_numerics::Thermodynamics::two_temperature_gas::TwoTemperatureGas;
/// use nalgebra::DVector;
/// let gas = TwoTemperatureGas::bundled("n2").unwrap();
/// let layout = VariableLayout::new(gas.n_species(), 2).unwrap();
/// let mut u = DVector::zeros(layout.n_var);
/// gas.prim_to_cons(&layout, &[1e-2, 1e-3], &[100.0, 0.0], 5000.0, 4000.0, &mut u);
/// let mut v = DVector::zeros(layout.n_prim_var);
/// gas.cons_to_prim(&layout, &u, &mut v).unwrap();
/// assert!((v[layout.tve()] - 4000.0).abs() < 1e-6);
/// ```
pub mod two_temperature_gas;

#[cfg(test)]
mod two_temperature_gas_tests;
