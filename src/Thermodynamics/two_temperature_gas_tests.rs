use crate::Numerics::variables::VariableLayout;
use crate::Thermodynamics::mixture_api::{MixtureCalculator, MixtureError};
use crate::Thermodynamics::species_data::{MixtureData, SpeciesData};
use crate::Thermodynamics::two_temperature_gas::TwoTemperatureGas;
use approx::assert_relative_eq;
use nalgebra::DVector;

fn air() -> TwoTemperatureGas {
    TwoTemperatureGas::bundled("air5").unwrap()
}

fn sample_conserved(gas: &TwoTemperatureGas, layout: &VariableLayout) -> DVector<f64> {
    let rho_s = [7.0e-3, 1.5e-3, 4.0e-4, 8.0e-4, 1.1e-3];
    let vel = [2500.0, -300.0];
    let mut u = DVector::zeros(layout.n_var);
    gas.prim_to_cons(layout, &rho_s, &vel, 7500.0, 5200.0, &mut u);
    u
}

fn primitives(gas: &TwoTemperatureGas, layout: &VariableLayout, u: &DVector<f64>) -> DVector<f64> {
    let mut v = DVector::zeros(layout.n_prim_var);
    gas.cons_to_prim(layout, u, &mut v).unwrap();
    v
}

#[test]
fn cons_to_prim_recovers_temperatures() {
    let gas = air();
    let layout = VariableLayout::new(5, 2).unwrap();
    let u = sample_conserved(&gas, &layout);
    let v = primitives(&gas, &layout, &u);
    assert_relative_eq!(v[layout.t()], 7500.0, max_relative = 1e-10);
    assert_relative_eq!(v[layout.tve()], 5200.0, max_relative = 1e-9);
    assert_relative_eq!(v[layout.vel(0)], 2500.0, max_relative = 1e-12);
    assert_relative_eq!(v[layout.vel(1)], -300.0, max_relative = 1e-12);
    let rho: f64 = (0..5).map(|s| u[s]).sum();
    assert_relative_eq!(v[layout.rho()], rho);
}

#[test]
fn pressure_derivative_is_homogeneous() {
    // dP/dU . U = P makes the projected flux Jacobian reproduce the flux
    let gas = air();
    let layout = VariableLayout::new(5, 2).unwrap();
    let u = sample_conserved(&gas, &layout);
    let v = primitives(&gas, &layout, &u);
    let mut dpdu = DVector::zeros(layout.n_var);
    gas.calc_dpdu(&layout, &v, &mut dpdu);
    assert_relative_eq!(dpdu.dot(&u), v[layout.p()], max_relative = 1e-9);
}

#[test]
fn derivative_vectors_match_finite_differences() {
    let gas = air();
    let layout = VariableLayout::new(5, 2).unwrap();
    let u = sample_conserved(&gas, &layout);
    let v = primitives(&gas, &layout, &u);
    let mut eve = DVector::zeros(5);
    gas.calc_eve(v[layout.tve()], &mut eve);

    let mut dpdu = DVector::zeros(layout.n_var);
    let mut dtdu = DVector::zeros(layout.n_var);
    let mut dtvedu = DVector::zeros(layout.n_var);
    gas.calc_dpdu(&layout, &v, &mut dpdu);
    gas.calc_dtdu(&layout, &v, &mut dtdu);
    gas.calc_dtvedu(&layout, &v, &eve, &mut dtvedu);

    for k in 0..layout.n_var {
        let h = 1e-6 * u[k].abs().max(1e-3);
        let mut up = u.clone();
        let mut um = u.clone();
        up[k] += h;
        um[k] -= h;
        let vp = primitives(&gas, &layout, &up);
        let vm = primitives(&gas, &layout, &um);
        let fd = |idx: usize| (vp[idx] - vm[idx]) / (2.0 * h);
        assert_relative_eq!(fd(layout.p()), dpdu[k], max_relative = 1e-5, epsilon = 1e-6);
        assert_relative_eq!(fd(layout.t()), dtdu[k], max_relative = 1e-5, epsilon = 1e-8);
        assert_relative_eq!(fd(layout.tve()), dtvedu[k], max_relative = 1e-5, epsilon = 1e-8);
    }
}

#[test]
fn vibrational_heat_capacity_is_energy_derivative() {
    let gas = air();
    let (mut ep, mut em) = (DVector::zeros(5), DVector::zeros(5));
    let mut cvve = DVector::zeros(5);
    let (mut cp, mut cm) = (DVector::zeros(5), DVector::zeros(5));
    let mut dcvve = DVector::zeros(5);
    let t = 4000.0;
    let h = 1e-3;
    gas.calc_eve(t + h, &mut ep);
    gas.calc_eve(t - h, &mut em);
    gas.calc_cvve(t, &mut cvve);
    gas.calc_cvve(t + h, &mut cp);
    gas.calc_cvve(t - h, &mut cm);
    gas.calc_dcvve(t, &mut dcvve);
    for s in 0..3 {
        assert_relative_eq!((ep[s] - em[s]) / (2.0 * h), cvve[s], max_relative = 1e-6);
        assert_relative_eq!((cp[s] - cm[s]) / (2.0 * h), dcvve[s], max_relative = 1e-5);
    }
    // atoms carry no vibrational energy
    assert_eq!(cvve[3], 0.0);
    assert_eq!(cvve[4], 0.0);
}

#[test]
fn sound_speed_matches_frozen_relation() {
    let gas = air();
    let layout = VariableLayout::new(5, 2).unwrap();
    let u = sample_conserved(&gas, &layout);
    let v = primitives(&gas, &layout, &u);
    let rho_r: f64 = (0..5).map(|s| u[s] * gas.gas_constant(s)).sum();
    let gamma = 1.0 + rho_r / v[layout.rhocvtr()];
    let expected = (gamma * v[layout.p()] / v[layout.rho()]).sqrt();
    assert_relative_eq!(v[layout.a()], expected, max_relative = 1e-12);
    assert_relative_eq!(v[layout.p()], v[layout.t()] * rho_r, max_relative = 1e-12);
}

#[test]
fn atomic_mixture_has_equal_temperatures() {
    let data = MixtureData {
        name: "atoms".to_string(),
        species: vec![
            SpeciesData::new("N", 14.0067, 0.0, 0.0, 3.3613e7),
            SpeciesData::new("O", 15.9994, 0.0, 0.0, 1.5578e7),
        ],
        reactions: vec![],
    };
    let gas = TwoTemperatureGas::new(data).unwrap();
    let layout = VariableLayout::new(2, 3).unwrap();
    let mut u = DVector::zeros(layout.n_var);
    gas.prim_to_cons(&layout, &[0.01, 0.02], &[100.0, 0.0, 50.0], 3000.0, 9000.0, &mut u);
    assert_eq!(u[layout.eve()], 0.0);
    let v = primitives(&gas, &layout, &u);
    assert_relative_eq!(v[layout.t()], 3000.0, max_relative = 1e-12);
    assert_eq!(v[layout.tve()], v[layout.t()]);
}

#[test]
fn negative_vibrational_energy_is_an_error() {
    let gas = air();
    let layout = VariableLayout::new(5, 2).unwrap();
    let mut u = sample_conserved(&gas, &layout);
    u[layout.eve()] = -1.0;
    let mut v = DVector::zeros(layout.n_prim_var);
    assert!(matches!(
        gas.cons_to_prim(&layout, &u, &mut v),
        Err(MixtureError::NonPositiveVibrationalEnergy(_))
    ));
}

#[test]
fn species_enthalpy_includes_formation_and_vibration() {
    let gas = air();
    let t = 298.15;
    let mut eve = DVector::zeros(5);
    let mut hs = DVector::zeros(5);
    gas.calc_hs(t, &eve, &mut hs);
    // at the reference temperature with frozen vibration hs = hf
    for s in 0..5 {
        assert_relative_eq!(hs[s], gas.species()[s].enthalpy_formation, epsilon = 1e-6);
    }
    eve[0] = 1.0e5;
    gas.calc_hs(t, &eve, &mut hs);
    assert_relative_eq!(hs[0], 1.0e5, epsilon = 1e-6);
}

#[test]
fn invalid_molar_mass_is_rejected() {
    let mut data = MixtureData::bundled("n2").unwrap();
    data.species[0].molar_mass = 0.0;
    assert!(matches!(
        TwoTemperatureGas::new(data),
        Err(MixtureError::InvalidSpecies { .. })
    ));
}
