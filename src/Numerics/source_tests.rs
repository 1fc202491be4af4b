use crate::Numerics::axisymmetric::Axisymmetric;
use crate::Numerics::chemistry::{
    Chemistry, T_EPSILON, T_MIN, equilibrium_constant, keq_constants, modified_temperature,
};
use crate::Numerics::errors::NumericsError;
use crate::Numerics::source_api::{
    SourceCell, SourceKind, SourceResult, SourceTerm, create_source, create_sources,
};
use crate::Numerics::test_helpers::*;
use crate::Numerics::variables::{FlowState, VariableLayout};
use crate::Numerics::vib_relaxation::{
    VibRelaxation, millikan_white_constants, pair_relaxation_time, park_relaxation_time,
};
use crate::Thermodynamics::mixture_api::MixtureCalculator;
use crate::Thermodynamics::two_temperature_gas::TwoTemperatureGas;
use crate::settings::NumericsConfig;
use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

const VOLUME: f64 = 2e-6;

fn evaluate<S: SourceTerm>(
    source: &mut S,
    layout: &VariableLayout,
    s: &FlowState,
    coord: &[f64],
) -> SourceResult {
    let mut out = SourceResult::new(layout);
    source.compute_source(&SourceCell::new(s, VOLUME, coord), &mut out);
    out
}

fn fd_source_jacobian<S: SourceTerm>(
    source: &mut S,
    gas: &Arc<TwoTemperatureGas>,
    layout: &VariableLayout,
    s: &FlowState,
    coord: &[f64],
) -> DMatrix<f64> {
    fd_jacobian(&s.u, |u| {
        let perturbed = FlowState::from_conserved(layout, gas.as_ref(), u.clone()).unwrap();
        evaluate(&mut *source, layout, &perturbed, coord).residual
    })
}

fn assert_jacobian_close(analytic: &DMatrix<f64>, fd: &DMatrix<f64>) {
    let scale = fd.amax();
    assert!(scale > 0.0);
    assert_matrix_close(analytic, fd, 1e-4, 1e-6 * scale);
}

#[test]
fn keq_table_is_clamped_and_interpolated() {
    let table: Vec<[f64; 5]> = (0..6).map(|i| [i as f64, 10.0 * i as f64, 0.0, 0.0, 1.0]).collect();
    assert_eq!(keq_constants(&table, 1e10), table[0]);
    // the first decade uses the first row as well
    assert_eq!(keq_constants(&table, 5e14), table[0]);
    assert_eq!(keq_constants(&table, 5e19), table[5]);
    assert_eq!(keq_constants(&table, 1e24), table[5]);
    let a = keq_constants(&table, 3e16);
    assert_relative_eq!(a[0], 2.0 + 2.0 / 9.0, max_relative = 1e-12);
    assert_relative_eq!(a[1], 20.0 + 20.0 / 9.0, max_relative = 1e-12);
    assert_relative_eq!(a[4], 1.0);
}

#[test]
fn keq_table_lookup_survives_degenerate_densities() {
    let table: Vec<[f64; 5]> = (0..6).map(|i| [i as f64, 0.0, 0.0, 0.0, 0.0]).collect();
    assert_eq!(keq_constants(&table, 0.0), table[0]);
    assert_eq!(keq_constants(&table, 1e-300), table[0]);
    assert_eq!(keq_constants(&table, f64::INFINITY), table[5]);
    assert_eq!(keq_constants(&table, f64::MAX), table[5]);
}

#[test]
fn equilibrium_constant_fit() {
    let a = [0.5, -1.0, 2.0, 0.25, 0.1];
    // z = 1 removes the logarithm
    assert_relative_eq!(equilibrium_constant(&a, 1e4), (0.5 - 1.0 + 0.25 + 0.1_f64).exp(), max_relative = 1e-14);
    let expected = (0.5 * 0.5 - 1.0 + 2.0 * 2.0_f64.ln() + 0.25 * 2.0 + 0.1 * 4.0).exp();
    assert_relative_eq!(equilibrium_constant(&a, 5e3), expected, max_relative = 1e-14);
}

#[test]
fn modified_temperature_is_smooth_and_bounded() {
    let (t_hot, d_hot) = modified_temperature(1e4);
    assert_relative_eq!(t_hot, 1e4, max_relative = 1e-3);
    assert_relative_eq!(d_hot, 1.0, max_relative = 1e-4);
    let (t_cold, d_cold) = modified_temperature(300.0);
    assert!(t_cold > T_MIN && t_cold < T_MIN + T_EPSILON);
    assert!(d_cold < 0.01);
    let (t_mid, _) = modified_temperature(T_MIN);
    assert_relative_eq!(t_mid, T_MIN + 0.5 * T_EPSILON);

    let h = 1e-3;
    for t in [500.0, 800.0, 1200.0] {
        let fd = (modified_temperature(t + h).0 - modified_temperature(t - h).0) / (2.0 * h);
        assert_relative_eq!(modified_temperature(t).1, fd, max_relative = 1e-7);
    }
}

#[test]
fn chemistry_conserves_mass() {
    let gas = air_gas();
    let layout = VariableLayout::new(5, 2).unwrap();
    let s = scaled_air_state(&gas, &layout, 1.0, &[300.0, 0.0], 9000.0, 7000.0);
    let mut chemistry = Chemistry::new(layout, gas.clone(), false);
    let out = evaluate(&mut chemistry, &layout, &s, &[0.0, 0.1]);
    let species = out.residual.rows(0, 5);
    assert!(species.amax() > 0.0);
    assert!(species.sum().abs() <= 1e-12 * species.amax());
    for k in 5..layout.eve() {
        assert_eq!(out.residual[k], 0.0);
    }
    assert_vector_close(&out.source, &(&out.residual / VOLUME), 1e-14, 0.0);
}

/// Keq from the mixture table fixes the nitrogen dissociation balance.
#[test]
fn chemistry_vanishes_at_dissociation_equilibrium() {
    let gas = n2_gas();
    let layout = VariableLayout::new(2, 2).unwrap();
    let mut chemistry = Chemistry::new(layout, gas.clone(), false);
    let t = 7000.0;
    let (m_n2, m_n) = (28.0134, 14.0067);
    let rho_n2 = 1.0;
    // dense enough for the last, density-independent Keq row
    let guess = [rho_n2, 0.1];
    let number_density = chemistry.number_density(guess.iter().copied());
    assert!(number_density > 1e19);

    let reaction = &gas.reactions()[0];
    let (th, _) = modified_temperature(t);
    let keq = equilibrium_constant(&keq_constants(&reaction.keq, number_density), th);
    // kmol/m³ -> mol/cm³ is a factor 1e-3
    let c_n2 = 1e-3 * rho_n2 / m_n2;
    let c_n = (keq * c_n2).sqrt();
    let rho_n = c_n * m_n / 1e-3;

    let equilibrium = state(gas.as_ref(), &layout, &[rho_n2, rho_n], &[0.0, 0.0], t, t);
    let at_equilibrium = evaluate(&mut chemistry, &layout, &equilibrium, &[0.0, 1.0]).residual;
    let depleted = state(gas.as_ref(), &layout, &[rho_n2, 0.5 * rho_n], &[0.0, 0.0], t, t);
    let away = evaluate(&mut chemistry, &layout, &depleted, &[0.0, 1.0]).residual;

    assert!(away[0] < 0.0 && away[1] > 0.0, "dissociation expected: {}", away);
    assert!(at_equilibrium[0].abs() < 1e-8 * away[0].abs());
    assert!(at_equilibrium[1].abs() < 1e-8 * away[1].abs());
}

#[test]
fn chemistry_jacobian_matches_finite_differences() {
    let gas = air_gas();
    for n_dim in [2, 3] {
        let layout = VariableLayout::new(5, n_dim).unwrap();
        let velocity: Vec<f64> = flow_direction(n_dim).iter().map(|c| c * 500.0).collect();
        // dense: the Keq row does not change under perturbation
        let s = scaled_air_state(&gas, &layout, 100.0, &velocity, 8000.0, 6000.0);
        let coord = vec![0.0; n_dim];
        let mut chemistry = Chemistry::new(layout, gas.clone(), true);
        let out = evaluate(&mut chemistry, &layout, &s, &coord);
        let mut explicit = Chemistry::new(layout, gas.clone(), false);
        let fd = fd_source_jacobian(&mut explicit, &gas, &layout, &s, &coord);
        assert_jacobian_close(&out.jacobian, &fd);
    }
}

#[test]
fn relaxation_times() {
    let (a, b) = millikan_white_constants(28.0134, 28.0134, 3395.0);
    let mu: f64 = 14.0067;
    assert_relative_eq!(a, 1.16e-3 * mu.sqrt() * 3395.0_f64.powf(4.0 / 3.0), max_relative = 1e-14);
    assert_relative_eq!(b, 0.015 * mu.powf(0.25), max_relative = 1e-14);

    // faster at high temperature and high pressure
    let tau_cold = pair_relaxation_time(a, b, 101325.0, 3000.0);
    let tau_hot = pair_relaxation_time(a, b, 101325.0, 8000.0);
    assert!(tau_hot < tau_cold);
    assert_relative_eq!(
        pair_relaxation_time(a, b, 2.0 * 101325.0, 3000.0),
        0.5 * tau_cold,
        max_relative = 1e-14
    );
    // Park's correction grows with temperature
    let n = 1e23;
    assert!(park_relaxation_time(28.0134, 20000.0, n) > park_relaxation_time(28.0134, 5000.0, n));
}

#[test]
fn vibrational_relaxation_drives_tve_towards_t() {
    let gas = air_gas();
    let layout = VariableLayout::new(5, 2).unwrap();
    let mut relaxation = VibRelaxation::new(layout, gas.clone(), false);
    let coord = [0.0, 0.1];

    let hot = scaled_air_state(&gas, &layout, 1.0, &[100.0, 0.0], 8000.0, 5000.0);
    let heating = evaluate(&mut relaxation, &layout, &hot, &coord);
    assert!(heating.residual[layout.eve()] > 0.0);
    for k in 0..layout.energy() + 1 {
        assert_eq!(heating.residual[k], 0.0);
    }
    assert!(relaxation.relaxation_times().iter().all(|t| *t > 0.0));

    let cold = scaled_air_state(&gas, &layout, 1.0, &[100.0, 0.0], 5000.0, 8000.0);
    assert!(evaluate(&mut relaxation, &layout, &cold, &coord).residual[layout.eve()] < 0.0);

    let equal = scaled_air_state(&gas, &layout, 1.0, &[100.0, 0.0], 6000.0, 6000.0);
    let balanced = evaluate(&mut relaxation, &layout, &equal, &coord).residual[layout.eve()];
    assert!(balanced.abs() < 1e-10 * heating.residual[layout.eve()]);
}

#[test]
fn vibrational_relaxation_jacobian_matches_finite_differences() {
    let gas = air_gas();
    for n_dim in [2, 3] {
        let layout = VariableLayout::new(5, n_dim).unwrap();
        let velocity: Vec<f64> = flow_direction(n_dim).iter().map(|c| c * 800.0).collect();
        let s = scaled_air_state(&gas, &layout, 2.0, &velocity, 9000.0, 4000.0);
        let coord = vec![0.0; n_dim];
        let mut relaxation = VibRelaxation::new(layout, gas.clone(), true);
        let out = evaluate(&mut relaxation, &layout, &s, &coord);
        let mut explicit = VibRelaxation::new(layout, gas.clone(), false);
        let fd = fd_source_jacobian(&mut explicit, &gas, &layout, &s, &coord);
        assert_jacobian_close(&out.jacobian, &fd);
    }
}

#[test]
fn axisymmetric_jacobian_matches_finite_differences() {
    let gas = air_gas();
    let (layout, s) = air_state(&gas, 2, 4000.0, 3000.0, 900.0);
    let coord = [0.3, 0.05];
    let mut axi = Axisymmetric::new(layout, true);
    let out = evaluate(&mut axi, &layout, &s, &coord);

    let v = s.u[layout.mom(1)] / s.v[layout.rho()];
    let scale = VOLUME / coord[1];
    assert_relative_eq!(out.residual[0], s.u[0] * v * scale, max_relative = 1e-14);
    assert_relative_eq!(
        out.residual[layout.energy()],
        s.v[layout.rho()] * s.v[layout.h()] * v * scale,
        max_relative = 1e-14
    );

    let mut explicit = Axisymmetric::new(layout, false);
    let fd = fd_source_jacobian(&mut explicit, &gas, &layout, &s, &coord);
    assert_jacobian_close(&out.jacobian, &fd);
}

#[test]
fn axisymmetric_source_vanishes_on_the_axis() {
    let gas = air_gas();
    let (layout, s) = air_state(&gas, 2, 4000.0, 3000.0, 900.0);
    let mut axi = Axisymmetric::new(layout, true);
    let out = evaluate(&mut axi, &layout, &s, &[0.3, 0.0]);
    assert!(out.residual.iter().all(|r| *r == 0.0));
    assert!(out.jacobian.iter().all(|j| *j == 0.0));
    assert_eq!(out.source, DVector::zeros(layout.n_var));
}

#[test]
fn sources_are_built_in_order() {
    let gas: Arc<dyn MixtureCalculator> = air_gas();
    let layout = VariableLayout::new(5, 2).unwrap();
    let config = NumericsConfig {
        chemistry: true,
        vib_relaxation: true,
        axisymmetric: true,
        ..NumericsConfig::default()
    };
    let sources = create_sources(layout, gas.clone(), &config).unwrap();
    let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["chemistry", "vibrational relaxation", "axisymmetric"]);

    let none = create_sources(layout, gas, &NumericsConfig::default()).unwrap();
    assert!(none.is_empty());
}

#[test]
fn axisymmetric_source_needs_two_dimensions() {
    let gas: Arc<dyn MixtureCalculator> = air_gas();
    let layout = VariableLayout::new(5, 3).unwrap();
    let err = create_source(SourceKind::Axisymmetric, layout, gas.clone(), true).unwrap_err();
    assert!(matches!(err, NumericsError::UnsupportedConfiguration(_)));
    assert!(create_source(SourceKind::Chemistry, layout, gas, true).is_ok());
}
