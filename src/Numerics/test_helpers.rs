//! Shared fixtures for the scheme test suites.
use crate::Numerics::variables::{FlowState, VariableLayout};
use crate::Thermodynamics::mixture_api::MixtureCalculator;
use crate::Thermodynamics::two_temperature_gas::TwoTemperatureGas;
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

pub const AIR_DENSITIES: [f64; 5] = [6.5e-3, 1.4e-3, 3.0e-4, 9.0e-4, 1.2e-3];

pub fn air_gas() -> Arc<TwoTemperatureGas> {
    Arc::new(TwoTemperatureGas::bundled("air5").unwrap())
}

pub fn n2_gas() -> Arc<TwoTemperatureGas> {
    Arc::new(TwoTemperatureGas::bundled("n2").unwrap())
}

/// Direction used for the velocity of the generic fixtures.
pub fn flow_direction(n_dim: usize) -> Vec<f64> {
    if n_dim == 2 {
        vec![0.8, 0.6]
    } else {
        vec![0.64, 0.48, 0.6]
    }
}

pub fn state(
    gas: &dyn MixtureCalculator,
    layout: &VariableLayout,
    rho_s: &[f64],
    velocity: &[f64],
    t: f64,
    tve: f64,
) -> FlowState {
    FlowState::from_primitives(layout, gas, rho_s, velocity, t, tve).unwrap()
}

/// Five-species air at the given temperatures moving with `speed`.
pub fn air_state(
    gas: &Arc<TwoTemperatureGas>,
    n_dim: usize,
    t: f64,
    tve: f64,
    speed: f64,
) -> (VariableLayout, FlowState) {
    let layout = VariableLayout::new(5, n_dim).unwrap();
    let velocity: Vec<f64> = flow_direction(n_dim).iter().map(|c| c * speed).collect();
    let s = state(gas.as_ref(), &layout, &AIR_DENSITIES, &velocity, t, tve);
    (layout, s)
}

/// Same composition scaled by `factor` in density.
pub fn scaled_air_state(
    gas: &Arc<TwoTemperatureGas>,
    layout: &VariableLayout,
    factor: f64,
    velocity: &[f64],
    t: f64,
    tve: f64,
) -> FlowState {
    let rho_s: Vec<f64> = AIR_DENSITIES.iter().map(|r| r * factor).collect();
    state(gas.as_ref(), layout, &rho_s, velocity, t, tve)
}

/// Central finite-difference Jacobian of `f` at `u`.
pub fn fd_jacobian<F>(u: &DVector<f64>, mut f: F) -> DMatrix<f64>
where
    F: FnMut(&DVector<f64>) -> DVector<f64>,
{
    let n = u.len();
    let mut jac: Option<DMatrix<f64>> = None;
    for k in 0..n {
        let h = if u[k] != 0.0 { 1e-6 * u[k].abs() } else { 1e-8 };
        let mut up = u.clone();
        let mut um = u.clone();
        up[k] += h;
        um[k] -= h;
        let column = (f(&up) - f(&um)) / (2.0 * h);
        let j = jac.get_or_insert_with(|| DMatrix::zeros(column.len(), n));
        j.set_column(k, &column);
    }
    jac.unwrap_or_else(|| DMatrix::zeros(0, 0))
}

pub fn assert_matrix_close(a: &DMatrix<f64>, b: &DMatrix<f64>, rel: f64, abs: f64) {
    assert_eq!(a.shape(), b.shape());
    for i in 0..a.nrows() {
        for j in 0..a.ncols() {
            let (x, y) = (a[(i, j)], b[(i, j)]);
            let tol = abs + rel * x.abs().max(y.abs());
            assert!(
                (x - y).abs() <= tol,
                "entry ({}, {}) differs: {} vs {} (tol {})",
                i,
                j,
                x,
                y,
                tol
            );
        }
    }
}

pub fn assert_vector_close(a: &DVector<f64>, b: &DVector<f64>, rel: f64, abs: f64) {
    assert_eq!(a.len(), b.len());
    for i in 0..a.len() {
        let tol = abs + rel * a[i].abs().max(b[i].abs());
        assert!(
            (a[i] - b[i]).abs() <= tol,
            "entry {} differs: {} vs {} (tol {})",
            i,
            a[i],
            b[i],
            tol
        );
    }
}
