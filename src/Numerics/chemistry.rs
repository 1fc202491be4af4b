//! Finite-rate chemistry with modified-Arrhenius rates, a smoothed
//! rate-controlling temperature and tabulated equilibrium constants.
use crate::Numerics::source_api::{SourceCell, SourceResult, SourceTerm};
use crate::Numerics::variables::VariableLayout;
use crate::Thermodynamics::mixture_api::{AVOGADRO, MixtureCalculator};
use crate::Thermodynamics::species_data::{KEQ_TABLE_ROWS, Reaction};
use nalgebra::DVector;
use std::sync::Arc;

/// Floor of the rate-controlling temperature.
pub const T_MIN: f64 = 800.0;
/// Width of the smooth transition onto `T_MIN`.
pub const T_EPSILON: f64 = 80.0;
/// log10 of the number density (cm⁻³) of the first Keq table row.
const KEQ_TABLE_OFFSET: i32 = 14;

/// 0.5·(T + Tmin + sqrt((T - Tmin)² + ε²)) and its derivative.
pub fn modified_temperature(t_rxn: f64) -> (f64, f64) {
    let root = ((t_rxn - T_MIN).powi(2) + T_EPSILON * T_EPSILON).sqrt();
    (0.5 * (t_rxn + T_MIN + root), 0.5 * (1.0 + (t_rxn - T_MIN) / root))
}

/// Keq fit coefficients for a mixture number density in cm⁻³, linearly
/// interpolated within the decade and clamped to the first and last rows.
pub fn keq_constants(table: &[[f64; 5]], number_density: f64) -> [f64; 5] {
    // N = 0 gives -inf; keep the decade inside i32 so the row clamps
    let pwr = number_density.log10().floor().clamp(-1e3, 1e3) as i32;
    let index = pwr - KEQ_TABLE_OFFSET;
    let last = KEQ_TABLE_ROWS as i32 - 1;
    if index <= 0 {
        return table[0];
    }
    if index >= last {
        return table[last as usize];
    }
    let row = index as usize;
    let lower = 10f64.powi(pwr);
    let upper = 10.0 * lower;
    let mut a = [0.0; 5];
    for (k, coeff) in a.iter_mut().enumerate() {
        *coeff = (table[row + 1][k] - table[row][k]) / (upper - lower) * (number_density - lower)
            + table[row][k];
    }
    a
}

/// Keq(T) = exp(A0 z + A1 + A2 ln(1/z) + A3/z + A4/z²), z = T/1e4.
pub fn equilibrium_constant(a: &[f64; 5], t: f64) -> f64 {
    let r = 1e4 / t;
    (a[0] / r + a[1] + a[2] * r.ln() + a[3] * r + a[4] * r * r).exp()
}

/// d ln Keq / dT.
fn log_keq_slope(a: &[f64; 5], t: f64) -> f64 {
    let r = 1e4 / t;
    (a[0] / r - a[2] - a[3] * r - 2.0 * a[4] * r * r) / t
}

#[derive(Debug, Clone)]
pub struct Chemistry {
    layout: VariableLayout,
    mixture: Arc<dyn MixtureCalculator>,
    implicit: bool,
    molar_mass: Vec<f64>,
    dkf: DVector<f64>,
    dkb: DVector<f64>,
    d_fwd: DVector<f64>,
    d_bkw: DVector<f64>,
    d_rate: DVector<f64>,
}

impl Chemistry {
    pub fn new(layout: VariableLayout, mixture: Arc<dyn MixtureCalculator>, implicit: bool) -> Self {
        let n = layout.n_var;
        let molar_mass = mixture.species().iter().map(|s| s.molar_mass).collect();
        Self {
            layout,
            mixture,
            implicit,
            molar_mass,
            dkf: DVector::zeros(n),
            dkb: DVector::zeros(n),
            d_fwd: DVector::zeros(n),
            d_bkw: DVector::zeros(n),
            d_rate: DVector::zeros(n),
        }
    }

    /// Mixture number density in cm⁻³.
    pub fn number_density(&self, rho_s: impl Iterator<Item = f64>) -> f64 {
        rho_s
            .zip(&self.molar_mass)
            .map(|(rho, m)| rho / m * AVOGADRO)
            .sum::<f64>()
            * 1e-6
    }
}

/// d/d(rho_k) of 1000·Π (0.001 rho_s/M_s)^ν_s.
fn concentration_product_derivative(
    u: &DVector<f64>,
    molar_mass: &[f64],
    nu: &[u32],
    out: &mut DVector<f64>,
) {
    out.fill(0.0);
    for k in 0..molar_mass.len() {
        if nu[k] == 0 {
            continue;
        }
        let c_k = 0.001 * u[k] / molar_mass[k];
        let mut d = 0.001 * nu[k] as f64 / molar_mass[k] * c_k.powi(nu[k] as i32 - 1);
        for (j, &nu_j) in nu.iter().enumerate() {
            if j != k {
                d *= (0.001 * u[j] / molar_mass[j]).powi(nu_j as i32);
            }
        }
        out[k] = 1000.0 * d;
    }
}

fn concentration_product(u: &DVector<f64>, molar_mass: &[f64], nu: &[u32]) -> f64 {
    nu.iter()
        .enumerate()
        .map(|(s, &n)| (0.001 * u[s] / molar_mass[s]).powi(n as i32))
        .product()
}

impl SourceTerm for Chemistry {
    fn name(&self) -> &'static str {
        "chemistry"
    }

    fn compute_source(&mut self, cell: &SourceCell, out: &mut SourceResult) {
        let layout = &self.layout;
        let state = cell.state;
        let (u, v) = (&state.u, &state.v);
        let ns = layout.n_species;
        let iv = layout.eve();
        let volume = cell.volume;
        let t = v[layout.t()];
        let tve = v[layout.tve()];
        let number_density = self.number_density((0..ns).map(|s| v[layout.rhos(s)]));

        out.residual.fill(0.0);
        if self.implicit {
            out.jacobian.fill(0.0);
        }

        for reaction in self.mixture.reactions() {
            let Reaction {
                cf, eta, theta, tcf_a, tcf_b, tcb_a, tcb_b, ..
            } = *reaction;
            let t_rxn_f = t.powf(tcf_a) * tve.powf(tcf_b);
            let t_rxn_b = t.powf(tcb_a) * tve.powf(tcb_b);
            let (thf, dthf) = modified_temperature(t_rxn_f);
            let (thb, dthb) = modified_temperature(t_rxn_b);

            let a = keq_constants(&reaction.keq, number_density);
            let keq = equilibrium_constant(&a, thb);
            let kf = cf * thf.powf(eta) * (-theta / thf).exp();
            let kfb = cf * thb.powf(eta) * (-theta / thb).exp();
            let kb = kfb / keq;

            let fwd = 1000.0 * kf * concentration_product(u, &self.molar_mass, &reaction.reactants);
            let bkw = 1000.0 * kb * concentration_product(u, &self.molar_mass, &reaction.products);
            let rate = fwd - bkw;

            for s in 0..ns {
                let net = reaction.products[s] as f64 - reaction.reactants[s] as f64;
                if net == 0.0 {
                    continue;
                }
                let mass_rate = net * self.molar_mass[s] * rate * volume;
                out.residual[s] += mass_rate;
                out.residual[iv] += mass_rate * state.eve[s];
            }

            if !self.implicit {
                continue;
            }

            // rate constants through T and Tve
            let coeff_f = kf * (eta / thf + theta / (thf * thf)) * dthf;
            let coeff_b = kb * ((eta / thb + theta / (thb * thb)) - log_keq_slope(&a, thb)) * dthb;
            for k in 0..layout.n_var {
                self.dkf[k] = coeff_f
                    * (tcf_a * t_rxn_f / t * state.dtdu[k] + tcf_b * t_rxn_f / tve * state.dtvedu[k]);
                self.dkb[k] = coeff_b
                    * (tcb_a * t_rxn_b / t * state.dtdu[k] + tcb_b * t_rxn_b / tve * state.dtvedu[k]);
            }
            concentration_product_derivative(u, &self.molar_mass, &reaction.reactants, &mut self.d_fwd);
            concentration_product_derivative(u, &self.molar_mass, &reaction.products, &mut self.d_bkw);
            for k in 0..layout.n_var {
                self.d_rate[k] = self.dkf[k] * (fwd / kf) + kf * self.d_fwd[k]
                    - self.dkb[k] * (bkw / kb)
                    - kb * self.d_bkw[k];
            }

            let jac = &mut out.jacobian;
            for s in 0..ns {
                let net = reaction.products[s] as f64 - reaction.reactants[s] as f64;
                if net == 0.0 {
                    continue;
                }
                let ms = net * self.molar_mass[s] * volume;
                for k in 0..layout.n_var {
                    jac[(s, k)] += ms * self.d_rate[k];
                    jac[(iv, k)] += ms * (self.d_rate[k] * state.eve[s]
                        + rate * state.cvve[s] * state.dtvedu[k]);
                }
            }
        }
        out.finish(volume);
    }
}
