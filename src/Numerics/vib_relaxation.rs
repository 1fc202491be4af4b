//! Landau-Teller exchange between translational-rotational and
//! vibrational-electronic energy.
//!
//! τ_s = τ_MW,s + τ_P,s: the Millikan-White mixing rule over all collision
//! partners plus Park's limiting cross-section correction. The Jacobian
//! differentiates both times with respect to P, T and the species densities.
use crate::Numerics::source_api::{SourceCell, SourceResult, SourceTerm};
use crate::Numerics::variables::VariableLayout;
use crate::Thermodynamics::mixture_api::{AVOGADRO, MixtureCalculator, RU};
use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;
use std::sync::Arc;

const ATM: f64 = 101325.0;
/// Park's limiting cross section is SIGMA_REF·(50000 K / T)², m².
const SIGMA_REF: f64 = 1e-20;
const T_SIGMA: f64 = 5e4;

/// Millikan-White A_sr and B_sr for a vibrator of molar mass `m_s` and
/// characteristic temperature `theta_v` colliding with a partner of mass `m_r`.
pub fn millikan_white_constants(m_s: f64, m_r: f64, theta_v: f64) -> (f64, f64) {
    let mu = m_s * m_r / (m_s + m_r);
    (1.16e-3 * mu.sqrt() * theta_v.powf(4.0 / 3.0), 0.015 * mu.powf(0.25))
}

/// Millikan-White pair relaxation time in seconds, P in Pa.
pub fn pair_relaxation_time(a_sr: f64, b_sr: f64, p: f64, t: f64) -> f64 {
    ATM / p * (a_sr * (t.powf(-1.0 / 3.0) - b_sr) - 18.42).exp()
}

/// Park correction 1/(σ c̄ N) with N in m⁻³.
pub fn park_relaxation_time(molar_mass: f64, t: f64, number_density: f64) -> f64 {
    let c_s = (8.0 * RU * t / (PI * molar_mass)).sqrt();
    let sigma = SIGMA_REF * T_SIGMA * T_SIGMA / (t * t);
    1.0 / (sigma * c_s * number_density)
}

#[derive(Debug, Clone)]
pub struct VibRelaxation {
    layout: VariableLayout,
    mixture: Arc<dyn MixtureCalculator>,
    implicit: bool,
    molar_mass: Vec<f64>,
    /// (A_sr, B_sr) per vibrator/partner pair
    mw_constants: Vec<Vec<(f64, f64)>>,
    tau_sr: DMatrix<f64>,
    tau: DVector<f64>,
    e_star: DVector<f64>,
    cvve_star: DVector<f64>,
    d_tau: DVector<f64>,
}

impl VibRelaxation {
    pub fn new(layout: VariableLayout, mixture: Arc<dyn MixtureCalculator>, implicit: bool) -> Self {
        let ns = layout.n_species;
        let species = mixture.species();
        let molar_mass: Vec<f64> = species.iter().map(|s| s.molar_mass).collect();
        let mw_constants = species
            .iter()
            .map(|s| {
                species
                    .iter()
                    .map(|r| millikan_white_constants(s.molar_mass, r.molar_mass, s.theta_v))
                    .collect()
            })
            .collect();
        Self {
            layout,
            mixture,
            implicit,
            molar_mass,
            mw_constants,
            tau_sr: DMatrix::zeros(ns, ns),
            tau: DVector::zeros(ns),
            e_star: DVector::zeros(ns),
            cvve_star: DVector::zeros(ns),
            d_tau: DVector::zeros(layout.n_var),
        }
    }

    /// Relaxation time τ_s of every species from the last evaluation.
    pub fn relaxation_times(&self) -> &DVector<f64> {
        &self.tau
    }
}

impl SourceTerm for VibRelaxation {
    fn name(&self) -> &'static str {
        "vibrational relaxation"
    }

    fn compute_source(&mut self, cell: &SourceCell, out: &mut SourceResult) {
        let layout = &self.layout;
        let state = cell.state;
        let v = &state.v;
        let ns = layout.n_species;
        let iv = layout.eve();
        let volume = cell.volume;
        let p = v[layout.p()];
        let t = v[layout.t()];

        // molar concentrations c_r, kmol/m³
        let conc: Vec<f64> = (0..ns).map(|r| v[layout.rhos(r)] / self.molar_mass[r]).collect();
        let conc_sum: f64 = conc.iter().sum();
        let number_density = conc_sum * AVOGADRO;

        self.mixture.calc_eve(t, &mut self.e_star);
        self.mixture.calc_cvve(t, &mut self.cvve_star);

        out.residual.fill(0.0);
        // τ_MW = Σc / Σ(c/τ_sr); mole fractions cancel to concentrations
        let mut mw_denominator = vec![0.0; ns];
        let mut tau_mw = vec![0.0; ns];
        let mut tau_p = vec![0.0; ns];
        for s in 0..ns {
            for r in 0..ns {
                let (a_sr, b_sr) = self.mw_constants[s][r];
                self.tau_sr[(s, r)] = pair_relaxation_time(a_sr, b_sr, p, t);
                mw_denominator[s] += conc[r] / self.tau_sr[(s, r)];
            }
            tau_mw[s] = conc_sum / mw_denominator[s];
            tau_p[s] = park_relaxation_time(self.molar_mass[s], t, number_density);
            self.tau[s] = tau_mw[s] + tau_p[s];

            let rho_s = v[layout.rhos(s)];
            out.residual[iv] += rho_s * (self.e_star[s] - state.eve[s]) / self.tau[s] * volume;
        }
        out.finish(volume);

        if !self.implicit {
            return;
        }
        let jac = &mut out.jacobian;
        jac.fill(0.0);
        for s in 0..ns {
            let rho_s = v[layout.rhos(s)];
            let tau_s = self.tau[s];
            let delta = self.e_star[s] - state.eve[s];

            // energies at fixed τ
            for k in 0..layout.n_var {
                jac[(iv, k)] += rho_s / tau_s
                    * (self.cvve_star[s] * state.dtdu[k] - state.cvve[s] * state.dtvedu[k])
                    * volume;
            }
            jac[(iv, s)] += delta / tau_s * volume;

            // τ_P ∝ T^1.5 / N
            for k in 0..layout.n_var {
                self.d_tau[k] = tau_p[s] * 1.5 / t * state.dtdu[k];
            }
            for r in 0..ns {
                self.d_tau[r] -= tau_p[s] / self.molar_mass[r] / conc_sum;
            }

            // τ_MW through the concentrations, P and T
            let den = mw_denominator[s];
            for r in 0..ns {
                let d_den_r = 1.0 / (self.molar_mass[r] * self.tau_sr[(s, r)]);
                self.d_tau[r] += 1.0 / (self.molar_mass[r] * den) - conc_sum / (den * den) * d_den_r;
            }
            let (a_sr_terms, p_terms): (f64, f64) = (0..ns)
                .map(|r| {
                    let (a_sr, _) = self.mw_constants[s][r];
                    let w = conc[r] / self.tau_sr[(s, r)];
                    // dτ_sr = -τ_sr (dP/P + A_sr T^(-4/3)/3 dT)
                    (w * a_sr * t.powf(-4.0 / 3.0) / 3.0, w / p)
                })
                .fold((0.0, 0.0), |acc, x| (acc.0 + x.0, acc.1 + x.1));
            // dden = Σ_r (c_r/τ_sr)(dP/P + A_sr T^(-4/3)/3 dT)
            let factor = -conc_sum / (den * den);
            for k in 0..layout.n_var {
                self.d_tau[k] += factor * (p_terms * state.dpdu[k] + a_sr_terms * state.dtdu[k]);
            }

            let coeff = -rho_s * delta / (tau_s * tau_s) * volume;
            for k in 0..layout.n_var {
                jac[(iv, k)] += coeff * self.d_tau[k];
            }
        }
    }
}
