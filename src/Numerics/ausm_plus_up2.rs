//! AUSM+-up2 (Kitamura-Shima) with low-Mach pressure diffusion and a
//! velocity-scaled pressure flux.
use crate::Numerics::ausm::{AusmFace, AusmLinearization};
use crate::Numerics::convective_api::{ConvectiveEdge, ConvectiveFlux, FluxResult};
use crate::Numerics::geometry::unit_normal;
use crate::Numerics::variables::{FlowState, VariableLayout};
use crate::Thermodynamics::mixture_api::MixtureCalculator;
use nalgebra::DVector;
use std::sync::Arc;

/// Pressure diffusion coefficient.
const KP: f64 = 0.25;
const SIGMA: f64 = 1.0;
/// Quartic correction of the Mach split.
const BETA: f64 = 1.0 / 8.0;

#[derive(Debug, Clone)]
pub struct AusmPlusUp2 {
    layout: VariableLayout,
    mixture: Arc<dyn MixtureCalculator>,
    implicit: bool,
    mach_inf: f64,
    gamma: f64,
    unit_normal: Vec<f64>,
    fc_l: DVector<f64>,
    fc_r: DVector<f64>,
    linearization: AusmLinearization,
}

impl AusmPlusUp2 {
    pub fn new(
        layout: VariableLayout,
        mixture: Arc<dyn MixtureCalculator>,
        implicit: bool,
        mach_inf: f64,
        gamma: f64,
    ) -> Self {
        Self {
            layout,
            mixture,
            implicit,
            mach_inf,
            gamma,
            unit_normal: vec![0.0; layout.n_dim],
            fc_l: DVector::zeros(layout.n_var),
            fc_r: DVector::zeros(layout.n_var),
            linearization: AusmLinearization::new(&layout),
        }
    }

    /// Interface sound speed min(Ĉ_L, Ĉ_R) built from the critical speeds.
    pub fn interface_sound_speed(&self, si: &FlowState, sj: &FlowState, un_i: f64, un_j: f64) -> f64 {
        let layout = &self.layout;
        let g = self.gamma;
        let c_star_l = (2.0 * (g - 1.0) / (g + 1.0) * si.v[layout.h()]).sqrt();
        let c_star_r = (2.0 * (g - 1.0) / (g + 1.0) * sj.v[layout.h()]).sqrt();
        let c_hat_l = c_star_l * c_star_l / c_star_l.max(un_i);
        let c_hat_r = c_star_r * c_star_r / c_star_r.max(-un_j);
        c_hat_l.min(c_hat_r)
    }

    fn fill_convective_vector(layout: &VariableLayout, state: &FlowState, a_f: f64, fc: &mut DVector<f64>) {
        let v = &state.v;
        let rho = v[layout.rho()];
        let e_ve = state.u[layout.eve()] / rho;
        for s in 0..layout.n_species {
            fc[s] = v[layout.rhos(s)] * a_f;
        }
        for d in 0..layout.n_dim {
            fc[layout.mom(d)] = rho * a_f * v[layout.vel(d)];
        }
        fc[layout.energy()] = rho * a_f * v[layout.h()];
        fc[layout.eve()] = rho * a_f * e_ve;
    }
}

impl ConvectiveFlux for AusmPlusUp2 {
    fn name(&self) -> &'static str {
        "AUSM+-up2"
    }

    fn compute_residual(&mut self, edge: &ConvectiveEdge, out: &mut FluxResult) {
        let (si, sj) = (edge.state_i, edge.state_j);
        let area = unit_normal(edge.normal, &mut self.unit_normal);
        let layout = self.layout;

        let un_i = layout.projected_velocity(&si.v, &self.unit_normal);
        let un_j = layout.projected_velocity(&sj.v, &self.unit_normal);
        let (rho_i, rho_j) = (si.v[layout.rho()], sj.v[layout.rho()]);
        let (p_i, p_j) = (si.v[layout.p()], sj.v[layout.p()]);

        let a_f = self.interface_sound_speed(si, sj, un_i, un_j);
        let m_l = un_i / a_f;
        let m_r = un_j / a_f;

        let rho_f = 0.5 * (rho_i + rho_j);
        let m_f_sq = 0.5 * (m_l * m_l + m_r * m_r);
        let m_ref_sq = m_f_sq.max(self.mach_inf * self.mach_inf).min(1.0);
        let fa = 2.0 * m_ref_sq.sqrt() - m_ref_sq;
        let alpha = 3.0 / 16.0 * (-4.0 + 5.0 * fa * fa);

        let mp = -(KP / fa) * (1.0 - SIGMA * m_f_sq).max(0.0) * (p_j - p_i) / (rho_f * a_f * a_f);

        let m_lp = if m_l.abs() <= 1.0 {
            0.25 * (m_l + 1.0).powi(2) + BETA * (m_l * m_l - 1.0).powi(2)
        } else {
            0.5 * (m_l + m_l.abs())
        };
        let m_rm = if m_r.abs() <= 1.0 {
            -0.25 * (m_r - 1.0).powi(2) - BETA * (m_r * m_r - 1.0).powi(2)
        } else {
            0.5 * (m_r - m_r.abs())
        };
        let m_f = m_lp + m_rm + mp;

        let p_lp = if m_l.abs() <= 1.0 {
            0.25 * (m_l + 1.0).powi(2) * (2.0 - m_l) + alpha * m_l * (m_l * m_l - 1.0).powi(2)
        } else {
            0.5 * (m_l + m_l.abs()) / m_l
        };
        let p_rm = if m_r.abs() <= 1.0 {
            0.25 * (m_r - 1.0).powi(2) * (2.0 + m_r) - alpha * m_r * (m_r * m_r - 1.0).powi(2)
        } else {
            0.5 * (m_r - m_r.abs()) / m_r
        };

        let q_mean = (0.5 * (layout.velocity_squared(&si.v) + layout.velocity_squared(&sj.v))).sqrt();
        let p_fi = q_mean * (p_lp + p_rm - 1.0) * rho_f * a_f;
        let p_f = 0.5 * (p_j + p_i) + 0.5 * (p_lp - p_rm) * (p_i - p_j) + p_fi;

        let phi = m_f.abs();
        let (mf_plus, mf_minus) = (0.5 * (m_f + phi), 0.5 * (m_f - phi));

        Self::fill_convective_vector(&layout, si, a_f, &mut self.fc_l);
        Self::fill_convective_vector(&layout, sj, a_f, &mut self.fc_r);

        for k in 0..layout.n_var {
            out.residual[k] = (mf_plus * self.fc_l[k] + mf_minus * self.fc_r[k]) * area;
        }
        for d in 0..layout.n_dim {
            out.residual[layout.mom(d)] += p_f * self.unit_normal[d] * area;
        }

        if self.implicit {
            let face = AusmFace {
                unit_normal: &self.unit_normal,
                area,
                a_i: a_f,
                a_j: a_f,
                m_l,
                m_r,
                m_f,
                fc_l: &self.fc_l,
                fc_r: &self.fc_r,
            };
            self.linearization.jacobians(
                &layout,
                self.mixture.as_ref(),
                si,
                sj,
                &face,
                &mut out.jacobian_i,
                &mut out.jacobian_j,
            );
        }
    }
}
