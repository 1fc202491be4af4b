//! Advection upstream splitting (Liou-Steffen) and the linearisation shared by
//! the AUSM family.
//!
//! The Jacobian treats the interface sound speed as the cell sound speed. It is
//! exact for the plain scheme when both Mach numbers are subsonic or when the
//! upwind side is supersonic; other branches and the AUSM+-up2 interface speed
//! are approximated.
use crate::Numerics::convective_api::{ConvectiveEdge, ConvectiveFlux, FluxResult};
use crate::Numerics::geometry::unit_normal;
use crate::Numerics::variables::{FlowState, VariableLayout};
use crate::Thermodynamics::mixture_api::MixtureCalculator;
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

/// da/dU for a² = (1 + β)P/ρ, β = ρR/ρCvtr, scaled by 1/(2a) with the given `a`.
pub fn sound_speed_derivative(
    layout: &VariableLayout,
    mixture: &dyn MixtureCalculator,
    state: &FlowState,
    a: f64,
    da: &mut DVector<f64>,
) {
    let v = &state.v;
    let rho = v[layout.rho()];
    let p = v[layout.p()];
    let rho_cvtr = v[layout.rhocvtr()];
    let beta = state.dpdu[layout.energy()];
    for s in 0..layout.n_species {
        da[s] = 1.0 / (2.0 * a)
            * ((mixture.gas_constant(s) - mixture.cvtr(s) * beta) / rho_cvtr * p / rho
                + (1.0 + beta) / rho * (state.dpdu[s] - p / rho));
    }
    for d in 0..layout.n_dim {
        da[layout.mom(d)] = -(1.0 + beta) * beta * v[layout.vel(d)] / (2.0 * rho * a);
    }
    da[layout.energy()] = (1.0 + beta) * beta / (2.0 * rho * a);
    da[layout.eve()] = (1.0 + beta) * state.dpdu[layout.eve()] / (2.0 * rho * a);
}

/// Convective vector [rho_s, rho u, rho h, rhoEve] · a.
pub fn convective_vector(layout: &VariableLayout, state: &FlowState, a: f64, fc: &mut DVector<f64>) {
    let v = &state.v;
    let rho = v[layout.rho()];
    for s in 0..layout.n_species {
        fc[s] = v[layout.rhos(s)] * a;
    }
    for d in 0..layout.n_dim {
        fc[layout.mom(d)] = rho * a * v[layout.vel(d)];
    }
    fc[layout.energy()] = rho * a * v[layout.h()];
    fc[layout.eve()] = a * state.u[layout.eve()];
}

/// Van Leer split Mach number M⁺ and pressure weight P⁺/P.
pub fn split_plus(m: f64) -> (f64, f64) {
    if m.abs() <= 1.0 {
        (0.25 * (m + 1.0).powi(2), 0.25 * (m + 1.0).powi(2) * (2.0 - m))
    } else {
        (0.5 * (m + m.abs()), 0.5 * (m + m.abs()) / m)
    }
}

/// Van Leer split Mach number M⁻ and pressure weight P⁻/P.
pub fn split_minus(m: f64) -> (f64, f64) {
    if m.abs() <= 1.0 {
        (-0.25 * (m - 1.0).powi(2), 0.25 * (m - 1.0).powi(2) * (2.0 + m))
    } else {
        (0.5 * (m - m.abs()), 0.5 * (m - m.abs()) / m)
    }
}

/// Scratch and assembly of the AUSM-family Jacobians.
#[derive(Debug, Clone)]
pub struct AusmLinearization {
    da_i: DVector<f64>,
    da_j: DVector<f64>,
    dm: DVector<f64>,
    dp: DVector<f64>,
}

/// Face quantities the linearisation needs.
#[derive(Debug, Clone, Copy)]
pub struct AusmFace<'a> {
    pub unit_normal: &'a [f64],
    pub area: f64,
    pub a_i: f64,
    pub a_j: f64,
    pub m_l: f64,
    pub m_r: f64,
    pub m_f: f64,
    pub fc_l: &'a DVector<f64>,
    pub fc_r: &'a DVector<f64>,
}

impl AusmLinearization {
    pub fn new(layout: &VariableLayout) -> Self {
        let n = layout.n_var;
        Self {
            da_i: DVector::zeros(n),
            da_j: DVector::zeros(n),
            dm: DVector::zeros(n),
            dp: DVector::zeros(n),
        }
    }

    pub fn jacobians(
        &mut self,
        layout: &VariableLayout,
        mixture: &dyn MixtureCalculator,
        si: &FlowState,
        sj: &FlowState,
        face: &AusmFace,
        jac_i: &mut DMatrix<f64>,
        jac_j: &mut DMatrix<f64>,
    ) {
        jac_i.fill(0.0);
        jac_j.fill(0.0);
        sound_speed_derivative(layout, mixture, si, face.a_i, &mut self.da_i);
        sound_speed_derivative(layout, mixture, sj, face.a_j, &mut self.da_j);
        let m_f = face.m_f;
        let fc_lr = if m_f >= 0.0 { face.fc_l } else { face.fc_r };

        if m_f >= 0.0 {
            add_flux_vector_terms(layout, si, face.a_i, &self.da_i, m_f, face.fc_l, jac_i);
        }
        if m_f >= 0.0 || m_f.abs() <= 1.0 {
            split_derivatives(
                layout, si, face.a_i, &self.da_i, face.unit_normal, face.m_l, Side::Left,
                &mut self.dm, &mut self.dp,
            );
            add_split_terms(layout, face.unit_normal, &self.dm, &self.dp, fc_lr, jac_i);
        }

        if m_f < 0.0 {
            add_flux_vector_terms(layout, sj, face.a_j, &self.da_j, m_f, face.fc_r, jac_j);
        }
        if m_f < 0.0 || m_f.abs() <= 1.0 {
            split_derivatives(
                layout, sj, face.a_j, &self.da_j, face.unit_normal, face.m_r, Side::Right,
                &mut self.dm, &mut self.dp,
            );
            add_split_terms(layout, face.unit_normal, &self.dm, &self.dp, fc_lr, jac_j);
        }

        jac_i.scale_mut(face.area);
        jac_j.scale_mut(face.area);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
    Left,
    Right,
}

/// m_F · d(Fc)/dU for the upwind side.
fn add_flux_vector_terms(
    layout: &VariableLayout,
    state: &FlowState,
    a: f64,
    da: &DVector<f64>,
    m_f: f64,
    fc: &DVector<f64>,
    jac: &mut DMatrix<f64>,
) {
    let n = layout.n_var;
    let (ie, iv) = (layout.energy(), layout.eve());
    let rho_h = state.v[layout.rho()] * state.v[layout.h()];
    let dpdu = &state.dpdu;
    for row in 0..(layout.n_species + layout.n_dim) {
        for col in 0..n {
            jac[(row, col)] += m_f * fc[row] / a * da[col];
        }
        jac[(row, row)] += m_f * a;
    }
    for col in 0..n {
        // d(rho h) = dP/dU + δ_E
        let d_rho_h = dpdu[col] + if col == ie { 1.0 } else { 0.0 };
        jac[(ie, col)] += m_f * (d_rho_h * a + rho_h * da[col]);
        jac[(iv, col)] += m_f * fc[iv] / a * da[col];
    }
    jac[(iv, iv)] += m_f * a;
}

/// Derivatives of the split Mach number (into `dm`) and split pressure (`dp`).
#[allow(clippy::too_many_arguments)]
fn split_derivatives(
    layout: &VariableLayout,
    state: &FlowState,
    a: f64,
    da: &DVector<f64>,
    unit_normal: &[f64],
    m: f64,
    side: Side,
    dm: &mut DVector<f64>,
    dp: &mut DVector<f64>,
) {
    let v = &state.v;
    let rho = v[layout.rho()];
    let p = v[layout.p()];
    let un = layout.projected_velocity(v, unit_normal);

    // d(un/a)
    for col in 0..layout.n_var {
        dm[col] = -un * da[col] / (a * a);
    }
    for s in 0..layout.n_species {
        dm[s] -= un / (rho * a);
    }
    for d in 0..layout.n_dim {
        dm[layout.mom(d)] += unit_normal[d] / (rho * a);
    }

    if m.abs() <= 1.0 {
        let (scale, p_poly, p_slope) = match side {
            Side::Left => (0.5 * (m + 1.0), (m + 1.0) * (2.0 - m), 3.0 - 3.0 * m),
            Side::Right => (-0.5 * (m - 1.0), (m - 1.0) * (2.0 + m), 3.0 + 3.0 * m),
        };
        let p_scale = match side {
            Side::Left => 0.25 * (m + 1.0),
            Side::Right => 0.25 * (m - 1.0),
        };
        for col in 0..layout.n_var {
            dp[col] = p_scale * (state.dpdu[col] * p_poly + p * dm[col] * p_slope);
            dm[col] *= scale;
        }
    } else {
        dp.copy_from(&state.dpdu);
    }
}

fn add_split_terms(
    layout: &VariableLayout,
    unit_normal: &[f64],
    dm: &DVector<f64>,
    dp: &DVector<f64>,
    fc_lr: &DVector<f64>,
    jac: &mut DMatrix<f64>,
) {
    let n = layout.n_var;
    for row in 0..n {
        for col in 0..n {
            jac[(row, col)] += dm[col] * fc_lr[row];
        }
    }
    for d in 0..layout.n_dim {
        for col in 0..n {
            jac[(layout.mom(d), col)] += dp[col] * unit_normal[d];
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ausm {
    layout: VariableLayout,
    mixture: Arc<dyn MixtureCalculator>,
    implicit: bool,
    unit_normal: Vec<f64>,
    fc_l: DVector<f64>,
    fc_r: DVector<f64>,
    linearization: AusmLinearization,
}

impl Ausm {
    pub fn new(layout: VariableLayout, mixture: Arc<dyn MixtureCalculator>, implicit: bool) -> Self {
        Self {
            layout,
            mixture,
            implicit,
            unit_normal: vec![0.0; layout.n_dim],
            fc_l: DVector::zeros(layout.n_var),
            fc_r: DVector::zeros(layout.n_var),
            linearization: AusmLinearization::new(&layout),
        }
    }
}

impl ConvectiveFlux for Ausm {
    fn name(&self) -> &'static str {
        "AUSM"
    }

    fn compute_residual(&mut self, edge: &ConvectiveEdge, out: &mut FluxResult) {
        let layout = &self.layout;
        let (si, sj) = (edge.state_i, edge.state_j);
        let area = unit_normal(edge.normal, &mut self.unit_normal);

        let (a_i, a_j) = (si.v[layout.a()], sj.v[layout.a()]);
        let m_l = layout.projected_velocity(&si.v, &self.unit_normal) / a_i;
        let m_r = layout.projected_velocity(&sj.v, &self.unit_normal) / a_j;
        let (m_lp, p_lp) = split_plus(m_l);
        let (m_rm, p_rm) = split_minus(m_r);
        let m_f = m_lp + m_rm;
        let p_f = p_lp * si.v[layout.p()] + p_rm * sj.v[layout.p()];

        convective_vector(layout, si, a_i, &mut self.fc_l);
        convective_vector(layout, sj, a_j, &mut self.fc_r);

        let phi = m_f.abs();
        for k in 0..layout.n_var {
            out.residual[k] =
                0.5 * ((m_f + phi) * self.fc_l[k] + (m_f - phi) * self.fc_r[k]) * area;
        }
        for d in 0..layout.n_dim {
            out.residual[layout.mom(d)] += p_f * self.unit_normal[d] * area;
        }

        if self.implicit {
            let face = AusmFace {
                unit_normal: &self.unit_normal,
                area,
                a_i,
                a_j,
                m_l,
                m_r,
                m_f,
                fc_l: &self.fc_l,
                fc_r: &self.fc_r,
            };
            self.linearization.jacobians(
                layout,
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
