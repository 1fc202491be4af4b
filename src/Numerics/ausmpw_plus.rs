//! AUSMPW+ (Kim, Kim and Rho): AUSM splitting with a pressure-based weight
//! and shock-fix functions, linearised exactly in forward mode.
//!
//! Interface gradients are stored against the stacked vector [U_i; U_j], so
//! the first n columns feed the left Jacobian and the rest the right one.
use crate::Numerics::convective_api::{ConvectiveEdge, ConvectiveFlux, FluxResult};
use crate::Numerics::geometry::unit_normal;
use crate::Numerics::variables::{FlowState, VariableLayout};
use crate::Thermodynamics::mixture_api::MixtureCalculator;
use nalgebra::DVector;
use std::sync::Arc;

const ALPHA: f64 = 3.0 / 16.0;
/// Relative density jump below which the averaged-gamma critical speed is used.
const DENSITY_JUMP: f64 = 1e-3;

/// Per-cell quantities and their derivatives with respect to the cell's own U.
#[derive(Debug, Clone)]
struct CellLinearization {
    rho: f64,
    p: f64,
    un: f64,
    sq_tangential: f64,
    h: f64,
    gtl: f64,
    d_rho: DVector<f64>,
    d_un: DVector<f64>,
    d_sq_tangential: DVector<f64>,
    d_h: DVector<f64>,
    d_gtl: DVector<f64>,
    d_cv: DVector<f64>,
}

impl CellLinearization {
    fn new(n: usize) -> Self {
        Self {
            rho: 0.0,
            p: 0.0,
            un: 0.0,
            sq_tangential: 0.0,
            h: 0.0,
            gtl: 0.0,
            d_rho: DVector::zeros(n),
            d_un: DVector::zeros(n),
            d_sq_tangential: DVector::zeros(n),
            d_h: DVector::zeros(n),
            d_gtl: DVector::zeros(n),
            d_cv: DVector::zeros(n),
        }
    }

    fn evaluate(&mut self, layout: &VariableLayout, mixture: &dyn MixtureCalculator, state: &FlowState, unit_normal: &[f64]) {
        let v = &state.v;
        self.rho = v[layout.rho()];
        self.p = v[layout.p()];
        self.h = v[layout.h()];
        self.un = layout.projected_velocity(v, unit_normal);
        let sq_vel = layout.velocity_squared(v);
        self.sq_tangential = sq_vel - self.un * self.un;

        let rho_r: f64 = (0..layout.n_species)
            .map(|s| v[layout.rhos(s)] * mixture.gas_constant(s))
            .sum();
        let cv = v[layout.rhocvtr()] + v[layout.rhocvve()];
        self.gtl = rho_r / cv + 1.0;
        self.evaluate_derivatives(layout, mixture, state, unit_normal, rho_r, cv);
    }

    fn evaluate_derivatives(
        &mut self,
        layout: &VariableLayout,
        mixture: &dyn MixtureCalculator,
        state: &FlowState,
        unit_normal: &[f64],
        rho_r: f64,
        cv: f64,
    ) {
        let v = &state.v;
        let rho = self.rho;
        let ns = layout.n_species;

        self.d_rho.fill(0.0);
        self.d_un.fill(0.0);
        self.d_sq_tangential.fill(0.0);
        for s in 0..ns {
            self.d_rho[s] = 1.0;
            self.d_un[s] = -self.un / rho;
            self.d_sq_tangential[s] = -2.0 * self.sq_tangential / rho;
        }
        for d in 0..layout.n_dim {
            let k = layout.mom(d);
            self.d_un[k] = unit_normal[d] / rho;
            self.d_sq_tangential[k] = 2.0 * (v[layout.vel(d)] - self.un * unit_normal[d]) / rho;
        }

        // h = (rhoE + P) / rho
        for k in 0..layout.n_var {
            self.d_h[k] = (state.dpdu[k] - self.h * self.d_rho[k]) / rho;
        }
        self.d_h[layout.energy()] += 1.0 / rho;

        // rhoCvve varies with the species densities and with Tve
        let mut dcvve = DVector::zeros(ns);
        mixture.calc_dcvve(v[layout.tve()], &mut dcvve);
        let d_rho_cvve_dtve: f64 = (0..ns).map(|s| v[layout.rhos(s)] * dcvve[s]).sum();
        for k in 0..layout.n_var {
            self.d_cv[k] = d_rho_cvve_dtve * state.dtvedu[k];
        }
        for s in 0..ns {
            self.d_cv[s] += mixture.cvtr(s) + state.cvve[s];
        }
        for k in 0..layout.n_var {
            let d_rho_r = if k < ns { mixture.gas_constant(k) } else { 0.0 };
            self.d_gtl[k] = d_rho_r / cv - rho_r / (cv * cv) * self.d_cv[k];
        }
    }
}

/// Gradients of the interface quantities with respect to [U_i; U_j].
#[derive(Debug, Clone)]
struct InterfaceGradients {
    hnorm: DVector<f64>,
    atl: DVector<f64>,
    aij: DVector<f64>,
    m_l: DVector<f64>,
    m_r: DVector<f64>,
    m_lp: DVector<f64>,
    m_rm: DVector<f64>,
    p_lp: DVector<f64>,
    p_rm: DVector<f64>,
    w: DVector<f64>,
    f_l: DVector<f64>,
    f_r: DVector<f64>,
    blend: DVector<f64>,
    mb_lp: DVector<f64>,
    mb_rm: DVector<f64>,
}

impl InterfaceGradients {
    fn new(n: usize) -> Self {
        let z = || DVector::zeros(2 * n);
        Self {
            hnorm: z(),
            atl: z(),
            aij: z(),
            m_l: z(),
            m_r: z(),
            m_lp: z(),
            m_rm: z(),
            p_lp: z(),
            p_rm: z(),
            w: z(),
            f_l: z(),
            f_r: z(),
            blend: z(),
            mb_lp: z(),
            mb_rm: z(),
        }
    }
}

/// Scalar interface values kept for the linearisation pass.
#[derive(Debug, Clone, Copy, Default)]
struct InterfaceValues {
    hnorm: f64,
    atl: f64,
    aij: f64,
    m_l: f64,
    m_r: f64,
    m_lp: f64,
    m_rm: f64,
    p_lp: f64,
    p_rm: f64,
    w: f64,
    f_l: f64,
    f_r: f64,
    mb_lp: f64,
    mb_rm: f64,
}

#[derive(Debug, Clone)]
pub struct AusmpwPlus {
    layout: VariableLayout,
    mixture: Arc<dyn MixtureCalculator>,
    implicit: bool,
    unit_normal: Vec<f64>,
    cell_i: CellLinearization,
    cell_j: CellLinearization,
    grad: InterfaceGradients,
    fc_l: DVector<f64>,
    fc_r: DVector<f64>,
}

/// Subsonic Van Leer pressure polynomial with the quartic AUSM+ term and its
/// derivative, left-running (`sign` = 1) or right-running (`sign` = -1).
fn pressure_polynomial(m: f64, sign: f64) -> (f64, f64) {
    let q = m * m - 1.0;
    let value = 0.25 * (m + sign).powi(2) * (2.0 - sign * m) + sign * ALPHA * m * q * q;
    let slope = 0.5 * (m + sign) * (2.0 - sign * m) - sign * 0.25 * (m + sign).powi(2)
        + sign * (ALPHA * q * q + 4.0 * ALPHA * m * m * q);
    (value, slope)
}

/// Adds `alpha * own` into the `side` half of a stacked gradient.
fn embed(target: &mut DVector<f64>, side: usize, alpha: f64, own: &DVector<f64>) {
    let n = own.len();
    target.rows_mut(side * n, n).axpy(alpha, own, 1.0);
}

impl AusmpwPlus {
    pub fn new(layout: VariableLayout, mixture: Arc<dyn MixtureCalculator>, implicit: bool) -> Self {
        let n = layout.n_var;
        Self {
            layout,
            mixture,
            implicit,
            unit_normal: vec![0.0; layout.n_dim],
            cell_i: CellLinearization::new(n),
            cell_j: CellLinearization::new(n),
            grad: InterfaceGradients::new(n),
            fc_l: DVector::zeros(n),
            fc_r: DVector::zeros(n),
        }
    }

    fn interface_values(&self) -> InterfaceValues {
        let (ci, cj) = (&self.cell_i, &self.cell_j);
        let mut iv = InterfaceValues {
            hnorm: 0.5 * (ci.h - 0.5 * ci.sq_tangential + cj.h - 0.5 * cj.sq_tangential),
            ..Default::default()
        };

        let (gi, gj) = (ci.gtl, cj.gtl);
        let atl_sq = if self.small_density_jump() {
            let gam = 0.5 * (gi + gj);
            2.0 * iv.hnorm * (gam - 1.0) / (gam + 1.0)
        } else {
            let num = (gi - 1.0) / (gi * ci.rho) - (gj - 1.0) / (gj * cj.rho);
            let den = (gj + 1.0) / (gj * ci.rho) - (gi + 1.0) / (gi * cj.rho);
            2.0 * iv.hnorm * num / den
        };
        iv.atl = atl_sq.sqrt();
        let un_up = self.upwind_cell().un;
        iv.aij = iv.atl * iv.atl / un_up.abs().max(iv.atl);

        iv.m_l = ci.un / iv.aij;
        iv.m_r = cj.un / iv.aij;
        if iv.m_l.abs() <= 1.0 {
            iv.m_lp = 0.25 * (iv.m_l + 1.0).powi(2);
            iv.p_lp = ci.p * pressure_polynomial(iv.m_l, 1.0).0;
        } else {
            iv.m_lp = 0.5 * (iv.m_l + iv.m_l.abs());
            iv.p_lp = ci.p * 0.5 * (iv.m_l + iv.m_l.abs()) / iv.m_l;
        }
        if iv.m_r.abs() <= 1.0 {
            iv.m_rm = -0.25 * (iv.m_r - 1.0).powi(2);
            iv.p_rm = cj.p * pressure_polynomial(iv.m_r, -1.0).0;
        } else {
            iv.m_rm = 0.5 * (iv.m_r - iv.m_r.abs());
            iv.p_rm = cj.p * 0.5 * (iv.m_r - iv.m_r.abs()) / iv.m_r;
        }

        iv.w = 1.0 - (ci.p / cj.p).min(cj.p / ci.p).powi(3);
        let ps = iv.p_lp + iv.p_rm;
        iv.f_l = if iv.m_l.abs() < 1.0 { ci.p / ps - 1.0 } else { 0.0 };
        iv.f_r = if iv.m_r.abs() < 1.0 { cj.p / ps - 1.0 } else { 0.0 };

        if iv.m_lp + iv.m_rm >= 0.0 {
            iv.mb_lp = iv.m_lp + iv.m_rm * ((1.0 - iv.w) * (1.0 + iv.f_r) - iv.f_l);
            iv.mb_rm = iv.m_rm * iv.w * (1.0 + iv.f_r);
        } else {
            iv.mb_lp = iv.m_lp * iv.w * (1.0 + iv.f_l);
            iv.mb_rm = iv.m_rm + iv.m_lp * ((1.0 - iv.w) * (1.0 + iv.f_l) - iv.f_r);
        }
        iv
    }

    fn small_density_jump(&self) -> bool {
        let (ri, rj) = (self.cell_i.rho, self.cell_j.rho);
        (ri - rj).abs() / (0.5 * (ri + rj)) < DENSITY_JUMP
    }

    fn upwind_side(&self) -> usize {
        if 0.5 * (self.cell_i.un + self.cell_j.un) >= 0.0 { 0 } else { 1 }
    }

    fn upwind_cell(&self) -> &CellLinearization {
        if self.upwind_side() == 0 { &self.cell_i } else { &self.cell_j }
    }

    /// Forward-mode pass over the same chain as `interface_values`.
    fn linearize(&mut self, iv: &InterfaceValues, si: &FlowState, sj: &FlowState) {
        let small_jump = self.small_density_jump();
        let upwind = self.upwind_side();
        let (ci, cj) = (&self.cell_i, &self.cell_j);
        let g = &mut self.grad;

        g.hnorm.fill(0.0);
        embed(&mut g.hnorm, 0, 0.5, &ci.d_h);
        embed(&mut g.hnorm, 0, -0.25, &ci.d_sq_tangential);
        embed(&mut g.hnorm, 1, 0.5, &cj.d_h);
        embed(&mut g.hnorm, 1, -0.25, &cj.d_sq_tangential);

        // critical speed: atl² = 2 Hnorm · ratio
        let (gi, gj) = (ci.gtl, cj.gtl);
        let (ri, rj) = (ci.rho, cj.rho);
        g.atl.fill(0.0);
        let ratio = if small_jump {
            let gam = 0.5 * (gi + gj);
            let dratio = 2.0 / (gam + 1.0).powi(2);
            embed(&mut g.atl, 0, 2.0 * iv.hnorm * dratio * 0.5, &ci.d_gtl);
            embed(&mut g.atl, 1, 2.0 * iv.hnorm * dratio * 0.5, &cj.d_gtl);
            (gam - 1.0) / (gam + 1.0)
        } else {
            let num = (1.0 - 1.0 / gi) / ri - (1.0 - 1.0 / gj) / rj;
            let den = (1.0 + 1.0 / gj) / ri - (1.0 + 1.0 / gi) / rj;
            let c_num = 2.0 * iv.hnorm / den;
            let c_den = -2.0 * iv.hnorm * num / (den * den);
            embed(&mut g.atl, 0, c_num / (gi * gi * ri), &ci.d_gtl);
            embed(&mut g.atl, 0, -c_num * (1.0 - 1.0 / gi) / (ri * ri), &ci.d_rho);
            embed(&mut g.atl, 1, -c_num / (gj * gj * rj), &cj.d_gtl);
            embed(&mut g.atl, 1, c_num * (1.0 - 1.0 / gj) / (rj * rj), &cj.d_rho);
            embed(&mut g.atl, 0, -c_den * (1.0 + 1.0 / gj) / (ri * ri), &ci.d_rho);
            embed(&mut g.atl, 0, c_den / (gi * gi * rj), &ci.d_gtl);
            embed(&mut g.atl, 1, -c_den / (gj * gj * ri), &cj.d_gtl);
            embed(&mut g.atl, 1, c_den * (1.0 + 1.0 / gi) / (rj * rj), &cj.d_rho);
            num / den
        };
        g.atl.axpy(2.0 * ratio, &g.hnorm, 1.0);
        g.atl.scale_mut(0.5 / iv.atl);

        // interface sound speed
        let cu = if upwind == 0 { ci } else { cj };
        if cu.un.abs() > iv.atl {
            g.aij.copy_from(&g.atl);
            g.aij.scale_mut(2.0 * iv.atl / cu.un.abs());
            embed(&mut g.aij, upwind, -iv.atl * iv.atl / (cu.un * cu.un) * cu.un.signum(), &cu.d_un);
        } else {
            g.aij.copy_from(&g.atl);
        }

        // Mach numbers
        g.m_l.copy_from(&g.aij);
        g.m_l.scale_mut(-iv.m_l / iv.aij);
        embed(&mut g.m_l, 0, 1.0 / iv.aij, &ci.d_un);
        g.m_r.copy_from(&g.aij);
        g.m_r.scale_mut(-iv.m_r / iv.aij);
        embed(&mut g.m_r, 1, 1.0 / iv.aij, &cj.d_un);

        // split Mach numbers and pressures
        g.p_lp.fill(0.0);
        if iv.m_l.abs() <= 1.0 {
            let (poly, slope) = pressure_polynomial(iv.m_l, 1.0);
            g.m_lp.copy_from(&g.m_l);
            g.m_lp.scale_mut(0.5 * (iv.m_l + 1.0));
            g.p_lp.axpy(ci.p * slope, &g.m_l, 0.0);
            embed(&mut g.p_lp, 0, poly, &si.dpdu);
        } else {
            let up = if iv.m_l > 0.0 { 1.0 } else { 0.0 };
            g.m_lp.copy_from(&g.m_l);
            g.m_lp.scale_mut(up);
            embed(&mut g.p_lp, 0, up, &si.dpdu);
        }
        g.p_rm.fill(0.0);
        if iv.m_r.abs() <= 1.0 {
            let (poly, slope) = pressure_polynomial(iv.m_r, -1.0);
            g.m_rm.copy_from(&g.m_r);
            g.m_rm.scale_mut(-0.5 * (iv.m_r - 1.0));
            g.p_rm.axpy(cj.p * slope, &g.m_r, 0.0);
            embed(&mut g.p_rm, 1, poly, &sj.dpdu);
        } else {
            let down = if iv.m_r < 0.0 { 1.0 } else { 0.0 };
            g.m_rm.copy_from(&g.m_r);
            g.m_rm.scale_mut(down);
            embed(&mut g.p_rm, 1, down, &sj.dpdu);
        }

        // pressure weight w = 1 - q³, q = min(P_i/P_j, P_j/P_i)
        g.w.fill(0.0);
        let (pi, pj) = (ci.p, cj.p);
        if pi <= pj {
            let q = pi / pj;
            embed(&mut g.w, 0, -3.0 * q * q / pj, &si.dpdu);
            embed(&mut g.w, 1, 3.0 * q * q * pi / (pj * pj), &sj.dpdu);
        } else {
            let q = pj / pi;
            embed(&mut g.w, 1, -3.0 * q * q / pi, &sj.dpdu);
            embed(&mut g.w, 0, 3.0 * q * q * pj / (pi * pi), &si.dpdu);
        }

        // shock-fix functions f = P/ps - 1
        let ps = iv.p_lp + iv.p_rm;
        g.f_l.fill(0.0);
        if iv.m_l.abs() < 1.0 {
            g.f_l.axpy(-pi / (ps * ps), &g.p_lp, 0.0);
            g.f_l.axpy(-pi / (ps * ps), &g.p_rm, 1.0);
            embed(&mut g.f_l, 0, 1.0 / ps, &si.dpdu);
        }
        g.f_r.fill(0.0);
        if iv.m_r.abs() < 1.0 {
            g.f_r.axpy(-pj / (ps * ps), &g.p_lp, 0.0);
            g.f_r.axpy(-pj / (ps * ps), &g.p_rm, 1.0);
            embed(&mut g.f_r, 1, 1.0 / ps, &sj.dpdu);
        }

        // weighted mass-flux splits
        if iv.m_lp + iv.m_rm >= 0.0 {
            let blend = (1.0 - iv.w) * (1.0 + iv.f_r) - iv.f_l;
            g.blend.axpy(-(1.0 + iv.f_r), &g.w, 0.0);
            g.blend.axpy(1.0 - iv.w, &g.f_r, 1.0);
            g.blend.axpy(-1.0, &g.f_l, 1.0);

            g.mb_lp.copy_from(&g.m_lp);
            g.mb_lp.axpy(blend, &g.m_rm, 1.0);
            g.mb_lp.axpy(iv.m_rm, &g.blend, 1.0);

            g.mb_rm.axpy(iv.w * (1.0 + iv.f_r), &g.m_rm, 0.0);
            g.mb_rm.axpy(iv.m_rm * (1.0 + iv.f_r), &g.w, 1.0);
            g.mb_rm.axpy(iv.m_rm * iv.w, &g.f_r, 1.0);
        } else {
            let blend = (1.0 - iv.w) * (1.0 + iv.f_l) - iv.f_r;
            g.blend.axpy(-(1.0 + iv.f_l), &g.w, 0.0);
            g.blend.axpy(1.0 - iv.w, &g.f_l, 1.0);
            g.blend.axpy(-1.0, &g.f_r, 1.0);

            g.mb_lp.axpy(iv.w * (1.0 + iv.f_l), &g.m_lp, 0.0);
            g.mb_lp.axpy(iv.m_lp * (1.0 + iv.f_l), &g.w, 1.0);
            g.mb_lp.axpy(iv.m_lp * iv.w, &g.f_l, 1.0);

            g.mb_rm.copy_from(&g.m_rm);
            g.mb_rm.axpy(blend, &g.m_lp, 1.0);
            g.mb_rm.axpy(iv.m_lp, &g.blend, 1.0);
        }
    }
}

impl ConvectiveFlux for AusmpwPlus {
    fn name(&self) -> &'static str {
        "AUSMPW+"
    }

    fn compute_residual(&mut self, edge: &ConvectiveEdge, out: &mut FluxResult) {
        let layout = self.layout;
        let (si, sj) = (edge.state_i, edge.state_j);
        let area = unit_normal(edge.normal, &mut self.unit_normal);
        let mixture = self.mixture.as_ref();

        self.cell_i.evaluate(&layout, mixture, si, &self.unit_normal);
        self.cell_j.evaluate(&layout, mixture, sj, &self.unit_normal);
        let iv = self.interface_values();

        // [rho_s, rho u, rho h, rhoEve]
        for (state, fc) in [(si, &mut self.fc_l), (sj, &mut self.fc_r)] {
            fc.copy_from(&state.u);
            fc[layout.energy()] += state.v[layout.p()];
        }

        for k in 0..layout.n_var {
            out.residual[k] = (iv.mb_lp * self.fc_l[k] + iv.mb_rm * self.fc_r[k]) * iv.aij * area;
        }
        for d in 0..layout.n_dim {
            out.residual[layout.mom(d)] += (iv.p_lp + iv.p_rm) * self.unit_normal[d] * area;
        }

        if !self.implicit {
            return;
        }
        self.linearize(&iv, si, sj);

        let n = layout.n_var;
        let g = &self.grad;
        let ie = layout.energy();
        for (side, jac, mb, dpdu) in [
            (0, &mut out.jacobian_i, iv.mb_lp, &si.dpdu),
            (1, &mut out.jacobian_j, iv.mb_rm, &sj.dpdu),
        ] {
            jac.fill(0.0);
            for col in 0..n {
                let c = side * n + col;
                let coef_l = g.mb_lp[c] * iv.aij + iv.mb_lp * g.aij[c];
                let coef_r = g.mb_rm[c] * iv.aij + iv.mb_rm * g.aij[c];
                for row in 0..n {
                    jac[(row, col)] = (coef_l * self.fc_l[row] + coef_r * self.fc_r[row]) * area;
                }
                for d in 0..layout.n_dim {
                    jac[(layout.mom(d), col)] += (g.p_lp[c] + g.p_rm[c]) * self.unit_normal[d] * area;
                }
                // own convective vector: dFc/dU = I + e_E ⊗ dP/dU
                jac[(col, col)] += mb * iv.aij * area;
                jac[(ie, col)] += mb * iv.aij * dpdu[col] * area;
            }
        }
    }
}
