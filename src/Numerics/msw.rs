//! Modified Steger-Warming flux-vector splitting.
//!
//! The split Jacobians A⁺ and A⁻ are built at pressure-weighted "star"
//! states; near smooth regions the weight tends to ½ (low dissipation), near
//! pressure jumps to 0 (pure Steger-Warming).
use crate::Numerics::convective_api::{ConvectiveEdge, ConvectiveFlux, FluxResult};
use crate::Numerics::eigenstructure::{Eigensystem, eigenvalues};
use crate::Numerics::geometry::unit_normal;
use crate::Numerics::variables::VariableLayout;
use nalgebra::{DMatrix, DVector};

const ALPHA: f64 = 5.0;
const EPSILON: f64 = 0.0;

#[derive(Debug, Clone)]
pub struct Msw {
    layout: VariableLayout,
    implicit: bool,
    unit_normal: Vec<f64>,
    ust_i: DVector<f64>,
    ust_j: DVector<f64>,
    vst_i: DVector<f64>,
    vst_j: DVector<f64>,
    lambda_p: DVector<f64>,
    lambda_m: DVector<f64>,
    eigen: Eigensystem,
    a_plus: DMatrix<f64>,
    a_minus: DMatrix<f64>,
}

impl Msw {
    pub fn new(layout: VariableLayout, implicit: bool) -> Self {
        let n = layout.n_var;
        Self {
            layout,
            implicit,
            unit_normal: vec![0.0; layout.n_dim],
            ust_i: DVector::zeros(n),
            ust_j: DVector::zeros(n),
            vst_i: DVector::zeros(layout.n_prim_var),
            vst_j: DVector::zeros(layout.n_prim_var),
            lambda_p: DVector::zeros(n),
            lambda_m: DVector::zeros(n),
            eigen: Eigensystem::new(&layout),
            a_plus: DMatrix::zeros(n, n),
            a_minus: DMatrix::zeros(n, n),
        }
    }

    /// Blending weight of the opposite cell in each star state.
    pub fn pressure_weight(p_i: f64, p_j: f64) -> f64 {
        let dp = (p_j - p_i).abs() / p_i.min(p_j);
        0.5 / ((ALPHA * dp).powi(2) + 1.0)
    }
}

impl ConvectiveFlux for Msw {
    fn name(&self) -> &'static str {
        "MSW"
    }

    fn compute_residual(&mut self, edge: &ConvectiveEdge, out: &mut FluxResult) {
        let layout = &self.layout;
        let (si, sj) = (edge.state_i, edge.state_j);
        let area = unit_normal(edge.normal, &mut self.unit_normal);

        let w = Self::pressure_weight(si.v[layout.p()], sj.v[layout.p()]);
        let onemw = 1.0 - w;
        for k in 0..layout.n_var {
            self.ust_i[k] = onemw * si.u[k] + w * sj.u[k];
            self.ust_j[k] = onemw * sj.u[k] + w * si.u[k];
        }
        for k in 0..layout.n_prim_var {
            self.vst_i[k] = onemw * si.v[k] + w * sj.v[k];
            self.vst_j[k] = onemw * sj.v[k] + w * si.v[k];
        }
        let proj_vel_i = layout.projected_velocity(&si.v, &self.unit_normal);
        let proj_vel_j = layout.projected_velocity(&sj.v, &self.unit_normal);
        let proj_vel_st_i = onemw * proj_vel_i + w * proj_vel_j;
        let proj_vel_st_j = onemw * proj_vel_j + w * proj_vel_i;

        eigenvalues(layout, proj_vel_st_i, self.vst_i[layout.a()], &mut self.lambda_p);
        eigenvalues(layout, proj_vel_st_j, self.vst_j[layout.a()], &mut self.lambda_m);
        for k in 0..layout.n_var {
            let lp = self.lambda_p[k];
            let lm = self.lambda_m[k];
            self.lambda_p[k] = 0.5 * (lp + (lp * lp + EPSILON * EPSILON).sqrt());
            self.lambda_m[k] = 0.5 * (lm - (lm * lm + EPSILON * EPSILON).sqrt());
        }

        // star-state eigenvectors with each cell's own dP/dU
        self.eigen
            .assemble(layout, &self.ust_i, &self.vst_i, &si.dpdu, &self.unit_normal);
        self.eigen.product(&self.lambda_p, &mut self.a_plus);
        self.eigen
            .assemble(layout, &self.ust_j, &self.vst_j, &sj.dpdu, &self.unit_normal);
        self.eigen.product(&self.lambda_m, &mut self.a_minus);

        out.residual.gemv(area, &self.a_plus, &si.u, 0.0);
        out.residual.gemv(area, &self.a_minus, &sj.u, 1.0);

        if self.implicit {
            out.jacobian_i.fill(0.0);
            out.jacobian_j.fill(0.0);
            out.jacobian_i.zip_apply(&self.a_plus, |j, a| *j += area * a);
            out.jacobian_j.zip_apply(&self.a_minus, |j, a| *j += area * a);
        }
    }
}
