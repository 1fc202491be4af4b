//! Roe upwind flux with the Harten-Hyman entropy correction.
//!
//! F = ½(F_i + F_j) - ½·Area·P|Λ|P⁻¹(U_j - U_i), with P, P⁻¹ and Λ evaluated at
//! the density-weighted Roe average.
use crate::Numerics::convective_api::{ConvectiveEdge, ConvectiveFlux, FluxResult};
use crate::Numerics::eigenstructure::{Eigensystem, eigenvalues, projected_flux, projected_jacobian};
use crate::Numerics::geometry::unit_normal;
use crate::Numerics::variables::VariableLayout;
use crate::Thermodynamics::mixture_api::MixtureCalculator;
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

/// Harten-Hyman (1983) smoothing of `lambda` given the same mode's
/// eigenvalue in the left and right cells. Returns a non-negative speed.
pub fn entropy_fix(lambda: f64, lambda_i: f64, lambda_j: f64) -> f64 {
    let epsilon = 4.0 * (lambda - lambda_i).max(lambda_j - lambda).max(0.0);
    if lambda.abs() < epsilon {
        ((lambda * lambda + epsilon * epsilon) / (2.0 * epsilon)).abs()
    } else {
        lambda.abs()
    }
}

#[derive(Debug, Clone)]
pub struct Roe {
    layout: VariableLayout,
    mixture: Arc<dyn MixtureCalculator>,
    implicit: bool,
    unit_normal: Vec<f64>,
    roe_u: DVector<f64>,
    roe_v: DVector<f64>,
    roe_dpdu: DVector<f64>,
    flux_i: DVector<f64>,
    flux_j: DVector<f64>,
    diff_u: DVector<f64>,
    lambda: DVector<f64>,
    lambda_i: DVector<f64>,
    lambda_j: DVector<f64>,
    eigen: Eigensystem,
    dissipation: DMatrix<f64>,
}

impl Roe {
    pub fn new(layout: VariableLayout, mixture: Arc<dyn MixtureCalculator>, implicit: bool) -> Self {
        let n = layout.n_var;
        Self {
            layout,
            mixture,
            implicit,
            unit_normal: vec![0.0; layout.n_dim],
            roe_u: DVector::zeros(n),
            roe_v: DVector::zeros(layout.n_prim_var),
            roe_dpdu: DVector::zeros(n),
            flux_i: DVector::zeros(n),
            flux_j: DVector::zeros(n),
            diff_u: DVector::zeros(n),
            lambda: DVector::zeros(n),
            lambda_i: DVector::zeros(n),
            lambda_j: DVector::zeros(n),
            eigen: Eigensystem::new(&layout),
            dissipation: DMatrix::zeros(n, n),
        }
    }
}

impl ConvectiveFlux for Roe {
    fn name(&self) -> &'static str {
        "Roe"
    }

    fn compute_residual(&mut self, edge: &ConvectiveEdge, out: &mut FluxResult) {
        let layout = &self.layout;
        let (si, sj) = (edge.state_i, edge.state_j);
        let area = unit_normal(edge.normal, &mut self.unit_normal);

        // Roe averaging, weight R = sqrt(rho_j / rho_i)
        let r = (sj.v[layout.rho()] / si.v[layout.rho()]).abs().sqrt();
        let w = 1.0 / (r + 1.0);
        for k in 0..layout.n_var {
            self.roe_u[k] = (r * sj.u[k] + si.u[k]) * w;
        }
        for k in 0..layout.n_prim_var {
            self.roe_v[k] = (r * sj.v[k] + si.v[k]) * w;
        }
        self.mixture.calc_dpdu(layout, &self.roe_v, &mut self.roe_dpdu);

        projected_flux(layout, &si.u, &si.v, edge.normal, &mut self.flux_i);
        projected_flux(layout, &sj.u, &sj.v, edge.normal, &mut self.flux_j);

        let proj_vel = layout.projected_velocity(&self.roe_v, &self.unit_normal);
        let proj_vel_i = layout.projected_velocity(&si.v, &self.unit_normal);
        let proj_vel_j = layout.projected_velocity(&sj.v, &self.unit_normal);
        let roe_sound_speed = ((1.0 + self.roe_dpdu[layout.energy()]) * self.roe_v[layout.p()]
            / self.roe_v[layout.rho()])
            .sqrt();

        eigenvalues(layout, proj_vel, roe_sound_speed, &mut self.lambda);
        eigenvalues(layout, proj_vel_i, si.v[layout.a()], &mut self.lambda_i);
        eigenvalues(layout, proj_vel_j, sj.v[layout.a()], &mut self.lambda_j);
        for k in 0..layout.n_var {
            self.lambda[k] = entropy_fix(self.lambda[k], self.lambda_i[k], self.lambda_j[k]);
        }

        self.eigen
            .assemble(layout, &self.roe_u, &self.roe_v, &self.roe_dpdu, &self.unit_normal);
        self.eigen.product(&self.lambda, &mut self.dissipation);

        self.diff_u.copy_from(&sj.u);
        self.diff_u -= &si.u;

        // residual = ½(F_i + F_j) - ½·Area·|A|(U_j - U_i)
        out.residual.copy_from(&self.flux_i);
        out.residual += &self.flux_j;
        out.residual
            .gemv(-0.5 * area, &self.dissipation, &self.diff_u, 0.5);

        if self.implicit {
            projected_jacobian(layout, &si.u, &si.v, &si.dpdu, edge.normal, 0.5, &mut out.jacobian_i);
            projected_jacobian(layout, &sj.u, &sj.v, &sj.dpdu, edge.normal, 0.5, &mut out.jacobian_j);
            out.jacobian_i.zip_apply(&self.dissipation, |a, d| *a += 0.5 * area * d);
            out.jacobian_j.zip_apply(&self.dissipation, |a, d| *a -= 0.5 * area * d);
        }
    }
}
