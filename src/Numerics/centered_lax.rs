//! Centered flux of the mean state with scalar first-order (Lax)
//! artificial dissipation.
use crate::Numerics::convective_api::{ConvectiveEdge, ConvectiveFlux, FluxResult};
use crate::Numerics::eigenstructure::{projected_flux, projected_jacobian};
use crate::Numerics::geometry::face_area;
use crate::Numerics::variables::VariableLayout;
use crate::Thermodynamics::mixture_api::MixtureCalculator;
use nalgebra::DVector;
use std::sync::Arc;

/// Exponent of the stretching switch.
const PARAM_P: f64 = 0.3;
const EPS: f64 = 1e-16;

#[derive(Debug, Clone)]
pub struct CenteredLax {
    layout: VariableLayout,
    mixture: Arc<dyn MixtureCalculator>,
    implicit: bool,
    kappa_0: f64,
    mean_u: DVector<f64>,
    mean_v: DVector<f64>,
    mean_dpdu: DVector<f64>,
    diff_u: DVector<f64>,
}

impl CenteredLax {
    pub fn new(
        layout: VariableLayout,
        mixture: Arc<dyn MixtureCalculator>,
        implicit: bool,
        kappa_0: f64,
    ) -> Self {
        Self {
            layout,
            mixture,
            implicit,
            kappa_0,
            mean_u: DVector::zeros(layout.n_var),
            mean_v: DVector::zeros(layout.n_prim_var),
            mean_dpdu: DVector::zeros(layout.n_var),
            diff_u: DVector::zeros(layout.n_var),
        }
    }
}

/// Pressure/curvature switch from the cell and mean spectral radii.
pub fn stretching_factor(lambda_i: f64, lambda_j: f64, mean_lambda: f64) -> f64 {
    let phi_i = (lambda_i / (4.0 * mean_lambda + EPS)).powf(PARAM_P);
    let phi_j = (lambda_j / (4.0 * mean_lambda + EPS)).powf(PARAM_P);
    4.0 * phi_i * phi_j / (phi_i + phi_j + EPS)
}

impl ConvectiveFlux for CenteredLax {
    fn name(&self) -> &'static str {
        "Lax"
    }

    fn compute_residual(&mut self, edge: &ConvectiveEdge, out: &mut FluxResult) {
        let layout = &self.layout;
        let (si, sj) = (edge.state_i, edge.state_j);
        let (ns, nd) = (layout.n_species, layout.n_dim);
        let (ie, iv) = (layout.energy(), layout.eve());

        self.mean_u.copy_from(&si.u);
        self.mean_u += &sj.u;
        self.mean_u *= 0.5;
        self.mean_v.copy_from(&si.v);
        self.mean_v += &sj.v;
        self.mean_v *= 0.5;
        self.mixture.calc_dpdu(layout, &self.mean_v, &mut self.mean_dpdu);

        projected_flux(layout, &self.mean_u, &self.mean_v, edge.normal, &mut out.residual);
        if self.implicit {
            projected_jacobian(
                layout,
                &self.mean_u,
                &self.mean_v,
                &self.mean_dpdu,
                edge.normal,
                0.5,
                &mut out.jacobian_i,
            );
            out.jacobian_j.copy_from(&out.jacobian_i);
        }

        // total enthalpy, not total energy, in the energy row
        self.diff_u.copy_from(&si.u);
        self.diff_u -= &sj.u;
        self.diff_u[ie] =
            si.v[layout.rho()] * si.v[layout.h()] - sj.v[layout.rho()] * sj.v[layout.h()];

        let area = face_area(edge.normal);
        let local_lambda_i =
            layout.projected_velocity(&si.v, edge.normal).abs() + si.v[layout.a()] * area;
        let local_lambda_j =
            layout.projected_velocity(&sj.v, edge.normal).abs() + sj.v[layout.a()] * area;
        let mean_lambda = 0.5 * (local_lambda_i + local_lambda_j);

        let stretching = stretching_factor(edge.lambda_i, edge.lambda_j, mean_lambda);
        let (n_i, n_j) = (edge.neighbors_i as f64, edge.neighbors_j as f64);
        let sc0 = 3.0 * (n_i + n_j) / (n_i * n_j);
        let epsilon_0 = self.kappa_0 * sc0 * nd as f64 / 3.0;

        let cte = epsilon_0 * stretching * mean_lambda;
        out.residual.axpy(cte, &self.diff_u, 1.0);

        if self.implicit {
            for k in 0..(ns + nd) {
                out.jacobian_i[(k, k)] += cte;
                out.jacobian_j[(k, k)] -= cte;
            }
            for k in 0..layout.n_var {
                out.jacobian_i[(ie, k)] += cte * si.dpdu[k];
                out.jacobian_j[(ie, k)] -= cte * sj.dpdu[k];
            }
            out.jacobian_i[(ie, ie)] += cte;
            out.jacobian_j[(ie, ie)] -= cte;
            out.jacobian_i[(iv, iv)] += cte;
            out.jacobian_j[(iv, iv)] -= cte;
        }
    }
}
