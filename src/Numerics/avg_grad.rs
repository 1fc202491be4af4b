//! Average-gradient viscous fluxes, plain and edge-corrected.
//!
//! Both schemes work on a mean primitive vector whose species slots hold mass
//! fractions Y_s instead of partial densities. The Jacobian is the thin-layer
//! approximation: gradients along the edge are replaced by (V_j - V_i)/d and
//! chained through dV/dU of each cell.
use crate::Numerics::convective_api::FluxResult;
use crate::Numerics::geometry::unit_normal;
use crate::Numerics::variables::{FlowState, VariableLayout};
use crate::Numerics::viscous_api::{ViscousEdge, ViscousFlux};
use crate::Thermodynamics::mixture_api::MixtureCalculator;
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

const TWO3: f64 = 2.0 / 3.0;

/// Mean state, flux tensor and Jacobian scratch shared by both variants.
#[derive(Debug, Clone)]
pub struct ViscousKernel {
    layout: VariableLayout,
    mixture: Arc<dyn MixtureCalculator>,
    prim_i: DVector<f64>,
    prim_j: DVector<f64>,
    mean_prim: DVector<f64>,
    mean_grad: DMatrix<f64>,
    mean_eve: DVector<f64>,
    mean_cvve: DVector<f64>,
    mean_diffusion: DVector<f64>,
    mean_viscosity: f64,
    mean_conductivity_tr: f64,
    mean_conductivity_ve: f64,
    hs: DVector<f64>,
    flux_tensor: DMatrix<f64>,
    tau: DMatrix<f64>,
    diffusion_sum: Vec<f64>,
    djdr_i: DMatrix<f64>,
    djdr_j: DMatrix<f64>,
    dfdv_i: DMatrix<f64>,
    dfdv_j: DMatrix<f64>,
    dvdu_i: DMatrix<f64>,
    dvdu_j: DMatrix<f64>,
    edge_vector: Vec<f64>,
}

impl ViscousKernel {
    pub fn new(layout: VariableLayout, mixture: Arc<dyn MixtureCalculator>) -> Self {
        let (n, ns, nd) = (layout.n_var, layout.n_species, layout.n_dim);
        Self {
            layout,
            mixture,
            prim_i: DVector::zeros(layout.n_prim_var),
            prim_j: DVector::zeros(layout.n_prim_var),
            mean_prim: DVector::zeros(layout.n_prim_var),
            mean_grad: DMatrix::zeros(layout.n_prim_var_grad, nd),
            mean_eve: DVector::zeros(ns),
            mean_cvve: DVector::zeros(ns),
            mean_diffusion: DVector::zeros(ns),
            mean_viscosity: 0.0,
            mean_conductivity_tr: 0.0,
            mean_conductivity_ve: 0.0,
            hs: DVector::zeros(ns),
            flux_tensor: DMatrix::zeros(n, nd),
            tau: DMatrix::zeros(nd, nd),
            diffusion_sum: vec![0.0; nd],
            djdr_i: DMatrix::zeros(ns, ns),
            djdr_j: DMatrix::zeros(ns, ns),
            dfdv_i: DMatrix::zeros(n, n),
            dfdv_j: DMatrix::zeros(n, n),
            dvdu_i: DMatrix::zeros(n, n),
            dvdu_j: DMatrix::zeros(n, n),
            edge_vector: vec![0.0; nd],
        }
    }

    /// Mean gradients after `average` (and `correct_along_edge`).
    pub fn mean_gradient(&self) -> &DMatrix<f64> {
        &self.mean_grad
    }

    /// Mean primitive vector with mass fractions in the species slots.
    pub fn mean_primitives(&self) -> &DVector<f64> {
        &self.mean_prim
    }

    /// Arithmetic means of transport, state and gradients; species gradients
    /// are converted to mass-fraction gradients cell by cell.
    pub fn average(&mut self, edge: &ViscousEdge) {
        let layout = &self.layout;
        let (si, sj) = (edge.state_i, edge.state_j);
        let (ti, tj) = (edge.transport_i, edge.transport_j);
        let (gi, gj) = (edge.grad_i, edge.grad_j);
        let ns = layout.n_species;
        let irho = layout.rho();
        let (rho_i, rho_j) = (si.v[irho], sj.v[irho]);

        self.mean_diffusion.copy_from(&ti.diffusion);
        self.mean_diffusion += &tj.diffusion;
        self.mean_diffusion *= 0.5;
        self.mean_viscosity = 0.5 * (ti.viscosity + tj.viscosity);
        self.mean_conductivity_tr = 0.5 * (ti.conductivity_tr + tj.conductivity_tr);
        self.mean_conductivity_ve = 0.5 * (ti.conductivity_ve + tj.conductivity_ve);

        self.prim_i.copy_from(&si.v);
        self.prim_j.copy_from(&sj.v);
        for s in 0..ns {
            self.prim_i[s] = si.v[layout.rhos(s)] / rho_i;
            self.prim_j[s] = sj.v[layout.rhos(s)] / rho_j;
        }
        self.mean_prim.copy_from(&self.prim_i);
        self.mean_prim += &self.prim_j;
        self.mean_prim *= 0.5;

        // ∇Y = (∇rho_s - Y ∇rho) / rho
        for d in 0..layout.n_dim {
            for s in 0..ns {
                self.mean_grad[(s, d)] = 0.5
                    * ((gi[(s, d)] - self.prim_i[s] * gi[(irho, d)]) / rho_i
                        + (gj[(s, d)] - self.prim_j[s] * gj[(irho, d)]) / rho_j);
            }
            for k in ns..layout.n_prim_var_grad {
                self.mean_grad[(k, d)] = 0.5 * (gi[(k, d)] + gj[(k, d)]);
            }
        }

        self.mean_eve.copy_from(&si.eve);
        self.mean_eve += &sj.eve;
        self.mean_eve *= 0.5;
        self.mean_cvve.copy_from(&si.cvve);
        self.mean_cvve += &sj.cvve;
        self.mean_cvve *= 0.5;
    }

    /// Replaces the edge-projected part of every mean gradient by the secant
    /// slope (V_j - V_i) along the edge.
    pub fn correct_along_edge(&mut self, coord_i: &[f64], coord_j: &[f64]) {
        let nd = self.layout.n_dim;
        for d in 0..nd {
            self.edge_vector[d] = coord_j[d] - coord_i[d];
        }
        let dist_sq: f64 = self.edge_vector.iter().map(|e| e * e).sum();
        for k in 0..self.layout.n_prim_var_grad {
            let projected: f64 = (0..nd).map(|d| self.mean_grad[(k, d)] * self.edge_vector[d]).sum();
            let mismatch = projected - (self.prim_j[k] - self.prim_i[k]);
            for d in 0..nd {
                self.mean_grad[(k, d)] -= mismatch * self.edge_vector[d] / dist_sq;
            }
        }
    }

    /// Viscous flux tensor of the mean state projected on `normal`.
    pub fn projected_flux(&mut self, normal: &[f64], flux: &mut DVector<f64>) {
        let layout = &self.layout;
        let (ns, nd) = (layout.n_species, layout.n_dim);
        let (ie, iv) = (layout.energy(), layout.eve());
        let v = &self.mean_prim;
        let grad = &self.mean_grad;
        let rho = v[layout.rho()];
        let mu = self.mean_viscosity;
        let (ktr, kve) = (self.mean_conductivity_tr, self.mean_conductivity_ve);

        self.mixture.calc_hs(v[layout.t()], &self.mean_eve, &mut self.hs);

        let div_vel: f64 = (0..nd).map(|d| grad[(layout.vel(d), d)]).sum();
        for d in 0..nd {
            self.diffusion_sum[d] = (0..ns)
                .map(|s| rho * self.mean_diffusion[s] * grad[(s, d)])
                .sum();
        }
        for a in 0..nd {
            for b in 0..nd {
                self.tau[(a, b)] = mu * (grad[(layout.vel(b), a)] + grad[(layout.vel(a), b)]);
            }
            self.tau[(a, a)] -= TWO3 * mu * div_vel;
        }

        self.flux_tensor.fill(0.0);
        for d in 0..nd {
            // Fick diffusion with the drift correction, Σ_s J_s = 0
            for s in 0..ns {
                self.flux_tensor[(s, d)] =
                    rho * self.mean_diffusion[s] * grad[(s, d)] - v[s] * self.diffusion_sum[d];
            }
            for e in 0..nd {
                self.flux_tensor[(layout.mom(e), d)] = self.tau[(d, e)];
                self.flux_tensor[(ie, d)] += self.tau[(d, e)] * v[layout.vel(e)];
            }
            for s in 0..ns {
                let j_s = self.flux_tensor[(s, d)];
                self.flux_tensor[(ie, d)] += j_s * self.hs[s];
                self.flux_tensor[(iv, d)] += j_s * self.mean_eve[s];
            }
            self.flux_tensor[(ie, d)] += ktr * grad[(layout.t(), d)] + kve * grad[(layout.tve(), d)];
            self.flux_tensor[(iv, d)] += kve * grad[(layout.tve(), d)];
        }

        for k in 0..layout.n_var {
            flux[k] = (0..nd).map(|d| self.flux_tensor[(k, d)] * normal[d]).sum();
        }
    }

    /// Thin-layer Jacobians. `fv` is the projected flux just computed,
    /// `unit_normal` and `area` describe the face, `dist` the edge length.
    #[allow(clippy::too_many_arguments)]
    pub fn jacobians(
        &mut self,
        si: &FlowState,
        sj: &FlowState,
        unit_normal: &[f64],
        area: f64,
        dist: f64,
        fv: &DVector<f64>,
        jac_i: &mut DMatrix<f64>,
        jac_j: &mut DMatrix<f64>,
    ) {
        let layout = self.layout;
        let (ns, nd) = (layout.n_species, layout.n_dim);
        let (ie, iv) = (layout.energy(), layout.eve());
        // columns of dF/dV: rho_s, u, T, Tve share the conserved offsets
        let (col_t, col_tve) = (ie, iv);
        let mu = self.mean_viscosity;
        let (ktr, kve) = (self.mean_conductivity_tr, self.mean_conductivity_ve);
        let theta: f64 = unit_normal.iter().map(|n| n * n).sum();

        self.diffusion_jacobians(si, sj, theta, dist);

        self.dfdv_j.fill(0.0);
        for d in 0..nd {
            for e in 0..nd {
                let c = strain_coefficient(theta, unit_normal, d, e);
                self.dfdv_j[(layout.mom(d), layout.mom(e))] = mu * c / dist * area;
            }
            let pi_d: f64 = (0..nd)
                .map(|e| mu / dist * strain_coefficient(theta, unit_normal, d, e) * self.mean_prim[layout.vel(e)])
                .sum();
            self.dfdv_j[(ie, layout.mom(d))] = pi_d * area;
        }
        self.dfdv_j[(ie, col_t)] = ktr * theta / dist * area;
        self.dfdv_j[(ie, col_tve)] = kve * theta / dist * area;
        self.dfdv_j[(iv, col_tve)] = kve * theta / dist * area;

        self.dfdv_i.copy_from(&self.dfdv_j);
        self.dfdv_i.neg_mut();

        // terms from the mean state itself, split evenly between the cells
        let mut common_t = 0.0;
        let mut common_tve = 0.0;
        for s in 0..ns {
            common_t += 0.5 * fv[s] * (self.mixture.gas_constant(s) + self.mixture.cvtr(s));
            common_tve += 0.5 * fv[s] * self.mean_cvve[s];
        }
        for dfdv in [&mut self.dfdv_i, &mut self.dfdv_j] {
            for d in 0..nd {
                dfdv[(ie, layout.mom(d))] += 0.5 * fv[layout.mom(d)];
            }
            dfdv[(ie, col_t)] += common_t;
            dfdv[(ie, col_tve)] += common_tve;
            dfdv[(iv, col_tve)] += common_tve;
        }

        for (dfdv, djdr) in [(&mut self.dfdv_i, &self.djdr_i), (&mut self.dfdv_j, &self.djdr_j)] {
            for a in 0..ns {
                for b in 0..ns {
                    dfdv[(a, b)] -= djdr[(a, b)] * area;
                    dfdv[(ie, a)] -= djdr[(b, a)] * self.hs[b] * area;
                    dfdv[(iv, a)] -= djdr[(b, a)] * self.mean_eve[b] * area;
                }
            }
        }

        primitive_transform(&layout, si, &mut self.dvdu_i);
        primitive_transform(&layout, sj, &mut self.dvdu_j);
        jac_i.gemm(1.0, &self.dfdv_i, &self.dvdu_i, 0.0);
        jac_j.gemm(1.0, &self.dfdv_j, &self.dvdu_j, 0.0);
    }

    /// d(diffusion flux)/d(rho_s) of both cells for the secant mass-fraction
    /// gradient.
    fn diffusion_jacobians(&mut self, si: &FlowState, sj: &FlowState, theta: f64, dist: f64) {
        let layout = &self.layout;
        let ns = layout.n_species;
        let (rho_i, rho_j) = (si.v[layout.rho()], sj.v[layout.rho()]);
        let ds = &self.mean_diffusion;
        let (yi, yj) = (&self.prim_i, &self.prim_j);

        let g = theta / dist;
        let mut sum_y = 0.0;
        let mut sum_y_i = 0.0;
        let mut sum_y_j = 0.0;
        for s in 0..ns {
            sum_y_i += ds[s] * g * yi[s];
            sum_y_j += ds[s] * g * yj[s];
            sum_y += ds[s] * g * (yj[s] - yi[s]);
        }

        self.djdr_i.fill(0.0);
        self.djdr_j.fill(0.0);
        for a in 0..ns {
            let y_sum = yi[a] + yj[a];
            for b in 0..ns {
                self.djdr_j[(a, b)] += 0.5 * ds[a] * g * (yj[a] * rho_i / rho_j + yi[a]);
                self.djdr_i[(a, b)] += -0.5 * ds[a] * g * (yj[a] + yi[a] * rho_j / rho_i);

                self.djdr_j[(a, b)] += 0.25 * (yi[a] - rho_i / rho_j * yj[a]) * sum_y
                    + 0.25 * y_sum * (rho_i + rho_j) * ds[b] * g / rho_j
                    - 0.25 * y_sum * (rho_i + rho_j) * sum_y_j / rho_j;
                self.djdr_i[(a, b)] += 0.25 * (yj[a] - rho_j / rho_i * yi[a]) * sum_y
                    - 0.25 * y_sum * (rho_i + rho_j) * ds[b] * g / rho_i
                    + 0.25 * y_sum * (rho_i + rho_j) * sum_y_i / rho_i;
            }
            self.djdr_j[(a, a)] += -0.5 * ds[a] * g * (1.0 + rho_i / rho_j);
            self.djdr_i[(a, a)] += 0.5 * ds[a] * g * (1.0 + rho_j / rho_i);

            self.djdr_j[(a, a)] += 0.25 * (1.0 + rho_i / rho_j) * sum_y;
            self.djdr_i[(a, a)] += 0.25 * (1.0 + rho_j / rho_i) * sum_y;
        }
    }
}

/// θ·δ_de + n_d·n_e/3, the normal-normal contraction of the strain rate.
fn strain_coefficient(theta: f64, unit_normal: &[f64], d: usize, e: usize) -> f64 {
    let diagonal = if d == e { theta } else { 0.0 };
    diagonal + unit_normal[d] * unit_normal[e] / 3.0
}

/// d[rho_s, u, T, Tve]/dU of one cell.
fn primitive_transform(layout: &VariableLayout, state: &FlowState, dvdu: &mut DMatrix<f64>) {
    let rho = state.v[layout.rho()];
    dvdu.fill(0.0);
    for s in 0..layout.n_species {
        dvdu[(s, s)] = 1.0;
    }
    for d in 0..layout.n_dim {
        let row = layout.mom(d);
        for s in 0..layout.n_species {
            dvdu[(row, s)] = -state.v[layout.vel(d)] / rho;
        }
        dvdu[(row, row)] = 1.0 / rho;
    }
    for k in 0..layout.n_var {
        dvdu[(layout.energy(), k)] = state.dtdu[k];
        dvdu[(layout.eve(), k)] = state.dtvedu[k];
    }
}

fn edge_length(coord_i: &[f64], coord_j: &[f64]) -> f64 {
    coord_i
        .iter()
        .zip(coord_j)
        .map(|(a, b)| (b - a) * (b - a))
        .sum::<f64>()
        .sqrt()
}

#[derive(Debug, Clone)]
pub struct AvgGrad {
    kernel: ViscousKernel,
    implicit: bool,
    unit_normal: Vec<f64>,
}

impl AvgGrad {
    pub fn new(layout: VariableLayout, mixture: Arc<dyn MixtureCalculator>, implicit: bool) -> Self {
        Self {
            kernel: ViscousKernel::new(layout, mixture),
            implicit,
            unit_normal: vec![0.0; layout.n_dim],
        }
    }

    pub fn kernel(&self) -> &ViscousKernel {
        &self.kernel
    }
}

impl ViscousFlux for AvgGrad {
    fn name(&self) -> &'static str {
        "average gradient"
    }

    fn compute_residual(&mut self, edge: &ViscousEdge, out: &mut FluxResult) {
        let area = unit_normal(edge.normal, &mut self.unit_normal);
        self.kernel.average(edge);
        self.kernel.projected_flux(edge.normal, &mut out.residual);
        if self.implicit {
            let dist = edge_length(edge.coord_i, edge.coord_j);
            self.kernel.jacobians(
                edge.state_i,
                edge.state_j,
                &self.unit_normal,
                area,
                dist,
                &out.residual,
                &mut out.jacobian_i,
                &mut out.jacobian_j,
            );
        }
    }
}

#[derive(Debug, Clone)]
pub struct AvgGradCorrected {
    kernel: ViscousKernel,
    implicit: bool,
    unit_normal: Vec<f64>,
}

impl AvgGradCorrected {
    pub fn new(layout: VariableLayout, mixture: Arc<dyn MixtureCalculator>, implicit: bool) -> Self {
        Self {
            kernel: ViscousKernel::new(layout, mixture),
            implicit,
            unit_normal: vec![0.0; layout.n_dim],
        }
    }

    pub fn kernel(&self) -> &ViscousKernel {
        &self.kernel
    }
}

impl ViscousFlux for AvgGradCorrected {
    fn name(&self) -> &'static str {
        "corrected average gradient"
    }

    fn compute_residual(&mut self, edge: &ViscousEdge, out: &mut FluxResult) {
        let area = unit_normal(edge.normal, &mut self.unit_normal);
        self.kernel.average(edge);
        self.kernel.correct_along_edge(edge.coord_i, edge.coord_j);
        self.kernel.projected_flux(edge.normal, &mut out.residual);
        if self.implicit {
            let dist = edge_length(edge.coord_i, edge.coord_j);
            self.kernel.jacobians(
                edge.state_i,
                edge.state_j,
                &self.unit_normal,
                area,
                dist,
                &out.residual,
                &mut out.jacobian_i,
                &mut out.jacobian_j,
            );
        }
    }
}
