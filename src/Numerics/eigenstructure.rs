//! Inviscid flux projected on a face normal, its exact Jacobian, and the
//! eigen-decomposition A = P Λ P⁻¹ shared by the Roe and Steger-Warming
//! schemes.
//!
//! Mode ordering of Λ and of the columns of P:
//! species (nS), shear (nDim-1), +acoustic, -acoustic, vibrational.
use crate::Numerics::geometry::create_basis;
use crate::Numerics::variables::VariableLayout;
use nalgebra::{DMatrix, DVector};

/// F·n = [rho_s un, m un + P n, rho h un, rhoEve un] for any normal length.
pub fn projected_flux(
    layout: &VariableLayout,
    u: &DVector<f64>,
    v: &DVector<f64>,
    normal: &[f64],
    flux: &mut DVector<f64>,
) {
    let un = layout.projected_velocity(v, normal);
    let p = v[layout.p()];
    for s in 0..layout.n_species {
        flux[s] = u[s] * un;
    }
    for d in 0..layout.n_dim {
        flux[layout.mom(d)] = u[layout.mom(d)] * un + p * normal[d];
    }
    flux[layout.energy()] = v[layout.rho()] * v[layout.h()] * un;
    flux[layout.eve()] = u[layout.eve()] * un;
}

/// scale · d(F·n)/dU, overwriting `jac`.
pub fn projected_jacobian(
    layout: &VariableLayout,
    u: &DVector<f64>,
    v: &DVector<f64>,
    dpdu: &DVector<f64>,
    normal: &[f64],
    scale: f64,
    jac: &mut DMatrix<f64>,
) {
    let ns = layout.n_species;
    let nd = layout.n_dim;
    let (ie, iv) = (layout.energy(), layout.eve());
    let rho = v[layout.rho()];
    let h = v[layout.h()];
    let eve = u[iv] / rho;
    let beta = dpdu[ie];
    let phi = dpdu[iv];
    let un = layout.projected_velocity(v, normal);

    jac.fill(0.0);
    for s in 0..ns {
        let ys = u[s] / rho;
        for k in 0..ns {
            jac[(s, k)] = -ys * un;
        }
        jac[(s, s)] += un;
        for e in 0..nd {
            jac[(s, layout.mom(e))] = ys * normal[e];
        }
    }
    for d in 0..nd {
        let row = layout.mom(d);
        let ud = v[layout.vel(d)];
        for k in 0..ns {
            jac[(row, k)] = -ud * un + dpdu[k] * normal[d];
        }
        for e in 0..nd {
            jac[(row, layout.mom(e))] = ud * normal[e] - beta * v[layout.vel(e)] * normal[d];
        }
        jac[(row, row)] += un;
        jac[(row, ie)] = beta * normal[d];
        jac[(row, iv)] = phi * normal[d];
    }
    for k in 0..ns {
        jac[(ie, k)] = (dpdu[k] - h) * un;
        jac[(iv, k)] = -eve * un;
    }
    for e in 0..nd {
        jac[(ie, layout.mom(e))] = h * normal[e] - beta * v[layout.vel(e)] * un;
        jac[(iv, layout.mom(e))] = eve * normal[e];
    }
    jac[(ie, ie)] = (1.0 + beta) * un;
    jac[(ie, iv)] = phi * un;
    jac[(iv, iv)] = un;

    if scale != 1.0 {
        jac.scale_mut(scale);
    }
}

/// Eigenvalues for the projected velocity `un` and sound speed `a`.
pub fn eigenvalues(layout: &VariableLayout, un: f64, a: f64, lambda: &mut DVector<f64>) {
    let (ns, nd) = (layout.n_species, layout.n_dim);
    for k in 0..(ns + nd - 1) {
        lambda[k] = un;
    }
    lambda[ns + nd - 1] = un + a;
    lambda[ns + nd] = un - a;
    lambda[ns + nd + 1] = un;
}

/// Right and left eigenvectors of the projected Jacobian plus reusable work
/// space, sized once for a layout.
#[derive(Debug, Clone)]
pub struct Eigensystem {
    pub p: DMatrix<f64>,
    pub p_inv: DMatrix<f64>,
    work: DMatrix<f64>,
    l: [f64; 3],
    m: [f64; 3],
}

impl Eigensystem {
    pub fn new(layout: &VariableLayout) -> Self {
        let n = layout.n_var;
        Self {
            p: DMatrix::zeros(n, n),
            p_inv: DMatrix::zeros(n, n),
            work: DMatrix::zeros(n, n),
            l: [0.0; 3],
            m: [0.0; 3],
        }
    }

    /// Fills P and P⁻¹ at the state (u, v, dpdu) for a unit normal.
    pub fn assemble(
        &mut self,
        layout: &VariableLayout,
        u: &DVector<f64>,
        v: &DVector<f64>,
        dpdu: &DVector<f64>,
        unit_normal: &[f64],
    ) {
        create_basis(unit_normal, &mut self.l, &mut self.m);
        self.assemble_p(layout, u, v, dpdu, unit_normal);
        self.assemble_p_inv(layout, u, v, dpdu, unit_normal);
    }

    fn assemble_p(
        &mut self,
        layout: &VariableLayout,
        u: &DVector<f64>,
        v: &DVector<f64>,
        dpdu: &DVector<f64>,
        n: &[f64],
    ) {
        let (ns, nd) = (layout.n_species, layout.n_dim);
        let (ie, iv) = (layout.energy(), layout.eve());
        let rho = v[layout.rho()];
        let a = v[layout.a()];
        let h = v[layout.h()];
        let eve = u[iv] / rho;
        let beta = dpdu[ie];
        let phi = dpdu[iv];
        let sq_vel = layout.velocity_squared(v);
        let un = layout.projected_velocity(v, n);
        let vel = |d: usize| v[layout.vel(d)];
        let tangents = [self.l, self.m];
        let p = &mut self.p;
        p.fill(0.0);

        for k in 0..ns {
            p[(k, k)] = 1.0;
            for d in 0..nd {
                p[(layout.mom(d), k)] = vel(d);
            }
            p[(ie, k)] = (beta * sq_vel - dpdu[k] - phi * eve) / beta;
            p[(iv, k)] = eve;
        }
        for (t, tangent) in tangents.iter().take(nd - 1).enumerate() {
            let col = ns + t;
            let mut ut = 0.0;
            for d in 0..nd {
                p[(layout.mom(d), col)] = rho * tangent[d];
                ut += vel(d) * tangent[d];
            }
            p[(ie, col)] = rho * ut;
        }
        for (col, sign) in [(ns + nd - 1, 1.0), (ns + nd, -1.0)] {
            for s in 0..ns {
                p[(s, col)] = u[s] / rho;
            }
            for d in 0..nd {
                p[(layout.mom(d), col)] = vel(d) + sign * a * n[d];
            }
            p[(ie, col)] = h + sign * a * un;
            p[(iv, col)] = eve;
        }
        let col = ns + nd + 1;
        p[(ie, col)] = -phi * rho / beta;
        p[(iv, col)] = rho;
    }

    fn assemble_p_inv(
        &mut self,
        layout: &VariableLayout,
        u: &DVector<f64>,
        v: &DVector<f64>,
        dpdu: &DVector<f64>,
        n: &[f64],
    ) {
        let (ns, nd) = (layout.n_species, layout.n_dim);
        let (ie, iv) = (layout.energy(), layout.eve());
        let rho = v[layout.rho()];
        let a = v[layout.a()];
        let a2 = a * a;
        let eve = u[iv] / rho;
        let beta = dpdu[ie];
        let phi = dpdu[iv];
        let un = layout.projected_velocity(v, n);
        let vel = |d: usize| v[layout.vel(d)];
        let tangents = [self.l, self.m];
        let pi = &mut self.p_inv;
        pi.fill(0.0);

        for s in 0..ns {
            let ys = u[s] / rho;
            for k in 0..ns {
                pi[(s, k)] = -ys * dpdu[k] / a2;
            }
            pi[(s, s)] += 1.0;
            for d in 0..nd {
                pi[(s, layout.mom(d))] = ys * beta * vel(d) / a2;
            }
            pi[(s, ie)] = -ys * beta / a2;
            pi[(s, iv)] = -ys * phi / a2;
        }
        for (t, tangent) in tangents.iter().take(nd - 1).enumerate() {
            let row = ns + t;
            let ut: f64 = (0..nd).map(|d| vel(d) * tangent[d]).sum();
            for k in 0..ns {
                pi[(row, k)] = -ut / rho;
            }
            for d in 0..nd {
                pi[(row, layout.mom(d))] = tangent[d] / rho;
            }
        }
        for (row, sign) in [(ns + nd - 1, 1.0), (ns + nd, -1.0)] {
            for k in 0..ns {
                pi[(row, k)] = 0.5 * (dpdu[k] / a2 - sign * un / a);
            }
            for d in 0..nd {
                pi[(row, layout.mom(d))] = 0.5 * (-beta * vel(d) / a2 + sign * n[d] / a);
            }
            pi[(row, ie)] = 0.5 * beta / a2;
            pi[(row, iv)] = 0.5 * phi / a2;
        }
        let row = ns + nd + 1;
        for k in 0..ns {
            pi[(row, k)] = -eve / rho;
        }
        pi[(row, iv)] = 1.0 / rho;
    }

    /// out = P · diag(lambda) · P⁻¹, using the internal work matrix.
    pub fn product(&mut self, lambda: &DVector<f64>, out: &mut DMatrix<f64>) {
        self.work.copy_from(&self.p);
        for (j, lam) in lambda.iter().enumerate() {
            self.work.column_mut(j).scale_mut(*lam);
        }
        out.gemm(1.0, &self.work, &self.p_inv, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Numerics::test_helpers::{air_gas, air_state, assert_matrix_close, fd_jacobian};
    use crate::Numerics::variables::FlowState;
    use approx::assert_relative_eq;

    #[test]
    fn eigenvectors_are_inverse_pair() {
        for nd in [2, 3] {
            let gas = air_gas();
            let (layout, state) = air_state(&gas, nd, 6000.0, 4500.0, 1800.0);
            let normal: Vec<f64> = if nd == 2 { vec![0.6, 0.8] } else { vec![0.48, -0.6, 0.64] };
            let mut eig = Eigensystem::new(&layout);
            eig.assemble(&layout, &state.u, &state.v, &state.dpdu, &normal);
            let product = &eig.p * &eig.p_inv;
            let identity = DMatrix::<f64>::identity(layout.n_var, layout.n_var);
            assert_matrix_close(&product, &identity, 1e-9, 1e-9);
        }
    }

    #[test]
    fn decomposition_reproduces_projected_jacobian() {
        for nd in [2, 3] {
            let gas = air_gas();
            let (layout, state) = air_state(&gas, nd, 6000.0, 4500.0, 1800.0);
            let normal: Vec<f64> = if nd == 2 { vec![0.6, 0.8] } else { vec![0.48, -0.6, 0.64] };
            let mut eig = Eigensystem::new(&layout);
            eig.assemble(&layout, &state.u, &state.v, &state.dpdu, &normal);
            let mut lambda = DVector::zeros(layout.n_var);
            let un = layout.projected_velocity(&state.v, &normal);
            eigenvalues(&layout, un, state.v[layout.a()], &mut lambda);
            let mut decomposed = DMatrix::zeros(layout.n_var, layout.n_var);
            eig.product(&lambda, &mut decomposed);

            let mut exact = DMatrix::zeros(layout.n_var, layout.n_var);
            projected_jacobian(&layout, &state.u, &state.v, &state.dpdu, &normal, 1.0, &mut exact);
            let scale = exact.amax();
            assert_matrix_close(&decomposed, &exact, 1e-8, 1e-10 * scale);
        }
    }

    #[test]
    fn jacobian_times_state_is_flux() {
        let gas = air_gas();
        let (layout, state) = air_state(&gas, 2, 9000.0, 7000.0, 3000.0);
        let normal = [0.3, -1.2];
        let mut jac = DMatrix::zeros(layout.n_var, layout.n_var);
        projected_jacobian(&layout, &state.u, &state.v, &state.dpdu, &normal, 1.0, &mut jac);
        let mut flux = DVector::zeros(layout.n_var);
        projected_flux(&layout, &state.u, &state.v, &normal, &mut flux);
        let au = &jac * &state.u;
        for k in 0..layout.n_var {
            assert_relative_eq!(au[k], flux[k], max_relative = 1e-9, epsilon = 1e-9 * flux.amax());
        }
    }

    #[test]
    fn projected_jacobian_matches_finite_differences() {
        let gas = air_gas();
        let (layout, state) = air_state(&gas, 3, 7000.0, 5000.0, 2200.0);
        let normal = [0.2, 0.5, -0.4];
        let mut jac = DMatrix::zeros(layout.n_var, layout.n_var);
        projected_jacobian(&layout, &state.u, &state.v, &state.dpdu, &normal, 1.0, &mut jac);
        let fd = fd_jacobian(&state.u, |u| {
            let s = FlowState::from_conserved(&layout, gas.as_ref(), u.clone()).unwrap();
            let mut f = DVector::zeros(layout.n_var);
            projected_flux(&layout, &s.u, &s.v, &normal, &mut f);
            f
        });
        assert_matrix_close(&jac, &fd, 1e-5, 1e-7 * jac.amax());
    }

    #[test]
    fn acoustic_modes_bracket_convective_speed() {
        let layout = VariableLayout::new(2, 2).unwrap();
        let mut lambda = DVector::zeros(layout.n_var);
        eigenvalues(&layout, 100.0, 340.0, &mut lambda);
        assert_eq!(lambda.as_slice(), &[100.0, 100.0, 100.0, 440.0, -240.0, 100.0]);
    }
}
