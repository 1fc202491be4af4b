//! Geometric source of the 2D axisymmetric equations,
//! (1/y)·[rho_s v, rho u v, rho v², rho h v, rhoEve v] integrated over the
//! cell. y is the radial (second) coordinate.
use crate::Numerics::source_api::{SourceCell, SourceResult, SourceTerm};
use crate::Numerics::variables::VariableLayout;

#[derive(Debug, Clone)]
pub struct Axisymmetric {
    layout: VariableLayout,
    implicit: bool,
}

impl Axisymmetric {
    pub fn new(layout: VariableLayout, implicit: bool) -> Self {
        Self { layout, implicit }
    }
}

impl SourceTerm for Axisymmetric {
    fn name(&self) -> &'static str {
        "axisymmetric"
    }

    fn compute_source(&mut self, cell: &SourceCell, out: &mut SourceResult) {
        let layout = &self.layout;
        let state = cell.state;
        let (u, v) = (&state.u, &state.v);
        let ns = layout.n_species;
        let (im_x, im_y) = (layout.mom(0), layout.mom(1));
        let (ie, iv) = (layout.energy(), layout.eve());

        // on the axis the term vanishes
        let yinv = if cell.coord[1] != 0.0 { 1.0 / cell.coord[1] } else { 0.0 };
        let rho = v[layout.rho()];
        let (rhou, rhov) = (u[im_x], u[im_y]);
        let rho_eve = u[iv];
        let h = v[layout.h()];
        let scale = yinv * cell.volume;

        for s in 0..ns {
            out.residual[s] = rhov * u[s] / rho * scale;
        }
        out.residual[im_x] = rhov * rhou / rho * scale;
        out.residual[im_y] = rhov * rhov / rho * scale;
        out.residual[ie] = rhov * h * scale;
        out.residual[iv] = rhov * rho_eve / rho * scale;
        out.finish(cell.volume);

        if !self.implicit {
            return;
        }
        let jac = &mut out.jacobian;
        jac.fill(0.0);

        for s in 0..ns {
            let ys = u[s] / rho;
            for k in 0..ns {
                jac[(s, k)] = -ys * rhov / rho;
            }
            jac[(s, s)] += rhov / rho;
            jac[(s, im_y)] = ys;
        }

        for k in 0..ns {
            jac[(im_x, k)] = -rhou * rhov / (rho * rho);
            jac[(im_y, k)] = -rhov * rhov / (rho * rho);
            jac[(iv, k)] = -rho_eve * rhov / (rho * rho);
        }
        jac[(im_x, im_x)] = rhov / rho;
        jac[(im_x, im_y)] = rhou / rho;
        jac[(im_y, im_y)] = 2.0 * rhov / rho;
        jac[(iv, im_y)] = rho_eve / rho;
        jac[(iv, iv)] = rhov / rho;

        // rho v h = v (rhoE + P)
        for k in 0..layout.n_var {
            jac[(ie, k)] = state.dpdu[k] * rhov / rho;
        }
        for k in 0..ns {
            jac[(ie, k)] -= h * rhov / rho;
        }
        jac[(ie, im_y)] += h;
        jac[(ie, ie)] += rhov / rho;

        *jac *= scale;
    }
}
