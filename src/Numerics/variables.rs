//! Index layout of the conserved and primitive vectors and the per-cell state
//! bundle consumed by every flux and source kernel.
//!
//! Conserved: `[rho_s (nS), rho*u (nDim), rhoE, rhoEve]`.
//! Primitive: `[rho_s (nS), T, Tve, u (nDim), P, rho, h, a, rhoCvtr, rhoCvve]`.
//! Gradients of primitives share the primitive layout.
use crate::Numerics::errors::NumericsError;
use crate::Thermodynamics::mixture_api::MixtureCalculator;
use nalgebra::DVector;

/// Named offsets into the flat state buffers for a given (nSpecies, nDim).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableLayout {
    pub n_species: usize,
    pub n_dim: usize,
    pub n_var: usize,
    pub n_prim_var: usize,
    pub n_prim_var_grad: usize,
}

impl VariableLayout {
    pub fn new(n_species: usize, n_dim: usize) -> Result<Self, NumericsError> {
        if n_dim != 2 && n_dim != 3 {
            return Err(NumericsError::UnsupportedDimension(n_dim));
        }
        if n_species == 0 {
            return Err(NumericsError::EmptyMixture);
        }
        let n_prim_var = n_species + n_dim + 8;
        Ok(Self {
            n_species,
            n_dim,
            n_var: n_species + n_dim + 2,
            n_prim_var,
            n_prim_var_grad: n_prim_var,
        })
    }

    // conserved offsets
    #[inline]
    pub fn mom(&self, dim: usize) -> usize {
        self.n_species + dim
    }
    #[inline]
    pub fn energy(&self) -> usize {
        self.n_species + self.n_dim
    }
    #[inline]
    pub fn eve(&self) -> usize {
        self.n_species + self.n_dim + 1
    }

    // primitive offsets
    #[inline]
    pub fn rhos(&self, species: usize) -> usize {
        species
    }
    #[inline]
    pub fn t(&self) -> usize {
        self.n_species
    }
    #[inline]
    pub fn tve(&self) -> usize {
        self.n_species + 1
    }
    #[inline]
    pub fn vel(&self, dim: usize) -> usize {
        self.n_species + 2 + dim
    }
    #[inline]
    pub fn p(&self) -> usize {
        self.n_species + self.n_dim + 2
    }
    #[inline]
    pub fn rho(&self) -> usize {
        self.n_species + self.n_dim + 3
    }
    #[inline]
    pub fn h(&self) -> usize {
        self.n_species + self.n_dim + 4
    }
    #[inline]
    pub fn a(&self) -> usize {
        self.n_species + self.n_dim + 5
    }
    #[inline]
    pub fn rhocvtr(&self) -> usize {
        self.n_species + self.n_dim + 6
    }
    #[inline]
    pub fn rhocvve(&self) -> usize {
        self.n_species + self.n_dim + 7
    }

    /// Velocity dotted with `normal` (any length, area-weighted or unit).
    pub fn projected_velocity(&self, v: &DVector<f64>, normal: &[f64]) -> f64 {
        (0..self.n_dim).map(|d| v[self.vel(d)] * normal[d]).sum()
    }

    pub fn velocity_squared(&self, v: &DVector<f64>) -> f64 {
        (0..self.n_dim).map(|d| v[self.vel(d)] * v[self.vel(d)]).sum()
    }
}

/// Everything a kernel needs to know about one control volume.
///
/// `eve` and `cvve` are per-species values at Tve. The derivative vectors are
/// with respect to the conserved variables.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowState {
    pub u: DVector<f64>,
    pub v: DVector<f64>,
    pub dpdu: DVector<f64>,
    pub dtdu: DVector<f64>,
    pub dtvedu: DVector<f64>,
    pub eve: DVector<f64>,
    pub cvve: DVector<f64>,
}

impl FlowState {
    pub fn from_conserved(
        layout: &VariableLayout,
        mixture: &dyn MixtureCalculator,
        u: DVector<f64>,
    ) -> Result<Self, NumericsError> {
        if u.len() != layout.n_var {
            return Err(NumericsError::LayoutMismatch {
                expected: layout.n_var,
                found: u.len(),
            });
        }
        if mixture.n_species() != layout.n_species {
            return Err(NumericsError::LayoutMismatch {
                expected: layout.n_species,
                found: mixture.n_species(),
            });
        }
        let ns = layout.n_species;
        let mut v = DVector::zeros(layout.n_prim_var);
        mixture.cons_to_prim(layout, &u, &mut v)?;

        let mut eve = DVector::zeros(ns);
        let mut cvve = DVector::zeros(ns);
        mixture.calc_eve(v[layout.tve()], &mut eve);
        mixture.calc_cvve(v[layout.tve()], &mut cvve);

        let mut dpdu = DVector::zeros(layout.n_var);
        let mut dtdu = DVector::zeros(layout.n_var);
        let mut dtvedu = DVector::zeros(layout.n_var);
        mixture.calc_dpdu(layout, &v, &mut dpdu);
        mixture.calc_dtdu(layout, &v, &mut dtdu);
        mixture.calc_dtvedu(layout, &v, &eve, &mut dtvedu);

        Ok(Self {
            u,
            v,
            dpdu,
            dtdu,
            dtvedu,
            eve,
            cvve,
        })
    }

    /// Builds the state from species densities, velocity and both temperatures.
    pub fn from_primitives(
        layout: &VariableLayout,
        mixture: &dyn MixtureCalculator,
        rho_s: &[f64],
        velocity: &[f64],
        t: f64,
        tve: f64,
    ) -> Result<Self, NumericsError> {
        if rho_s.len() != layout.n_species {
            return Err(NumericsError::LayoutMismatch {
                expected: layout.n_species,
                found: rho_s.len(),
            });
        }
        if velocity.len() != layout.n_dim {
            return Err(NumericsError::LayoutMismatch {
                expected: layout.n_dim,
                found: velocity.len(),
            });
        }
        let mut u = DVector::zeros(layout.n_var);
        mixture.prim_to_cons(layout, rho_s, velocity, t, tve, &mut u);
        Self::from_conserved(layout, mixture, u)
    }

    pub fn density(&self, layout: &VariableLayout) -> f64 {
        self.v[layout.rho()]
    }

    pub fn pressure(&self, layout: &VariableLayout) -> f64 {
        self.v[layout.p()]
    }

    pub fn sound_speed(&self, layout: &VariableLayout) -> f64 {
        self.v[layout.a()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_offsets_are_contiguous() {
        let layout = VariableLayout::new(5, 3).unwrap();
        assert_eq!(layout.n_var, 10);
        assert_eq!(layout.n_prim_var, 16);
        assert_eq!(layout.t(), 5);
        assert_eq!(layout.tve(), 6);
        assert_eq!(layout.vel(0), 7);
        assert_eq!(layout.vel(2), 9);
        assert_eq!(layout.p(), 10);
        assert_eq!(layout.rho(), 11);
        assert_eq!(layout.h(), 12);
        assert_eq!(layout.a(), 13);
        assert_eq!(layout.rhocvtr(), 14);
        assert_eq!(layout.rhocvve(), 15);
        assert_eq!(layout.mom(0), 5);
        assert_eq!(layout.energy(), 8);
        assert_eq!(layout.eve(), 9);
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(matches!(
            VariableLayout::new(2, 1),
            Err(NumericsError::UnsupportedDimension(1))
        ));
        assert!(matches!(
            VariableLayout::new(0, 2),
            Err(NumericsError::EmptyMixture)
        ));
    }
}
