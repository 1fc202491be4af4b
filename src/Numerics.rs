/// setup-time error type of the schemes
pub mod errors;
/// layouts of the conserved/primitive vectors and the per-cell state bundle
pub mod variables;
/// face area, unit normal and tangent basis
pub mod geometry;
/// projected flux, projected Jacobian and the eigen-decomposition of the
/// two-temperature Euler system
pub mod eigenstructure;
/// # Convective fluxes
/// every scheme implements `ConvectiveFlux`: from the states of the two cells
/// sharing an edge it fills the numerical flux F·A and, for implicit runs, the
/// Jacobians with respect to U_i and U_j.
/// ```
/// use tne2_numerics::Numerics::convective_api::{ConvectiveEdge, ConvectiveFlux, FluxResult, create_convective};
/// use tne2_numerics::Numerics::variables::FlowState;
/// use tne2_numerics::settings::{ConvectiveKind, NumericsConfig};
/// let config = NumericsConfig { convective: ConvectiveKind::Roe, ..NumericsConfig::default() };
/// let gas = config.build_mixture().unwrap();
/// let layout = config.layout(gas.as_ref()).unwrap();
/// let rho_s = [6.5e-3, 1.4e-3, 3.0e-4, 9.0e-4, 1.2e-3];
/// let state = FlowState::from_primitives(&layout, gas.as_ref(), &rho_s, &[800.0, 0.0], 3000.0, 2500.0).unwrap();
/// let mut scheme = create_convective(config.convective, layout, gas, &config).unwrap();
/// let mut out = FluxResult::new(&layout);
/// scheme.compute_residual(&ConvectiveEdge::new(&state, &state, &[1.0, 0.0]), &mut out);
/// assert!(out.residual.iter().all(|f| f.is_finite()));
/// ```
pub mod convective_api;
/// Roe flux-difference splitting with the Harten entropy fix
pub mod roe;
/// modified Steger-Warming flux-vector splitting
pub mod msw;
/// AUSM with the shared AUSM-family Jacobian
pub mod ausm;
/// AUSM+-up2, all-speed AUSM variant
pub mod ausm_plus_up2;
/// AUSMPW+ with pressure-based weights and exact linearisation
pub mod ausmpw_plus;
/// centered Lax scheme with scalar dissipation
pub mod centered_lax;
/// # Viscous fluxes
/// average-gradient discretisation of diffusion, shear stress and heat
/// conduction with the thin-layer Jacobian
pub mod viscous_api;
pub mod avg_grad;
/// # Source terms
/// finite-rate chemistry, Landau-Teller vibrational relaxation and the
/// axisymmetric geometric source
pub mod source_api;
pub mod chemistry;
pub mod vib_relaxation;
pub mod axisymmetric;

#[cfg(test)]
pub mod test_helpers;
#[cfg(test)]
mod source_tests;
