//! # tne2_numerics
//!
//! Numerical kernels of a finite-volume solver for two-temperature
//! thermochemical nonequilibrium flows: convective fluxes (Roe, modified
//! Steger-Warming, AUSM, AUSM+-up2, AUSMPW+, centered Lax), average-gradient
//! viscous fluxes and volumetric sources (finite-rate chemistry, vibrational
//! relaxation, axisymmetry), each with its Jacobian for implicit time
//! integration. The gas model sits behind the `MixtureCalculator` trait.
#[allow(non_snake_case)]
pub mod Numerics;
#[allow(non_snake_case)]
pub mod Thermodynamics;
#[allow(non_snake_case)]
pub mod Utils;
pub mod settings;
