use log::{error, info};
use nalgebra::{DMatrix, DVector};
use std::env;
use std::sync::Arc;
use tne2_numerics::Numerics::convective_api::{
    ConvectiveEdge, ConvectiveFlux, FluxResult, create_convective,
};
use tne2_numerics::Numerics::errors::NumericsError;
use tne2_numerics::Numerics::source_api::{SourceCell, SourceResult, SourceTerm, create_sources};
use tne2_numerics::Numerics::variables::{FlowState, VariableLayout};
use tne2_numerics::Numerics::viscous_api::{
    CellTransport, ViscousEdge, ViscousFlux, create_viscous,
};
use tne2_numerics::Thermodynamics::mixture_api::MixtureCalculator;
use tne2_numerics::Utils::logger::init_logger;
use tne2_numerics::Utils::pretty_print::{conserved_labels, print_matrix, print_vectors};
use tne2_numerics::settings::{ConvectiveKind, NumericsConfig};

const ALL_CONVECTIVE: [ConvectiveKind; 6] = [
    ConvectiveKind::Roe,
    ConvectiveKind::Msw,
    ConvectiveKind::Ausm,
    ConvectiveKind::AusmPlusUp2,
    ConvectiveKind::AusmpwPlus,
    ConvectiveKind::CenteredLax,
];

/// Post-shock-like pair of cells: the right one denser, hotter and slower.
fn demo_states(
    layout: &VariableLayout,
    gas: &dyn MixtureCalculator,
) -> Result<(FlowState, FlowState), NumericsError> {
    let n = gas.n_species();
    // mostly the first species, a little of every other one
    let composition: Vec<f64> = (0..n).map(|s| if s == 0 { 0.75 } else { 0.25 / (n - 1).max(1) as f64 }).collect();
    let rho_l: Vec<f64> = composition.iter().map(|y| 2e-3 * y).collect();
    let rho_r: Vec<f64> = composition.iter().map(|y| 3e-3 * y).collect();
    let mut u_l = vec![0.0; layout.n_dim];
    let mut u_r = vec![0.0; layout.n_dim];
    u_l[0] = 1500.0;
    u_r[0] = 1100.0;
    u_l[1] = 50.0;
    let left = FlowState::from_primitives(layout, gas, &rho_l, &u_l, 4000.0, 3000.0)?;
    let right = FlowState::from_primitives(layout, gas, &rho_r, &u_r, 6000.0, 4200.0)?;
    Ok((left, right))
}

/// Linear primitive field through the two cells along x.
fn demo_gradient(layout: &VariableLayout, left: &FlowState, right: &FlowState, dx: f64) -> DMatrix<f64> {
    let mut grad = DMatrix::zeros(layout.n_prim_var_grad, layout.n_dim);
    for k in 0..layout.n_prim_var_grad {
        grad[(k, 0)] = (right.v[k] - left.v[k]) / dx;
    }
    grad
}

fn run(config: &NumericsConfig) -> Result<(), NumericsError> {
    let gas: Arc<dyn MixtureCalculator> = config.build_mixture()?;
    let layout = config.layout(gas.as_ref())?;
    let labels = conserved_labels(&layout, gas.as_ref());
    let (left, right) = demo_states(&layout, gas.as_ref())?;

    let mut normal = vec![0.0; layout.n_dim];
    normal[0] = 1e-2;
    let mut out = FluxResult::new(&layout);
    let mut fluxes: Vec<(String, DVector<f64>)> = Vec::new();
    for kind in ALL_CONVECTIVE {
        let mut scheme = create_convective(kind, layout, gas.clone(), config)?;
        let edge = ConvectiveEdge::new(&left, &right, &normal)
            .with_neighbors(4, 4)
            .with_spectral_radii(40.0, 45.0);
        scheme.compute_residual(&edge, &mut out);
        fluxes.push((scheme.name().to_string(), out.residual.clone()));
        if kind == config.convective && config.implicit {
            print_matrix(&format!("{} dF/dU_i", scheme.name()), &labels, &out.jacobian_i);
        }
    }
    let columns: Vec<(&str, &DVector<f64>)> = fluxes.iter().map(|(n, f)| (n.as_str(), f)).collect();
    print_vectors("convective residuals", &labels, &columns);

    let dx = 1e-3;
    let mut coord_j = vec![0.0; layout.n_dim];
    coord_j[0] = dx;
    let coord_i = vec![0.0; layout.n_dim];
    if let Some(mut viscous) = create_viscous(config.viscous, layout, gas.clone(), config)? {
        let grad = demo_gradient(&layout, &left, &right, dx);
        let diffusion = DVector::from_element(layout.n_species, 1e-4);
        let transport_i = CellTransport::new(diffusion.clone(), 1.2e-4, 0.25, 0.05);
        let transport_j = CellTransport::new(diffusion, 1.6e-4, 0.32, 0.07);
        let edge = ViscousEdge {
            state_i: &left,
            state_j: &right,
            grad_i: &grad,
            grad_j: &grad,
            transport_i: &transport_i,
            transport_j: &transport_j,
            coord_i: &coord_i,
            coord_j: &coord_j,
            normal: &normal,
        };
        viscous.compute_residual(&edge, &mut out);
        print_vectors(viscous.name(), &labels, &[("Fv", &out.residual)]);
    }

    let mut sources = create_sources(layout, gas.clone(), config)?;
    let mut result = SourceResult::new(&layout);
    let mut cell_coord = vec![0.0; layout.n_dim];
    cell_coord[1] = 0.05;
    for source in sources.iter_mut() {
        source.compute_source(&SourceCell::new(&right, 1e-6, &cell_coord), &mut result);
        print_vectors(
            source.name(),
            &labels,
            &[("residual", &result.residual), ("source", &result.source)],
        );
    }
    info!("demo finished");
    Ok(())
}

pub fn main() {
    let config = match env::args().nth(1) {
        Some(path) => match NumericsConfig::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("cannot read configuration {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => NumericsConfig {
            chemistry: true,
            vib_relaxation: true,
            axisymmetric: true,
            ..NumericsConfig::default()
        },
    };
    if let Err(e) = init_logger(&config) {
        eprintln!("logger setup failed: {}", e);
    }
    if let Err(e) = run(&config) {
        error!("{}", e);
        std::process::exit(1);
    }
}
