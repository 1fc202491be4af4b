use crate::Numerics::variables::VariableLayout;
use crate::Thermodynamics::mixture_api::MixtureCalculator;
use nalgebra::{DMatrix, DVector};
use prettytable::{Cell, Row, Table};

const AXES: [&str; 3] = ["u", "v", "w"];

/// Row names of a conserved vector: species densities, momenta, energies.
pub fn conserved_labels(layout: &VariableLayout, mixture: &dyn MixtureCalculator) -> Vec<String> {
    let mut labels: Vec<String> = mixture
        .species()
        .iter()
        .map(|s| format!("rho_{}", s.name))
        .collect();
    labels.extend(AXES.iter().take(layout.n_dim).map(|a| format!("rho{}", a)));
    labels.push("rhoE".to_string());
    labels.push("rhoEve".to_string());
    labels
}

/// One row per component, one column per named vector.
pub fn vectors_table(labels: &[String], columns: &[(&str, &DVector<f64>)]) -> Table {
    let mut table = Table::new();
    let mut header = vec![Cell::new("")];
    header.extend(columns.iter().map(|(name, _)| Cell::new(name)));
    table.add_row(Row::new(header));
    for (i, label) in labels.iter().enumerate() {
        let mut row = vec![Cell::new(label)];
        for (_, v) in columns {
            let text = v.get(i).map(|x| format!("{:.6e}", x)).unwrap_or_default();
            row.push(Cell::new(&text));
        }
        table.add_row(Row::new(row));
    }
    table
}

pub fn matrix_table(labels: &[String], m: &DMatrix<f64>) -> Table {
    let mut table = Table::new();
    let mut header = vec![Cell::new("")];
    header.extend(labels.iter().take(m.ncols()).map(|l| Cell::new(l)));
    table.add_row(Row::new(header));
    for i in 0..m.nrows() {
        let name = labels.get(i).cloned().unwrap_or_else(|| i.to_string());
        let mut row = vec![Cell::new(&name)];
        row.extend((0..m.ncols()).map(|j| Cell::new(&format!("{:.3e}", m[(i, j)]))));
        table.add_row(Row::new(row));
    }
    table
}

pub fn print_vectors(title: &str, labels: &[String], columns: &[(&str, &DVector<f64>)]) {
    println!("{}", title);
    vectors_table(labels, columns).printstd();
}

pub fn print_matrix(title: &str, labels: &[String], m: &DMatrix<f64>) {
    println!("{}", title);
    matrix_table(labels, m).printstd();
}
