//! Species and reaction data of two-temperature mixtures.
//!
//! Data lives in plain serde structs so that a mixture can be read from a JSON
//! file; two Park air mixtures are bundled. Reaction equations are written as
//! strings (`"N2 + O => NO + N"`) and turned into stoichiometric counts when a
//! mixture is built.
use crate::Thermodynamics::mixture_api::MixtureError;
use log::info;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static ARROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(<=>|=>|<=|=)\s*").expect("arrow pattern is valid"));
static PLUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\+\s+").expect("plus pattern is valid"));
static TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)?\s*([A-Za-z][A-Za-z0-9\-\+]*)$").expect("term pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesData {
    pub name: String,
    /// kg/kmol
    pub molar_mass: f64,
    /// number of rotational degrees of freedom
    pub rot_modes: f64,
    /// characteristic vibrational temperature, K (0 for atoms)
    pub theta_v: f64,
    /// formation enthalpy, J/kg
    pub enthalpy_formation: f64,
    /// reference temperature of the formation enthalpy, K
    pub ref_temperature: f64,
    #[serde(default)]
    pub charge: i32,
}

impl SpeciesData {
    pub fn new(
        name: &str,
        molar_mass: f64,
        rot_modes: f64,
        theta_v: f64,
        enthalpy_formation: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            molar_mass,
            rot_modes,
            theta_v,
            enthalpy_formation,
            ref_temperature: 298.15,
            charge: 0,
        }
    }
}

/// Rate data of one reaction as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionData {
    pub equation: String,
    /// Cf (cm^3/mol/s units), eta, theta (K)
    pub arrhenius: [f64; 3],
    /// exponents of the forward and backward rate-controlling temperatures:
    /// Tf = T^a_f Tve^b_f, Tb = T^a_b Tve^b_b
    pub controlling_temperature: [f64; 4],
    /// equilibrium-constant fit, one row per decade of number density from
    /// 1e14 to 1e19 cm^-3
    pub keq: Vec<[f64; 5]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixtureData {
    pub name: String,
    pub species: Vec<SpeciesData>,
    #[serde(default)]
    pub reactions: Vec<ReactionData>,
}

/// A reaction with its equation resolved against the mixture species.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub equation: String,
    pub cf: f64,
    pub eta: f64,
    pub theta: f64,
    pub tcf_a: f64,
    pub tcf_b: f64,
    pub tcb_a: f64,
    pub tcb_b: f64,
    pub keq: Vec<[f64; 5]>,
    /// stoichiometric count of each species on the reactant side
    pub reactants: Vec<u32>,
    /// stoichiometric count of each species on the product side
    pub products: Vec<u32>,
}

pub const KEQ_TABLE_ROWS: usize = 6;

/// Splits `"2N + O2 => NO + N"` into (species, count) lists for both sides.
pub fn parse_equation(equation: &str) -> Result<(Vec<(String, u32)>, Vec<(String, u32)>), MixtureError> {
    let sides: Vec<&str> = ARROW.split(equation.trim()).collect();
    if sides.len() != 2 {
        return Err(MixtureError::MalformedEquation(equation.to_string()));
    }

    let mut parsed = Vec::with_capacity(2);
    for side in sides {
        let mut entries: Vec<(String, u32)> = Vec::new();
        for token in PLUS.split(side.trim()) {
            let caps = TERM
                .captures(token.trim())
                .ok_or_else(|| MixtureError::MalformedEquation(equation.to_string()))?;
            let count = match caps.get(1) {
                Some(m) => m
                    .as_str()
                    .parse::<u32>()
                    .map_err(|_| MixtureError::MalformedEquation(equation.to_string()))?,
                None => 1,
            };
            let name = caps[2].to_string();
            match entries.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 += count,
                None => entries.push((name, count)),
            }
        }
        if entries.is_empty() {
            return Err(MixtureError::MalformedEquation(equation.to_string()));
        }
        parsed.push(entries);
    }
    let products = parsed.pop().unwrap_or_default();
    let reactants = parsed.pop().unwrap_or_default();
    Ok((reactants, products))
}

impl Reaction {
    pub fn from_data(data: &ReactionData, species: &[SpeciesData]) -> Result<Self, MixtureError> {
        let (lhs, rhs) = parse_equation(&data.equation)?;
        let to_counts = |side: &[(String, u32)]| -> Result<Vec<u32>, MixtureError> {
            let mut counts = vec![0u32; species.len()];
            for (name, count) in side {
                let index = species.iter().position(|s| &s.name == name).ok_or_else(|| {
                    MixtureError::UnknownSpecies {
                        species: name.clone(),
                        equation: data.equation.clone(),
                    }
                })?;
                counts[index] += count;
            }
            Ok(counts)
        };
        let reactants = to_counts(&lhs)?;
        let products = to_counts(&rhs)?;

        // element balance is not checked, only mass
        let mass = |counts: &[u32]| -> f64 {
            counts
                .iter()
                .zip(species)
                .map(|(c, s)| *c as f64 * s.molar_mass)
                .sum()
        };
        let (m_lhs, m_rhs) = (mass(&reactants), mass(&products));
        if (m_lhs - m_rhs).abs() > 1e-6 * m_lhs.max(m_rhs) {
            return Err(MixtureError::InvalidReaction {
                equation: data.equation.clone(),
                reason: format!("mass is not conserved ({} vs {})", m_lhs, m_rhs),
            });
        }
        if data.keq.len() != KEQ_TABLE_ROWS {
            return Err(MixtureError::InvalidReaction {
                equation: data.equation.clone(),
                reason: format!("expected {} Keq rows, found {}", KEQ_TABLE_ROWS, data.keq.len()),
            });
        }
        let [cf, eta, theta] = data.arrhenius;
        let [tcf_a, tcf_b, tcb_a, tcb_b] = data.controlling_temperature;
        Ok(Self {
            equation: data.equation.clone(),
            cf,
            eta,
            theta,
            tcf_a,
            tcf_b,
            tcb_a,
            tcb_b,
            keq: data.keq.clone(),
            reactants,
            products,
        })
    }
}

impl MixtureData {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, MixtureError> {
        let content = fs::read_to_string(path.as_ref())?;
        let data: MixtureData = serde_json::from_str(&content)?;
        info!(
            "loaded mixture '{}' with {} species and {} reactions from {}",
            data.name,
            data.species.len(),
            data.reactions.len(),
            path.as_ref().display()
        );
        Ok(data)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), MixtureError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn bundled(name: &str) -> Result<Self, MixtureError> {
        match name.to_lowercase().as_str() {
            "air5" | "air-5" | "air_5" => Ok(air5()),
            "n2" | "nitrogen" => Ok(nitrogen2()),
            _ => Err(MixtureError::UnknownMixture(name.to_string())),
        }
    }
}

// Park (1990) equilibrium-constant fits, rows for N = 1e14 .. 1e19 cm^-3.
const KEQ_N2: [[f64; 5]; 6] = [
    [3.4907, 0.83133, 4.0978, -12.728, 0.07487],
    [2.0723, 1.38970, 2.0617, -11.828, 0.015105],
    [1.6060, 1.57320, 1.3923, -11.533, -0.004543],
    [1.5351, 1.60610, 1.2993, -11.494, -0.00698],
    [1.4766, 1.62910, 1.2153, -11.457, -0.00944],
    [1.4766, 1.62910, 1.2153, -11.457, -0.00944],
];
const KEQ_O2: [[f64; 5]; 6] = [
    [1.8103, 1.9607, 3.5716, -7.3623, 0.083861],
    [0.91354, 2.3160, 2.2885, -6.7969, 0.046338],
    [0.64183, 2.4253, 1.9026, -6.6277, 0.035151],
    [0.55388, 2.4600, 1.7763, -6.5720, 0.031445],
    [0.52455, 2.4715, 1.7342, -6.55534, 0.030209],
    [0.50989, 2.4773, 1.7132, -6.5441, 0.029591],
];
const KEQ_NO: [[f64; 5]; 6] = [
    [2.1649, 0.078577, 2.8508, -8.5422, 0.053043],
    [1.0072, 0.53545, 1.1911, -7.8098, 0.004394],
    [0.63817, 0.68189, 0.66336, -7.5773, -0.011025],
    [0.55889, 0.71558, 0.55396, -7.5304, -0.014089],
    [0.5150, 0.73286, 0.49096, -7.5025, -0.015938],
    [0.50765, 0.73575, 0.48042, -7.4979, -0.016247],
];

/// ln Keq is linear in the fit coefficients, so the exchange reactions follow
/// from two dissociation fits by detailed balance.
fn keq_difference(a: &[[f64; 5]; 6], b: &[[f64; 5]; 6]) -> Vec<[f64; 5]> {
    a.iter()
        .zip(b.iter())
        .map(|(ra, rb)| {
            let mut row = [0.0; 5];
            for k in 0..5 {
                row[k] = ra[k] - rb[k];
            }
            row
        })
        .collect()
}

const DISSOCIATION_TC: [f64; 4] = [0.5, 0.5, 1.0, 0.0];
const EXCHANGE_TC: [f64; 4] = [1.0, 0.0, 1.0, 0.0];

fn dissociation(
    molecule: &str,
    atoms: (&str, &str),
    partner: &str,
    arrhenius: [f64; 3],
    keq: &[[f64; 5]; 6],
) -> ReactionData {
    ReactionData {
        equation: format!(
            "{} + {} => {} + {} + {}",
            molecule, partner, atoms.0, atoms.1, partner
        ),
        arrhenius,
        controlling_temperature: DISSOCIATION_TC,
        keq: keq.to_vec(),
    }
}

/// Five-species Park air: N2, O2, NO, N, O.
pub fn air5() -> MixtureData {
    let species = vec![
        SpeciesData::new("N2", 28.0134, 2.0, 3395.0, 0.0),
        SpeciesData::new("O2", 31.9988, 2.0, 2239.0, 0.0),
        SpeciesData::new("NO", 30.0061, 2.0, 2817.0, 3.0344e6),
        SpeciesData::new("N", 14.0067, 0.0, 0.0, 3.3613e7),
        SpeciesData::new("O", 15.9994, 0.0, 0.0, 1.5578e7),
    ];
    let mut reactions = Vec::new();
    for partner in ["N2", "O2", "NO"] {
        reactions.push(dissociation("N2", ("N", "N"), partner, [7.0e21, -1.6, 113200.0], &KEQ_N2));
    }
    for partner in ["N", "O"] {
        reactions.push(dissociation("N2", ("N", "N"), partner, [3.0e22, -1.6, 113200.0], &KEQ_N2));
    }
    for partner in ["N2", "O2", "NO"] {
        reactions.push(dissociation("O2", ("O", "O"), partner, [2.0e21, -1.5, 59500.0], &KEQ_O2));
    }
    for partner in ["N", "O"] {
        reactions.push(dissociation("O2", ("O", "O"), partner, [1.0e22, -1.5, 59500.0], &KEQ_O2));
    }
    for partner in ["N2", "O2"] {
        reactions.push(dissociation("NO", ("N", "O"), partner, [5.0e15, 0.0, 75500.0], &KEQ_NO));
    }
    for partner in ["NO", "N", "O"] {
        reactions.push(dissociation("NO", ("N", "O"), partner, [1.1e17, 0.0, 75500.0], &KEQ_NO));
    }
    reactions.push(ReactionData {
        equation: "N2 + O => NO + N".to_string(),
        arrhenius: [6.4e17, -1.0, 38400.0],
        controlling_temperature: EXCHANGE_TC,
        keq: keq_difference(&KEQ_N2, &KEQ_NO),
    });
    reactions.push(ReactionData {
        equation: "NO + O => O2 + N".to_string(),
        arrhenius: [8.4e12, 0.0, 19450.0],
        controlling_temperature: EXCHANGE_TC,
        keq: keq_difference(&KEQ_NO, &KEQ_O2),
    });
    MixtureData {
        name: "air5".to_string(),
        species,
        reactions,
    }
}

/// Dissociating nitrogen: N2, N.
pub fn nitrogen2() -> MixtureData {
    let species = vec![
        SpeciesData::new("N2", 28.0134, 2.0, 3395.0, 0.0),
        SpeciesData::new("N", 14.0067, 0.0, 0.0, 3.3613e7),
    ];
    let reactions = vec![
        dissociation("N2", ("N", "N"), "N2", [7.0e21, -1.6, 113200.0], &KEQ_N2),
        dissociation("N2", ("N", "N"), "N", [3.0e22, -1.6, 113200.0], &KEQ_N2),
    ];
    MixtureData {
        name: "n2".to_string(),
        species,
        reactions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_dissociation_equation() {
        let (lhs, rhs) = parse_equation("N2 + N2 => N + N + N2").unwrap();
        assert_eq!(lhs, vec![("N2".to_string(), 2)]);
        assert_eq!(rhs, vec![("N".to_string(), 2), ("N2".to_string(), 1)]);
    }

    #[test]
    fn parses_leading_coefficients_and_reversible_arrow() {
        let (lhs, rhs) = parse_equation("2N + O2 <=> 2 NO").unwrap();
        assert_eq!(lhs, vec![("N".to_string(), 2), ("O2".to_string(), 1)]);
        assert_eq!(rhs, vec![("NO".to_string(), 2)]);
    }

    #[test]
    fn rejects_equation_without_arrow() {
        assert!(matches!(
            parse_equation("N2 + O"),
            Err(MixtureError::MalformedEquation(_))
        ));
    }

    #[test]
    fn rejects_dangling_plus() {
        assert!(matches!(
            parse_equation("N2 + => N + N"),
            Err(MixtureError::MalformedEquation(_))
        ));
    }

    #[test]
    fn shared_patterns_parse_from_many_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| parse_equation("N2 + O => NO + N")))
            .collect();
        for handle in handles {
            let (lhs, rhs) = handle.join().unwrap().unwrap();
            assert_eq!(lhs, vec![("N2".to_string(), 1), ("O".to_string(), 1)]);
            assert_eq!(rhs, vec![("NO".to_string(), 1), ("N".to_string(), 1)]);
        }
    }

    #[test]
    fn resolves_reaction_counts() {
        let data = air5();
        let reaction = Reaction::from_data(&data.reactions[0], &data.species).unwrap();
        // N2 + N2 => N + N + N2
        assert_eq!(reaction.reactants, vec![2, 0, 0, 0, 0]);
        assert_eq!(reaction.products, vec![1, 0, 0, 2, 0]);
        assert_relative_eq!(reaction.cf, 7.0e21);
        assert_relative_eq!(reaction.tcf_a, 0.5);
    }

    #[test]
    fn unknown_species_is_reported() {
        let data = nitrogen2();
        let mut bad = data.reactions[0].clone();
        bad.equation = "N2 + O => N + N + O".to_string();
        let err = Reaction::from_data(&bad, &data.species).unwrap_err();
        assert!(matches!(err, MixtureError::UnknownSpecies { .. }));
    }

    #[test]
    fn unbalanced_reaction_is_rejected() {
        let data = nitrogen2();
        let mut bad = data.reactions[0].clone();
        bad.equation = "N2 + N2 => N + N2".to_string();
        assert!(matches!(
            Reaction::from_data(&bad, &data.species),
            Err(MixtureError::InvalidReaction { .. })
        ));
    }

    #[test]
    fn bundled_air_has_seventeen_reactions() {
        let data = MixtureData::bundled("air5").unwrap();
        assert_eq!(data.species.len(), 5);
        assert_eq!(data.reactions.len(), 17);
        for reaction in &data.reactions {
            assert!(Reaction::from_data(reaction, &data.species).is_ok());
        }
        assert!(MixtureData::bundled("argon").is_err());
    }

    #[test]
    fn exchange_keq_is_detailed_balance_of_dissociations() {
        let data = air5();
        let exchange = &data.reactions[15];
        assert_relative_eq!(exchange.keq[2][0], KEQ_N2[2][0] - KEQ_NO[2][0]);
        assert_relative_eq!(exchange.keq[5][4], KEQ_N2[5][4] - KEQ_NO[5][4]);
    }

    #[test]
    fn mixture_json_round_trip() {
        let data = nitrogen2();
        let file = NamedTempFile::new().unwrap();
        data.save_to_file(file.path()).unwrap();
        let loaded = MixtureData::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, data);
    }
}
