//! Rigid-rotor / harmonic-oscillator gas with separate translational-rotational
//! (T) and vibrational-electronic (Tve) temperatures.
use crate::Numerics::variables::VariableLayout;
use crate::Thermodynamics::mixture_api::{MixtureCalculator, MixtureError, RU};
use crate::Thermodynamics::species_data::{MixtureData, Reaction, SpeciesData};
use log::{info, warn};
use nalgebra::DVector;

const TVE_MAX_ITER: usize = 100;
const TVE_TOL: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct TwoTemperatureGas {
    pub name: String,
    species: Vec<SpeciesData>,
    reactions: Vec<Reaction>,
    gas_constant: Vec<f64>,
    cvtr: Vec<f64>,
    formation_energy: Vec<f64>,
}

impl TwoTemperatureGas {
    pub fn new(data: MixtureData) -> Result<Self, MixtureError> {
        for s in &data.species {
            if !(s.molar_mass > 0.0) {
                return Err(MixtureError::InvalidSpecies {
                    name: s.name.clone(),
                    reason: format!("molar mass must be positive, got {}", s.molar_mass),
                });
            }
            if s.theta_v < 0.0 || s.rot_modes < 0.0 {
                return Err(MixtureError::InvalidSpecies {
                    name: s.name.clone(),
                    reason: "negative vibrational temperature or rotational modes".to_string(),
                });
            }
        }
        let reactions = data
            .reactions
            .iter()
            .map(|r| Reaction::from_data(r, &data.species))
            .collect::<Result<Vec<_>, _>>()?;

        let gas_constant: Vec<f64> = data.species.iter().map(|s| RU / s.molar_mass).collect();
        let cvtr = data
            .species
            .iter()
            .zip(&gas_constant)
            .map(|(s, r)| (1.5 + 0.5 * s.rot_modes) * r)
            .collect();
        let formation_energy = data
            .species
            .iter()
            .zip(&gas_constant)
            .map(|(s, r)| s.enthalpy_formation - r * s.ref_temperature)
            .collect();
        info!(
            "two-temperature mixture '{}': {} species, {} reactions",
            data.name,
            data.species.len(),
            reactions.len()
        );
        Ok(Self {
            name: data.name,
            species: data.species,
            reactions,
            gas_constant,
            cvtr,
            formation_energy,
        })
    }

    pub fn bundled(name: &str) -> Result<Self, MixtureError> {
        Self::new(MixtureData::bundled(name)?)
    }

    fn species_eve(&self, s: usize, temperature: f64) -> f64 {
        let theta = self.species[s].theta_v;
        if theta == 0.0 {
            return 0.0;
        }
        self.gas_constant[s] * theta / ((theta / temperature).exp() - 1.0)
    }

    fn species_cvve(&self, s: usize, temperature: f64) -> f64 {
        let theta = self.species[s].theta_v;
        if theta == 0.0 {
            return 0.0;
        }
        let x = theta / temperature;
        let e = x.exp();
        self.gas_constant[s] * x * x * e / ((e - 1.0) * (e - 1.0))
    }

    fn rho_eve(&self, rho_s: &[f64], tve: f64) -> (f64, f64) {
        let mut rho_eve = 0.0;
        let mut rho_cvve = 0.0;
        for (s, rho) in rho_s.iter().enumerate() {
            rho_eve += rho * self.species_eve(s, tve);
            rho_cvve += rho * self.species_cvve(s, tve);
        }
        (rho_eve, rho_cvve)
    }

    /// Newton iteration on rhoEve(Tve) = target, started from `guess`.
    fn solve_tve(&self, rho_s: &[f64], target: f64, guess: f64) -> Result<f64, MixtureError> {
        let mut tve = if guess > 0.0 { guess } else { 1000.0 };
        for _ in 0..TVE_MAX_ITER {
            let (rho_eve, rho_cvve) = self.rho_eve(rho_s, tve);
            let step = (rho_eve - target) / rho_cvve;
            let mut next = tve - step;
            if !(next > 0.0) || !next.is_finite() {
                next = 0.5 * tve;
            }
            if (next - tve).abs() <= TVE_TOL * tve {
                return Ok(next);
            }
            tve = next;
        }
        warn!(
            "Tve Newton iteration stalled at {} K for rhoEve = {}",
            tve, target
        );
        Err(MixtureError::TveNotConverged {
            iterations: TVE_MAX_ITER,
            rho_eve: target,
        })
    }
}

impl MixtureCalculator for TwoTemperatureGas {
    fn species(&self) -> &[SpeciesData] {
        &self.species
    }

    fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    fn is_ionized(&self) -> bool {
        self.species.iter().any(|s| s.charge != 0 || s.name == "e-")
    }

    fn gas_constant(&self, species: usize) -> f64 {
        self.gas_constant[species]
    }

    fn cvtr(&self, species: usize) -> f64 {
        self.cvtr[species]
    }

    fn formation_energy(&self, species: usize) -> f64 {
        self.formation_energy[species]
    }

    fn calc_eve(&self, temperature: f64, eve: &mut DVector<f64>) {
        for s in 0..self.species.len() {
            eve[s] = self.species_eve(s, temperature);
        }
    }

    fn calc_cvve(&self, temperature: f64, cvve: &mut DVector<f64>) {
        for s in 0..self.species.len() {
            cvve[s] = self.species_cvve(s, temperature);
        }
    }

    fn calc_dcvve(&self, temperature: f64, dcvve: &mut DVector<f64>) {
        for s in 0..self.species.len() {
            let theta = self.species[s].theta_v;
            if theta == 0.0 {
                dcvve[s] = 0.0;
                continue;
            }
            let x = theta / temperature;
            let e = x.exp();
            let cvve = self.gas_constant[s] * x * x * e / ((e - 1.0) * (e - 1.0));
            // d/dT = d/dx * (-x/T)
            dcvve[s] = -cvve * (2.0 + x - 2.0 * x * e / (e - 1.0)) / temperature;
        }
    }

    fn calc_hs(&self, t: f64, eve: &DVector<f64>, hs: &mut DVector<f64>) {
        for s in 0..self.species.len() {
            hs[s] = self.gas_constant[s] * t
                + self.cvtr[s] * (t - self.species[s].ref_temperature)
                + self.formation_energy[s]
                + eve[s];
        }
    }

    fn calc_dpdu(&self, layout: &VariableLayout, v: &DVector<f64>, dpdu: &mut DVector<f64>) {
        let t = v[layout.t()];
        let rho_cvtr = v[layout.rhocvtr()];
        let rho_r: f64 = (0..layout.n_species)
            .map(|s| v[layout.rhos(s)] * self.gas_constant[s])
            .sum();
        let beta = rho_r / rho_cvtr;
        let half_sq_vel = 0.5 * layout.velocity_squared(v);

        for s in 0..layout.n_species {
            dpdu[s] = self.gas_constant[s] * t
                + beta
                    * (-self.cvtr[s] * (t - self.species[s].ref_temperature)
                        - self.formation_energy[s]
                        + half_sq_vel);
        }
        for d in 0..layout.n_dim {
            dpdu[layout.mom(d)] = -beta * v[layout.vel(d)];
        }
        dpdu[layout.energy()] = beta;
        dpdu[layout.eve()] = -beta;
    }

    fn calc_dtdu(&self, layout: &VariableLayout, v: &DVector<f64>, dtdu: &mut DVector<f64>) {
        let t = v[layout.t()];
        let rho_cvtr = v[layout.rhocvtr()];
        let half_sq_vel = 0.5 * layout.velocity_squared(v);
        for s in 0..layout.n_species {
            dtdu[s] = (-self.cvtr[s] * (t - self.species[s].ref_temperature)
                - self.formation_energy[s]
                + half_sq_vel)
                / rho_cvtr;
        }
        for d in 0..layout.n_dim {
            dtdu[layout.mom(d)] = -v[layout.vel(d)] / rho_cvtr;
        }
        dtdu[layout.energy()] = 1.0 / rho_cvtr;
        dtdu[layout.eve()] = -1.0 / rho_cvtr;
    }

    fn calc_dtvedu(
        &self,
        layout: &VariableLayout,
        v: &DVector<f64>,
        eve: &DVector<f64>,
        dtvedu: &mut DVector<f64>,
    ) {
        dtvedu.fill(0.0);
        let rho_cvve = v[layout.rhocvve()];
        if rho_cvve <= 0.0 {
            // no vibrating mass: Tve follows T
            let mut dtdu = DVector::zeros(layout.n_var);
            self.calc_dtdu(layout, v, &mut dtdu);
            dtvedu.copy_from(&dtdu);
            return;
        }
        for s in 0..layout.n_species {
            dtvedu[s] = -eve[s] / rho_cvve;
        }
        dtvedu[layout.eve()] = 1.0 / rho_cvve;
    }

    fn cons_to_prim(
        &self,
        layout: &VariableLayout,
        u: &DVector<f64>,
        v: &mut DVector<f64>,
    ) -> Result<(), MixtureError> {
        let ns = layout.n_species;
        let rho_s = &u.as_slice()[..ns];
        let rho: f64 = rho_s.iter().sum();

        let mut sq_vel = 0.0;
        for d in 0..layout.n_dim {
            let vel = u[layout.mom(d)] / rho;
            v[layout.vel(d)] = vel;
            sq_vel += vel * vel;
        }

        let mut rho_cvtr = 0.0;
        let mut rho_r = 0.0;
        let mut rho_ef_ref = 0.0;
        let mut vib_mass = 0.0;
        for (s, &r) in rho_s.iter().enumerate() {
            v[layout.rhos(s)] = r;
            rho_cvtr += r * self.cvtr[s];
            rho_r += r * self.gas_constant[s];
            rho_ef_ref += r * (self.formation_energy[s] - self.cvtr[s] * self.species[s].ref_temperature);
            if self.species[s].theta_v > 0.0 {
                vib_mass += r;
            }
        }

        let rho_e = u[layout.energy()];
        let rho_eve = u[layout.eve()];
        let t = (rho_e - rho_eve - 0.5 * rho * sq_vel - rho_ef_ref) / rho_cvtr;
        if !(t > 0.0) {
            return Err(MixtureError::NonPositiveTemperature(t));
        }

        let tve = if vib_mass > 0.0 {
            if !(rho_eve > 0.0) {
                return Err(MixtureError::NonPositiveVibrationalEnergy(rho_eve));
            }
            self.solve_tve(rho_s, rho_eve, t)?
        } else {
            t
        };
        let (_, rho_cvve) = self.rho_eve(rho_s, tve);

        let p = t * rho_r;
        let beta = rho_r / rho_cvtr;
        v[layout.t()] = t;
        v[layout.tve()] = tve;
        v[layout.p()] = p;
        v[layout.rho()] = rho;
        v[layout.h()] = (rho_e + p) / rho;
        v[layout.a()] = ((1.0 + beta) * p / rho).sqrt();
        v[layout.rhocvtr()] = rho_cvtr;
        v[layout.rhocvve()] = rho_cvve;
        Ok(())
    }

    fn prim_to_cons(
        &self,
        layout: &VariableLayout,
        rho_s: &[f64],
        velocity: &[f64],
        t: f64,
        tve: f64,
        u: &mut DVector<f64>,
    ) {
        let rho: f64 = rho_s.iter().sum();
        let sq_vel: f64 = velocity.iter().map(|c| c * c).sum();
        let mut rho_e = 0.5 * rho * sq_vel;
        let mut rho_eve = 0.0;
        for (s, &r) in rho_s.iter().enumerate() {
            u[s] = r;
            let eve = self.species_eve(s, tve);
            rho_e += r
                * (self.cvtr[s] * (t - self.species[s].ref_temperature)
                    + self.formation_energy[s]
                    + eve);
            rho_eve += r * eve;
        }
        for d in 0..layout.n_dim {
            u[layout.mom(d)] = rho * velocity[d];
        }
        u[layout.energy()] = rho_e;
        u[layout.eve()] = rho_eve;
    }
}
