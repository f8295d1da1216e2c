//! Well-mixed, region-partitioned Gillespie direct method.
//!
//! Each region is an independent well-mixed compartment; transport reactions
//! move single particles between compartments. There is no diffusion
//! lattice. Propensities use macroscopic rate constants converted by region
//! volume:
//!
//! a = k · (N_A·V)^(1 - order) · Π n_s!/(n_s - m_s)!
//!
//! Reference: Gillespie DT, J Phys Chem 1977;81:2340-2361

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};

use crate::config::AVOGADRO;
use crate::error::{HybridError, Result};
use crate::hybrid::CountSnapshot;
use crate::model::{ModelDefinition, ReactionId, ReactionKind, RegionId};

const TIME_EPSILON: f64 = 1e-12;

/// One reaction in one region
#[derive(Debug, Clone, Copy)]
struct Channel {
    reaction: usize,
    region: usize,
    /// (N_A·V)^(1 - order) for this region
    volume_factor: f64,
}

/// Stochastic engine over a `ModelDefinition`
pub struct WellMixedHost<'m> {
    model: &'m ModelDefinition,
    counts: CountSnapshot,
    rate_constants: Vec<f64>,
    channels: Vec<Channel>,
    propensities: Vec<f64>,
    rng: StdRng,
    time_sec: f64,
    event_count: u64,
}

impl<'m> WellMixedHost<'m> {
    /// Start from the model's initial counts
    pub fn new(model: &'m ModelDefinition, seed: u64) -> Self {
        let mut channels = Vec::new();
        for (r, reaction) in model.reactions().iter().enumerate() {
            for (g, region) in model.regions().iter().enumerate() {
                if reaction.active_in(RegionId(g)) {
                    let nav = AVOGADRO * region.volume_L;
                    channels.push(Channel {
                        reaction: r,
                        region: g,
                        volume_factor: nav.powi(1 - reaction.order() as i32),
                    });
                }
            }
        }

        let mut host = Self {
            model,
            counts: CountSnapshot::from_model(model),
            rate_constants: model.reactions().iter().map(|r| r.rate_constant).collect(),
            propensities: vec![0.0; channels.len()],
            channels,
            rng: StdRng::seed_from_u64(seed),
            time_sec: 0.0,
            event_count: 0,
        };
        host.recompute_propensities();
        host
    }

    pub fn model(&self) -> &ModelDefinition {
        self.model
    }

    pub fn time_sec(&self) -> f64 {
        self.time_sec
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    pub fn counts(&self) -> &CountSnapshot {
        &self.counts
    }

    pub fn rate_constant(&self, reaction: ReactionId) -> f64 {
        self.rate_constants[reaction.0]
    }

    /// Override a reaction's macroscopic rate constant from now on
    pub fn set_reaction_rate(&mut self, reaction: ReactionId, rate_constant: f64) -> Result<()> {
        if reaction.0 >= self.rate_constants.len() {
            return Err(HybridError::InvalidParameter {
                name: "reaction",
                reason: format!("reaction #{} does not exist", reaction.0),
            });
        }
        if !(rate_constant.is_finite() && rate_constant >= 0.0) {
            return Err(HybridError::InvalidRateConstant {
                index: reaction.0,
                value: rate_constant,
            });
        }
        self.rate_constants[reaction.0] = rate_constant;
        self.recompute_propensities();
        Ok(())
    }

    /// Fire reactions until `t_end_sec`; the clock ends exactly at `t_end_sec`
    pub fn advance_until(&mut self, t_end_sec: f64) {
        while self.time_sec < t_end_sec - TIME_EPSILON {
            let total: f64 = self.propensities.iter().sum();
            if total <= 0.0 {
                break;
            }
            // total > 0 and finite, so the distribution is valid
            let tau = match Exp::new(total) {
                Ok(exp) => exp.sample(&mut self.rng),
                Err(_) => break,
            };
            if self.time_sec + tau >= t_end_sec {
                break;
            }
            self.time_sec += tau;

            let target = self.rng.gen::<f64>() * total;
            let chosen = self.select(target);
            self.fire(self.channels[chosen]);
            self.event_count += 1;
            self.recompute_propensities();
        }
        self.time_sec = self.time_sec.max(t_end_sec);
    }

    fn select(&self, target: f64) -> usize {
        let mut cumsum = 0.0;
        let mut last_nonzero = 0;
        for (i, &a) in self.propensities.iter().enumerate() {
            if a > 0.0 {
                last_nonzero = i;
            }
            cumsum += a;
            if target < cumsum {
                return i;
            }
        }
        last_nonzero
    }

    fn fire(&mut self, channel: Channel) {
        let model = self.model;
        let reaction = &model.reactions()[channel.reaction];
        match &reaction.kind {
            ReactionKind::Chemical { reactants, products } => {
                for s in reactants {
                    let row = self.counts.row_mut(s.0);
                    row[channel.region] = row[channel.region].saturating_sub(1);
                }
                for s in products {
                    self.counts.row_mut(s.0)[channel.region] += 1;
                }
            }
            ReactionKind::Transport { species, from, to } => {
                let row = self.counts.row_mut(species.0);
                row[from.0] = row[from.0].saturating_sub(1);
                row[to.0] += 1;
            }
        }
    }

    fn recompute_propensities(&mut self) {
        let model = self.model;
        for (i, channel) in self.channels.iter().enumerate() {
            let reaction = &model.reactions()[channel.reaction];
            let k = self.rate_constants[channel.reaction];
            self.propensities[i] = match &reaction.kind {
                ReactionKind::Chemical { reactants, .. } => {
                    let mut a = k * channel.volume_factor;
                    let mut seen: Vec<usize> = Vec::with_capacity(reactants.len());
                    for s in reactants {
                        if seen.contains(&s.0) {
                            continue;
                        }
                        seen.push(s.0);
                        let multiplicity = reactants.iter().filter(|r| r.0 == s.0).count() as u64;
                        let n = self.counts.get(*s, RegionId(channel.region));
                        a *= falling_factorial(n, multiplicity);
                    }
                    a
                }
                ReactionKind::Transport { species, from, .. } => {
                    k * self.counts.get(*species, *from) as f64
                }
            };
        }
    }
}

#[inline]
fn falling_factorial(value: u64, count: u64) -> f64 {
    match count {
        0 => 1.0,
        1 => value as f64,
        _ if value < count => 0.0,
        _ => (0..count).map(|i| (value - i) as f64).product(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hybrid::LatticeView;
    use crate::model::ModelBuilder;

    fn decay_model(n: u64) -> ModelDefinition {
        ModelBuilder::new("decay")
            .region("cytoplasm", 1e-15)
            .species("A")
            .reaction("decay", &["A"], &[], 1.0, &[])
            .initial_count("A", "cytoplasm", n)
            .build()
            .unwrap()
    }

    #[test]
    fn test_falling_factorial() {
        assert_eq!(falling_factorial(5, 0), 1.0);
        assert_eq!(falling_factorial(5, 1), 5.0);
        assert_eq!(falling_factorial(5, 2), 20.0);
        assert_eq!(falling_factorial(1, 2), 0.0);
    }

    #[test]
    fn test_clock_reaches_target() {
        let model = decay_model(10);
        let mut host = WellMixedHost::new(&model, 1);
        host.advance_until(0.5);
        assert!((host.time_sec() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_extinction_stops_events() {
        let model = decay_model(5);
        let mut host = WellMixedHost::new(&model, 3);
        host.advance_until(1000.0);
        let a = model.species_id("A").unwrap();
        assert_eq!(host.counts().total_count(a).unwrap_or(99), 0);
        assert_eq!(host.event_count(), 5);
    }

    #[test]
    fn test_zero_rate_never_fires() {
        let model = decay_model(100);
        let mut host = WellMixedHost::new(&model, 7);
        host.set_reaction_rate(model.reaction_id("decay").unwrap(), 0.0).unwrap();
        host.advance_until(10.0);
        assert_eq!(host.event_count(), 0);
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let model = decay_model(1);
        let mut host = WellMixedHost::new(&model, 7);
        let decay = model.reaction_id("decay").unwrap();
        assert!(host.set_reaction_rate(decay, f64::NAN).is_err());
        assert!(host.set_reaction_rate(ReactionId(4), 1.0).is_err());
    }

    #[test]
    fn test_transport_moves_particles() {
        let model = ModelBuilder::new("transport")
            .region("cytoplasm", 1e-15)
            .region("plasmaMembrane", 1e-16)
            .species("G2")
            .transport("insert", "G2", "cytoplasm", "plasmaMembrane", 50.0)
            .initial_count("G2", "cytoplasm", 20)
            .build()
            .unwrap();
        let mut host = WellMixedHost::new(&model, 11);
        host.advance_until(10.0);

        let g2 = model.species_id("G2").unwrap();
        let mem = model.region_id("plasmaMembrane").unwrap();
        // 50/s × 10 s: every particle has moved with overwhelming probability
        assert_eq!(host.counts().count_in_region(g2, mem).unwrap_or(0), 20);
        assert_eq!(host.counts().total_count(g2).unwrap_or(0), 20);
    }

    #[test]
    fn test_seed_determinism() {
        let model = decay_model(200);
        let mut a = WellMixedHost::new(&model, 42);
        let mut b = WellMixedHost::new(&model, 42);
        a.advance_until(0.3);
        b.advance_until(0.3);
        assert_eq!(a.counts(), b.counts());
        assert_eq!(a.event_count(), b.event_count());
    }
}
