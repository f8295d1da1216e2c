//! Coupling rules between discrete counts and the ODE state.
//!
//! A `CouplingSpec` names everything by string and is resolved once against
//! the compiled reaction system and the discrete model. The resolved
//! `Coupling` holds indices only.
//!
//! ## Conservation reconciliation
//! For a protein present as a free ODE variable plus some bound complexes:
//! ```text
//! delta = rdme_total - free - Σ bound
//! delta >= 0:  free += delta
//! delta <  0:  frac = rdme_total / (free + Σ bound)
//!              free  *= frac
//!              bound *= frac, and bound·(1 - frac) goes to its release target
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{HybridError, Result};
use crate::model::{ModelDefinition, ReactionId, RegionId, SpeciesId};
use crate::ode::ReactionSystem;

use super::lattice::LatticeView;

/// One bound form of a tracked protein, by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundSpec {
    /// ODE variable holding the complex
    pub variable: String,
    /// ODE variable that receives the ligand when the complex is degraded
    pub releases_to: Option<String>,
}

/// Conservation group for one protein, by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConservationSpec {
    /// Discrete species whose count is the group total
    pub species: String,
    /// Restrict the count to one region; `None` means the total
    pub region: Option<String>,
    /// ODE variable for the unbound protein
    pub free: String,
    pub bound: Vec<BoundSpec>,
}

/// Full coupling description, by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingSpec {
    pub conservation: Vec<ConservationSpec>,
    /// Discrete species whose summed count changes are added to `substrate`
    pub exchange_species: Vec<String>,
    /// ODE variable receiving released ligand and exchange deltas
    pub substrate: String,
    /// ODE variable that sets the feedback rate
    pub driver: String,
    /// Discrete reaction whose rate is driven by the ODE state
    pub feedback_reaction: String,
    /// Feedback rate = constant × [driver]
    pub feedback_rate_constant: f64,
}

/// Where a group total is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSource {
    Total(SpeciesId),
    InRegion(SpeciesId, RegionId),
}

impl CountSource {
    pub fn read<V: LatticeView + ?Sized>(&self, view: &V) -> Result<u64> {
        match *self {
            CountSource::Total(species) => view.total_count(species),
            CountSource::InRegion(species, region) => view.count_in_region(species, region),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundState {
    pub variable: usize,
    pub releases_to: Option<usize>,
}

/// Resolved conservation group
#[derive(Debug, Clone, PartialEq)]
pub struct ConservationRule {
    pub label: String,
    pub source: CountSource,
    pub free: usize,
    pub bound: Vec<BoundState>,
}

/// Outcome of reconciling one group
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reconciliation {
    /// Discrete side gained (or kept) mass; it went to the free pool
    Gained { added: f64 },
    /// Discrete side lost mass; pools scaled by `fraction`
    Scaled { fraction: f64, released: f64 },
}

impl ConservationRule {
    /// Seed the free pool from the discrete total; bound pools are left alone
    pub fn seed(&self, state: &mut [f64], rdme_total: f64) {
        state[self.free] = rdme_total;
    }

    /// Match the group sum in `state` to `rdme_total`
    pub fn reconcile(&self, state: &mut [f64], rdme_total: f64) -> Reconciliation {
        let free = state[self.free];
        let bound_sum: f64 = self.bound.iter().map(|b| state[b.variable]).sum();
        let ode_total = free + bound_sum;
        let delta = rdme_total - ode_total;

        // An empty ODE group cannot be scaled: all new mass is free
        if delta >= 0.0 || ode_total <= 0.0 {
            state[self.free] = free + delta.max(0.0);
            return Reconciliation::Gained { added: delta.max(0.0) };
        }

        let fraction = rdme_total / ode_total;
        state[self.free] = free * fraction;

        let mut released = 0.0;
        for b in &self.bound {
            let before = state[b.variable];
            let after = before * fraction;
            state[b.variable] = after;
            if let Some(target) = b.releases_to {
                state[target] += before - after;
                released += before - after;
            }
        }
        Reconciliation::Scaled { fraction, released }
    }
}

/// Feedback channel into the discrete engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackChannel {
    pub reaction: ReactionId,
    pub rate_constant: f64,
    pub driver: usize,
}

impl FeedbackChannel {
    pub fn rate(&self, state: &[f64]) -> f64 {
        self.rate_constant * state[self.driver]
    }
}

/// Resolved coupling: indices into the ODE state and the discrete model
#[derive(Debug, Clone)]
pub struct Coupling {
    pub rules: Vec<ConservationRule>,
    pub exchange: Vec<SpeciesId>,
    pub substrate: usize,
    pub feedback: FeedbackChannel,
    /// Particle count per mol/L (N_A × V)
    pub nav: f64,
}

impl Coupling {
    /// Resolve a named spec. Every name must exist in `system` or `model`.
    pub fn resolve(
        spec: &CouplingSpec,
        system: &ReactionSystem,
        model: &ModelDefinition,
        nav: f64,
    ) -> Result<Self> {
        if !(nav.is_finite() && nav > 0.0) {
            return Err(HybridError::InvalidParameter {
                name: "nav",
                reason: format!("conversion factor must be positive, got {nav}"),
            });
        }
        if !(spec.feedback_rate_constant.is_finite() && spec.feedback_rate_constant >= 0.0) {
            return Err(HybridError::InvalidParameter {
                name: "feedback_rate_constant",
                reason: format!("must be non-negative, got {}", spec.feedback_rate_constant),
            });
        }

        let rules = spec
            .conservation
            .iter()
            .map(|c| {
                let species = model.species_id(&c.species)?;
                let source = match &c.region {
                    Some(region) => CountSource::InRegion(species, model.region_id(region)?),
                    None => CountSource::Total(species),
                };
                let bound = c
                    .bound
                    .iter()
                    .map(|b| {
                        Ok(BoundState {
                            variable: system.index_of(&b.variable)?,
                            releases_to: b
                                .releases_to
                                .as_deref()
                                .map(|name| system.index_of(name))
                                .transpose()?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(ConservationRule {
                    label: c.species.clone(),
                    source,
                    free: system.index_of(&c.free)?,
                    bound,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let exchange = spec
            .exchange_species
            .iter()
            .map(|name| model.species_id(name))
            .collect::<Result<Vec<_>>>()?;

        let feedback = FeedbackChannel {
            reaction: model.reaction_id(&spec.feedback_reaction)?,
            rate_constant: spec.feedback_rate_constant,
            driver: system.index_of(&spec.driver)?,
        };

        Ok(Self {
            rules,
            exchange,
            substrate: system.index_of(&spec.substrate)?,
            feedback,
            nav,
        })
    }

    /// Summed exchange-species count in mol/L
    pub fn exchange_concentration<V: LatticeView + ?Sized>(&self, view: &V) -> Result<f64> {
        let mut total = 0u64;
        for &species in &self.exchange {
            total += view.total_count(species)?;
        }
        Ok(total as f64 / self.nav)
    }
}
