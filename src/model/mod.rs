//! Discrete model definitions.
//!
//! A `ModelDefinition` is an immutable description of the species, regions
//! and reactions simulated by the discrete (particle-count) engine. It is
//! produced by `ModelBuilder`, which resolves every name once and rejects
//! unknown or duplicated names before anything runs. After `build()` all
//! references are typed ids.
//!
//! Rate constants are macroscopic: M·s⁻¹ for zero order, s⁻¹ for first
//! order, M⁻¹·s⁻¹ for second order. Region volumes convert them to
//! per-particle propensities.

mod builder;
pub mod presets;

pub use builder::ModelBuilder;

use serde::{Deserialize, Serialize};

use crate::error::{HybridError, Result};

/// Index of a species in a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeciesId(pub(crate) usize);

/// Index of a region in a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub(crate) usize);

/// Index of a reaction in a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReactionId(pub(crate) usize);

impl SpeciesId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl RegionId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl ReactionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A spatial compartment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    /// Volume (L)
    pub volume_L: f64,
}

/// What a discrete reaction does to particle counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReactionKind {
    /// Reactants are consumed and products created in the same region
    Chemical {
        reactants: Vec<SpeciesId>,
        products: Vec<SpeciesId>,
    },
    /// One particle moves between regions (first order)
    Transport {
        species: SpeciesId,
        from: RegionId,
        to: RegionId,
    },
}

/// A reaction channel of the discrete engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscreteReaction {
    pub name: String,
    pub kind: ReactionKind,
    /// Macroscopic rate constant
    pub rate_constant: f64,
    /// Regions where a chemical reaction may fire; empty means everywhere
    pub regions: Vec<RegionId>,
}

impl DiscreteReaction {
    /// Molecularity; transport is first order
    pub fn order(&self) -> usize {
        match &self.kind {
            ReactionKind::Chemical { reactants, .. } => reactants.len(),
            ReactionKind::Transport { .. } => 1,
        }
    }

    /// Whether this reaction can fire in `region`
    pub fn active_in(&self, region: RegionId) -> bool {
        match &self.kind {
            ReactionKind::Chemical { .. } => self.regions.is_empty() || self.regions.contains(&region),
            ReactionKind::Transport { from, .. } => *from == region,
        }
    }
}

/// Frozen model consumed by the discrete engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub name: String,
    species: Vec<String>,
    regions: Vec<Region>,
    reactions: Vec<DiscreteReaction>,
    /// Initial particle counts, `[species][region]`
    initial_counts: Vec<Vec<u64>>,
}

impl ModelDefinition {
    pub fn species_names(&self) -> &[String] {
        &self.species
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn reactions(&self) -> &[DiscreteReaction] {
        &self.reactions
    }

    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    pub fn n_regions(&self) -> usize {
        self.regions.len()
    }

    pub fn species_id(&self, name: &str) -> Result<SpeciesId> {
        self.species
            .iter()
            .position(|s| s == name)
            .map(SpeciesId)
            .ok_or_else(|| HybridError::UnknownSpecies(name.to_string()))
    }

    pub fn region_id(&self, name: &str) -> Result<RegionId> {
        self.regions
            .iter()
            .position(|r| r.name == name)
            .map(RegionId)
            .ok_or_else(|| HybridError::UnknownRegion(name.to_string()))
    }

    pub fn reaction_id(&self, name: &str) -> Result<ReactionId> {
        self.reactions
            .iter()
            .position(|r| r.name == name)
            .map(ReactionId)
            .ok_or_else(|| HybridError::InvalidParameter {
                name: "reaction",
                reason: format!("no reaction named `{name}`"),
            })
    }

    pub fn species_name(&self, id: SpeciesId) -> &str {
        &self.species[id.0]
    }

    pub fn region(&self, id: RegionId) -> &Region {
        &self.regions[id.0]
    }

    pub fn reaction(&self, id: ReactionId) -> &DiscreteReaction {
        &self.reactions[id.0]
    }

    pub fn initial_count(&self, species: SpeciesId, region: RegionId) -> u64 {
        self.initial_counts[species.0][region.0]
    }

    /// Initial counts as a `[species][region]` table
    pub fn initial_counts(&self) -> &[Vec<u64>] {
        &self.initial_counts
    }
}
