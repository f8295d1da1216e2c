//! Read-only view of the discrete particle state.
//!
//! The host engine owns the particle counts. At a synchronization point it
//! exposes them through `LatticeView`; the stepper only reads.

use serde::{Deserialize, Serialize};

use crate::error::{HybridError, Result};
use crate::model::{ModelDefinition, RegionId, SpeciesId};

/// Capability set the host must provide at each synchronization point
pub trait LatticeView {
    /// Particle count of a species summed over all regions
    fn total_count(&self, species: SpeciesId) -> Result<u64>;

    /// Particle count of a species in one region
    fn count_in_region(&self, species: SpeciesId, region: RegionId) -> Result<u64>;
}

/// Owned per-region particle counts, `[species][region]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSnapshot {
    counts: Vec<Vec<u64>>,
    n_regions: usize,
}

impl CountSnapshot {
    /// All-zero snapshot
    pub fn new(n_species: usize, n_regions: usize) -> Self {
        Self {
            counts: vec![vec![0; n_regions]; n_species],
            n_regions,
        }
    }

    /// Snapshot of a model's initial condition
    pub fn from_model(model: &ModelDefinition) -> Self {
        Self {
            counts: model.initial_counts().to_vec(),
            n_regions: model.n_regions(),
        }
    }

    /// Build from a `[species][region]` table; rows must have equal length
    pub fn from_counts(counts: Vec<Vec<u64>>) -> Result<Self> {
        let n_regions = counts.first().map_or(0, Vec::len);
        if let Some(row) = counts.iter().find(|row| row.len() != n_regions) {
            return Err(HybridError::DimensionMismatch {
                context: "count snapshot row",
                expected: n_regions,
                actual: row.len(),
            });
        }
        Ok(Self { counts, n_regions })
    }

    pub fn n_species(&self) -> usize {
        self.counts.len()
    }

    pub fn n_regions(&self) -> usize {
        self.n_regions
    }

    pub fn get(&self, species: SpeciesId, region: RegionId) -> u64 {
        self.counts
            .get(species.0)
            .and_then(|row| row.get(region.0))
            .copied()
            .unwrap_or(0)
    }

    pub fn set(&mut self, species: SpeciesId, region: RegionId, count: u64) -> Result<()> {
        let row = self
            .counts
            .get_mut(species.0)
            .ok_or_else(|| unknown_species(species))?;
        let slot = row.get_mut(region.0).ok_or_else(|| unknown_region(region))?;
        *slot = count;
        Ok(())
    }

    /// Per-species totals over all regions
    pub fn totals(&self) -> Vec<u64> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn as_table(&self) -> &[Vec<u64>] {
        &self.counts
    }

    pub(crate) fn row_mut(&mut self, species: usize) -> &mut [u64] {
        &mut self.counts[species]
    }
}

impl LatticeView for CountSnapshot {
    fn total_count(&self, species: SpeciesId) -> Result<u64> {
        self.counts
            .get(species.0)
            .map(|row| row.iter().sum())
            .ok_or_else(|| unknown_species(species))
    }

    fn count_in_region(&self, species: SpeciesId, region: RegionId) -> Result<u64> {
        let row = self.counts.get(species.0).ok_or_else(|| unknown_species(species))?;
        row.get(region.0).copied().ok_or_else(|| unknown_region(region))
    }
}

fn unknown_species(species: SpeciesId) -> HybridError {
    HybridError::UnknownSpecies(format!("#{}", species.0))
}

fn unknown_region(region: RegionId) -> HybridError {
    HybridError::UnknownRegion(format!("#{}", region.0))
}
