//! Builder for `ModelDefinition`.
//!
//! Names are collected as strings and resolved in `build()`, so declaration
//! order does not matter.

use std::collections::HashSet;

use super::{DiscreteReaction, ModelDefinition, ReactionKind, Region, RegionId, SpeciesId};
use crate::error::{HybridError, Result};

#[derive(Debug, Clone)]
enum ReactionDraft {
    Chemical {
        name: String,
        reactants: Vec<String>,
        products: Vec<String>,
        rate_constant: f64,
        regions: Vec<String>,
    },
    Transport {
        name: String,
        species: String,
        from: String,
        to: String,
        rate_constant: f64,
    },
}

/// Collects declarations and validates them into a `ModelDefinition`
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    name: String,
    species: Vec<String>,
    regions: Vec<(String, f64)>,
    reactions: Vec<ReactionDraft>,
    counts: Vec<(String, String, u64)>,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            species: Vec::new(),
            regions: Vec::new(),
            reactions: Vec::new(),
            counts: Vec::new(),
        }
    }

    /// Declare a region with its volume in liters
    pub fn region(mut self, name: impl Into<String>, volume_L: f64) -> Self {
        self.regions.push((name.into(), volume_L));
        self
    }

    pub fn species(mut self, name: impl Into<String>) -> Self {
        self.species.push(name.into());
        self
    }

    /// Declare a chemical reaction. An empty `regions` slice means the
    /// reaction fires in every region.
    pub fn reaction(
        mut self,
        name: impl Into<String>,
        reactants: &[&str],
        products: &[&str],
        rate_constant: f64,
        regions: &[&str],
    ) -> Self {
        self.reactions.push(ReactionDraft::Chemical {
            name: name.into(),
            reactants: reactants.iter().map(|s| s.to_string()).collect(),
            products: products.iter().map(|s| s.to_string()).collect(),
            rate_constant,
            regions: regions.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Declare a first-order transition of one species between regions
    pub fn transport(
        mut self,
        name: impl Into<String>,
        species: &str,
        from: &str,
        to: &str,
        rate_constant: f64,
    ) -> Self {
        self.reactions.push(ReactionDraft::Transport {
            name: name.into(),
            species: species.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            rate_constant,
        });
        self
    }

    /// Set the initial particle count of a species in a region
    pub fn initial_count(mut self, species: &str, region: &str, count: u64) -> Self {
        self.counts.push((species.to_string(), region.to_string(), count));
        self
    }

    pub fn build(self) -> Result<ModelDefinition> {
        check_unique("species", self.species.iter())?;
        check_unique("region", self.regions.iter().map(|(n, _)| n))?;
        check_unique(
            "reaction",
            self.reactions.iter().map(|r| match r {
                ReactionDraft::Chemical { name, .. } | ReactionDraft::Transport { name, .. } => name,
            }),
        )?;

        let regions: Vec<Region> = self
            .regions
            .into_iter()
            .map(|(name, volume_L)| {
                if volume_L.is_finite() && volume_L > 0.0 {
                    Ok(Region { name, volume_L })
                } else {
                    Err(HybridError::InvalidParameter {
                        name: "region volume",
                        reason: format!("region `{name}` has volume {volume_L}"),
                    })
                }
            })
            .collect::<Result<_>>()?;

        let species = self.species;
        let species_id = |name: &str| {
            species
                .iter()
                .position(|s| s == name)
                .map(SpeciesId)
                .ok_or_else(|| HybridError::UnknownSpecies(name.to_string()))
        };
        let region_id = |name: &str| {
            regions
                .iter()
                .position(|r| r.name == name)
                .map(RegionId)
                .ok_or_else(|| HybridError::UnknownRegion(name.to_string()))
        };

        let mut reactions = Vec::with_capacity(self.reactions.len());
        for (index, draft) in self.reactions.into_iter().enumerate() {
            let reaction = match draft {
                ReactionDraft::Chemical {
                    name,
                    reactants,
                    products,
                    rate_constant,
                    regions: active,
                } => {
                    if reactants.is_empty() && products.is_empty() {
                        return Err(HybridError::DegenerateReaction { index });
                    }
                    DiscreteReaction {
                        name,
                        kind: ReactionKind::Chemical {
                            reactants: reactants.iter().map(|s| species_id(s.as_str())).collect::<Result<_>>()?,
                            products: products.iter().map(|s| species_id(s.as_str())).collect::<Result<_>>()?,
                        },
                        rate_constant,
                        regions: active.iter().map(|r| region_id(r.as_str())).collect::<Result<_>>()?,
                    }
                }
                ReactionDraft::Transport {
                    name,
                    species: sp,
                    from,
                    to,
                    rate_constant,
                } => DiscreteReaction {
                    name,
                    kind: ReactionKind::Transport {
                        species: species_id(sp.as_str())?,
                        from: region_id(from.as_str())?,
                        to: region_id(to.as_str())?,
                    },
                    rate_constant,
                    regions: Vec::new(),
                },
            };
            if !reaction.rate_constant.is_finite() || reaction.rate_constant < 0.0 {
                return Err(HybridError::InvalidRateConstant {
                    index,
                    value: reaction.rate_constant,
                });
            }
            reactions.push(reaction);
        }

        let mut initial_counts = vec![vec![0u64; regions.len()]; species.len()];
        for (sp, reg, count) in &self.counts {
            let s = species_id(sp.as_str())?;
            let r = region_id(reg.as_str())?;
            initial_counts[s.0][r.0] = *count;
        }

        log::debug!(
            "Built model `{}`: {} species, {} regions, {} reactions",
            self.name,
            species.len(),
            regions.len(),
            reactions.len()
        );

        Ok(ModelDefinition {
            name: self.name,
            species,
            regions,
            reactions,
            initial_counts,
        })
    }
}

fn check_unique<'a, I>(kind: &'static str, names: I) -> Result<()>
where
    I: Iterator<Item = &'a String>,
{
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(HybridError::DuplicateName {
                kind,
                name: name.clone(),
            });
        }
    }
    Ok(())
}
