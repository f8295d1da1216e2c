//! Mass-action reaction systems for the continuous subsystem.
//!
//! A human-authored list of `(reactants, products, k)` triples is compiled
//! once into a signed stoichiometry matrix and a reactant-multiplicity
//! (dependency) matrix over a lexicographically sorted variable ordering.
//! Both matrices are indexed `[reaction][variable]`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{HybridError, Result};

/// One elementary reaction as written by the modeller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionSpec {
    /// Reactant names, repeated for multiplicity
    pub reactants: Vec<String>,
    /// Product names, repeated for multiplicity
    pub products: Vec<String>,
    /// Mass-action rate constant
    pub rate_constant: f64,
}

impl ReactionSpec {
    pub fn new<R, P, S>(reactants: R, products: P, rate_constant: f64) -> Self
    where
        R: IntoIterator<Item = S>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reactants: reactants.into_iter().map(Into::into).collect(),
            products: products.into_iter().map(Into::into).collect(),
            rate_constant,
        }
    }
}

/// Compiled, immutable reaction system
#[derive(Debug, Clone)]
pub struct ReactionSystem {
    names: Vec<String>,
    /// products − reactants
    stoichiometry: Vec<Vec<i32>>,
    /// reactant multiplicities
    dependency: Vec<Vec<u32>>,
    rate_constants: Vec<f64>,
}

impl ReactionSystem {
    /// Compile a reaction list.
    ///
    /// Fails on a reaction with no reactants and no products, and on
    /// negative or non-finite rate constants.
    pub fn build(reactions: &[ReactionSpec]) -> Result<Self> {
        let mut name_set = BTreeSet::new();
        for (index, rxn) in reactions.iter().enumerate() {
            if rxn.reactants.is_empty() && rxn.products.is_empty() {
                return Err(HybridError::DegenerateReaction { index });
            }
            if !rxn.rate_constant.is_finite() || rxn.rate_constant < 0.0 {
                return Err(HybridError::InvalidRateConstant {
                    index,
                    value: rxn.rate_constant,
                });
            }
            name_set.extend(rxn.reactants.iter().cloned());
            name_set.extend(rxn.products.iter().cloned());
        }

        // BTreeSet iteration is already sorted
        let names: Vec<String> = name_set.into_iter().collect();
        let n_species = names.len();

        let mut stoichiometry = vec![vec![0i32; n_species]; reactions.len()];
        let mut dependency = vec![vec![0u32; n_species]; reactions.len()];
        let mut rate_constants = Vec::with_capacity(reactions.len());

        for (i, rxn) in reactions.iter().enumerate() {
            rate_constants.push(rxn.rate_constant);
            for r in &rxn.reactants {
                let idx = position(&names, r)?;
                dependency[i][idx] += 1;
                stoichiometry[i][idx] -= 1;
            }
            for p in &rxn.products {
                let idx = position(&names, p)?;
                stoichiometry[i][idx] += 1;
            }
        }

        log::debug!(
            "Compiled reaction system: {} reactions over {:?}",
            reactions.len(),
            names
        );

        Ok(Self {
            names,
            stoichiometry,
            dependency,
            rate_constants,
        })
    }

    /// Variable names in state-vector order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_species(&self) -> usize {
        self.names.len()
    }

    pub fn n_reactions(&self) -> usize {
        self.rate_constants.len()
    }

    /// Index of a variable in the state vector
    pub fn index_of(&self, name: &str) -> Result<usize> {
        position(&self.names, name)
    }

    pub fn stoichiometry(&self) -> &[Vec<i32>] {
        &self.stoichiometry
    }

    pub fn dependency(&self) -> &[Vec<u32>] {
        &self.dependency
    }

    pub fn rate_constants(&self) -> &[f64] {
        &self.rate_constants
    }

    /// Fresh all-zero state vector
    pub fn zero_state(&self) -> Vec<f64> {
        vec![0.0; self.n_species()]
    }

    /// Mass-action rate of every reaction:
    /// v_r = k_r · Π_v state[v]^dep[r][v]
    pub fn evaluate_rates(&self, state: &[f64]) -> Result<Vec<f64>> {
        self.check_len("ODE state", state.len())?;
        Ok((0..self.n_reactions())
            .map(|r| self.reaction_rate(r, state))
            .collect())
    }

    /// dState/dt = Sᵀ · v, written into `dydt`
    pub fn derivatives(&self, state: &[f64], dydt: &mut [f64]) -> Result<()> {
        self.check_len("ODE state", state.len())?;
        self.check_len("derivative buffer", dydt.len())?;
        self.derivatives_unchecked(state, dydt);
        Ok(())
    }

    /// Right-hand side used inside the integrator; lengths are checked once
    /// by the caller before integration starts.
    pub(crate) fn derivatives_unchecked(&self, state: &[f64], dydt: &mut [f64]) {
        dydt.iter_mut().for_each(|d| *d = 0.0);
        for r in 0..self.n_reactions() {
            let rate = self.reaction_rate(r, state);
            if rate == 0.0 {
                continue;
            }
            for (d, &s) in dydt.iter_mut().zip(&self.stoichiometry[r]) {
                if s != 0 {
                    *d += f64::from(s) * rate;
                }
            }
        }
    }

    #[inline]
    fn reaction_rate(&self, r: usize, state: &[f64]) -> f64 {
        let mut rate = self.rate_constants[r];
        for (&x, &m) in state.iter().zip(&self.dependency[r]) {
            match m {
                0 => {}
                1 => rate *= x,
                _ => rate *= x.powi(m as i32),
            }
        }
        rate
    }

    pub(crate) fn check_len(&self, context: &'static str, actual: usize) -> Result<()> {
        if actual != self.n_species() {
            return Err(HybridError::DimensionMismatch {
                context,
                expected: self.n_species(),
                actual,
            });
        }
        Ok(())
    }
}

fn position(names: &[String], name: &str) -> Result<usize> {
    names
        .binary_search_by(|n| n.as_str().cmp(name))
        .map_err(|_| HybridError::UnknownSpecies(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding_system() -> ReactionSystem {
        ReactionSystem::build(&[
            ReactionSpec::new(["G1", "GAI"], ["G1GAI"], 2.0),
            ReactionSpec::new(["G1GAI"], ["G1", "GAI"], 0.5),
        ])
        .unwrap()
    }

    #[test]
    fn test_names_sorted() {
        let sys = binding_system();
        assert_eq!(sys.names(), &["G1", "G1GAI", "GAI"]);
        assert_eq!(sys.index_of("GAI").unwrap(), 2);
    }

    #[test]
    fn test_matrices() {
        let sys = binding_system();
        assert_eq!(sys.stoichiometry()[0], vec![-1, 1, -1]);
        assert_eq!(sys.dependency()[0], vec![1, 0, 1]);
        assert_eq!(sys.stoichiometry()[1], vec![1, -1, 1]);
        assert_eq!(sys.dependency()[1], vec![0, 1, 0]);
    }

    #[test]
    fn test_repeated_reactant_multiplicity() {
        let sys = ReactionSystem::build(&[ReactionSpec::new(["A", "A"], ["A2"], 1.0)]).unwrap();
        assert_eq!(sys.dependency()[0], vec![2, 0]);
        assert_eq!(sys.stoichiometry()[0], vec![-2, 1]);

        let rates = sys.evaluate_rates(&[3.0, 0.0]).unwrap();
        assert!((rates[0] - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_mass_action_rates() {
        let sys = binding_system();
        // G1=2, G1GAI=4, GAI=3
        let rates = sys.evaluate_rates(&[2.0, 4.0, 3.0]).unwrap();
        assert!((rates[0] - 12.0).abs() < 1e-12);
        assert!((rates[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_derivatives() {
        let sys = binding_system();
        let mut dydt = vec![0.0; 3];
        sys.derivatives(&[2.0, 4.0, 3.0], &mut dydt).unwrap();
        // net binding flux 12 - 2 = 10
        assert!((dydt[0] + 10.0).abs() < 1e-12);
        assert!((dydt[1] - 10.0).abs() < 1e-12);
        assert!((dydt[2] + 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_source_reaction_allowed() {
        let sys = ReactionSystem::build(&[ReactionSpec::new(Vec::<String>::new(), vec!["X".to_string()], 1.5)])
            .unwrap();
        let rates = sys.evaluate_rates(&[0.0]).unwrap();
        assert!((rates[0] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_reaction_rejected() {
        let err = ReactionSystem::build(&[
            ReactionSpec::new(["A"], ["B"], 1.0),
            ReactionSpec::new(Vec::<String>::new(), Vec::<String>::new(), 1.0),
        ])
        .unwrap_err();
        assert!(matches!(err, HybridError::DegenerateReaction { index: 1 }));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let err = ReactionSystem::build(&[ReactionSpec::new(["A"], ["B"], -1.0)]).unwrap_err();
        assert!(matches!(err, HybridError::InvalidRateConstant { index: 0, .. }));
    }

    #[test]
    fn test_state_length_checked() {
        let sys = binding_system();
        let err = sys.evaluate_rates(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            HybridError::DimensionMismatch { expected: 3, actual: 2, .. }
        ));
    }

    #[test]
    fn test_unknown_name() {
        let sys = binding_system();
        assert!(matches!(sys.index_of("G2"), Err(HybridError::UnknownSpecies(_))));
    }
}
