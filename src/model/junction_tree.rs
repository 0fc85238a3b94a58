//! Defines a `JunctionTree`: an undirected tree of cliques, each holding a potential, whose
//! product is the (unnormalized) distribution being modelled.
//!
//! The tree itself is supplied by the caller. Building one from a model (triangulation and
//! clique-tree construction) is out of the scope of this library, as is checking the running
//! intersection property.

use crate::factor::Factor;
use crate::util::{PgmError, Result};
use crate::variable::{Variable, VariableSet};

use indexmap::{IndexMap, IndexSet};
use log::debug;

/// A tree of cliques connected through separators
///
/// # Representation
/// Cliques are numbered in the order they were first declared to the `JunctionTreeBuilder`; the
/// first clique is the root used by calibration. Every clique holds exactly one potential whose
/// variables are exactly the clique.
#[derive(Clone, Debug)]
pub struct JunctionTree {

    /// The variables of each clique
    cliques: Vec<VariableSet>,

    /// The potential of each clique
    potentials: Vec<Factor>,

    /// The edges of the tree, as pairs of clique indices
    edges: Vec<(usize, usize)>,

    /// The neighbours of each clique
    adjacency: Vec<Vec<usize>>

}

impl JunctionTree {

    /// The cliques, in index order
    pub fn cliques(&self) -> &[VariableSet] {
        &self.cliques
    }

    pub fn num_cliques(&self) -> usize {
        self.cliques.len()
    }

    /// The edges of the tree, in the order they were declared
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// The neighbours of clique `i`
    pub fn neighbors(&self, i: usize) -> &[usize] {
        self.adjacency.get(i).map(|n| n.as_slice()).unwrap_or(&[])
    }

    /// The separator between two cliques: the variables they share
    pub fn sepset(&self, a: usize, b: usize) -> Option<VariableSet> {
        match (self.cliques.get(a), self.cliques.get(b)) {
            (Some(x), Some(y)) => Some(x.intersection(y)),
            _ => None
        }
    }

    /// The potential of clique `i`
    pub fn potential(&self, i: usize) -> Option<&Factor> {
        self.potentials.get(i)
    }

    pub fn potentials(&self) -> &[Factor] {
        &self.potentials
    }

    /// The index of the clique with exactly the given variables
    pub fn clique_index(&self, clique: &VariableSet) -> Option<usize> {
        self.cliques.iter().position(|c| c == clique)
    }

    /// Every variable in the tree, in order of first appearance across the potentials
    pub fn variables(&self) -> Vec<Variable> {
        let mut seen: IndexMap<&str, &Variable> = IndexMap::new();
        for v in self.potentials.iter().flat_map(|phi| phi.scope().iter()) {
            seen.entry(v.name()).or_insert(v);
        }
        seen.values().map(|&v| v.clone()).collect()
    }

    /// Replace the potential of clique `i`
    ///
    /// # Errors
    /// `PgmError::InvalidStructure` if there is no clique `i` or the factor is not over exactly its
    /// variables, `PgmError::CardinalityMismatch` if it disagrees with the rest of the tree
    pub(crate) fn set_potential(&mut self, i: usize, factor: Factor) -> Result<()> {
        let clique = self.cliques
                         .get(i)
                         .ok_or_else(|| PgmError::InvalidStructure(format!("there is no clique {}", i)))?;

        if &factor.variables() != clique {
            return Err(PgmError::InvalidStructure(
                format!("a potential over {} cannot be assigned to clique {}", factor.variables(), clique)
            ));
        }

        let known = self.variables();
        check_cardinalities(&known, factor.scope())?;

        self.potentials[i] = factor;
        Ok(())
    }

}


/// Check that every variable in `scope` agrees with the cardinality of the same variable in `known`
fn check_cardinalities(known: &[Variable], scope: &[Variable]) -> Result<()> {
    for v in scope.iter() {
        if let Some(k) = known.iter().find(|k| k.name() == v.name()) {
            if k.cardinality() != v.cardinality() {
                return Err(PgmError::CardinalityMismatch {
                    name: v.name().to_string(),
                    left: k.cardinality(),
                    right: v.cardinality()
                });
            }
        }
    }
    Ok(())
}


/// An implementation of the [builder pattern] for creating a `JunctionTree`.
///
/// [builder pattern]: https://en.wikipedia.org/wiki/Builder_pattern
#[derive(Default)]
pub struct JunctionTreeBuilder {

    /// The cliques, in order of declaration
    cliques: IndexSet<VariableSet>,

    /// The declared edges
    edges: Vec<(usize, usize)>,

    /// The factors to assign to cliques
    factors: Vec<Factor>,

    /// The error state of the builder, if any
    err: Option<PgmError>

}

impl JunctionTreeBuilder {

    /// Construct a new `JunctionTreeBuilder`
    pub fn new() -> Self {
        JunctionTreeBuilder {
            cliques: IndexSet::new(),
            edges: Vec::new(),
            factors: Vec::new(),
            err: None
        }
    }


    /// Declare a clique. Declaring the same clique twice is an error.
    pub fn with_clique(mut self, clique: VariableSet) -> Self {
        if self.err.is_none() && !self.cliques.insert(clique.clone()) {
            self.err = Some(PgmError::InvalidStructure(format!("clique {} was declared twice", clique)));
        }
        self
    }


    /// Connect two cliques, declaring either of them if it is new
    pub fn with_edge(mut self, a: VariableSet, b: VariableSet) -> Self {
        if self.err.is_some() {
            return self;
        }

        let (i, _) = self.cliques.insert_full(a);
        let (j, _) = self.cliques.insert_full(b);
        self.edges.push((i, j));
        self
    }


    /// Assign a factor to the clique over exactly the factor's variables. Several factors for the
    /// same clique are multiplied together.
    pub fn with_factor(mut self, factor: Factor) -> Self {
        if self.err.is_none() {
            self.factors.push(factor);
        }
        self
    }


    /// Build the `JunctionTree`
    ///
    /// # Errors
    /// * `PgmError::InvalidStructure` if the cliques and edges do not form a single tree, an edge
    ///   joins cliques that share no variables, a factor matches no clique or a clique receives
    ///   no factor
    /// * `PgmError::CardinalityMismatch` if the factors disagree on a variable
    pub fn build(self) -> Result<JunctionTree> {
        if let Some(e) = self.err {
            return Err(e);
        }

        let cliques: Vec<VariableSet> = self.cliques.into_iter().collect();
        if cliques.is_empty() {
            return Err(PgmError::InvalidStructure(String::from("a junction tree needs at least one clique")));
        }

        let adjacency = build_adjacency(&cliques, &self.edges)?;
        check_tree(&cliques, &self.edges, &adjacency)?;

        // assign each factor to its clique
        let mut known: Vec<Variable> = Vec::new();
        let mut potentials: Vec<Option<Factor>> = vec![None; cliques.len()];
        for factor in self.factors.into_iter() {
            check_cardinalities(&known, factor.scope())?;
            for v in factor.scope().iter() {
                if !known.iter().any(|k| k.name() == v.name()) {
                    known.push(v.clone());
                }
            }

            let vars = factor.variables();
            let i = cliques.iter().position(|c| c == &vars).ok_or_else(|| {
                PgmError::InvalidStructure(format!("no clique matches a factor over {}", vars))
            })?;

            potentials[i] = Some(match potentials[i].take() {
                Some(phi) => phi.product(&factor)?,
                None => factor
            });
        }

        let potentials = potentials.into_iter()
                                   .zip(cliques.iter())
                                   .map(|(phi, c)| phi.ok_or_else(|| {
                                       PgmError::InvalidStructure(format!("clique {} has no potential", c))
                                   }))
                                   .collect::<Result<Vec<Factor>>>()?;

        debug!("built a junction tree of {} cliques", cliques.len());

        Ok(JunctionTree { cliques, potentials, edges: self.edges, adjacency })
    }

}


/// Build the neighbour lists, rejecting self loops, repeated edges and empty separators
fn build_adjacency(cliques: &[VariableSet], edges: &[(usize, usize)]) -> Result<Vec<Vec<usize>>> {
    let mut adjacency = vec![Vec::new(); cliques.len()];

    for &(i, j) in edges.iter() {
        if i == j {
            return Err(PgmError::InvalidStructure(format!("clique {} is connected to itself", cliques[i])));
        }

        if adjacency[i].contains(&j) {
            return Err(PgmError::InvalidStructure(
                format!("cliques {} and {} are connected twice", cliques[i], cliques[j])
            ));
        }

        if cliques[i].intersection(&cliques[j]).is_empty() {
            return Err(PgmError::InvalidStructure(
                format!("cliques {} and {} share no variables", cliques[i], cliques[j])
            ));
        }

        adjacency[i].push(j);
        adjacency[j].push(i);
    }

    Ok(adjacency)
}


/// A graph on `n` nodes is a tree iff it has `n - 1` edges and is connected
fn check_tree(cliques: &[VariableSet], edges: &[(usize, usize)], adjacency: &[Vec<usize>]) -> Result<()> {
    if edges.len() + 1 != cliques.len() {
        return Err(PgmError::InvalidStructure(
            format!("{} cliques cannot form a tree with {} edges", cliques.len(), edges.len())
        ));
    }

    let mut visited = vec![false; cliques.len()];
    let mut stack = vec![0];
    visited[0] = true;
    while let Some(i) = stack.pop() {
        for &j in adjacency[i].iter() {
            if !visited[j] {
                visited[j] = true;
                stack.push(j);
            }
        }
    }

    match visited.iter().position(|&v| !v) {
        Some(i) => Err(PgmError::InvalidStructure(
            format!("clique {} is not connected to clique {}", cliques[i], cliques[0])
        )),
        None => Ok(())
    }
}
