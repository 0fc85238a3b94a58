//! Greedy elimination orderings, as described in Koller & Friedman Section 9.4.3.2
//!
//! Each ordering is computed on an interaction graph built for the call: two variables are
//! adjacent iff they appear together in the scope of some `Factor`.

use crate::factor::Factor;
use crate::util::{PgmError, Result};

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;

/// The cost function used to choose the next variable to eliminate. The variable with the lowest
/// cost is eliminated first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EliminationHeuristic {
    /// The product of the cardinalities of the neighbours: the size of the factor created by
    /// eliminating the variable
    #[default]
    MinWeight,

    /// The number of neighbours
    MinNeighbors,

    /// The number of fill edges eliminating the variable would add
    MinFill,

    /// The sum, over the fill edges, of the product of the cardinalities of their endpoints
    WeightedMinFill
}

/// How a query chooses its elimination order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EliminationOrdering {
    /// Greedily, by a heuristic
    Heuristic(EliminationHeuristic),

    /// A caller supplied order over the variables of the model. It must list every variable a
    /// query eliminates; the rest are skipped.
    Explicit(Vec<String>)
}

impl Default for EliminationOrdering {
    fn default() -> Self {
        EliminationOrdering::Heuristic(EliminationHeuristic::default())
    }
}

impl EliminationOrdering {

    /// The order in which to eliminate `to_eliminate` from `factors`. An explicit order may list
    /// more variables than a query eliminates; the others are skipped and the relative order of
    /// the rest is kept.
    ///
    /// # Errors
    /// `PgmError::InvalidEliminationOrder` if an explicit order lists a variable twice or misses
    /// one of `to_eliminate`
    pub(crate) fn resolve(&self, factors: &[Factor], to_eliminate: &[String]) -> Result<Vec<String>> {
        match self {
            EliminationOrdering::Heuristic(h) => Ok(h.order(factors, to_eliminate)),
            EliminationOrdering::Explicit(order) => {
                if let Some(dup) = order.iter().duplicates().next() {
                    return Err(PgmError::InvalidEliminationOrder(format!("`{}` is listed twice", dup)));
                }

                if let Some(missing) = to_eliminate.iter().find(|v| !order.contains(v)) {
                    return Err(PgmError::InvalidEliminationOrder(format!("`{}` is missing", missing)));
                }

                Ok(order.iter().filter(|v| to_eliminate.contains(v)).cloned().collect())
            }
        }
    }

}

impl EliminationHeuristic {

    /// Greedily order `to_eliminate`. Ties go to the variable listed first in `to_eliminate`.
    pub fn order(self, factors: &[Factor], to_eliminate: &[String]) -> Vec<String> {
        let mut graph = InteractionGraph::new(factors);
        let mut remaining: Vec<&str> = to_eliminate.iter().map(|v| v.as_str()).collect();
        let mut order = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let (idx, _) = remaining.iter()
                                    .enumerate()
                                    .min_by_key(|(_, v)| graph.cost(v, self))
                                    .unwrap_or((0, &""));

            let var = remaining.remove(idx);
            graph.eliminate(var);
            order.push(var.to_string());
        }

        order
    }

}


/// The undirected graph induced by a set of factor scopes
struct InteractionGraph {

    /// The cardinality of every variable
    cardinalities: IndexMap<String, usize>,

    /// The neighbours of every variable
    adjacency: IndexMap<String, IndexSet<String>>

}

impl InteractionGraph {

    fn new(factors: &[Factor]) -> Self {
        let mut cardinalities = IndexMap::new();
        let mut adjacency: IndexMap<String, IndexSet<String>> = IndexMap::new();

        for phi in factors.iter() {
            for v in phi.scope().iter() {
                cardinalities.insert(v.name().to_string(), v.cardinality());
                let neighbors = adjacency.entry(v.name().to_string()).or_default();
                for u in phi.names().filter(|&u| u != v.name()) {
                    neighbors.insert(u.to_string());
                }
            }
        }

        InteractionGraph { cardinalities, adjacency }
    }

    fn neighbors(&self, var: &str) -> impl Iterator<Item = &str> {
        self.adjacency.get(var).into_iter().flat_map(|n| n.iter().map(|u| u.as_str()))
    }

    fn cardinality(&self, var: &str) -> usize {
        self.cardinalities.get(var).copied().unwrap_or(1)
    }

    fn adjacent(&self, u: &str, v: &str) -> bool {
        self.adjacency.get(u).map_or(false, |n| n.contains(v))
    }

    /// The pairs of neighbours of `var` that are not yet adjacent
    fn fill_edges<'a>(&'a self, var: &str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let neighbors: Vec<&'a str> = self.adjacency
                                          .get(var)
                                          .map(|n| n.iter().map(|u| u.as_str()).collect())
                                          .unwrap_or_default();

        neighbors.into_iter()
                 .tuple_combinations()
                 .filter(move |&(u, v)| !self.adjacent(u, v))
    }

    fn cost(&self, var: &str, heuristic: EliminationHeuristic) -> usize {
        match heuristic {
            EliminationHeuristic::MinWeight => {
                self.neighbors(var).fold(1usize, |w, u| w.saturating_mul(self.cardinality(u)))
            },
            EliminationHeuristic::MinNeighbors => self.neighbors(var).count(),
            EliminationHeuristic::MinFill => self.fill_edges(var).count(),
            EliminationHeuristic::WeightedMinFill => {
                self.fill_edges(var)
                    .map(|(u, v)| self.cardinality(u).saturating_mul(self.cardinality(v)))
                    .fold(0usize, |acc, w| acc.saturating_add(w))
            }
        }
    }

    /// Connect the neighbours of `var` pairwise and remove it from the graph
    fn eliminate(&mut self, var: &str) {
        let neighbors = self.adjacency.shift_remove(var).unwrap_or_default();

        for u in neighbors.iter() {
            if let Some(adj) = self.adjacency.get_mut(u) {
                adj.shift_remove(var);
                adj.extend(neighbors.iter().filter(|&v| v != u).cloned());
            }
        }
    }

}
