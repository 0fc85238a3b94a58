//! Defines an `UndirectedModel` which is a Markovian model that represents the factorization of a
//! probability distribution P

use crate::factor::Factor;
use crate::inference::VariableElimination;
use crate::util::{PgmError, Result};
use crate::variable::{Assignment, Variable};
use super::Model;

use indexmap::IndexMap;
use log::debug;

/// Represents a Markovian Network - an Undirected Probabilistic Graphical Model.
///
/// # Representation
/// Although a Markovian Network typically is represented as a graph, this representation does not
/// explicitly define the graph structure. Instead, it uses a logical view of a Markovian Network
/// as a collection of `Factor`s to present the semantics of operations over a Markovian Network.
/// Although there are connections between these `Factor`s, they are not explicitly defined.
#[derive(Clone, Debug)]
pub struct UndirectedModel {

    /// The `Factor`s that comprise the `UndirectedModel`
    factors: Vec<Factor>,

    /// The `Variable`s that comprise the `UndirectedModel`, in order of first appearance
    variables: IndexMap<String, Variable>,

    /// The partition function of the Gibbs Distribution.
    partition: f64

}


impl UndirectedModel {

    /// Get the partition function of the Gibbs distribution
    pub fn partition(&self) -> f64 {
        self.partition
    }
}


impl Model for UndirectedModel {

    type Conditioned = UndirectedModel;

    fn lookup_variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    fn variables(&self) -> Vec<Variable> {
        self.variables.values().cloned().collect()
    }

    fn num_variables(&self) -> usize {
        self.variables.len()
    }

    fn factors(&self) -> Vec<Factor> {
        self.factors.clone()
    }

    /// Condition the `Model` given the evidence. Factors reduced to scalars are kept, so the
    /// partition function of the result is the unnormalized measure of the evidence.
    ///
    /// # Errors
    /// * `PgmError::UnknownVariable` or `PgmError::StateOutOfRange` for invalid evidence
    /// * `PgmError::InconsistentEvidence` if the evidence has zero probability
    fn condition(&self, evidence: &Assignment) -> Result<UndirectedModel> {
        self.check_assignment(evidence)?;

        let builder = self.factors
                          .iter()
                          .map(|f| f.reduce(&evidence.restricted_to(f.scope())))
                          .collect::<Result<Vec<Factor>>>()?
                          .into_iter()
                          .fold(UndirectedModelBuilder::new(), |b, f| b.with_factor(f));

        builder.build().map_err(|e| match e {
            PgmError::ZeroPartition(_) => PgmError::InconsistentEvidence,
            e => e
        })
    }

    /// The normalized probability of a full `Assignment`
    fn probability(&self, assignment: &Assignment) -> Result<f64> {
        // for every factor in the graph
        self.factors.iter()
                    // get the value of the assignment
                    .map(|f| f.value(assignment))
                    // and multiply those values together
                    .try_fold(1.0, |p, val| val.map(|v| p * v))
                    // and finally normalize by the partition function
                    .map(|v| v / self.partition)
    }

}


/// An implementation of the [builder pattern] for creating a `UndirectedModel`.
///
/// [builder pattern]: https://en.wikipedia.org/wiki/Builder_pattern
#[derive(Default)]
pub struct UndirectedModelBuilder {

    /// The `Factor`s added to the `UndirectedModel`
    factors: Vec<Factor>,

    /// Every `Variable` seen so far
    variables: IndexMap<String, Variable>,

    /// The error state of the builder, if any
    err: Option<PgmError>

}

impl UndirectedModelBuilder {

    /// Construct a new `UndirectedModelBuilder`
    pub fn new() -> UndirectedModelBuilder {
        UndirectedModelBuilder {
            factors: Vec::new(),
            variables: IndexMap::new(),
            err: None
        }
    }


    /// Add a `Factor` to the `UndirectedModel`. A variable shared with an earlier `Factor` must
    /// have the same cardinality.
    pub fn with_factor(mut self, factor: Factor) -> Self {
        if self.err.is_some() {
            return self;
        }

        for v in factor.scope().iter() {
            match self.variables.get(v.name()) {
                Some(known) if known.cardinality() != v.cardinality() => {
                    self.err = Some(PgmError::CardinalityMismatch {
                        name: v.name().to_string(),
                        left: known.cardinality(),
                        right: v.cardinality()
                    });
                    return self;
                },
                Some(_) => (),
                None => {
                    self.variables.insert(v.name().to_string(), v.clone());
                }
            }
        }

        self.factors.push(factor);
        self
    }


    /// Build the `UndirectedModel`, computing its partition function by variable elimination
    ///
    /// # Errors
    /// * the first error recorded by `with_factor`
    /// * `PgmError::ZeroPartition` if every assignment has measure zero
    pub fn build(self) -> Result<UndirectedModel> {
        if let Some(e) = self.err {
            return Err(e);
        }

        let partition = VariableElimination::new(self.factors.clone())?
            .evidence_probability(&Assignment::new())?;

        if !(partition > 0.0 && partition.is_finite()) {
            return Err(PgmError::ZeroPartition(partition));
        }

        debug!(
            "built an undirected model of {} factors over {} variables, Z = {}",
            self.factors.len(),
            self.variables.len(),
            partition
        );

        Ok(UndirectedModel {
            factors: self.factors,
            variables: self.variables,
            partition
        })
    }

}
