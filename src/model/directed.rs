//! Defines a `DirectedModel`, which is a Bayesian model that represents the factorization of
//! a probability distribution P

use crate::factor::{Factor, TabularCpd};
use crate::init::Initialization;
use crate::util::{PgmError, Result};
use crate::variable::{Assignment, Variable};
use super::undirected::{UndirectedModel, UndirectedModelBuilder};
use super::Model;

use indexmap::IndexMap;
use log::debug;


/// Represents a Bayesian Network - a Directed Probabilistic Graphical Model.
///
/// # Representation
/// The network is represented as a Directed Acyclic Graph (DAG). A traditional graph data
/// structure is not used for the simple representation of a `DirectedModel`; instead, the
/// Conditional Probability Distribution (CPD) of each `Variable` implicitly defines the edges of
/// the graph. The `Variable`s are held in their topological order to faciliate efficient
/// computations over the graph.
#[derive(Clone, Debug)]
pub struct DirectedModel {

    /// The names of the `Variable`s comprising the scope of the `DirectedModel` and their
    /// associated CPDs. The CPD of ```X``` has evidence ```Pa(X)```, so in the DAG represented by
    /// this map there are edges ```P -> X forall P in cpd(X).evidence()```
    graph: IndexMap<String, TabularCpd>

}

impl DirectedModel {

    /// Get the CPD for the named variable in this model.
    pub fn cpd(&self, name: &str) -> Option<&TabularCpd> {
        self.graph.get(name)
    }

    /// Get the parents of the named variable
    pub fn parents(&self, name: &str) -> Option<&[Variable]> {
        self.graph.get(name).map(|cpd| cpd.evidence())
    }

    /// Get the children of the named variable, in topological order
    pub fn children(&self, name: &str) -> Vec<&Variable> {
        self.graph.values()
                  .filter(|cpd| cpd.evidence().iter().any(|p| p.name() == name))
                  .map(|cpd| cpd.variable())
                  .collect()
    }

    /// Get a topological order of the `DirectedModel`
    pub fn topological_order(&self) -> Vec<Variable> {
        self.variables()
    }
}

impl Model for DirectedModel {

    type Conditioned = UndirectedModel;

    fn lookup_variable(&self, name: &str) -> Option<&Variable> {
        self.graph.get(name).map(|cpd| cpd.variable())
    }

    fn variables(&self) -> Vec<Variable> {
        self.graph.values().map(|cpd| cpd.variable().clone()).collect()
    }

    fn num_variables(&self) -> usize {
        self.graph.len()
    }

    fn factors(&self) -> Vec<Factor> {
        self.graph.values().map(|cpd| cpd.to_factor()).collect()
    }

    /// Condition the `DirectedModel` given the evidence.
    ///
    /// Reducing the CPDs by the evidence breaks their normalization, so the result is the reduced
    /// Gibbs distribution as an `UndirectedModel`.
    ///
    /// # Errors
    /// * `PgmError::UnknownVariable` or `PgmError::StateOutOfRange` for invalid evidence
    /// * `PgmError::InconsistentEvidence` if the evidence has zero probability
    fn condition(&self, evidence: &Assignment) -> Result<UndirectedModel> {
        self.check_assignment(evidence)?;

        let mut builder = UndirectedModelBuilder::new();
        for cpd in self.graph.values() {
            let phi = cpd.as_factor();
            builder = builder.with_factor(phi.reduce(&evidence.restricted_to(phi.scope()))?);
        }

        builder.build().map_err(|e| match e {
            PgmError::ZeroPartition(_) => PgmError::InconsistentEvidence,
            e => e
        })
    }

    /// Determine the probability of a full `Assignment` by the chain rule
    fn probability(&self, assignment: &Assignment) -> Result<f64> {
        // for every variable in the graph
        self.graph.values()
                  // get the probability of the assignment
                  .map(|cpd| cpd.value(assignment))
                  // and multiply those probability by the chain rule
                  // but if there are any errors, just return the error
                  .try_fold(1.0, |p, val| val.map(|v| p * v))
    }
}


/// An implementation of the [builder pattern] for creating a `DirectedModel`.
///
/// Models must be assembled in topological order: a `Variable`'s parents have to be added before
/// it. This guarantees the graph is acyclic.
///
/// [builder pattern]: https://en.wikipedia.org/wiki/Builder_pattern
#[derive(Default)]
pub struct DirectedModelBuilder {

    /// The `Variable`s and their associated CPDs
    cpds: IndexMap<String, TabularCpd>,

    /// The error state of the builder
    err: Option<PgmError>

}


impl DirectedModelBuilder {

    /// Construct a new `DirectedModelBuilder` representing an empty `DirectedModel`
    pub fn new() -> Self {
        DirectedModelBuilder {
            cpds: IndexMap::new(),
            err: None
        }
    }


    /// Add a `Variable` to the `DirectedModel`.
    ///
    /// # Args
    /// * `var`: the variable to add to the model
    /// * `parents`: the parent variables. The parents must already be in the model.
    /// * `init`: the initialization mechanism for the CPD of `var` in the model.
    pub fn with_variable(mut self, var: &Variable, parents: &[Variable], init: Initialization) -> Self {
        // if we are in an error state, do nothing
        if self.err.is_some() {
            return self;
        }

        if let Err(e) = self.add_variable(var, parents, init) {
            self.err = Some(e);
        }

        self
    }


    /// Complete building the model.
    ///
    /// # Returns
    /// the `DirectedModel`, or the first error generated during the building process
    ///
    /// # Postcondition
    /// This call consumes the `DirectedModelBuilder`
    pub fn build(self) -> Result<DirectedModel> {
        match self.err {
            Some(e) => Err(e),
            None => {
                debug!("built a directed model over {} variables", self.cpds.len());
                Ok(DirectedModel { graph: self.cpds })
            }
        }
    }


    /// Internal function that acutally does the variable addition to the model
    fn add_variable(&mut self, var: &Variable, parents: &[Variable], init: Initialization) -> Result<()> {
        if self.cpds.contains_key(var.name()) {
            return Err(PgmError::DuplicateVariable(var.name().to_string()));
        }

        for p in parents.iter() {
            let known = self.cpds
                            .get(p.name())
                            .ok_or_else(|| PgmError::MissingParent(p.name().to_string()))?
                            .variable();

            if known.cardinality() != p.cardinality() {
                return Err(PgmError::CardinalityMismatch {
                    name: p.name().to_string(),
                    left: known.cardinality(),
                    right: p.cardinality()
                });
            }
        }

        let cpd = init.build_cpd(var, parents)?;
        self.cpds.insert(var.name().to_string(), cpd);

        Ok(())
    }
}
