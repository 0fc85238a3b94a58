//! Defines a `Model`, which is a Bayesian (directed) or Markovian (undirected) graphical model
//! representing the factorization of a probability distribution P.

use crate::factor::Factor;
use crate::util::{PgmError, Result};
use crate::variable::{Assignment, Variable};

/// The `Model` trait represents a Probabilistic Graphical Model.
pub trait Model {

    /// The concrete type of `Model` that is returned by the `condition` operation.
    type Conditioned;


    /// Lookup a `Variable` in the `Model` based on the name
    fn lookup_variable(&self, name: &str) -> Option<&Variable>;


    /// Get all `Variable`s in the model, in model order.
    fn variables(&self) -> Vec<Variable>;


    /// Get the number of `Variable`s in the the `Model`
    fn num_variables(&self) -> usize;


    /// The `Factor`s whose product is the (unnormalized) distribution of the `Model`
    fn factors(&self) -> Vec<Factor>;


    /// Condition the `Model` given the evidence.
    ///
    /// # Args
    /// * `evidence`: a partial `Assignment` of the `Variable`s in this `Model`.
    ///
    /// # Returns:
    /// a new `Model` with scope ```self.vars() - evidence.keys()``` that represents the
    /// conditional distribution ```P(self.scope() - evidence.keys() | evidence.keys())```
    fn condition(&self, evidence: &Assignment) -> Result<Self::Conditioned>;


    /// Determine the probability of a full `Assignment` to the `Variable`s in the `Model`.
    ///
    /// Specifically, this computes ```P(zeta)```, where ```zeta``` is a full assignment.
    ///
    /// # Args
    /// * `assignment`: a full `Assignment` to the `Model`
    ///
    /// # Returns
    /// the probability of the `Assignment` given the `Model`
    fn probability(&self, assignment: &Assignment) -> Result<f64>;


    /// Check that every variable in `assignment` belongs to the `Model` and that its state is in
    /// range
    fn check_assignment(&self, assignment: &Assignment) -> Result<()> {
        for (name, state) in assignment.iter() {
            let var = self.lookup_variable(name)
                          .ok_or_else(|| PgmError::UnknownVariable(name.to_string()))?;

            if state >= var.cardinality() {
                return Err(PgmError::StateOutOfRange {
                    name: name.to_string(),
                    state,
                    cardinality: var.cardinality()
                });
            }
        }

        Ok(())
    }
}

pub mod directed;
pub mod junction_tree;
pub mod undirected;
