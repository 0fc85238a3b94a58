//! Defines the interface to inference engines

use crate::factor::Factor;
use crate::util::Result;
use crate::variable::{Assignment, VariableSet};

mod belief_propagation;
mod elimination_order;
mod variable_elimination;

pub use self::belief_propagation::BeliefPropagation;
pub use self::elimination_order::{EliminationHeuristic, EliminationOrdering};
pub use self::variable_elimination::VariableElimination;


/// A `ConditionalInference` engine is capable of answering Conditional Probability Queries of the
/// form:
///     ```P(Y | E = e)```
pub trait ConditionalInference {

    /// Infer the joint distribution ```P(variables | evidence)```. The scope of the result is
    /// `variables`, in the order given.
    fn query(&self, variables: &[&str], evidence: &Assignment) -> Result<Factor>;

}


/// A `MapInference` engine is capable of answering Maximum a posteriori queries:
///     ```MAP(Y | E = e) = argmax_y P(Y = y | E = e)```
pub trait MapInference {

    /// Infer the most probable joint assignment of every unobserved variable given the evidence.
    /// If `variables` are given, the assignment is restricted to them.
    fn map_query(&self, variables: Option<&[&str]>, evidence: &Assignment) -> Result<Assignment>;

    /// The probability of the most probable assignment.
    ///
    /// Without `variables`, this is the largest probability of a complete assignment to the
    /// unobserved variables given the evidence. With `variables`, the other unobserved variables
    /// are maximized out, and the result is the largest entry of the product of the normalized
    /// distributions of each queried variable.
    fn max_marginal(&self, variables: Option<&[&str]>, evidence: &Assignment) -> Result<f64>;

}


/// The pair of operations used to pass messages: products combine factors, and the projection
/// onto a separator either sums or maximizes out the other variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Semiring {
    SumProduct,
    MaxProduct
}

impl Semiring {

    /// Remove every variable of `factor` that is not in `onto`
    pub fn project(self, factor: &Factor, onto: &VariableSet) -> Result<Factor> {
        let others: Vec<&str> = factor.names().filter(|v| !onto.contains(v)).collect();

        match self {
            Semiring::SumProduct => factor.marginalize(&others),
            Semiring::MaxProduct => factor.maximize(&others)
        }
    }

}
