//! Defines an inference engine that uses exact inference by variable elimination to answer
//! conditional probability and MAP queries.
//!
//! Implementation of Koller & Friedman Algorithm 9.1 (Sum-Product-VE) and Algorithm 13.1
//! (Max-Product-VE, with traceback).

use crate::factor::{Backpointer, Factor};
use crate::model::directed::DirectedModel;
use crate::model::undirected::UndirectedModel;
use crate::model::Model;
use crate::util::{PgmError, Result};
use crate::variable::{Assignment, Variable};
use super::elimination_order::{EliminationHeuristic, EliminationOrdering};
use super::{ConditionalInference, MapInference};

use indexmap::IndexMap;
use log::{debug, trace};

/// Exact inference over a "bag of factors" by variable elimination
///
/// The engine holds the factors of a model. Every query works on its own copy of them: the
/// factors are reduced by the evidence and the remaining variables are eliminated in an order
/// computed for that query.
#[derive(Clone, Debug)]
pub struct VariableElimination {

    /// the factors whose product is the (unnormalized) distribution to query
    factors: Vec<Factor>,

    /// every variable, in order of first appearance across `factors`
    variables: IndexMap<String, Variable>,

    /// how to order the variables to eliminate
    ordering: EliminationOrdering

}


impl VariableElimination {

    /// Construct an engine over a set of factors
    ///
    /// # Errors
    /// `PgmError::CardinalityMismatch` if two factors disagree on the cardinality of a variable
    pub fn new(factors: Vec<Factor>) -> Result<Self> {
        let mut variables: IndexMap<String, Variable> = IndexMap::new();

        for v in factors.iter().flat_map(|phi| phi.scope().iter()) {
            match variables.get(v.name()) {
                Some(known) if known.cardinality() != v.cardinality() => {
                    return Err(PgmError::CardinalityMismatch {
                        name: v.name().to_string(),
                        left: known.cardinality(),
                        right: v.cardinality()
                    });
                },
                Some(_) => (),
                None => {
                    variables.insert(v.name().to_string(), v.clone());
                }
            }
        }

        Ok(VariableElimination { factors, variables, ordering: EliminationOrdering::default() })
    }


    /// Construct an engine over the CPDs of a `DirectedModel`
    pub fn for_directed(model: &DirectedModel) -> Self {
        VariableElimination::for_model(model)
    }


    /// Construct an engine over the factors of an `UndirectedModel`
    pub fn for_undirected(model: &UndirectedModel) -> Self {
        VariableElimination::for_model(model)
    }


    /// Models check the consistency of their variables when they are built
    fn for_model<M: Model>(model: &M) -> Self {
        VariableElimination {
            factors: model.factors(),
            variables: model.variables().into_iter().map(|v| (v.name().to_string(), v)).collect(),
            ordering: EliminationOrdering::default()
        }
    }


    /// Choose the elimination order greedily with `heuristic`
    pub fn with_heuristic(mut self, heuristic: EliminationHeuristic) -> Self {
        self.ordering = EliminationOrdering::Heuristic(heuristic);
        self
    }


    /// Eliminate variables in the given order. The order may name any variable of the model and
    /// must name every variable a query eliminates; each query skips the variables it keeps or
    /// observes.
    pub fn with_elimination_order(mut self, order: &[&str]) -> Self {
        self.ordering = EliminationOrdering::Explicit(order.iter().map(|v| v.to_string()).collect());
        self
    }


    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }


    /// Every variable, in order of first appearance across the factors
    pub fn variables(&self) -> Vec<Variable> {
        self.variables.values().cloned().collect()
    }


    /// The order in which `query(variables, evidence)` eliminates variables
    pub fn elimination_order(&self, variables: &[&str], evidence: &Assignment) -> Result<Vec<String>> {
        self.check_query(variables, evidence)?;
        let factors = self.reduced(evidence)?;
        self.order(&factors, variables, evidence)
    }


    /// The marginal distribution of each queried variable, conditioned on `evidence`
    pub fn query_marginals(&self, variables: &[&str], evidence: &Assignment) -> Result<IndexMap<String, Factor>> {
        let joint = self.query(variables, evidence)?;

        variables.iter()
                 .map(|&name| {
                     let others: Vec<&str> = variables.iter().filter(|&&v| v != name).cloned().collect();
                     joint.marginalize(&others).map(|phi| (name.to_string(), phi))
                 })
                 .collect()
    }


    /// The total unnormalized measure of `evidence`: the sum over every assignment consistent with
    /// it of the product of the factors. For a Bayesian network this is ```P(evidence)```; with
    /// no evidence it is the partition function.
    pub fn evidence_probability(&self, evidence: &Assignment) -> Result<f64> {
        self.check_evidence(evidence)?;

        let factors = self.reduced(evidence)?;
        let order = self.order(&factors, &[], evidence)?;
        let remaining = eliminate(factors, &order, &mut SumOut)?;

        Ok(Factor::product_all(&remaining)?.sum())
    }


    /// Check that `evidence` names known variables and states that exist
    fn check_evidence(&self, evidence: &Assignment) -> Result<()> {
        for (name, state) in evidence.iter() {
            let var = self.variables
                          .get(name)
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


    /// Check the query variables against the model and the evidence
    fn check_query(&self, variables: &[&str], evidence: &Assignment) -> Result<()> {
        self.check_evidence(evidence)?;

        for (i, &name) in variables.iter().enumerate() {
            if !self.variables.contains_key(name) {
                return Err(PgmError::UnknownVariable(name.to_string()));
            }

            if variables[..i].contains(&name) {
                return Err(PgmError::DuplicateVariable(name.to_string()));
            }

            if evidence.contains(name) {
                return Err(PgmError::QueryEvidenceOverlap(name.to_string()));
            }
        }

        Ok(())
    }


    /// A working copy of the factors, reduced by the evidence
    fn reduced(&self, evidence: &Assignment) -> Result<Vec<Factor>> {
        self.factors
            .iter()
            .map(|phi| phi.reduce(&evidence.restricted_to(phi.scope())))
            .collect()
    }


    /// The elimination order for everything but the kept and observed variables
    fn order(&self, factors: &[Factor], keep: &[&str], evidence: &Assignment) -> Result<Vec<String>> {
        let to_eliminate: Vec<String> = self.variables
                                            .keys()
                                            .filter(|&v| !keep.contains(&v.as_str()) && !evidence.contains(v))
                                            .cloned()
                                            .collect();

        if let EliminationOrdering::Explicit(explicit) = &self.ordering {
            if let Some(unknown) = explicit.iter().find(|v| !self.variables.contains_key(v.as_str())) {
                return Err(PgmError::InvalidEliminationOrder(
                    format!("`{}` is not a variable of the model", unknown)
                ));
            }
        }

        let order = self.ordering.resolve(factors, &to_eliminate)?;
        debug!("elimination order: {:?}", order);
        Ok(order)
    }


    /// Max-product elimination of every unobserved variable, followed by traceback
    ///
    /// # Returns
    /// the largest unnormalized value consistent with the evidence and the assignment attaining it
    fn max_product(&self, evidence: &Assignment) -> Result<(f64, Assignment)> {
        let factors = self.reduced(evidence)?;
        let order = self.order(&factors, &[], evidence)?;

        let mut op = MaxOut { backpointers: Vec::with_capacity(order.len()) };
        let remaining = eliminate(factors, &order, &mut op)?;
        let best = Factor::product_all(&remaining)?.max_value();

        // every back-pointer is over variables eliminated after its own
        let mut traceback = Assignment::new();
        for bp in op.backpointers.iter().rev() {
            let state = bp.state(&traceback)?;
            traceback.set(bp.variable().name(), state);
        }

        let assignment = self.variables
                             .keys()
                             .filter_map(|v| traceback.get(v).map(|s| (v.as_str(), s)))
                             .collect();

        Ok((best, assignment))
    }

}


/// The operation that removes a variable from the product of the factors that mention it
trait Elimination {

    fn eliminate(&mut self, psi: &Factor, var: &str) -> Result<Factor>;

}

/// Sum-product elimination
struct SumOut;

impl Elimination for SumOut {

    fn eliminate(&mut self, psi: &Factor, var: &str) -> Result<Factor> {
        psi.marginalize(&[var])
    }

}

/// Max-product elimination, remembering the maximizing states
struct MaxOut {
    backpointers: Vec<Backpointer>
}

impl Elimination for MaxOut {

    fn eliminate(&mut self, psi: &Factor, var: &str) -> Result<Factor> {
        let (tau, bp) = psi.maximize_with_argmax(var)?;
        self.backpointers.push(bp);
        Ok(tau)
    }

}


/// Eliminate the variables of `order` one at a time
///
/// # Returns
/// the factors left once every variable of `order` is gone
fn eliminate<E: Elimination>(factors: Vec<Factor>, order: &[String], op: &mut E) -> Result<Vec<Factor>> {
    let mut phis = factors;

    for var in order.iter() {
        let (with, without): (Vec<Factor>, Vec<Factor>) = phis.into_iter()
                                                              .partition(|phi| phi.contains(var));
        phis = without;

        if with.is_empty() {
            continue;
        }

        // product step - multiply factors with var
        let psi = Factor::product_all(&with)?;
        trace!("eliminating {} from a product of {} factors over {}", var, with.len(), psi.variables());

        // sum (or max) step - remove var from psi
        phis.push(op.eliminate(&psi, var)?);
    }

    Ok(phis)
}


impl ConditionalInference for VariableElimination {

    fn query(&self, variables: &[&str], evidence: &Assignment) -> Result<Factor> {
        if variables.is_empty() {
            return Err(PgmError::EmptyQuery);
        }

        self.check_query(variables, evidence)?;

        let factors = self.reduced(evidence)?;
        let order = self.order(&factors, variables, evidence)?;
        let remaining = eliminate(factors, &order, &mut SumOut)?;

        // multiply together remaining factors. This is the unnormalized joint of the query
        // variables and the evidence.
        let joint = Factor::product_all(&remaining)?.reorder(variables)?;

        joint.normalize().map_err(|_| PgmError::InconsistentEvidence)
    }

}


impl MapInference for VariableElimination {

    fn map_query(&self, variables: Option<&[&str]>, evidence: &Assignment) -> Result<Assignment> {
        match variables {
            Some(vars) if vars.is_empty() => return Err(PgmError::EmptyQuery),
            Some(vars) => self.check_query(vars, evidence)?,
            None => self.check_evidence(evidence)?
        };

        let (best, assignment) = self.max_product(evidence)?;
        if !(best > 0.0) {
            return Err(PgmError::InconsistentEvidence);
        }

        Ok(match variables {
            Some(vars) => vars.iter().filter_map(|&v| assignment.get(v).map(|s| (v, s))).collect(),
            None => assignment
        })
    }

    fn max_marginal(&self, variables: Option<&[&str]>, evidence: &Assignment) -> Result<f64> {
        let vars = match variables {
            None => {
                let z = self.evidence_probability(evidence)?;
                if !(z > 0.0) {
                    return Err(PgmError::InconsistentEvidence);
                }

                let (best, _) = self.max_product(evidence)?;
                return Ok(best / z);
            },
            Some(vars) if vars.is_empty() => return Err(PgmError::EmptyQuery),
            Some(vars) => vars
        };

        self.check_query(vars, evidence)?;

        // maximize out everything else, then take the distribution of each queried variable
        let factors = self.reduced(evidence)?;
        let order = self.order(&factors, vars, evidence)?;
        let mut op = MaxOut { backpointers: Vec::new() };
        let max_marginal = Factor::product_all(&eliminate(factors, &order, &mut op)?)?;

        let mut product = Factor::identity();
        for &name in vars.iter() {
            let others: Vec<&str> = vars.iter().filter(|&&v| v != name).cloned().collect();
            let distribution = max_marginal.marginalize(&others)?
                                           .normalize()
                                           .map_err(|_| PgmError::InconsistentEvidence)?;
            product = product.product(&distribution)?;
        }

        Ok(product.max_value())
    }

}
