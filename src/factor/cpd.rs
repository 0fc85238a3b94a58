//! Tabular conditional probability distributions

use super::{Factor, Table};
use crate::util::{PgmError, Result, CPD_TOLERANCE};
use crate::variable::{Assignment, Variable};

use itertools::Itertools;
use ndarray::prelude as nd;

/// A Conditional Probability Distribution ```P(X | Pa(X))``` stored as a table.
///
/// # Representation
/// The table handed to `TabularCpd::new` has one row per state of the child variable and one
/// column per joint assignment of the parents (the "evidence"). Columns are ordered row-major over
/// the parents, so the first parent changes slowest. Every column is a distribution over the
/// child and must sum to one.
///
/// Internally the CPD is a `Factor` over ```[child, parents...]```.
#[derive(Clone, Debug, PartialEq)]
pub struct TabularCpd {
    factor: Factor
}

impl TabularCpd {

    /// Construct a new `TabularCpd`
    ///
    /// # Errors
    /// * `PgmError::DuplicateVariable` if the child is its own parent, or a parent repeats
    /// * `PgmError::ShapeMismatch` if `values` is not ```card(X) x prod(card(Pa(X)))```
    /// * `PgmError::NegativeValue` for a negative entry
    /// * `PgmError::NotACpd` if a column does not sum to one
    pub fn new(variable: Variable, evidence: Vec<Variable>, values: nd::Array2<f64>) -> Result<Self> {
        let mut scope = Vec::with_capacity(evidence.len() + 1);
        scope.push(variable);
        scope.extend(evidence);

        if let Some(name) = scope.iter().map(|v| v.name()).duplicates().next() {
            return Err(PgmError::DuplicateVariable(name.to_string()));
        }

        let columns: usize = scope[1..].iter().map(|v| v.cardinality()).product();
        let expected = vec![scope[0].cardinality(), columns];
        if values.shape() != expected.as_slice() {
            return Err(PgmError::ShapeMismatch { expected, found: values.shape().to_vec() });
        }

        // a row per child state, with the parent axes unfolded from the columns
        let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();
        let table = Table::from_shape_vec(nd::IxDyn(&shape), values.iter().cloned().collect())
            .map_err(|_| PgmError::ShapeMismatch { expected: shape.clone(), found: values.shape().to_vec() })?;

        let factor = Factor::new(scope, table)?;

        for (column, &sum) in values.sum_axis(nd::Axis(0)).iter().enumerate() {
            if (sum - 1.0).abs() > CPD_TOLERANCE {
                return Err(PgmError::NotACpd {
                    variable: factor.scope()[0].name().to_string(),
                    column,
                    sum
                });
            }
        }

        Ok(TabularCpd { factor })
    }


    /// The child variable
    pub fn variable(&self) -> &Variable {
        &self.factor.scope()[0]
    }


    /// The parents of the child variable, in column order
    pub fn evidence(&self) -> &[Variable] {
        &self.factor.scope()[1..]
    }


    /// Borrow the CPD as a `Factor` over ```[child, parents...]```
    pub fn as_factor(&self) -> &Factor {
        &self.factor
    }


    pub fn to_factor(&self) -> Factor {
        self.factor.clone()
    }


    pub fn into_factor(self) -> Factor {
        self.factor
    }


    /// ```P(x | pa(x))``` for an assignment covering the child and all of its parents
    pub fn value(&self, assignment: &Assignment) -> Result<f64> {
        self.factor.value(assignment)
    }

}
