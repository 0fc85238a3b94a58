//! Definition of the factor module
//!
//! A `Factor` represents a relationship between some set of `Variable`s: a non-negative function
//! of their joint assignment, stored as a dense table.

use crate::util::{PgmError, Result, TIE_TOLERANCE};
use crate::variable::{all_assignments, Assignment, Variable, VariableSet};

use approx::AbsDiffEq;
use itertools::Itertools;
use ndarray::prelude as nd;

use std::fmt;

mod cpd;

pub use self::cpd::TabularCpd;

/// Alias f64 ndarray::ArrayD as Table
pub type Table = nd::ArrayD<f64>;


/// A table factor over some scope of variables, as described in Koller & Friedman Section 4.2.1.
///
/// # Representation
/// Axis `i` of the table corresponds to `scope[i]`, and the table is addressed in row-major
/// order, so the last variable of the scope changes fastest. The order of the scope is a detail
/// of the representation: equality compares factors as functions, after aligning their scopes.
///
/// A `Factor` with an empty scope is a scalar. The identity `Factor` is the scalar `1.0`.
///
/// All operations return a new `Factor`; none mutate their inputs.
#[derive(Clone, Debug)]
pub struct Factor {
    /// The scope of the `Factor`
    scope: Vec<Variable>,

    /// The values of the `Factor` table
    table: Table
}


impl Factor {

    /// Get the identity factor
    pub fn identity() -> Self {
        Factor { scope: Vec::new(), table: Table::from_elem(nd::IxDyn(&[]), 1.0) }
    }


    /// Create a new `Factor`
    ///
    /// # Errors
    /// * `PgmError::InvalidCardinality` if a variable has no states
    /// * `PgmError::ShapeMismatch` if the table shape differs from the scope cardinalities
    /// * `PgmError::DuplicateVariable` if a variable appears twice in the scope
    /// * `PgmError::NegativeValue` if the table holds a negative or non-finite value
    pub fn new(scope: Vec<Variable>, table: Table) -> Result<Self> {
        if let Some(v) = scope.iter().find(|v| v.cardinality() == 0) {
            return Err(PgmError::InvalidCardinality(v.name().to_string()));
        }

        let expected: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();
        if expected.as_slice() != table.shape() {
            return Err(PgmError::ShapeMismatch { expected, found: table.shape().to_vec() });
        }

        if let Some(name) = scope.iter().map(|v| v.name()).duplicates().next() {
            return Err(PgmError::DuplicateVariable(name.to_string()));
        }

        // factors may not have negative values
        if table.iter().any(|&v| !v.is_finite() || v < 0.0) {
            return Err(PgmError::NegativeValue);
        }

        Ok(Factor { scope, table })
    }


    /// Create a new `Factor` from values listed in row-major order over `scope`
    pub fn from_values(scope: Vec<Variable>, values: Vec<f64>) -> Result<Self> {
        let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();
        let found = vec![values.len()];
        let table = Table::from_shape_vec(nd::IxDyn(&shape), values)
            .map_err(|_| PgmError::ShapeMismatch { expected: shape.clone(), found })?;

        Factor::new(scope, table)
    }


    /// Check if the `Factor` is the identity `Factor`
    pub fn is_identity(&self) -> bool {
        self.scope.is_empty() && self.table.iter().all(|&v| v == 1.0)
    }


    /// Retrieve the scope of the `Factor`
    pub fn scope(&self) -> &[Variable] {
        &self.scope
    }


    /// The names of the variables in scope, in scope order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scope.iter().map(|v| v.name())
    }


    /// The variables in scope, as a set
    pub fn variables(&self) -> VariableSet {
        VariableSet::of(&self.scope)
    }


    /// Check if the named variable is in scope
    pub fn contains(&self, name: &str) -> bool {
        self.axis(name).is_some()
    }


    /// Look up a variable in scope by name
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.scope.iter().find(|v| v.name() == name)
    }


    /// The table of the `Factor`. Axis `i` corresponds to `scope()[i]`.
    pub fn table(&self) -> &Table {
        &self.table
    }


    /// The values of the `Factor` in row-major order over the scope
    pub fn values(&self) -> Vec<f64> {
        self.table.iter().cloned().collect()
    }


    /// The sum of all values
    pub fn sum(&self) -> f64 {
        self.table.sum()
    }


    /// The largest value
    pub fn max_value(&self) -> f64 {
        self.table.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }


    /// Retrieve the value for a complete assignment over the scope of this `Factor`
    ///
    /// # Args
    /// assignment: a full assignment to the scope of a `Factor`. The assignment's scope may be a
    ///             superset of the `Factor`s scope.
    ///
    /// # Errors
    /// * `PgmError::IncompleteAssignment`, if assignment is not a complete assignment to the
    ///   scope of the `Factor`
    /// * `PgmError::StateOutOfRange`, if a state exceeds its variable's cardinality
    pub fn value(&self, assignment: &Assignment) -> Result<f64> {
        let idx = table_index(&self.scope, assignment)?;
        Ok(self.table[nd::IxDyn(&idx)])
    }


    /// Product of this `Factor` and another `Factor`.
    ///
    /// Defined in Koller & Friedman Section 4.2.1
    ///
    /// # Returns
    /// A new `Factor` of scope union(self.scope(), other.scope()): this factor's variables
    /// first, followed by the variables only in `other`, each in their original order.
    ///
    /// # Errors
    /// * `PgmError::CardinalityMismatch`, if a shared variable has a different cardinality in
    ///   each `Factor`
    pub fn product(&self, other: &Factor) -> Result<Factor> {
        let scope = self.union_scope(other)?;
        let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();

        // align both tables onto the union scope. Variables missing from a factor become
        // zero-stride axes, so the product costs one multiplication per output entry.
        let lhs = self.aligned(&scope);
        let rhs = other.aligned(&scope);

        match (lhs.broadcast(shape.clone()), rhs.broadcast(shape.clone())) {
            (Some(lhs), Some(rhs)) => Ok(Factor { scope, table: &lhs * &rhs }),
            (l, _) => {
                let misaligned = if l.is_none() { self } else { other };
                Err(PgmError::ShapeMismatch {
                    expected: shape,
                    found: misaligned.table.shape().to_vec()
                })
            }
        }
    }


    /// Product of every `Factor` in `factors`. The product of no factors is the identity.
    pub fn product_all<'a, I>(factors: I) -> Result<Factor>
        where I: IntoIterator<Item = &'a Factor>
    {
        factors.into_iter().try_fold(Factor::identity(), |acc, phi| acc.product(phi))
    }


    /// Reduce the `Factor` to the given partial assignment
    ///
    /// Defined in Koller & Friedman 4.2.3
    ///
    /// # Args
    /// evidence: an assignment to some of the variables in scope
    ///
    /// # Returns
    /// A new `Factor` over the unassigned variables holding the slice of the table consistent
    /// with `evidence`. Assigning every variable yields a scalar `Factor`.
    ///
    /// # Errors
    /// * `PgmError::UnknownVariable`, if `evidence` names a variable outside the scope
    /// * `PgmError::StateOutOfRange`, if an assigned state is out of range
    pub fn reduce(&self, evidence: &Assignment) -> Result<Factor> {
        let mut fixed: Vec<(usize, usize)> = Vec::with_capacity(evidence.len());
        for (name, state) in evidence.iter() {
            let axis = self.axis(name)
                           .ok_or_else(|| PgmError::UnknownVariable(name.to_string()))?;
            check_state(&self.scope[axis], state)?;
            fixed.push((axis, state));
        }

        // remove the highest axes first so the remaining axis indices stay valid
        fixed.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        let mut view = self.table.view();
        for &(axis, state) in fixed.iter() {
            view = view.index_axis_move(nd::Axis(axis), state);
        }

        let axes: Vec<usize> = fixed.iter().map(|&(axis, _)| axis).collect();
        Ok(Factor { scope: self.scope_without(&axes), table: view.to_owned() })
    }


    /// Marginalize (sum out) the given variables
    ///
    /// Defined in Koller & Friedman 9.3.1
    ///
    /// # Errors
    /// * `PgmError::UnknownVariable`, if a variable is not in scope
    /// * `PgmError::DuplicateVariable`, if a variable is named twice
    pub fn marginalize(&self, names: &[&str]) -> Result<Factor> {
        let axes = self.elimination_axes(names)?;
        let table = axes.iter().fold(self.table.clone(), |t, &ax| t.sum_axis(nd::Axis(ax)));

        Ok(Factor { scope: self.scope_without(&axes), table })
    }


    /// Maximize out the given variables. Same contract as `marginalize`, with each entry holding
    /// the maximum over the eliminated states rather than their sum.
    pub fn maximize(&self, names: &[&str]) -> Result<Factor> {
        let axes = self.elimination_axes(names)?;
        let table = axes.iter().fold(self.table.clone(), |t, &ax| {
            t.map_axis(nd::Axis(ax), |lane| lane_max(lane.iter()).1)
        });

        Ok(Factor { scope: self.scope_without(&axes), table })
    }


    /// Maximize out a single variable, recording the maximizing state for every assignment to the
    /// remaining scope. The lowest state wins a tie.
    pub fn maximize_with_argmax(&self, name: &str) -> Result<(Factor, Backpointer)> {
        let axis = self.axis(name).ok_or_else(|| PgmError::UnknownVariable(name.to_string()))?;
        let best = self.table.map_axis(nd::Axis(axis), |lane| lane_max(lane.iter()));

        let scope = self.scope_without(&[axis]);
        let backpointer = Backpointer {
            variable: self.scope[axis].clone(),
            scope: scope.clone(),
            states: best.mapv(|(state, _)| state)
        };

        Ok((Factor { scope, table: best.mapv(|(_, value)| value) }, backpointer))
    }


    /// Divide every value by the sum of all values
    ///
    /// # Errors
    /// * `PgmError::ZeroPartition`, if the values sum to zero
    pub fn normalize(&self) -> Result<Factor> {
        let z = self.table.sum();
        if !(z > 0.0 && z.is_finite()) {
            return Err(PgmError::ZeroPartition(z));
        }

        Ok(Factor { scope: self.scope.clone(), table: &self.table / z })
    }


    /// The same function with its scope permuted into the order given by `names`
    ///
    /// # Errors
    /// * `PgmError::UnknownVariable` or `PgmError::DuplicateVariable` for a bad name
    /// * `PgmError::IncompleteAssignment`, if a variable in scope is not named
    pub fn reorder(&self, names: &[&str]) -> Result<Factor> {
        let mut axes = Vec::with_capacity(names.len());
        for &name in names {
            let axis = self.axis(name).ok_or_else(|| PgmError::UnknownVariable(name.to_string()))?;
            if axes.contains(&axis) {
                return Err(PgmError::DuplicateVariable(name.to_string()));
            }
            axes.push(axis);
        }

        if axes.len() != self.scope.len() {
            let missing = self.names()
                              .filter(|n| !names.contains(n))
                              .map(String::from)
                              .collect();
            return Err(PgmError::IncompleteAssignment(missing));
        }

        let scope = axes.iter().map(|&ax| self.scope[ax].clone()).collect();
        let table = self.table.view().permuted_axes(axes).to_owned();
        Ok(Factor { scope, table })
    }


    /// The index of the axis of the named variable
    fn axis(&self, name: &str) -> Option<usize> {
        self.scope.iter().position(|v| v.name() == name)
    }


    /// Axes of the named variables, highest first
    fn elimination_axes(&self, names: &[&str]) -> Result<Vec<usize>> {
        let mut axes = Vec::with_capacity(names.len());
        for &name in names {
            let axis = self.axis(name).ok_or_else(|| PgmError::UnknownVariable(name.to_string()))?;
            if axes.contains(&axis) {
                return Err(PgmError::DuplicateVariable(name.to_string()));
            }
            axes.push(axis);
        }

        axes.sort_unstable_by(|a, b| b.cmp(a));
        Ok(axes)
    }


    fn scope_without(&self, axes: &[usize]) -> Vec<Variable> {
        self.scope.iter()
                  .enumerate()
                  .filter(|(i, _)| !axes.contains(i))
                  .map(|(_, v)| v.clone())
                  .collect()
    }


    /// Compute the union of the two scopes, checking that shared variables agree
    fn union_scope(&self, other: &Factor) -> Result<Vec<Variable>> {
        for v in other.scope.iter() {
            if let Some(mine) = self.variable(v.name()) {
                if mine.cardinality() != v.cardinality() {
                    return Err(PgmError::CardinalityMismatch {
                        name: v.name().to_string(),
                        left: mine.cardinality(),
                        right: v.cardinality()
                    });
                }
            }
        }

        Ok(self.scope.iter()
                     .chain(other.scope.iter())
                     .unique_by(|v| v.name())
                     .cloned()
                     .collect())
    }


    /// View the table with its axes arranged to follow `scope`, a superset of this factor's
    /// scope. Variables outside this factor get axes of length one.
    fn aligned(&self, scope: &[Variable]) -> nd::ArrayViewD<'_, f64> {
        let position = |v: &Variable| scope.iter().position(|s| s.name() == v.name());

        let mut axes: Vec<usize> = (0..self.scope.len()).collect();
        axes.sort_by_key(|&i| position(&self.scope[i]));

        let mut view = self.table.view().permuted_axes(axes);
        for (i, v) in scope.iter().enumerate() {
            if !self.contains(v.name()) {
                view = view.insert_axis(nd::Axis(i));
            }
        }

        view
    }


    /// This factor's table with its scope permuted into `other`'s order, provided both factors
    /// are over the same variables
    fn aligned_with(&self, other: &Factor) -> Option<Table> {
        let same_variables = self.scope.len() == other.scope.len()
            && other.scope.iter().all(|v| self.variable(v.name()) == Some(v));

        if !same_variables {
            return None;
        }

        let names: Vec<&str> = other.names().collect();
        self.reorder(&names).ok().map(|f| f.table)
    }

}


/// The table index of a complete assignment to `scope`
fn table_index(scope: &[Variable], assignment: &Assignment) -> Result<Vec<usize>> {
    let mut idx = Vec::with_capacity(scope.len());
    let mut missing = Vec::new();

    for v in scope.iter() {
        match assignment.get(v.name()) {
            Some(state) => {
                check_state(v, state)?;
                idx.push(state);
            },
            None => missing.push(v.name().to_string())
        }
    }

    if !missing.is_empty() {
        return Err(PgmError::IncompleteAssignment(missing));
    }

    Ok(idx)
}


fn check_state(variable: &Variable, state: usize) -> Result<()> {
    if state >= variable.cardinality() {
        return Err(PgmError::StateOutOfRange {
            name: variable.name().to_string(),
            state,
            cardinality: variable.cardinality()
        });
    }

    Ok(())
}


/// The position and value of the largest entry of a non-empty lane. The earliest position wins a
/// tie.
fn lane_max<'a, I>(lane: I) -> (usize, f64)
    where I: Iterator<Item = &'a f64>
{
    let mut best = (0, f64::NAN);
    for (state, &x) in lane.enumerate() {
        if state == 0 || exceeds(x, best.1) {
            best = (state, x);
        }
    }
    best
}


/// `true` if `candidate` is larger than `incumbent` by more than the tie tolerance
fn exceeds(candidate: f64, incumbent: f64) -> bool {
    candidate - incumbent > TIE_TOLERANCE * incumbent.abs()
}


/// The maximizing states of an eliminated variable, for every assignment to the scope that
/// remained after it was maximized out. Used to recover a MAP assignment.
#[derive(Clone, Debug)]
pub struct Backpointer {
    /// The eliminated variable
    variable: Variable,

    /// The scope of the table of maximizing states
    scope: Vec<Variable>,

    /// The maximizing state of `variable`, indexed like a factor table over `scope`
    states: nd::ArrayD<usize>
}

impl Backpointer {

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn scope(&self) -> &[Variable] {
        &self.scope
    }

    /// The maximizing state of the eliminated variable given a complete assignment to `scope()`
    pub fn state(&self, assignment: &Assignment) -> Result<usize> {
        let idx = table_index(&self.scope, assignment)?;
        Ok(self.states[nd::IxDyn(&idx)])
    }

}


impl PartialEq for Factor {

    fn eq(&self, other: &Factor) -> bool {
        match self.aligned_with(other) {
            Some(table) => table == other.table,
            None => false
        }
    }

}


impl AbsDiffEq for Factor {

    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Factor, epsilon: f64) -> bool {
        match self.aligned_with(other) {
            Some(table) => table.iter()
                                .zip(other.table.iter())
                                .all(|(a, b)| a.abs_diff_eq(b, epsilon)),
            None => false
        }
    }

}


impl fmt::Display for Factor {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (assn, value) in all_assignments(&self.scope).zip(self.table.iter()) {
            writeln!(f, "{}: {:.6}", assn, value)?;
        }
        Ok(())
    }

}


// Unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use itertools::iproduct;
    use ndarray::array;

    /// The product from Koller & Friedman Figure 4.3
    fn kf_product() -> (Variable, Variable, Variable, Factor) {
        let a = Variable::discrete("A", 3);
        let b = Variable::binary("B");
        let c = Variable::binary("C");

        let phi = Factor::from_values(
            vec![ a.clone(), b.clone(), c.clone() ],
            vec![ 0.25, 0.35, 0.08, 0.16, 0.05, 0.07, 0., 0., 0.15, 0.21, 0.09, 0.18 ]
        ).expect("Unexpected error");

        (a, b, c, phi)
    }

    #[test]
    fn identity() {
        let f = Factor::identity();

        assert!(f.is_identity());
        assert!(f.scope().is_empty());
        assert_eq!(1.0, f.value(&Assignment::new()).unwrap());
    }

    #[test]
    fn table_factor() {
        let vars = vec![ Variable::binary("A"), Variable::discrete("B", 5), Variable::discrete("C", 3) ];
        let mut table = Table::ones(vec![2, 5, 3]);
        table[nd::IxDyn(&[1, 1, 1])] = 5.;

        // assert table holds correct values
        let f = Factor::new(vars.clone(), table).unwrap();

        assert!(! f.is_identity());
        for (x, y, z) in iproduct!(0..2, 0..5, 0..3) {
            let assn = Assignment::new().with("A", x).with("B", y).with("C", z);

            let val = f.value(&assn).unwrap();
            if x == 1 && y == 1 && z == 1 {
                assert_eq!(5., val);
            } else {
                assert_eq!(1., val);
            }
        }
    }

    #[test]
    fn table_factor_errs() {
        // mismatched number of dimensions
        let vars = vec![ Variable::binary("A"), Variable::binary("B") ];
        let f = Factor::new(vars.clone(), Table::ones(vec![2, 2, 2]));
        match f {
            Err(PgmError::ShapeMismatch { .. }) => (),
            _ => panic!("wrong error type")
        };

        // wrong cardinality
        let f = Factor::new(vars.clone(), Table::ones(vec![2, 3]));
        match f {
            Err(PgmError::ShapeMismatch { .. }) => (),
            _ => panic!("wrong error type")
        };

        // repeated variable
        let f = Factor::new(vec![ Variable::binary("A"), Variable::binary("A") ], Table::ones(vec![2, 2]));
        assert_eq!(Err(PgmError::DuplicateVariable(String::from("A"))), f);

        // negative values
        let f = Factor::from_values(vars.clone(), vec![ 0.5, -0.5, 1., 1. ]);
        assert_eq!(Err(PgmError::NegativeValue), f);

        // no states
        let f = Factor::from_values(vec![ Variable::discrete("Z", 0) ], vec![]);
        assert_eq!(Err(PgmError::InvalidCardinality(String::from("Z"))), f);

        // too few values
        let f = Factor::from_values(vars, vec![ 1., 1., 1. ]);
        assert!(f.is_err());
    }

    #[test]
    fn value() {
        let vars = vec![ Variable::binary("A"), Variable::binary("B") ];
        let f = Factor::from_values(vars, vec![ 0., 1., 2., 3. ]).expect("Unexpected error");

        // verify behavior on precise assignment
        for (i, (x, y)) in iproduct!(0..2, 0..2).enumerate() {
            let assn = Assignment::new().with("A", x).with("B", y);
            assert_eq!(i as f64, f.value(&assn).expect("unexpected error"));
        }

        // verify behavior on full assignment with out of scope values
        for (i, (x, y)) in iproduct!(0..2, 0..2).enumerate() {
            let assn = Assignment::new().with("A", x).with("B", y).with("C", 0);
            assert_eq!(i as f64, f.value(&assn).expect("unexpected error"));
        }

        // verify behavior on incomplete assignment
        let assn = Assignment::new().with("A", 0).with("C", 0);
        assert_eq!(Err(PgmError::IncompleteAssignment(vec![String::from("B")])), f.value(&assn));

        // and on a state that does not exist
        let assn = Assignment::new().with("A", 0).with("B", 2);
        match f.value(&assn) {
            Err(PgmError::StateOutOfRange { state: 2, .. }) => (),
            other => panic!("incorrect result {:?}", other)
        };
    }

    #[test]
    /// Example taken from Koller & Friedman Figure 4.3
    fn product() {
        let (a, b, c, expected) = kf_product();

        let phi1 = Factor::from_values(vec![ a.clone(), b.clone() ], vec![ 0.5, 0.8, 0.1, 0., 0.3, 0.9 ])
            .expect("Unexpected error");
        let phi2 = Factor::from_values(vec![ b, c ], vec![ 0.5, 0.7, 0.1, 0.2 ])
            .expect("Unexpected error");

        let phi = phi1.product(&phi2).expect("Unexpected error");
        assert_eq!(vec!["A", "B", "C"], phi.names().collect::<Vec<_>>());

        for (assn, val) in all_assignments(expected.scope()).zip(expected.values()) {
            assert_abs_diff_eq!(val, phi.value(&assn).unwrap(), epsilon = 1e-12);
        }

        // the scope of the product follows the left operand
        let flipped = phi2.product(&phi1).expect("Unexpected error");
        assert_eq!(vec!["B", "C", "A"], flipped.names().collect::<Vec<_>>());
        assert_abs_diff_eq!(phi, flipped, epsilon = 1e-12);
    }

    #[test]
    fn prod_disjoint() {
        let phi1 = Factor::from_values(vec![ Variable::binary("A") ], vec![ 0.2, 0.8 ]).unwrap();
        let phi2 = Factor::from_values(vec![ Variable::discrete("B", 3) ], vec![ 1., 2., 3. ]).unwrap();

        let phi = phi1.product(&phi2).expect("Unexpected error");
        let expected = Factor::new(
            vec![ Variable::binary("A"), Variable::discrete("B", 3) ],
            array![[0.2, 0.4, 0.6], [0.8, 1.6, 2.4]].into_dyn()
        ).unwrap();

        assert_abs_diff_eq!(expected, phi, epsilon = 1e-12);
    }

    #[test]
    fn prod_identity() {
        let a = Variable::discrete("A", 3);
        let b = Variable::binary("B");

        let phi1 = Factor::new(
            vec![ a, b ],
            array![[0.5, 0.8], [0.1, 0.], [0.3, 0.9]].into_dyn()
        ).expect("Unexpected error");

        let phi2 = Factor::identity();
        let phi = phi1.product(&phi2).expect("Unexpected error");
        assert_eq!(phi1.scope(), phi.scope());
        assert_eq!(phi1, phi);

        let phi = phi2.product(&phi1).expect("Unexpected error");
        assert_eq!(phi1.scope(), phi.scope());
        assert_eq!(phi1, phi);

        let all = Factor::product_all(vec![]).expect("Unexpected error");
        assert!(all.is_identity());
    }

    #[test]
    fn prod_err() {
        let phi1 = Factor::from_values(vec![ Variable::discrete("A", 3) ], vec![ 0.5, 0.8, 0.1 ]).unwrap();
        let phi2 = Factor::from_values(vec![ Variable::binary("A") ], vec![ 0.5, 0.7 ]).unwrap();

        let phi = phi1.product(&phi2);
        assert_eq!(
            Err(PgmError::CardinalityMismatch { name: String::from("A"), left: 3, right: 2 }),
            phi
        );
    }

    #[test]
    /// Example take from Koller & Friedman Figure 4.5
    fn reduce_simple() {
        let (_, _, c, phi) = kf_product();

        let reduced = phi.reduce(&Assignment::new().with("C", 0)).expect("Unexpected error");
        assert_eq!(vec!["A", "B"], reduced.names().collect::<Vec<_>>());
        assert!(! reduced.contains(c.name()));
        assert_eq!(vec![ 0.25, 0.08, 0.05, 0., 0.15, 0.09 ], reduced.values());
    }

    #[test]
    fn reduce_empty() {
        let (_, _, _, phi) = kf_product();

        let reduced = phi.reduce(&Assignment::new()).expect("Unexpected error");
        assert_eq!(phi.scope(), reduced.scope());
        assert_eq!(phi, reduced);
    }

    #[test]
    fn reduce_full() {
        let (_, _, _, phi) = kf_product();

        let assn = Assignment::new().with("A", 2).with("B", 0).with("C", 1);
        let reduced = phi.reduce(&assn).expect("Unexpected error");
        assert!(reduced.scope().is_empty());
        assert_eq!(0.21, reduced.value(&Assignment::new()).unwrap());
    }

    #[test]
    fn reduce_multiple() {
        let (_, _, _, phi) = kf_product();

        let assn = Assignment::new().with("C", 0).with("A", 2);
        let reduced = phi.reduce(&assn).expect("Unexpected error");
        assert_eq!(vec!["B"], reduced.names().collect::<Vec<_>>());
        assert_eq!(vec![ 0.15, 0.09 ], reduced.values());
    }

    #[test]
    fn reduce_errs() {
        let (_, _, _, phi) = kf_product();

        let unknown = phi.reduce(&Assignment::new().with("D", 0));
        assert_eq!(Err(PgmError::UnknownVariable(String::from("D"))), unknown);

        let out_of_range = phi.reduce(&Assignment::new().with("A", 3));
        assert_eq!(
            Err(PgmError::StateOutOfRange { name: String::from("A"), state: 3, cardinality: 3 }),
            out_of_range
        );
    }

    #[test]
    /// Example taken from Koller & Friedman Figure 9.7
    fn marginalize() {
        let (_, _, _, phi) = kf_product();

        let marginalized = phi.marginalize(&["B"]).expect("Unexpected error");
        assert_eq!(vec!["A", "C"], marginalized.names().collect::<Vec<_>>());

        let expected = array![[0.33, 0.51], [0.05, 0.07], [0.24, 0.39]].into_dyn();
        for (x, y) in iproduct!(0..3, 0..2) {
            let assn = Assignment::new().with("A", x).with("C", y);
            assert_abs_diff_eq!(expected[nd::IxDyn(&[x, y])], marginalized.value(&assn).unwrap(), epsilon = 1e-12);
        }

        let all = phi.marginalize(&["C", "A", "B"]).expect("Unexpected error");
        assert!(all.scope().is_empty());
        assert_abs_diff_eq!(1.59, all.sum(), epsilon = 1e-12);
    }

    #[test]
    fn marginalize_errs() {
        let (_, _, _, phi) = kf_product();

        assert_eq!(Err(PgmError::UnknownVariable(String::from("D"))), phi.marginalize(&["D"]));
        assert_eq!(Err(PgmError::DuplicateVariable(String::from("A"))), phi.marginalize(&["A", "A"]));
    }

    #[test]
    fn maximize() {
        let (_, _, _, phi) = kf_product();

        let maximized = phi.maximize(&["B"]).expect("Unexpected error");
        assert_eq!(vec!["A", "C"], maximized.names().collect::<Vec<_>>());
        assert_eq!(vec![ 0.25, 0.35, 0.05, 0.07, 0.15, 0.21 ], maximized.values());

        let maximized = phi.maximize(&["A", "C"]).expect("Unexpected error");
        assert_eq!(vec![ 0.35, 0.18 ], maximized.values());
    }

    #[test]
    fn maximize_with_argmax() {
        let (_, _, _, phi) = kf_product();

        let (maximized, backpointer) = phi.maximize_with_argmax("A").expect("Unexpected error");
        assert_eq!(vec!["B", "C"], maximized.names().collect::<Vec<_>>());
        assert_eq!(vec![ 0.25, 0.35, 0.09, 0.18 ], maximized.values());

        assert_eq!("A", backpointer.variable().name());
        let states: Vec<usize> = iproduct!(0..2, 0..2)
            .map(|(b, c)| backpointer.state(&Assignment::new().with("B", b).with("C", c)).unwrap())
            .collect();
        assert_eq!(vec![ 0, 0, 2, 2 ], states);
    }

    #[test]
    fn argmax_ties_take_lowest_state() {
        let phi = Factor::from_values(
            vec![ Variable::binary("A"), Variable::discrete("B", 3) ],
            vec![ 0.2, 0.2, 0.1, 0.0, 0.4, 0.4 ]
        ).unwrap();

        let (maximized, backpointer) = phi.maximize_with_argmax("B").expect("Unexpected error");
        assert_eq!(vec![ 0.2, 0.4 ], maximized.values());
        assert_eq!(0, backpointer.state(&Assignment::new().with("A", 0)).unwrap());
        assert_eq!(1, backpointer.state(&Assignment::new().with("A", 1)).unwrap());
    }

    #[test]
    fn normalize() {
        let phi = Factor::from_values(vec![ Variable::binary("A") ], vec![ 1., 3. ]).unwrap();
        let normalized = phi.normalize().expect("Unexpected error");
        assert_eq!(vec![ 0.25, 0.75 ], normalized.values());

        let zero = Factor::from_values(vec![ Variable::binary("A") ], vec![ 0., 0. ]).unwrap();
        assert_eq!(Err(PgmError::ZeroPartition(0.)), zero.normalize());
    }

    #[test]
    fn reorder_and_equality() {
        let (_, _, _, phi) = kf_product();

        let reordered = phi.reorder(&["C", "A", "B"]).expect("Unexpected error");
        assert_eq!(vec!["C", "A", "B"], reordered.names().collect::<Vec<_>>());
        assert_eq!(phi, reordered);
        assert_eq!(
            phi.value(&Assignment::new().with("A", 2).with("B", 1).with("C", 0)).unwrap(),
            reordered.table()[nd::IxDyn(&[0, 2, 1])]
        );

        assert!(phi.reorder(&["C", "A"]).is_err());
        assert!(phi.reorder(&["C", "A", "A"]).is_err());

        let other = phi.marginalize(&["C"]).unwrap();
        assert!(phi != other);
    }

    #[test]
    fn display() {
        let phi = Factor::from_values(vec![ Variable::binary("A") ], vec![ 0.25, 0.75 ]).unwrap();
        assert_eq!("{A = 0}: 0.250000\n{A = 1}: 0.750000\n", phi.to_string());
    }
}
