//! Definition of the variable module
//!
//! A `Variable` represents a categorical random variable in a Probabilistic Graphical Model. An
//! `Assignment` maps variable names to states, and a `VariableSet` names the variables of a
//! clique or separator.

use indexmap::IndexMap;
use itertools::Itertools;

use std::collections::BTreeSet;
use std::fmt;
use std::iter;

/// A discrete random variable with a fixed number of states. States are the integers
/// `0..cardinality`.
///
/// Variables are identified by name throughout the library; two `Variable`s with the same name and
/// different cardinalities are reported as a mismatch wherever they meet.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    /// The name of the `Variable`
    name: String,

    /// The number of states
    cardinality: usize
}

impl Variable {

    /// Construct a new `Variable`
    pub fn new(name: &str, cardinality: usize) -> Self {
        Variable { name: String::from(name), cardinality }
    }

    /// Construct a new `Variable` with two states
    pub fn binary(name: &str) -> Self {
        Variable::new(name, 2)
    }

    /// Construct a new `Variable` with `count` states
    pub fn discrete(name: &str, count: usize) -> Self {
        Variable::new(name, count)
    }

    /// Get the name of the `Variable`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of states of the `Variable`
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

}

impl fmt::Display for Variable {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }

}


/// An assignment of states to some set of `Variable`s, keyed by variable name.
///
/// Iteration follows insertion order; equality does not depend on it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
    values: IndexMap<String, usize>
}

impl Assignment {

    /// Construct an empty `Assignment`
    pub fn new() -> Self {
        Assignment { values: IndexMap::new() }
    }

    /// Assign `state` to the variable named `name`, replacing any earlier value
    pub fn set(&mut self, name: &str, state: usize) {
        self.values.insert(String::from(name), state);
    }

    /// Builder-style variant of `set`
    pub fn with(mut self, name: &str, state: usize) -> Self {
        self.set(name, state);
        self
    }

    /// Get the state assigned to the named variable, if any
    pub fn get(&self, name: &str) -> Option<usize> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The names of the assigned variables, in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// The part of this `Assignment` that concerns the given scope
    pub fn restricted_to(&self, scope: &[Variable]) -> Assignment {
        scope.iter()
             .filter_map(|v| self.get(v.name()).map(|s| (v.name(), s)))
             .collect()
    }

}

impl<'a> FromIterator<(&'a str, usize)> for Assignment {

    fn from_iter<I: IntoIterator<Item = (&'a str, usize)>>(iter: I) -> Self {
        let mut assn = Assignment::new();
        for (name, state) in iter {
            assn.set(name, state);
        }
        assn
    }

}

impl fmt::Display for Assignment {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let body = self.iter().map(|(k, v)| format!("{} = {}", k, v)).join(", ");
        write!(f, "{{{}}}", body)
    }

}


/// Iterate over every complete `Assignment` to `scope`, in row-major order (the last variable
/// changes fastest). An empty scope yields a single, empty `Assignment`.
pub fn all_assignments(scope: &[Variable]) -> Box<dyn Iterator<Item = Assignment> + '_> {
    if scope.is_empty() {
        return Box::new(iter::once(Assignment::new()));
    }

    Box::new(
        scope.iter()
             .map(|v| 0..v.cardinality())
             .multi_cartesian_product()
             .map(move |states| {
                 scope.iter().map(|v| v.name()).zip(states).collect()
             })
    )
}


/// A set of variable names, ordered by name. Cliques and separators of a junction tree are keyed
/// by their `VariableSet`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableSet(BTreeSet<String>);

impl VariableSet {

    pub fn new() -> Self {
        VariableSet(BTreeSet::new())
    }

    /// The set of names in the given scope
    pub fn of(scope: &[Variable]) -> Self {
        scope.iter().map(|v| v.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    pub fn intersection(&self, other: &VariableSet) -> VariableSet {
        VariableSet(self.0.intersection(&other.0).cloned().collect())
    }

    pub fn is_subset(&self, other: &VariableSet) -> bool {
        self.0.is_subset(&other.0)
    }

}

impl<S: AsRef<str>> FromIterator<S> for VariableSet {

    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        VariableSet(iter.into_iter().map(|s| String::from(s.as_ref())).collect())
    }

}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for VariableSet {

    fn from(names: [S; N]) -> Self {
        names.iter().collect()
    }

}

impl fmt::Display for VariableSet {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({})", self.iter().join(", "))
    }

}


// Unit Tests for the variable module
#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn binary() {
        let var = Variable::binary("Foo");
        assert_eq!(var.name(), "Foo");
        assert_eq!(var.cardinality(), 2);
        assert_eq!(var.to_string(), "Foo");
    }

    #[test]
    fn discrete() {
        let var = Variable::discrete("Foo", 10);
        assert_eq!(var.name(), "Foo");
        assert_eq!(var.cardinality(), 10);
        assert_ne!(var, Variable::discrete("Foo", 9));
    }

    #[test]
    fn assignment() {
        let mut assn = Assignment::new();
        assert!(assn.is_empty());
        assn.set("A", 1);
        assn.set("B", 0);
        assn.set("A", 2);

        assert_eq!(2, assn.len());
        assert_eq!(Some(2), assn.get("A"));
        assert_eq!(Some(0), assn.get("B"));
        assert_eq!(None, assn.get("C"));
        assert_eq!(vec!["A", "B"], assn.names().collect::<Vec<_>>());
    }

    #[test]
    fn assignment_equality_ignores_order() {
        let a = Assignment::new().with("A", 1).with("B", 0);
        let b: Assignment = vec![("B", 0), ("A", 1)].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!("{A = 1, B = 0}", a.to_string());
    }

    #[test]
    fn restricted() {
        let assn = Assignment::new().with("A", 1).with("B", 0).with("C", 2);
        let scope = vec![Variable::binary("C"), Variable::binary("A"), Variable::binary("D")];

        let restricted = assn.restricted_to(&scope);
        assert_eq!(Assignment::new().with("A", 1).with("C", 2), restricted);
    }

    #[test]
    fn enumerate_assignments() {
        let scope = vec![Variable::binary("A"), Variable::discrete("B", 3)];
        let all: Vec<Assignment> = all_assignments(&scope).collect();

        assert_eq!(6, all.len());
        assert_eq!(Assignment::new().with("A", 0).with("B", 0), all[0]);
        assert_eq!(Assignment::new().with("A", 0).with("B", 1), all[1]);
        assert_eq!(Assignment::new().with("A", 1).with("B", 2), all[5]);
    }

    #[test]
    fn enumerate_empty_scope() {
        let all: Vec<Assignment> = all_assignments(&[]).collect();
        assert_eq!(vec![Assignment::new()], all);
    }

    #[test]
    fn variable_sets() {
        let ab = VariableSet::from(["B", "A"]);
        let bc = VariableSet::from(["C", "B"]);

        assert_eq!(VariableSet::from(["B"]), ab.intersection(&bc));
        assert!(VariableSet::from(["A"]).is_subset(&ab));
        assert_eq!(ab, VariableSet::of(&[Variable::binary("A"), Variable::binary("B")]));
        assert_eq!("(A, B)", ab.to_string());
    }

}
