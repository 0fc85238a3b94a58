//! Defines the `Error` type for the pgm-exact library

use std::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, PgmError>;

/// Relative tolerance under which two candidate maxima are considered tied. Ties always resolve to
/// the lowest state index.
pub const TIE_TOLERANCE: f64 = 1e-12;

/// Tolerance on the column sums of a conditional probability table
pub const CPD_TOLERANCE: f64 = 1e-3;

/// Default tolerance when checking that a junction tree is calibrated
pub const CALIBRATION_TOLERANCE: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum PgmError {

    /// Represents an incomplete assignment where a complete assignment was required.
    #[error("missing assignments to the required variables: {0:?}")]
    IncompleteAssignment(Vec<String>),

    /// A variable was referenced that is not in the scope of the factor or model
    #[error("variable `{0}` is not in scope")]
    UnknownVariable(String),

    /// Two occurrences of the same variable disagree on its number of states
    #[error("variable `{name}` has cardinality {left} in one place and {right} in another")]
    CardinalityMismatch { name: String, left: usize, right: usize },

    /// A table whose shape does not agree with the cardinalities of its scope
    #[error("table of shape {found:?} does not match the expected shape {expected:?}")]
    ShapeMismatch { expected: Vec<usize>, found: Vec<usize> },

    /// A variable with no states
    #[error("variable `{0}` must have at least one state")]
    InvalidCardinality(String),

    /// Represents a variable that was present multiple times in a situation where it should only
    /// have been present once
    #[error("variable `{0}` was given more than once")]
    DuplicateVariable(String),

    /// A state index outside `0..cardinality`
    #[error("state {state} is out of range for variable `{name}` with cardinality {cardinality}")]
    StateOutOfRange { name: String, state: usize, cardinality: usize },

    /// The same variable was both queried and observed
    #[error("variable `{0}` appears in both the query and the evidence")]
    QueryEvidenceOverlap(String),

    /// A marginal query over no variables
    #[error("a query must name at least one variable")]
    EmptyQuery,

    /// The evidence has zero probability, so the conditional distribution is undefined
    #[error("the evidence has zero probability under the model")]
    InconsistentEvidence,

    /// Normalization of a factor whose values sum to zero
    #[error("cannot normalize a factor whose values sum to {0}")]
    ZeroPartition(f64),

    /// Factor tables hold non-negative, finite values only
    #[error("factor tables may not hold negative or non-finite values")]
    NegativeValue,

    /// Represents an error where there was a parent variable expected, but not found
    #[error("parent `{0}` must be added to the model before its children")]
    MissingParent(String),

    /// Represents the situation when we expected a CPD but did not receive one
    #[error("column {column} of the CPD for `{variable}` sums to {sum}")]
    NotACpd { variable: String, column: usize, sum: f64 },

    /// Represents an attempt to initialize a variable with an incompatible Initialization
    #[error("invalid initialization: {0}")]
    InvalidInitialization(String),

    /// A caller supplied elimination order that does not cover the variables to eliminate
    #[error("invalid elimination order: {0}")]
    InvalidEliminationOrder(String),

    /// A junction tree that is not a tree, or whose cliques and potentials disagree
    #[error("invalid junction tree: {0}")]
    InvalidStructure(String),

    /// Beliefs were requested before calibration
    #[error("beliefs are not available until the junction tree is calibrated")]
    NotCalibrated,

}
