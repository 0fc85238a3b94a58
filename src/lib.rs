//! Exact inference over discrete probabilistic graphical models: factor algebra, variable
//! elimination for conditional and MAP queries, and junction tree calibration.

pub mod variable;
pub mod factor;
pub mod init;
pub mod model;
pub mod inference;
pub mod util;

pub use util::{Result, PgmError};
pub use variable::{all_assignments, Assignment, Variable, VariableSet};
pub use factor::{Backpointer, Factor, TabularCpd, Table};
pub use init::Initialization;
pub use model::Model;
pub use model::directed::{DirectedModel, DirectedModelBuilder};
pub use model::undirected::{UndirectedModel, UndirectedModelBuilder};
pub use model::junction_tree::{JunctionTree, JunctionTreeBuilder};
pub use inference::{
    BeliefPropagation,
    ConditionalInference,
    EliminationHeuristic,
    EliminationOrdering,
    MapInference,
    Semiring,
    VariableElimination
};
