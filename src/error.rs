use thiserror::Error;

use crate::collision::broadphase::manager::ManagerState;

/// Failure modes of geometry construction and proximity queries.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum QueryError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(&'static str),

    #[error("no narrow-phase algorithm for shape pair {0}/{1}")]
    UnsupportedGeometryPair(&'static str, &'static str),

    #[error("iterative solver exceeded its budget of {iterations} iterations")]
    ConvergenceFailure { iterations: usize },

    #[error("manager tree is {0:?}; call setup() or update() before querying")]
    StaleTraversal(ManagerState),
}
