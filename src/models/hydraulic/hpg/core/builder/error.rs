use thiserror::Error;

use crate::models::hydraulic::hpg::core::{CurveError, DepthError};

/// Errors that can occur while building a performance graph.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No probed discharge produced a curve with enough points.
    #[error("no discharge yields a curve with more than {min_points} points")]
    NoValidFlow { min_points: usize },

    /// A characteristic depth could not be solved.
    #[error("characteristic depth solve failed")]
    Depth(#[from] DepthError),

    /// The sampled curves do not form valid families.
    #[error("sampled curves are inconsistent")]
    Curve(#[from] CurveError),
}
