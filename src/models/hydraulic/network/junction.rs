//! Junction head-loss correction seam.

use thiserror::Error;

use super::{Link, Node, NodeId};

/// Failure reported by a junction-loss collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct JunctionError {
    message: String,
}

impl JunctionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What a junction-loss model sees when a junction is resolved.
#[derive(Debug, Clone)]
pub struct JunctionContext<'a> {
    pub id: NodeId,
    pub node: &'a Node,

    /// Depth resolved from the links leaving the junction.
    pub depth: f64,

    /// Links draining into the junction.
    pub inflows: Vec<&'a Link>,

    /// Links leaving the junction.
    pub outflows: Vec<&'a Link>,
}

/// Corrects a junction's depth for the losses of merging or resizing flow.
pub trait JunctionLoss {
    /// Returns the corrected node depth.
    ///
    /// # Errors
    ///
    /// Returns a [`JunctionError`] if the correction cannot be computed.
    fn correct(&self, junction: &JunctionContext<'_>) -> Result<f64, JunctionError>;
}

/// Leaves every junction depth unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJunctionLoss;

impl JunctionLoss for NoJunctionLoss {
    fn correct(&self, junction: &JunctionContext<'_>) -> Result<f64, JunctionError> {
        Ok(junction.depth)
    }
}
