use thiserror::Error;

use crate::models::hydraulic::hpg::core::DepthError;

/// Reasons a profile march stops.
///
/// These are ordinary outcomes of probing a reach at extreme flows or depths;
/// callers such as the curve builder branch on them.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The reach was asked for a profile with no segments.
    #[error("profile needs at least one step")]
    NoSteps,

    /// The Newton derivative vanished or is not finite.
    #[error("newton iteration diverged at station {station}")]
    Divergence { station: usize },

    /// A depth left the real domain of the section geometry.
    #[error("depth is not a real number at station {station}")]
    Imaginary { station: usize },

    /// The profile rose above the allowed ceiling.
    #[error("depth {depth} exceeds the ceiling at station {station}")]
    AtMaxDepth { station: usize, depth: f64 },

    /// The profile crossed critical depth against its march direction.
    #[error("flow regime changed at station {station}")]
    AtMinDepth { station: usize },

    /// Flowing water met a section with no wetted area.
    #[error("wetted area vanished at depth {depth}")]
    ZeroArea { depth: f64 },

    /// A characteristic depth could not be solved.
    #[error("characteristic depth solve failed")]
    Depth(#[from] DepthError),
}

impl ProfileError {
    /// Whether the failure only rules out this boundary depth.
    ///
    /// The curve builder skips such depths and keeps sampling.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::AtMinDepth { .. })
    }

    /// Whether a subcritical march ending this way may hand over to a
    /// supercritical one on a steep reach.
    pub(super) fn allows_jump(&self) -> bool {
        matches!(
            self,
            Self::AtMinDepth { .. } | Self::Divergence { .. } | Self::Imaginary { .. }
        )
    }
}
