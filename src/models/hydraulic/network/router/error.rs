use thiserror::Error;

use crate::models::hydraulic::{
    hpg::core::{DepthError, InterpError, ProfileError},
    network::{JunctionError, NetworkError},
};

/// Errors that abort a routing pass.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("sink node {index} does not exist")]
    UnknownSink { index: usize },

    #[error("link `{link}` carries flow but has no performance graph")]
    MissingHpg { link: String },

    #[error("lookup failed on link `{link}` at downstream depth {downstream_depth} and flow {flow}")]
    Lookup {
        link: String,
        downstream_depth: f64,
        flow: f64,
        #[source]
        source: InterpError,
    },

    #[error("ponded profile failed on link `{link}` at downstream depth {downstream_depth}")]
    Ponding {
        link: String,
        downstream_depth: f64,
        #[source]
        source: ProfileError,
    },

    #[error("outfall critical depth failed on link `{link}` for flow {flow}")]
    Outlet {
        link: String,
        flow: f64,
        #[source]
        source: DepthError,
    },

    #[error("reverse-flow depth failed on link `{link}` at depth {entry_depth} and flow {flow}")]
    Reverse {
        link: String,
        entry_depth: f64,
        flow: f64,
        #[source]
        source: DepthError,
    },

    #[error("junction correction failed at node `{node}`")]
    Junction {
        node: String,
        #[source]
        source: JunctionError,
    },

    #[error(transparent)]
    Network(#[from] NetworkError),
}
