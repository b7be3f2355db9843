//! Conduit networks and the steady-state backwater router.
//!
//! A [`Network`] is a directed graph of nodes joined by links. Each link is
//! one conduit with its [`Reach`](crate::models::hydraulic::hpg::core::Reach)
//! and, once attached, a shared read-only performance graph. Routing starts
//! from a sink node with a known control depth and walks upstream, resolving
//! each link's upstream depth, stored volume and friction loss.

mod graph;
mod junction;
mod router;

pub use graph::{Link, LinkId, LinkState, Network, NetworkError, Node, NodeId};
pub use junction::{JunctionContext, JunctionError, JunctionLoss, NoJunctionLoss};
pub use router::{Boundary, RouteError, RouteSummary, RouterConfig};
