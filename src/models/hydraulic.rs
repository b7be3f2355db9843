//! Conduit hydraulics.
//!
//! - [`hpg`]: per-conduit Hydraulic Performance Graphs and the solvers that
//!   build and query them.
//! - [`network`]: the node/link graph and the steady-state router that
//!   propagates a downstream control depth upstream through it.

pub mod hpg;
pub mod network;
