//! # Backwater HPG
//!
//! Steady-state backwater routing through networks of circular conduits,
//! built on precomputed Hydraulic Performance Graphs (HPGs).
//!
//! ## Crate layout
//!
//! - [`models`]: The hydraulic models: the HPG subsystem (profile solver,
//!   curve-family builder, text store, runtime interpolator) and the network
//!   steady-state router that consumes it.
//! - [`support`]: Supporting utilities used by the models (numeric
//!   constraints, unit-system constants, cross-section geometry, splines).
//!
//! ## Lifecycle
//!
//! A performance graph is built once per conduit (or loaded from its text
//! form), attached read-only to a network link, and then reused by every
//! routing pass. Each pass resolves one steady-state water-surface snapshot
//! from a downstream boundary and keeps no state beyond the link results it
//! writes.

pub mod models;
pub mod support;
