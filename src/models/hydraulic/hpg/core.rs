//! Computational core of the Hydraulic Performance Graph.
//!
//! A performance graph tabulates, for one conduit, the upstream depth, stored
//! volume and friction loss produced by a discharge and a downstream depth.
//! It is built once by tracing gradually-varied-flow profiles through the
//! conduit, persisted as text, and interpolated at run time.

mod builder;
mod curve;
mod depth;
mod interp;
mod profile;
mod reach;
mod store;

pub use builder::{
    BuildError, BuilderConfig, build_curve, build_family, build_hpg, find_max_flow, sample_flows,
};
pub use curve::{Curve, CurveClass, CurveError, Family, Hpg, HpgHeader, ProfilePoint, Quantity};
pub use depth::{CharacteristicDepths, DepthError, critical_depth, normal_depth};
pub use interp::InterpError;
pub use profile::{
    Direction, ProfileConfig, ProfileError, ProfileRequest, ProfileResult, solve_combined,
    solve_profile,
};
pub use reach::{Reach, ReachError};
pub use store::{StoreError, load_hpg, read_hpg, save_hpg, write_hpg};

pub(crate) use depth::bracketed_root;

#[cfg(test)]
pub(crate) use reach::test_support;
