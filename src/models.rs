//! Hydraulic models.
//!
//! # Model structure
//!
//! Each model lives in its own module and keeps its computation in a `core`
//! submodule. The model module itself holds a [`twine_core::Model`] adapter
//! where one makes sense.

pub mod hydraulic;
