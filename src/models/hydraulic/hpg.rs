//! Hydraulic Performance Graph models.
//!
//! This module provides a [`twine_core::Model`] over a built or loaded
//! performance graph. The computational core (profile solver, curve builder,
//! text store and interpolator) is in the [`core`](self::core) module.

pub mod core;

use twine_core::Model;

use self::core::{Hpg, InterpError};

/// A conduit query: signed flow and depth at the downstream end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConduitQuery {
    pub flow: f64,
    pub downstream_depth: f64,
}

/// Conduit state read from a performance graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConduitState {
    pub upstream_depth: f64,
    pub volume: f64,
    pub friction_loss: f64,
}

/// Model adapter answering [`ConduitQuery`]s from one performance graph.
#[derive(Debug, Clone, Copy)]
pub struct HpgModel<'a> {
    hpg: &'a Hpg,
}

impl<'a> HpgModel<'a> {
    #[must_use]
    pub fn new(hpg: &'a Hpg) -> Self {
        Self { hpg }
    }
}

impl Model for HpgModel<'_> {
    type Input = ConduitQuery;
    type Output = ConduitState;
    type Error = InterpError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        let ConduitQuery {
            flow,
            downstream_depth,
        } = *input;

        Ok(ConduitState {
            upstream_depth: self.hpg.upstream_depth(flow, downstream_depth)?,
            volume: self.hpg.volume(flow, downstream_depth)?,
            friction_loss: self.hpg.friction_loss(flow, downstream_depth)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use super::core::{BuilderConfig, build_hpg, test_support::sample_reach};

    #[test]
    fn model_matches_direct_lookups() {
        let hpg = build_hpg(&sample_reach(), &BuilderConfig::default()).unwrap();
        let (min, max) = hpg.valid_range(1.0).unwrap();
        let query = ConduitQuery {
            flow: 0.25 * (min + max),
            downstream_depth: 7.0,
        };

        let state = HpgModel::new(&hpg).call(&query).unwrap();
        assert_relative_eq!(state.upstream_depth, hpg.upstream_depth(query.flow, 7.0).unwrap());
        assert_relative_eq!(state.volume, hpg.volume(query.flow, 7.0).unwrap());
        assert_relative_eq!(state.friction_loss, hpg.friction_loss(query.flow, 7.0).unwrap());
    }

    #[test]
    fn model_reports_invalid_flow() {
        let hpg = build_hpg(&sample_reach(), &BuilderConfig::default()).unwrap();
        let (_, max) = hpg.valid_range(1.0).unwrap();
        let err = HpgModel::new(&hpg)
            .call(&ConduitQuery {
                flow: 2.0 * max,
                downstream_depth: 5.0,
            })
            .unwrap_err();
        assert_eq!(err, InterpError::InvalidFlow { flow: 2.0 * max });
    }
}
