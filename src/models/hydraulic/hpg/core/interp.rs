//! Run-time lookups into a performance graph.
//!
//! A query names a signed flow and a downstream depth. The two curves whose
//! flows bracket the query are located in the family for the flow's sign,
//! each is evaluated along its splines, and the two values are blended
//! linearly in flow. Near the first and last tabulated depths the rule
//! depends on whether each curve is steep or mild.

mod dispatch;
mod error;

pub use error::InterpError;

use super::{Curve, Hpg, Quantity};

use dispatch::{Region, Rule};

impl Hpg {
    /// Looks up `quantity` for a signed `flow` and a `downstream_depth`.
    ///
    /// # Errors
    ///
    /// Returns [`InterpError::InvalidFlow`] if the flow magnitude lies outside
    /// the tabulated range of its family or a bracketing curve is degenerate,
    /// and [`InterpError::Interpolation`] if the query or result is not finite.
    pub fn lookup(
        &self,
        quantity: Quantity,
        flow: f64,
        downstream_depth: f64,
    ) -> Result<f64, InterpError> {
        let failed = InterpError::Interpolation {
            flow,
            depth: downstream_depth,
        };
        if !flow.is_finite() || !downstream_depth.is_finite() {
            return Err(failed);
        }

        let family = self.family_for(flow);
        let magnitude = flow.abs();
        let (min, max) = family.flow_range().ok_or(InterpError::InvalidFlow { flow })?;
        if magnitude < min || magnitude > max {
            return Err(InterpError::InvalidFlow { flow });
        }

        let curves = family.curves();
        let lower = curves.partition_point(|c| c.magnitude() <= magnitude) - 1;
        let low = family
            .curve(lower)
            .ok_or(InterpError::InvalidParam { index: lower })?;

        let value = if low.magnitude() == magnitude {
            low.extrapolate(quantity, downstream_depth)
                .ok_or(InterpError::InvalidFlow { flow })?
        } else {
            let high = family
                .curve(lower + 1)
                .ok_or(InterpError::InvalidParam { index: lower + 1 })?;
            blend_curves(quantity, magnitude, low, high, downstream_depth)
                .ok_or(InterpError::InvalidFlow { flow })?
        };

        if value.is_finite() { Ok(value) } else { Err(failed) }
    }

    /// Upstream depth for a signed flow and a downstream depth.
    ///
    /// # Errors
    ///
    /// See [`Hpg::lookup`].
    pub fn upstream_depth(&self, flow: f64, downstream_depth: f64) -> Result<f64, InterpError> {
        self.lookup(Quantity::UpstreamDepth, flow, downstream_depth)
    }

    /// Stored volume for a signed flow and a downstream depth.
    ///
    /// # Errors
    ///
    /// See [`Hpg::lookup`].
    pub fn volume(&self, flow: f64, downstream_depth: f64) -> Result<f64, InterpError> {
        self.lookup(Quantity::Volume, flow, downstream_depth)
    }

    /// Friction head loss for a signed flow and a downstream depth.
    ///
    /// # Errors
    ///
    /// See [`Hpg::lookup`].
    pub fn friction_loss(&self, flow: f64, downstream_depth: f64) -> Result<f64, InterpError> {
        self.lookup(Quantity::FrictionLoss, flow, downstream_depth)
    }
}

/// Answers a query strictly between the flows of `low` and `high`.
///
/// Returns `None` when either curve is degenerate.
fn blend_curves(
    quantity: Quantity,
    flow: f64,
    low: &Curve,
    high: &Curve,
    depth: f64,
) -> Option<f64> {
    if low.is_degenerate() || high.is_degenerate() {
        return None;
    }

    let region = Region::locate(low, high, depth)?;
    let rule = dispatch::rule(low.class()?, high.class()?, region);

    let (f1, f2) = (low.magnitude(), high.magnitude());
    let mix = |y1: f64, y2: f64| blend(flow, f1, f2, y1, y2);
    let (low_start, high_start) = (low.first()?, high.first()?);
    let first_low = low_start.get(quantity);
    let first_high = high_start.get(quantity);

    Some(match rule {
        Rule::FirstPointBlend => mix(first_low, first_high),
        Rule::SteepTransitional => {
            let critical_line = first_low
                + (depth - low_start.downstream) / (high_start.downstream - low_start.downstream)
                    * (first_high - first_low);
            0.5 * (critical_line + low.eval(quantity, depth)?)
        }
        Rule::Transitional => 0.5 * (first_low + first_high),
        Rule::Extrapolate => mix(
            low.extrapolate(quantity, depth)?,
            high.extrapolate(quantity, depth)?,
        ),
        Rule::SplineBlend => mix(low.eval(quantity, depth)?, high.eval(quantity, depth)?),
    })
}

/// Linear blend in flow between values `y1` at `f1` and `y2` at `f2`.
///
/// The increment is taken as `|y1 − y2|`, so the result moves away from `y1`
/// upward even when `y2 < y1`.
fn blend(flow: f64, f1: f64, f2: f64, y1: f64, y2: f64) -> f64 {
    y1 + (flow - f1) / (f2 - f1) * (y1 - y2).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::models::hydraulic::hpg::core::{
        BuilderConfig, Family, HpgHeader, ProfilePoint, build_hpg, test_support::sample_reach,
    };

    fn point(downstream: f64, upstream: f64) -> ProfilePoint {
        ProfilePoint {
            downstream,
            upstream,
            volume: 10.0 * upstream,
            friction_loss: 0.01 * upstream,
        }
    }

    /// A mild curve whose upstream depth sits `offset` above the downstream depth.
    fn mild(flow: f64, offset: f64) -> Curve {
        Curve::new(
            flow,
            (0..5)
                .map(|i| {
                    let d = 1.0 + f64::from(i);
                    point(d, d + offset)
                })
                .collect(),
        )
    }

    /// A steep curve: inlet control at `critical` until drowned.
    fn steep(flow: f64, critical: f64) -> Curve {
        Curve::new(
            flow,
            vec![
                point(critical, critical),
                point(critical + 1.0, critical),
                point(critical + 2.0, critical + 1.5),
                point(critical + 3.0, critical + 3.0),
            ],
        )
    }

    fn graph(curves: Vec<Curve>) -> Hpg {
        Hpg::new(
            HpgHeader::default(),
            Family::new(curves).unwrap(),
            Family::default(),
        )
        .unwrap()
    }

    #[test]
    fn exact_flow_reads_its_own_curve() {
        let hpg = graph(vec![mild(10.0, 0.5), mild(20.0, 1.0)]);
        assert_relative_eq!(hpg.upstream_depth(10.0, 3.0).unwrap(), 3.5);
        assert_relative_eq!(hpg.upstream_depth(20.0, 3.0).unwrap(), 4.0);
        assert_relative_eq!(hpg.volume(20.0, 3.0).unwrap(), 40.0);
        assert_relative_eq!(hpg.friction_loss(10.0, 3.0).unwrap(), 0.035);
    }

    #[test]
    fn flows_outside_the_table_are_invalid() {
        let hpg = graph(vec![mild(10.0, 0.5), mild(20.0, 1.0)]);
        assert_eq!(
            hpg.upstream_depth(25.0, 3.0),
            Err(InterpError::InvalidFlow { flow: 25.0 })
        );
        assert_eq!(
            hpg.upstream_depth(5.0, 3.0),
            Err(InterpError::InvalidFlow { flow: 5.0 })
        );
        assert_eq!(
            hpg.upstream_depth(-15.0, 3.0),
            Err(InterpError::InvalidFlow { flow: -15.0 })
        );
        assert!(matches!(
            hpg.upstream_depth(f64::NAN, 3.0),
            Err(InterpError::Interpolation { .. })
        ));
    }

    #[test]
    fn degenerate_bracket_is_invalid() {
        let broken = Curve::new(15.0, vec![point(1.0, 1.5)]);
        let hpg = graph(vec![mild(10.0, 0.5), broken, mild(20.0, 1.0)]);
        assert_eq!(
            hpg.upstream_depth(12.0, 3.0),
            Err(InterpError::InvalidFlow { flow: 12.0 })
        );
    }

    #[test]
    fn within_curves_blends_in_flow() {
        let hpg = graph(vec![mild(10.0, 0.5), mild(20.0, 1.0)]);
        assert_relative_eq!(hpg.upstream_depth(15.0, 3.0).unwrap(), 3.75);
    }

    #[test]
    fn blend_moves_up_even_when_values_fall() {
        // The higher-flow curve sits lower, yet the blend still rises above the low curve.
        let hpg = graph(vec![mild(10.0, 1.0), mild(20.0, 0.5)]);
        assert_relative_eq!(hpg.upstream_depth(15.0, 3.0).unwrap(), 4.25);
        assert_relative_eq!(blend(15.0, 10.0, 20.0, 4.0, 3.5), 4.25);
    }

    #[test]
    fn beyond_last_point_extrapolates() {
        let hpg = graph(vec![mild(10.0, 0.5), mild(20.0, 1.0)]);
        assert_relative_eq!(hpg.upstream_depth(15.0, 7.0).unwrap(), 7.75);
        assert_relative_eq!(hpg.upstream_depth(10.0, 7.0).unwrap(), 7.5);
    }

    #[test]
    fn below_first_points_uses_first_values() {
        let hpg = graph(vec![mild(10.0, 0.5), mild(20.0, 1.0)]);
        assert_relative_eq!(hpg.upstream_depth(15.0, 0.5).unwrap(), 1.75);
    }

    #[test]
    fn steep_pairs_use_transitional_rules() {
        let hpg = graph(vec![steep(10.0, 1.0), steep(20.0, 2.0)]);

        // Below both first points: blend of the first upstream depths.
        assert_relative_eq!(hpg.upstream_depth(15.0, 0.5).unwrap(), 1.5);

        // Between the first points: mean of the line joining the two first
        // points and the low curve, which is flat there at its critical depth.
        assert_relative_eq!(hpg.upstream_depth(15.0, 1.25).unwrap(), 0.5 * (1.25 + 1.0));
        assert_relative_eq!(hpg.upstream_depth(12.0, 1.75).unwrap(), 0.5 * (1.75 + 1.0));
        assert_relative_eq!(hpg.volume(15.0, 1.25).unwrap(), 0.5 * (12.5 + 10.0));
    }

    #[test]
    fn mixed_pairs_use_unweighted_mean() {
        let hpg = graph(vec![steep(10.0, 1.0), mild(20.0, 2.0)]);
        let first_sum = 1.0 + 3.0;
        assert_relative_eq!(hpg.upstream_depth(12.0, 0.5).unwrap(), 0.5 * first_sum);
        assert_relative_eq!(hpg.upstream_depth(18.0, 0.5).unwrap(), 0.5 * first_sum);
    }

    #[test]
    fn adverse_flows_use_adverse_family() {
        let hpg = Hpg::new(
            HpgHeader::default(),
            Family::new(vec![mild(10.0, 0.5), mild(20.0, 1.0)]).unwrap(),
            Family::new(vec![mild(-10.0, 2.0), mild(-20.0, 3.0)]).unwrap(),
        )
        .unwrap();
        assert_relative_eq!(hpg.upstream_depth(-10.0, 3.0).unwrap(), 5.0);
        assert_relative_eq!(hpg.upstream_depth(-15.0, 3.0).unwrap(), 5.5);
    }

    #[test]
    fn built_graph_lookups() {
        let hpg = build_hpg(&sample_reach(), &BuilderConfig::default()).unwrap();
        let (min, max) = hpg.valid_range(1.0).unwrap();

        let flow = 0.5 * (min + max);
        let a = hpg.upstream_depth(flow, 6.0).unwrap();
        let b = hpg.upstream_depth(flow, 6.0).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());

        assert!(matches!(
            hpg.upstream_depth(max * 1.01, 6.0),
            Err(InterpError::InvalidFlow { .. })
        ));

        let curve = &hpg.forward().curves()[hpg.forward().len() / 2];
        for p in curve.points() {
            assert_relative_eq!(
                hpg.upstream_depth(curve.flow(), p.downstream).unwrap(),
                p.upstream,
                max_relative = 1e-12
            );
        }

        let (lo, hi) = (curve.first().unwrap().downstream, curve.last().unwrap().downstream);
        let mut previous = f64::NEG_INFINITY;
        for i in 0..=50 {
            let depth = lo + (hi - lo) * f64::from(i) / 50.0;
            let upstream = hpg.upstream_depth(curve.flow(), depth).unwrap();
            assert!(upstream >= previous - 1e-12, "not monotonic at depth {depth}");
            previous = upstream;
        }
    }
}
