//! Sampling a conduit into forward and adverse curve families.
//!
//! Each family spans discharges from a small fraction of the largest flow
//! the conduit can carry with a usable curve up to that flow. Every curve
//! samples downstream depths from critical depth up to a fraction of the
//! full depth, and optionally on into the surcharged range.

mod config;
mod error;

pub use config::BuilderConfig;
pub use error::BuildError;

use log::{debug, warn};

use super::{
    Curve, Family, Hpg, HpgHeader, ProfilePoint, Reach, critical_depth, solve_combined,
};

/// First discharge probed by the max-flow search, per unit of full depth.
const PROBE_FLOW_PER_DEPTH: f64 = 500.0;

/// Builds the performance graph of `reach`.
///
/// The forward family samples the reach as given. The adverse family samples
/// the reversed reach and stores negated flows. A family for which no
/// discharge yields a usable curve is left empty.
///
/// # Errors
///
/// Returns [`BuildError::NoValidFlow`] if both families are empty, or another
/// [`BuildError`] if a depth solve fails.
pub fn build_hpg(reach: &Reach, config: &BuilderConfig) -> Result<Hpg, BuildError> {
    let forward = family_or_empty(build_family(reach, 1.0, config), "forward")?;
    let adverse = family_or_empty(build_family(&reach.reversed(), -1.0, config), "adverse")?;

    if forward.is_empty() && adverse.is_empty() {
        return Err(BuildError::NoValidFlow {
            min_points: config.min_points,
        });
    }

    let header = HpgHeader {
        ds_invert: Some(reach.ds_invert()),
        us_invert: Some(reach.us_invert()),
        slope: Some(reach.slope()),
        length: Some(reach.length()),
        roughness: Some(reach.roughness()),
        diameter: Some(reach.max_depth()),
        max_depth_frac: Some(config.max_depth_frac.get()),
        ..HpgHeader::default()
    };

    Ok(Hpg::new(header, forward, adverse)?)
}

fn family_or_empty(
    family: Result<Family, BuildError>,
    label: &str,
) -> Result<Family, BuildError> {
    match family {
        Err(BuildError::NoValidFlow { min_points }) => {
            warn!("{label} family is empty: no curve has more than {min_points} points");
            Ok(Family::default())
        }
        other => other,
    }
}

/// Builds one family, with flows carrying the sign of `sign`.
///
/// # Errors
///
/// Returns [`BuildError::NoValidFlow`] if no discharge yields a usable curve.
pub fn build_family(reach: &Reach, sign: f64, config: &BuilderConfig) -> Result<Family, BuildError> {
    let max_flow = find_max_flow(reach, config)?;
    let min_flow = config.min_flow_fraction * max_flow;

    let mut curves = Vec::with_capacity(config.curves);
    for flow in sample_flows(min_flow, max_flow, config.curves) {
        let points = build_curve(reach, flow, config)?;
        if points.len() <= config.min_points {
            debug!(
                "discarding curve for flow {flow}: {} points, need more than {}",
                points.len(),
                config.min_points
            );
            continue;
        }
        curves.push(Curve::new(sign.signum() * flow, points));
    }

    if curves.is_empty() {
        return Err(BuildError::NoValidFlow {
            min_points: config.min_points,
        });
    }

    Ok(Family::new(curves)?)
}

/// Finds the largest discharge for which the reach still yields a usable curve.
///
/// Probes upward by doubling from `500 × full depth`, then bisects between
/// the last usable flow and the first unusable one.
///
/// # Errors
///
/// Returns [`BuildError::NoValidFlow`] if even tiny discharges fail.
pub fn find_max_flow(reach: &Reach, config: &BuilderConfig) -> Result<f64, BuildError> {
    let usable = |flow: f64| -> Result<bool, BuildError> {
        Ok(build_curve(reach, flow, config)?.len() > config.min_points)
    };

    let mut upper = PROBE_FLOW_PER_DEPTH * reach.max_depth();
    if usable(upper)? {
        let mut capped = true;
        for _ in 0..config.max_flow_iters {
            upper *= 2.0;
            if !usable(upper)? {
                capped = false;
                break;
            }
        }
        if capped {
            debug!("max flow search capped at {upper}");
            return Ok(upper);
        }
    }

    let mut lower = 1.0;
    let mut found = false;
    for _ in 0..config.max_flow_iters {
        if usable(lower)? {
            found = true;
            break;
        }
        upper = lower;
        lower *= 0.5;
    }
    if !found {
        return Err(BuildError::NoValidFlow {
            min_points: config.min_points,
        });
    }

    for _ in 0..config.max_flow_iters {
        if upper - lower < config.max_flow_tol {
            break;
        }
        let mid = 0.5 * (lower + upper);
        if usable(mid)? {
            lower = mid;
        } else {
            upper = mid;
        }
    }

    debug!("max flow {lower}");
    Ok(lower)
}

/// Spaces `n` discharges from `min_flow` to `max_flow`, clustered near low flow.
///
/// `flow(i) = min + ln(1 − (i/n)³) / ln(1 − ((n−1)/n)³) · (max − min)`
#[must_use]
pub fn sample_flows(min_flow: f64, max_flow: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![max_flow];
    }

    let n_f = n as f64;
    let last = (1.0 - ((n_f - 1.0) / n_f).powi(3)).ln();
    (0..n)
        .map(|i| {
            let fraction = (1.0 - (i as f64 / n_f).powi(3)).ln() / last;
            min_flow + fraction * (max_flow - min_flow)
        })
        .collect()
}

/// Samples the curve of one discharge magnitude.
///
/// A point that turns supercritical against the march is skipped; any other
/// profile failure, including reaching the ceiling, ends the pass.
///
/// # Errors
///
/// Returns a [`BuildError`] if the critical depth cannot be solved.
pub fn build_curve(
    reach: &Reach,
    flow: f64,
    config: &BuilderConfig,
) -> Result<Vec<ProfilePoint>, BuildError> {
    // Steep and mild flows share the range from critical depth to the top.
    let critical = critical_depth(reach, flow)?;
    let max_depth = reach.max_depth();
    let top = config.max_depth_frac.get() * max_depth;

    let mut points = Vec::new();
    if critical < top {
        let samples = config.depth_samples;
        let depths_iter = (0..samples).map(|i| {
            if samples > 1 {
                critical + (top - critical) * i as f64 / (samples - 1) as f64
            } else {
                critical
            }
        });
        sample_pass(reach, flow, depths_iter, top, config, &mut points);
    }

    if let Some(height) = config.pressurized_height {
        let ceiling = max_depth + height.get();
        let samples = config.depth_samples.max(1);
        let depths_iter =
            (1..=samples).map(|i| top + (ceiling - top) * i as f64 / samples as f64);
        sample_pass(reach, flow, depths_iter, ceiling, config, &mut points);
    }

    debug!("flow {flow}: {} points from critical depth {critical}", points.len());
    Ok(points)
}

fn sample_pass(
    reach: &Reach,
    flow: f64,
    downstream_depths: impl Iterator<Item = f64>,
    ceiling: f64,
    config: &BuilderConfig,
    points: &mut Vec<ProfilePoint>,
) {
    for depth in downstream_depths {
        match solve_combined(reach, flow, depth, Some(ceiling), &config.profile) {
            Ok(point) => {
                if points.last().is_none_or(|last| point.downstream > last.downstream) {
                    points.push(point);
                }
            }
            Err(err) if err.is_recoverable() => {}
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::{
        models::hydraulic::hpg::core::{CurveClass, critical_depth, test_support::*},
        support::constraint::NonNegative,
    };

    #[test]
    fn flow_spacing_clusters_near_low_flow() {
        let flows = sample_flows(1.0, 10.0, 5);
        assert_eq!(flows.len(), 5);
        assert_relative_eq!(flows[0], 1.0);
        assert_relative_eq!(flows[4], 10.0);

        let gaps: Vec<f64> = flows.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(gaps.iter().all(|&g| g > 0.0));
        assert!(gaps[0] < gaps[3]);

        assert_eq!(sample_flows(1.0, 10.0, 1), vec![10.0]);
    }

    #[test]
    fn max_flow_of_sample_reaches() {
        let config = BuilderConfig::default();

        let mild = find_max_flow(&sample_reach(), &config).unwrap();
        assert!((850.0..1000.0).contains(&mild), "mild max flow {mild}");

        let steep = find_max_flow(&steep_reach(), &config).unwrap();
        assert!((290.0..360.0).contains(&steep), "steep max flow {steep}");

        let adverse = find_max_flow(&sample_reach().reversed(), &config).unwrap();
        assert!((550.0..680.0).contains(&adverse), "adverse max flow {adverse}");
    }

    #[test]
    fn curves_start_at_critical_depth() {
        let reach = sample_reach();
        let config = BuilderConfig::default();
        let points = build_curve(&reach, 300.0, &config).unwrap();

        assert!(points.len() > config.min_points);
        assert_relative_eq!(points[0].downstream, critical_depth(&reach, 300.0).unwrap());
        assert!(points.iter().all(|p| p.downstream <= 9.5 + 1e-12));
        assert!(points.windows(2).all(|w| w[1].downstream > w[0].downstream));
    }

    #[test]
    fn pressurized_pass_extends_curves() {
        let reach = sample_reach();
        let config = BuilderConfig {
            pressurized_height: Some(NonNegative::new(5.0).unwrap()),
            ..BuilderConfig::default()
        };
        let free = build_curve(&reach, 300.0, &BuilderConfig::default()).unwrap();
        let extended = build_curve(&reach, 300.0, &config).unwrap();

        assert!(extended.len() > free.len());
        assert!(extended.last().unwrap().downstream > reach.max_depth());
        assert!(extended.last().unwrap().upstream > reach.max_depth());
    }

    #[test]
    fn builds_both_families() {
        let reach = sample_reach();
        let config = BuilderConfig::default();
        let hpg = build_hpg(&reach, &config).unwrap();

        assert!(!hpg.forward().is_empty());
        assert!(!hpg.adverse().is_empty());
        assert!(hpg.forward().curves().iter().all(|c| c.flow() > 0.0));
        assert!(hpg.adverse().curves().iter().all(|c| c.flow() < 0.0));
        assert!(
            hpg.forward()
                .curves()
                .iter()
                .all(|c| c.points().len() > config.min_points)
        );

        let header = hpg.header();
        assert_eq!(header.diameter, Some(10.0));
        assert_eq!(header.slope, Some(0.002));
        assert_eq!(header.max_depth_frac, Some(0.95));
    }

    #[test]
    fn steep_reach_curves_are_inlet_controlled() {
        let hpg = build_hpg(&steep_reach(), &BuilderConfig::default()).unwrap();
        let first = &hpg.forward().curves()[0];
        assert_eq!(first.class(), Some(CurveClass::Steep));

        let mild = build_hpg(&sample_reach(), &BuilderConfig::default()).unwrap();
        assert_eq!(mild.forward().curves()[0].class(), Some(CurveClass::Mild));
    }
}
