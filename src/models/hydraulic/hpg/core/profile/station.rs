use crate::models::hydraulic::hpg::core::{Reach, depth::ZERO_FLOW};

use super::ProfileError;

/// Depths at or below this fraction of full depth count as dry.
const EMPTY_FRACTION: f64 = 1e-4;

/// Depths at or above this fraction of full depth run full.
const PRESSURIZED_FRACTION: f64 = 0.9999;

/// How the section carries water at a given depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Regime {
    Empty,
    Free,
    Pressurized,
}

impl Regime {
    fn of(depth: f64, max_depth: f64) -> Self {
        if depth <= EMPTY_FRACTION * max_depth {
            Self::Empty
        } else if depth >= PRESSURIZED_FRACTION * max_depth {
            Self::Pressurized
        } else {
            Self::Free
        }
    }
}

/// Hydraulic state at one computational station.
#[derive(Debug, Clone, Copy)]
pub(super) struct Station {
    pub depth: f64,
    pub energy: f64,
    pub friction_slope: f64,
    pub area: f64,
    pub velocity: f64,
    pub froude_squared: f64,
    pub regime: Regime,

    /// Derivative of `energy` with respect to depth.
    pub d_energy: f64,

    /// Derivative of `friction_slope` with respect to depth.
    pub d_friction: f64,
}

impl Station {
    /// Evaluates the station at `depth` with bed elevation `elevation`.
    ///
    /// In a full section the depth above the crown is pressure head.
    pub(super) fn evaluate(
        reach: &Reach,
        flow: f64,
        depth: f64,
        elevation: f64,
        index: usize,
    ) -> Result<Self, ProfileError> {
        if !depth.is_finite() {
            return Err(ProfileError::Imaginary { station: index });
        }

        let section = reach.section();
        let regime = Regime::of(depth, reach.max_depth());

        if flow.abs() < ZERO_FLOW || regime == Regime::Empty {
            return Ok(Self {
                depth,
                energy: elevation + depth,
                friction_slope: reach.slope(),
                area: section.area(depth.max(0.0)),
                velocity: 0.0,
                froude_squared: 0.0,
                regime,
                d_energy: 1.0,
                d_friction: 0.0,
            });
        }

        let gravity = reach.hydraulics().gravity();

        if regime == Regime::Pressurized {
            let area = section.full_area();
            if area <= 0.0 {
                return Err(ProfileError::ZeroArea { depth });
            }
            let radius = section.hydraulic_radius(reach.max_depth());
            let velocity = flow / area;
            return Ok(Self {
                depth,
                energy: elevation + depth + velocity * velocity / (2.0 * gravity),
                friction_slope: reach.friction_slope(flow, area, radius),
                area,
                velocity,
                froude_squared: 0.0,
                regime,
                d_energy: 1.0,
                d_friction: 0.0,
            });
        }

        let area = section.area(depth);
        if !area.is_finite() {
            return Err(ProfileError::Imaginary { station: index });
        }
        if area <= f64::EPSILON * section.full_area() {
            return Err(ProfileError::ZeroArea { depth });
        }
        let perimeter = section.wetted_perimeter(depth);
        let top_width = section.top_width(depth);
        let friction_slope = reach.friction_slope(flow, area, area / perimeter);
        let velocity = flow / area;
        let froude_squared = flow * flow * top_width / (gravity * area * area * area);

        let d_perimeter = section.perimeter_derivative(depth);
        let d_friction = friction_slope
            * (4.0 / 3.0 * d_perimeter / perimeter - 10.0 / 3.0 * top_width / area);

        Ok(Self {
            depth,
            energy: elevation + depth + velocity * velocity / (2.0 * gravity),
            friction_slope,
            area,
            velocity,
            froude_squared,
            regime,
            d_energy: 1.0 - froude_squared,
            d_friction,
        })
    }

    /// Whether the section changed between dry, free-surface and full flow.
    pub(super) fn flipped_from(&self, previous: &Self) -> bool {
        self.regime != previous.regime
    }
}
