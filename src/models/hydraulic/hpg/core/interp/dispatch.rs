//! Choice of interpolation rule for a query bracketed by two curves.

use crate::models::hydraulic::hpg::core::{Curve, CurveClass};

/// Where the queried downstream depth falls relative to the bracketing curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Region {
    /// Below the first point of the lower-flow curve.
    BelowLow,
    /// Below the first point of the higher-flow curve only.
    BelowHighOnly,
    /// Past the last point of either curve.
    BeyondLast,
    Within,
}

impl Region {
    pub(super) fn locate(low: &Curve, high: &Curve, depth: f64) -> Option<Self> {
        let (low_first, low_last) = (low.first()?.downstream, low.last()?.downstream);
        let (high_first, high_last) = (high.first()?.downstream, high.last()?.downstream);

        Some(if depth < low_first {
            Self::BelowLow
        } else if depth < high_first {
            Self::BelowHighOnly
        } else if depth > low_last.min(high_last) {
            Self::BeyondLast
        } else {
            Self::Within
        })
    }
}

/// How a two-curve query is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Rule {
    /// Flow blend of the two curves' first-point values.
    FirstPointBlend,
    /// Mean of the line through both first points, taken at the queried
    /// depth, and the lower curve's own value.
    SteepTransitional,
    /// Unweighted mean of the two first-point values.
    Transitional,
    /// Flow blend of each curve extended past its last point.
    Extrapolate,
    /// Flow blend of the two curves' spline values.
    SplineBlend,
}

/// The dispatch table over `(class of low, class of high, region)`.
pub(super) fn rule(low: CurveClass, high: CurveClass, region: Region) -> Rule {
    use CurveClass::{Mild, Steep};

    match (low, high, region) {
        (_, _, Region::BeyondLast) => Rule::Extrapolate,
        (_, _, Region::Within) => Rule::SplineBlend,

        (Steep, Steep, Region::BelowLow) | (Mild, Mild, Region::BelowLow) => Rule::FirstPointBlend,
        (Steep, Steep, Region::BelowHighOnly) => Rule::SteepTransitional,
        (Mild, Mild, Region::BelowHighOnly) => Rule::SplineBlend,

        (Steep, Mild, _) | (Mild, Steep, _) => Rule::Transitional,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use CurveClass::{Mild, Steep};

    #[test]
    fn table_cells() {
        assert_eq!(rule(Steep, Steep, Region::BelowLow), Rule::FirstPointBlend);
        assert_eq!(rule(Steep, Steep, Region::BelowHighOnly), Rule::SteepTransitional);
        assert_eq!(rule(Steep, Steep, Region::BeyondLast), Rule::Extrapolate);
        assert_eq!(rule(Steep, Steep, Region::Within), Rule::SplineBlend);

        for (low, high) in [(Steep, Mild), (Mild, Steep)] {
            assert_eq!(rule(low, high, Region::BelowLow), Rule::Transitional);
            assert_eq!(rule(low, high, Region::BelowHighOnly), Rule::Transitional);
            assert_eq!(rule(low, high, Region::BeyondLast), Rule::Extrapolate);
            assert_eq!(rule(low, high, Region::Within), Rule::SplineBlend);
        }

        assert_eq!(rule(Mild, Mild, Region::BelowLow), Rule::FirstPointBlend);
        assert_eq!(rule(Mild, Mild, Region::BelowHighOnly), Rule::SplineBlend);
        assert_eq!(rule(Mild, Mild, Region::BeyondLast), Rule::Extrapolate);
        assert_eq!(rule(Mild, Mild, Region::Within), Rule::SplineBlend);
    }
}
