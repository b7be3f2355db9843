use crate::support::constraint::{Constrained, StrictlyPositive};

/// Circular pipe section.
///
/// Geometry is expressed through the central angle `θ = 2·acos(1 − 2y/D)`
/// subtended by the free surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circular {
    diameter: f64,
}

impl Circular {
    /// Creates a circular section of the given diameter.
    #[must_use]
    pub fn new(diameter: Constrained<f64, StrictlyPositive>) -> Self {
        Self {
            diameter: diameter.into_inner(),
        }
    }

    /// Pipe diameter.
    #[must_use]
    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    fn theta(&self, y: f64) -> f64 {
        let y = y.min(self.diameter);
        2.0 * (1.0 - 2.0 * y / self.diameter).acos()
    }

    pub(super) fn area(&self, y: f64) -> f64 {
        let theta = self.theta(y);
        self.diameter * self.diameter / 8.0 * (theta - theta.sin())
    }

    pub(super) fn wetted_perimeter(&self, y: f64) -> f64 {
        self.diameter * self.theta(y) / 2.0
    }

    pub(super) fn top_width(&self, y: f64) -> f64 {
        if y >= self.diameter {
            return 0.0;
        }
        self.diameter * (self.theta(y) / 2.0).sin()
    }

    /// `dP/dy = 2D/T`; unbounded at the invert and the crown, reported as zero there.
    pub(super) fn perimeter_derivative(&self, y: f64) -> f64 {
        let top_width = self.top_width(y);
        if top_width > 0.0 {
            2.0 * self.diameter / top_width
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn pipe(diameter: f64) -> Circular {
        Circular::new(StrictlyPositive::new(diameter).unwrap())
    }

    #[test]
    fn half_full() {
        let c = pipe(2.0);
        assert_relative_eq!(c.area(1.0), PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(c.wetted_perimeter(1.0), PI, epsilon = 1e-12);
        assert_relative_eq!(c.top_width(1.0), 2.0, epsilon = 1e-12);
        assert_relative_eq!(c.perimeter_derivative(1.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn full_and_above_crown() {
        let c = pipe(2.0);
        assert_relative_eq!(c.area(2.0), PI, epsilon = 1e-12);
        assert_relative_eq!(c.area(3.0), PI, epsilon = 1e-12);
        assert_eq!(c.top_width(2.0), 0.0);
        assert_eq!(c.perimeter_derivative(2.5), 0.0);
    }

    #[test]
    fn negative_depth_is_outside_domain() {
        assert!(pipe(1.0).area(-0.1).is_nan());
    }

    #[test]
    fn perimeter_derivative_matches_finite_difference() {
        let c = pipe(3.0);
        let y = 1.2;
        let h = 1e-6;
        let fd = (c.wetted_perimeter(y + h) - c.wetted_perimeter(y - h)) / (2.0 * h);
        assert_relative_eq!(c.perimeter_derivative(y), fd, epsilon = 1e-5);
    }
}
