//! Conduit cross-section geometry.
//!
//! A [`CrossSection`] answers the geometric questions the profile solver asks
//! at a flow depth `y`: wetted area, wetted perimeter, top width and the rate
//! of change of the perimeter. Shapes form a closed set, so the dispatch is a
//! plain `match` over the variants.

mod circular;

pub use circular::Circular;

/// Cross-section shape of a conduit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrossSection {
    /// Circular pipe.
    Circular(Circular),
    /// Placeholder for conduits without hydraulic geometry.
    ///
    /// Every geometric property is zero, so any flowing profile through a
    /// dummy conduit reports a zero-area failure.
    Dummy,
}

impl CrossSection {
    /// Full (crown) depth of the section.
    #[must_use]
    pub fn max_depth(&self) -> f64 {
        match self {
            Self::Circular(c) => c.diameter(),
            Self::Dummy => 0.0,
        }
    }

    /// Wetted area at depth `y`.
    ///
    /// Depths above the crown return the full area. Negative depths fall
    /// outside the trigonometric domain and yield `NaN`.
    #[must_use]
    pub fn area(&self, y: f64) -> f64 {
        match self {
            Self::Circular(c) => c.area(y),
            Self::Dummy => 0.0,
        }
    }

    /// Wetted perimeter at depth `y`.
    #[must_use]
    pub fn wetted_perimeter(&self, y: f64) -> f64 {
        match self {
            Self::Circular(c) => c.wetted_perimeter(y),
            Self::Dummy => 0.0,
        }
    }

    /// Free-surface top width at depth `y`; zero for a full section.
    #[must_use]
    pub fn top_width(&self, y: f64) -> f64 {
        match self {
            Self::Circular(c) => c.top_width(y),
            Self::Dummy => 0.0,
        }
    }

    /// Derivative of the wetted perimeter with respect to depth.
    #[must_use]
    pub fn perimeter_derivative(&self, y: f64) -> f64 {
        match self {
            Self::Circular(c) => c.perimeter_derivative(y),
            Self::Dummy => 0.0,
        }
    }

    /// Area of the full section.
    #[must_use]
    pub fn full_area(&self) -> f64 {
        self.area(self.max_depth())
    }

    /// Hydraulic radius `A/P` at depth `y`, zero where the perimeter vanishes.
    #[must_use]
    pub fn hydraulic_radius(&self, y: f64) -> f64 {
        let perimeter = self.wetted_perimeter(y);
        if perimeter > 0.0 {
            self.area(y) / perimeter
        } else {
            0.0
        }
    }
}

impl From<Circular> for CrossSection {
    fn from(circular: Circular) -> Self {
        Self::Circular(circular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::support::constraint::StrictlyPositive;

    #[test]
    fn dummy_has_no_geometry() {
        let dummy = CrossSection::Dummy;
        assert_eq!(dummy.max_depth(), 0.0);
        assert_eq!(dummy.area(1.0), 0.0);
        assert_eq!(dummy.hydraulic_radius(1.0), 0.0);
    }

    #[test]
    fn circular_dispatch() {
        let section = CrossSection::from(Circular::new(StrictlyPositive::new(2.0).unwrap()));
        assert_eq!(section.max_depth(), 2.0);
        assert!((section.full_area() - std::f64::consts::PI).abs() < 1e-12);
    }
}
