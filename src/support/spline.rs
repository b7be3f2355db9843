//! Shape-preserving piecewise cubic interpolation.
//!
//! [`MonotoneSpline`] is a cubic Hermite interpolant whose knot slopes follow
//! the Fritsch–Butland weighted harmonic mean. Between two knots the curve
//! never overshoots the data, so monotone tabulations (upstream depth against
//! downstream depth along one performance curve) stay monotone when
//! interpolated.

use thiserror::Error;

/// Errors raised when a spline cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SplineError {
    #[error("a spline needs at least two knots")]
    TooFewKnots,

    #[error("knot abscissae and ordinates differ in length")]
    LengthMismatch,

    #[error("knot abscissae must be strictly increasing (index {index})")]
    NotIncreasing { index: usize },

    #[error("knot {index} is not finite")]
    NotFinite { index: usize },
}

/// Monotone piecewise cubic Hermite spline.
#[derive(Debug, Clone, PartialEq)]
pub struct MonotoneSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    slopes: Vec<f64>,
}

impl MonotoneSpline {
    /// Builds a spline through the knots `(xs[i], ys[i])`.
    ///
    /// # Errors
    ///
    /// Fails if there are fewer than two knots, the slices differ in length,
    /// a value is not finite, or `xs` is not strictly increasing.
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<Self, SplineError> {
        if xs.len() != ys.len() {
            return Err(SplineError::LengthMismatch);
        }
        if xs.len() < 2 {
            return Err(SplineError::TooFewKnots);
        }
        if let Some(index) = xs
            .iter()
            .zip(ys)
            .position(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(SplineError::NotFinite { index });
        }
        if let Some(index) = xs.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SplineError::NotIncreasing { index: index + 1 });
        }

        let n = xs.len();
        let widths: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let secants: Vec<f64> = ys
            .windows(2)
            .zip(&widths)
            .map(|(w, h)| (w[1] - w[0]) / h)
            .collect();

        let mut slopes = vec![0.0; n];
        slopes[0] = secants[0];
        slopes[n - 1] = secants[n - 2];
        for k in 1..n - 1 {
            let (d0, d1) = (secants[k - 1], secants[k]);
            if d0 * d1 <= 0.0 {
                continue;
            }
            let (h0, h1) = (widths[k - 1], widths[k]);
            slopes[k] = 3.0 * (h0 + h1) / ((2.0 * h1 + h0) / d0 + (h1 + 2.0 * h0) / d1);
        }

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            slopes,
        })
    }

    /// Smallest and largest knot abscissa.
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Evaluates the spline, holding the end values outside the knot range.
    #[must_use]
    pub fn eval(&self, x: f64) -> f64 {
        let (lo, hi) = self.domain();
        if x <= lo {
            return self.ys[0];
        }
        if x >= hi {
            return self.ys[self.ys.len() - 1];
        }

        let k = self.xs.partition_point(|&xi| xi <= x) - 1;
        let h = self.xs[k + 1] - self.xs[k];
        let t = (x - self.xs[k]) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * self.ys[k] + h10 * h * self.slopes[k] + h01 * self.ys[k + 1] + h11 * h * self.slopes[k + 1]
    }

    /// Extends the spline past its last knot along the final secant.
    #[must_use]
    pub fn extrapolate_last(&self, x: f64) -> f64 {
        let n = self.xs.len();
        let slope = (self.ys[n - 1] - self.ys[n - 2]) / (self.xs[n - 1] - self.xs[n - 2]);
        self.ys[n - 1] + slope * (x - self.xs[n - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn reproduces_knots() {
        let xs = [0.0, 1.0, 2.5, 4.0];
        let ys = [1.0, 1.5, 3.0, 3.2];
        let spline = MonotoneSpline::new(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(&ys) {
            assert_eq!(spline.eval(*x), *y);
        }
    }

    #[test]
    fn reproduces_straight_lines() {
        let spline = MonotoneSpline::new(&[0.0, 1.0, 3.0], &[2.0, 4.0, 8.0]).unwrap();
        assert_relative_eq!(spline.eval(0.5), 3.0, epsilon = 1e-12);
        assert_relative_eq!(spline.eval(2.0), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn preserves_monotonicity_of_steep_data() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [0.0, 0.01, 0.02, 5.0, 5.01];
        let spline = MonotoneSpline::new(&xs, &ys).unwrap();

        let mut previous = spline.eval(0.0);
        for i in 1..=400 {
            let value = spline.eval(f64::from(i) * 0.01);
            assert!(value >= previous, "overshoot at x = {}", f64::from(i) * 0.01);
            previous = value;
        }
    }

    #[test]
    fn flat_segments_stay_flat() {
        let spline = MonotoneSpline::new(&[0.0, 1.0, 2.0, 3.0], &[1.0, 2.0, 2.0, 3.0]).unwrap();
        assert_eq!(spline.eval(1.5), 2.0);
    }

    #[test]
    fn clamps_and_extrapolates() {
        let spline = MonotoneSpline::new(&[1.0, 2.0, 3.0], &[1.0, 2.0, 4.0]).unwrap();
        assert_eq!(spline.eval(0.0), 1.0);
        assert_eq!(spline.eval(9.0), 4.0);
        assert_relative_eq!(spline.extrapolate_last(4.0), 6.0);
        assert_eq!(spline.domain(), (1.0, 3.0));
    }

    #[test]
    fn rejects_bad_knots() {
        assert_eq!(
            MonotoneSpline::new(&[1.0], &[1.0]),
            Err(SplineError::TooFewKnots)
        );
        assert_eq!(
            MonotoneSpline::new(&[1.0, 2.0], &[1.0]),
            Err(SplineError::LengthMismatch)
        );
        assert_eq!(
            MonotoneSpline::new(&[1.0, 1.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(SplineError::NotIncreasing { index: 1 })
        );
        assert_eq!(
            MonotoneSpline::new(&[1.0, f64::NAN], &[1.0, 2.0]),
            Err(SplineError::NotFinite { index: 1 })
        );
    }
}
