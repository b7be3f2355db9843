use num_traits::{One, Zero};

use super::{Constrained, Constraint, ConstraintError};

/// Marker type enforcing the lower-open unit interval `0 < x ≤ 1`.
///
/// Used for the fraction of a conduit's full depth that bounds the
/// free-surface part of a performance graph.
///
/// # Examples
///
/// ```
/// use backwater_hpg::support::constraint::UnitIntervalLowerOpen;
///
/// assert!(UnitIntervalLowerOpen::new(0.95).is_ok());
/// assert!(UnitIntervalLowerOpen::new(1.0).is_ok());
/// assert!(UnitIntervalLowerOpen::new(0.0).is_err());
/// assert!(UnitIntervalLowerOpen::new(1.2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitIntervalLowerOpen;

impl UnitIntervalLowerOpen {
    /// Constructs a [`Constrained<T, UnitIntervalLowerOpen>`] if `0 < value ≤ 1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not positive, exceeds one, or is `NaN`.
    pub fn new<T: PartialOrd + Zero + One>(
        value: T,
    ) -> Result<Constrained<T, UnitIntervalLowerOpen>, ConstraintError> {
        Constrained::<T, UnitIntervalLowerOpen>::new(value)
    }
}

impl<T: PartialOrd + Zero + One> Constraint<T> for UnitIntervalLowerOpen {
    fn check(value: &T) -> Result<(), ConstraintError> {
        if value.partial_cmp(&T::zero()).is_none() {
            return Err(ConstraintError::NotANumber);
        }
        if *value < T::zero() {
            return Err(ConstraintError::Negative);
        }
        if *value == T::zero() {
            return Err(ConstraintError::Zero);
        }
        if *value > T::one() {
            return Err(ConstraintError::AboveMaximum);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        assert!(UnitIntervalLowerOpen::new(1e-9).is_ok());
        assert!(UnitIntervalLowerOpen::new(1.0).is_ok());
        assert_eq!(UnitIntervalLowerOpen::new(0.0), Err(ConstraintError::Zero));
        assert_eq!(
            UnitIntervalLowerOpen::new(-0.1),
            Err(ConstraintError::Negative)
        );
        assert_eq!(
            UnitIntervalLowerOpen::new(1.0001),
            Err(ConstraintError::AboveMaximum)
        );
        assert_eq!(
            UnitIntervalLowerOpen::new(f64::NAN),
            Err(ConstraintError::NotANumber)
        );
    }
}
