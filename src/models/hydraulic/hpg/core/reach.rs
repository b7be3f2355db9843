use thiserror::Error;
use uom::si::f64::Length;

use crate::support::{
    constraint::{ConstraintError, StrictlyPositive},
    units::{Hydraulics, LengthUnit},
    xsection::CrossSection,
};

/// Errors raised when describing a conduit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReachError {
    #[error("invalid {parameter}")]
    InvalidParameter {
        parameter: &'static str,
        #[source]
        source: ConstraintError,
    },

    #[error("{parameter} must be finite")]
    NotFinite { parameter: &'static str },
}

/// One uniform conduit: fixed cross-section, slope and roughness.
///
/// Elevations, lengths and depths share one length unit, the one the
/// reach's [`Hydraulics`] constants are expressed in.
#[derive(Debug, Clone, PartialEq)]
pub struct Reach {
    section: CrossSection,
    length: f64,
    roughness: f64,
    us_invert: f64,
    ds_invert: f64,
    hydraulics: Hydraulics,
}

impl Reach {
    /// Creates a reach with US customary hydraulic constants.
    ///
    /// # Errors
    ///
    /// Returns a [`ReachError`] if the length or roughness is not strictly
    /// positive, or an invert is not finite.
    pub fn new(
        section: CrossSection,
        length: f64,
        roughness: f64,
        us_invert: f64,
        ds_invert: f64,
    ) -> Result<Self, ReachError> {
        let length = StrictlyPositive::new(length)
            .map_err(|source| ReachError::InvalidParameter {
                parameter: "length",
                source,
            })?
            .into_inner();
        let roughness = StrictlyPositive::new(roughness)
            .map_err(|source| ReachError::InvalidParameter {
                parameter: "roughness",
                source,
            })?
            .into_inner();
        if !us_invert.is_finite() {
            return Err(ReachError::NotFinite {
                parameter: "upstream invert",
            });
        }
        if !ds_invert.is_finite() {
            return Err(ReachError::NotFinite {
                parameter: "downstream invert",
            });
        }

        Ok(Self {
            section,
            length,
            roughness,
            us_invert,
            ds_invert,
            hydraulics: Hydraulics::default(),
        })
    }

    /// Creates a reach from length quantities, expressed in `unit`.
    ///
    /// The reach uses the hydraulic constants derived for that unit.
    ///
    /// # Errors
    ///
    /// See [`Reach::new`].
    pub fn from_quantities(
        section: CrossSection,
        length: Length,
        roughness: f64,
        us_invert: Length,
        ds_invert: Length,
        unit: LengthUnit,
    ) -> Result<Self, ReachError> {
        Ok(Self::new(
            section,
            unit.value_of(length),
            roughness,
            unit.value_of(us_invert),
            unit.value_of(ds_invert),
        )?
        .with_hydraulics(Hydraulics::for_unit(unit)))
    }

    /// Replaces the hydraulic constants.
    #[must_use]
    pub fn with_hydraulics(mut self, hydraulics: Hydraulics) -> Self {
        self.hydraulics = hydraulics;
        self
    }

    /// The same conduit seen from its other end.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            us_invert: self.ds_invert,
            ds_invert: self.us_invert,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn section(&self) -> &CrossSection {
        &self.section
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Manning roughness coefficient.
    #[must_use]
    pub fn roughness(&self) -> f64 {
        self.roughness
    }

    #[must_use]
    pub fn us_invert(&self) -> f64 {
        self.us_invert
    }

    #[must_use]
    pub fn ds_invert(&self) -> f64 {
        self.ds_invert
    }

    #[must_use]
    pub fn hydraulics(&self) -> Hydraulics {
        self.hydraulics
    }

    /// Bed slope, positive when the conduit falls toward its downstream end.
    #[must_use]
    pub fn slope(&self) -> f64 {
        (self.us_invert - self.ds_invert) / self.length
    }

    /// Full depth of the cross-section.
    #[must_use]
    pub fn max_depth(&self) -> f64 {
        self.section.max_depth()
    }

    /// Manning friction slope for `flow` through wetted `area` with hydraulic radius `radius`.
    pub(crate) fn friction_slope(&self, flow: f64, area: f64, radius: f64) -> f64 {
        let conveyance = self.hydraulics.manning_k() / self.roughness * area * radius.powf(2.0 / 3.0);
        let ratio = flow / conveyance;
        ratio * ratio
    }

    /// Uniform-flow capacity at depth `y` on the bed slope; zero unless the slope is positive.
    pub(crate) fn capacity(&self, y: f64) -> f64 {
        let slope = self.slope();
        if slope <= 0.0 {
            return 0.0;
        }
        let area = self.section.area(y);
        let radius = self.section.hydraulic_radius(y);
        self.hydraulics.manning_k() / self.roughness * area * radius.powf(2.0 / 3.0) * slope.sqrt()
    }

    /// Squared Froude number `Q²T/(gA³)` at depth `y`.
    pub(crate) fn froude_squared(&self, flow: f64, y: f64) -> f64 {
        let area = self.section.area(y);
        let top_width = self.section.top_width(y);
        flow * flow * top_width / (self.hydraulics.gravity() * area * area * area)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    use crate::support::xsection::Circular;

    /// A conduit section of the given diameter.
    pub(crate) fn circular(diameter: f64) -> CrossSection {
        Circular::new(StrictlyPositive::new(diameter).unwrap()).into()
    }

    /// The 500 ft, 10 ft diameter pipe falling one foot used across the tests.
    pub(crate) fn sample_reach() -> Reach {
        Reach::new(circular(10.0), 500.0, 0.015, 1.0, 0.0).unwrap()
    }

    /// A short, steep 5 ft pipe dropping ten feet.
    pub(crate) fn steep_reach() -> Reach {
        Reach::new(circular(5.0), 200.0, 0.013, 10.0, 0.0).unwrap()
    }
}
