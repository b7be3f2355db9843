//! Hydraulic constants for a consistent unit system.
//!
//! The profile solver works in plain `f64` values of one length unit (feet or
//! meters) and seconds. [`Hydraulics`] bundles the two constants that depend
//! on that choice: gravitational acceleration and the Manning equation
//! constant `k` in `V = (k/n) R^(2/3) S^(1/2)`.
//!
//! The constants can be taken from the conventional presets or derived from
//! [`uom`] quantities:
//!
//! ```
//! use backwater_hpg::support::units::{Hydraulics, LengthUnit};
//!
//! let derived = Hydraulics::for_unit(LengthUnit::Foot);
//! let preset = Hydraulics::US_CUSTOMARY;
//! assert!((derived.manning_k() - preset.manning_k()).abs() < 1e-5);
//! assert!((derived.gravity() - preset.gravity()).abs() < 1e-3);
//! ```

use uom::si::{
    acceleration::{foot_per_second_squared, meter_per_second_squared, standard_gravity},
    f64::{Acceleration, Length},
    length::{foot, meter},
};

/// Length unit used by a hydraulic model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthUnit {
    /// US customary feet.
    #[default]
    Foot,
    /// SI meters.
    Meter,
}

impl LengthUnit {
    /// Expresses a length quantity as a plain value in this unit.
    #[must_use]
    pub fn value_of(self, length: Length) -> f64 {
        match self {
            Self::Foot => length.get::<foot>(),
            Self::Meter => length.get::<meter>(),
        }
    }

    /// Expresses an acceleration quantity in this unit per second squared.
    #[must_use]
    pub fn acceleration_of(self, acceleration: Acceleration) -> f64 {
        match self {
            Self::Foot => acceleration.get::<foot_per_second_squared>(),
            Self::Meter => acceleration.get::<meter_per_second_squared>(),
        }
    }
}

/// Gravity and Manning constant of one unit system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hydraulics {
    gravity: f64,
    manning_k: f64,
}

impl Hydraulics {
    /// Feet and seconds, with the conventional rounded constants.
    pub const US_CUSTOMARY: Self = Self {
        gravity: 32.174,
        manning_k: 1.485_918_6,
    };

    /// Meters and seconds.
    pub const SI: Self = Self {
        gravity: 9.81,
        manning_k: 1.0,
    };

    /// Creates constants from explicit values.
    #[must_use]
    pub const fn new(gravity: f64, manning_k: f64) -> Self {
        Self { gravity, manning_k }
    }

    /// Derives the constants for a length unit from standard gravity and the
    /// meter-based definition of the Manning equation.
    #[must_use]
    pub fn for_unit(unit: LengthUnit) -> Self {
        let gravity = unit.acceleration_of(Acceleration::new::<standard_gravity>(1.0));
        let manning_k = unit.value_of(Length::new::<meter>(1.0)).cbrt();
        Self { gravity, manning_k }
    }

    /// Gravitational acceleration in length units per second squared.
    #[must_use]
    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    /// Manning equation constant.
    #[must_use]
    pub fn manning_k(&self) -> f64 {
        self.manning_k
    }
}

impl Default for Hydraulics {
    fn default() -> Self {
        Self::US_CUSTOMARY
    }
}
