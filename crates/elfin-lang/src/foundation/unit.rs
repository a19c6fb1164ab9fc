//! Physical units as dimensional exponent vectors.
//!
//! A unit is a vector of integer exponents over the SI base dimensions
//! (plus angle, tracked for type safety although SI treats it as
//! dimensionless) together with a scale factor relative to the coherent
//! SI unit.
//!
//! Two units are compatible for addition and comparison iff their exponent
//! vectors are equal; multiplication and division add and subtract the
//! vectors and combine the scales.
//!
//! # Examples
//!
//! ```
//! # use elfin_lang::foundation::unit::*;
//! let velocity = Unit::base(UnitDimensions::METER).divide(&Unit::base(UnitDimensions::SECOND));
//! assert_eq!(velocity.dims.length, 1);
//! assert_eq!(velocity.dims.time, -1);
//! assert_eq!(velocity.to_string(), "m/s");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dimensional exponents over the SI base dimensions.
///
/// Each field is the power of the corresponding base unit. Exponent
/// arithmetic saturates at the `i8` range; real models never get close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UnitDimensions {
    /// Length (L) - base unit: meter (m)
    pub length: i8,
    /// Mass (M) - base unit: kilogram (kg)
    pub mass: i8,
    /// Time (T) - base unit: second (s)
    pub time: i8,
    /// Temperature (Θ) - base unit: kelvin (K)
    pub temperature: i8,
    /// Electric current (I) - base unit: ampere (A)
    pub current: i8,
    /// Amount of substance (N) - base unit: mole (mol)
    pub amount: i8,
    /// Luminous intensity (J) - base unit: candela (cd)
    pub luminosity: i8,
    /// Angle - base unit: radian (rad)
    pub angle: i8,
}

impl UnitDimensions {
    /// All exponents zero.
    pub const DIMENSIONLESS: UnitDimensions = UnitDimensions::new(0, 0, 0, 0, 0, 0, 0, 0);
    /// Length exponent one (meter).
    pub const METER: UnitDimensions = UnitDimensions::new(1, 0, 0, 0, 0, 0, 0, 0);
    /// Mass exponent one (kilogram).
    pub const KILOGRAM: UnitDimensions = UnitDimensions::new(0, 1, 0, 0, 0, 0, 0, 0);
    /// Time exponent one (second).
    pub const SECOND: UnitDimensions = UnitDimensions::new(0, 0, 1, 0, 0, 0, 0, 0);
    /// Temperature exponent one (kelvin).
    pub const KELVIN: UnitDimensions = UnitDimensions::new(0, 0, 0, 1, 0, 0, 0, 0);
    /// Current exponent one (ampere).
    pub const AMPERE: UnitDimensions = UnitDimensions::new(0, 0, 0, 0, 1, 0, 0, 0);
    /// Amount exponent one (mole).
    pub const MOLE: UnitDimensions = UnitDimensions::new(0, 0, 0, 0, 0, 1, 0, 0);
    /// Luminosity exponent one (candela).
    pub const CANDELA: UnitDimensions = UnitDimensions::new(0, 0, 0, 0, 0, 0, 1, 0);
    /// Angle exponent one (radian).
    pub const RADIAN: UnitDimensions = UnitDimensions::new(0, 0, 0, 0, 0, 0, 0, 1);

    /// Construct an exponent vector field by field.
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        length: i8,
        mass: i8,
        time: i8,
        temperature: i8,
        current: i8,
        amount: i8,
        luminosity: i8,
        angle: i8,
    ) -> Self {
        Self {
            length,
            mass,
            time,
            temperature,
            current,
            amount,
            luminosity,
            angle,
        }
    }

    /// True if every exponent is zero.
    pub fn is_dimensionless(&self) -> bool {
        *self == Self::DIMENSIONLESS
    }

    /// Add exponent vectors (unit multiplication).
    pub fn multiply(&self, other: &UnitDimensions) -> UnitDimensions {
        self.combine(other, 1)
    }

    /// Subtract exponent vectors (unit division).
    pub fn divide(&self, other: &UnitDimensions) -> UnitDimensions {
        self.combine(other, -1)
    }

    /// Scale every exponent by an integer (unit exponentiation).
    pub fn pow(&self, exponent: i8) -> UnitDimensions {
        let e = exponent as i16;
        UnitDimensions::new(
            sat(self.length as i16 * e),
            sat(self.mass as i16 * e),
            sat(self.time as i16 * e),
            sat(self.temperature as i16 * e),
            sat(self.current as i16 * e),
            sat(self.amount as i16 * e),
            sat(self.luminosity as i16 * e),
            sat(self.angle as i16 * e),
        )
    }

    fn combine(&self, other: &UnitDimensions, sign: i16) -> UnitDimensions {
        UnitDimensions::new(
            sat(self.length as i16 + sign * other.length as i16),
            sat(self.mass as i16 + sign * other.mass as i16),
            sat(self.time as i16 + sign * other.time as i16),
            sat(self.temperature as i16 + sign * other.temperature as i16),
            sat(self.current as i16 + sign * other.current as i16),
            sat(self.amount as i16 + sign * other.amount as i16),
            sat(self.luminosity as i16 + sign * other.luminosity as i16),
            sat(self.angle as i16 + sign * other.angle as i16),
        )
    }
}

fn sat(value: i16) -> i8 {
    value.clamp(i8::MIN as i16, i8::MAX as i16) as i8
}

/// A physical unit: exponent vector plus scale factor.
///
/// The scale is the multiplicative factor relative to the coherent SI unit
/// for the dimension, e.g. 1.0 for meter, 1000.0 for kilometer, 1e-3 for
/// gram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Dimensional exponents
    pub dims: UnitDimensions,
    /// Scale factor relative to the coherent SI unit (1.0 = base SI unit)
    pub scale: f64,
}

impl Unit {
    /// Dimensionless with scale 1.
    pub const DIMENSIONLESS: Unit = Unit {
        dims: UnitDimensions::DIMENSIONLESS,
        scale: 1.0,
    };

    /// Create a unit from an exponent vector and scale.
    pub fn new(dims: UnitDimensions, scale: f64) -> Self {
        Self { dims, scale }
    }

    /// Create a coherent (scale 1) unit from an exponent vector.
    pub fn base(dims: UnitDimensions) -> Self {
        Self { dims, scale: 1.0 }
    }

    /// True if every exponent is zero.
    pub fn is_dimensionless(&self) -> bool {
        self.dims.is_dimensionless()
    }

    /// Multiply units: exponent vectors add, scales multiply.
    pub fn multiply(&self, other: &Unit) -> Unit {
        Unit::new(self.dims.multiply(&other.dims), self.scale * other.scale)
    }

    /// Divide units: exponent vectors subtract, scales divide.
    pub fn divide(&self, other: &Unit) -> Unit {
        Unit::new(self.dims.divide(&other.dims), self.scale / other.scale)
    }

    /// Raise a unit to an integer power.
    pub fn pow(&self, exponent: i8) -> Unit {
        Unit::new(self.dims.pow(exponent), self.scale.powi(exponent as i32))
    }

    /// Units are compatible for addition/comparison iff their exponent
    /// vectors are equal. Scale is value-level metadata, not type-level.
    pub fn is_compatible_with(&self, other: &Unit) -> bool {
        self.dims == other.dims
    }
}

impl fmt::Display for UnitDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: [(&str, i8); 8] = [
            ("m", self.length),
            ("kg", self.mass),
            ("s", self.time),
            ("K", self.temperature),
            ("A", self.current),
            ("mol", self.amount),
            ("cd", self.luminosity),
            ("rad", self.angle),
        ];

        let mut numerator = Vec::new();
        let mut denominator = Vec::new();
        for (symbol, exp) in fields {
            match exp {
                0 => {}
                1 => numerator.push(symbol.to_string()),
                e if e > 1 => numerator.push(format!("{}^{}", symbol, e)),
                -1 => denominator.push(symbol.to_string()),
                e => denominator.push(format!("{}^{}", symbol, -e)),
            }
        }

        if numerator.is_empty() && denominator.is_empty() {
            return write!(f, "1");
        }
        if numerator.is_empty() {
            write!(f, "1")?;
        } else {
            write!(f, "{}", numerator.join("*"))?;
        }
        for d in denominator {
            write!(f, "/{}", d)?;
        }
        Ok(())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dims)?;
        if self.scale != 1.0 {
            write!(f, " (x{})", self.scale)?;
        }
        Ok(())
    }
}
