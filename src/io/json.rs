//! Tagged JSON records for values plain JSON cannot represent.
//!
//! Complex numbers become `{"__class__": "complex", "real": .., "imag": ..}`
//! and non-integral rationals become
//! `{"__class__": "Fraction", "numerator": .., "denominator": ..}`.
//! Integral rationals are written as plain integers.

use num_complex::Complex64;
use num_rational::Rational64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "__class__")]
enum Tagged {
    #[serde(rename = "complex")]
    Complex { real: f64, imag: f64 },
    #[serde(rename = "Fraction")]
    Fraction { numerator: i64, denominator: i64 },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RationalRecord {
    Integer(i64),
    Tagged(Tagged),
}

pub fn serialize_rational<S: Serializer>(
    value: &Rational64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if value.is_integer() {
        serializer.serialize_i64(value.to_integer())
    } else {
        Tagged::Fraction {
            numerator: *value.numer(),
            denominator: *value.denom(),
        }
        .serialize(serializer)
    }
}

pub fn deserialize_rational<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Rational64, D::Error> {
    match RationalRecord::deserialize(deserializer)? {
        RationalRecord::Integer(n) => Ok(Rational64::from_integer(n)),
        RationalRecord::Tagged(Tagged::Fraction { numerator, denominator }) => {
            if denominator == 0 {
                return Err(serde::de::Error::custom("Fraction with zero denominator"));
            }
            Ok(Rational64::new(numerator, denominator))
        }
        RationalRecord::Tagged(Tagged::Complex { .. }) => {
            Err(serde::de::Error::custom("expected a Fraction, found a complex record"))
        }
    }
}

/// A complex number that serializes as a tagged record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaggedComplex(pub Complex64);

impl Serialize for TaggedComplex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        tagged_complex::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for TaggedComplex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        tagged_complex::deserialize(deserializer).map(TaggedComplex)
    }
}

/// For use with `#[serde(with = "crate::io::tagged_complex")]`.
pub mod tagged_complex {
    use super::Tagged;
    use num_complex::Complex64;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Complex64, serializer: S) -> Result<S::Ok, S::Error> {
        Tagged::Complex {
            real: value.re,
            imag: value.im,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Complex64, D::Error> {
        match Tagged::deserialize(deserializer)? {
            Tagged::Complex { real, imag } => Ok(Complex64::new(real, imag)),
            Tagged::Fraction { .. } => Err(serde::de::Error::custom(
                "expected a complex record, found a Fraction",
            )),
        }
    }
}

pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
