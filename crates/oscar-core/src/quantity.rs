//! Resource quantities in the cluster scheduler's native notation.
//!
//! A quantity is a non-negative decimal magnitude followed by an optional
//! SI suffix (`n`, `u`, `m`, `k`, `M`, `G`, `T`, `P`, `E`), binary suffix
//! (`Ki` through `Ei`) or decimal exponent (`1e3`, `5E-1`).
//!
//! Values are held exactly as an integer count of nano-units. Fractions
//! smaller than one nano-unit round up, matching the scheduler.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::QuantityError;

const NANOS_PER_UNIT: i128 = 1_000_000_000;

/// Significant digits accepted in a magnitude before scaling.
const MAX_DIGITS: usize = 30;

const BINARY_SUFFIXES: [(u32, &str); 6] = [
    (6, "Ei"),
    (5, "Pi"),
    (4, "Ti"),
    (3, "Gi"),
    (2, "Mi"),
    (1, "Ki"),
];

const DECIMAL_SUFFIXES: [(i32, &str); 9] = [
    (18, "E"),
    (15, "P"),
    (12, "T"),
    (9, "G"),
    (6, "M"),
    (3, "k"),
    (0, ""),
    (-3, "m"),
    (-6, "u"),
];

/// Notation a quantity was written in; drives its canonical rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    DecimalSi,
    BinarySi,
    DecimalExponent,
}

/// An exact, non-negative resource quantity such as `250m` or `128Mi`.
///
/// Equality and ordering compare the numeric value only, so `0.25` equals
/// `250m`.
#[derive(Debug, Clone, Copy)]
pub struct Quantity {
    nanos: i128,
    format: Format,
}

enum Scale {
    /// Power of ten.
    Decimal(i32),
    /// Power of 1024.
    Binary(u32),
}

impl Quantity {
    /// Parse a quantity string.
    pub fn parse(input: &str) -> Result<Self, QuantityError> {
        if input.is_empty() {
            return Err(QuantityError::Empty);
        }

        let unsigned = match input.as_bytes()[0] {
            b'+' => &input[1..],
            b'-' => return Err(QuantityError::Negative(input.to_string())),
            _ => input,
        };

        let split = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(split);

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
            return Err(QuantityError::Malformed(input.to_string()));
        }

        // Trailing fractional zeros carry no value.
        let fraction = fraction.trim_end_matches('0');
        let digits = format!("{whole}{fraction}");
        let significant = digits.trim_start_matches('0');
        if significant.len() > MAX_DIGITS {
            return Err(QuantityError::OutOfRange(input.to_string()));
        }
        let mantissa: i128 = if significant.is_empty() {
            0
        } else {
            significant
                .parse()
                .map_err(|_| QuantityError::Malformed(input.to_string()))?
        };

        let (scale, format) =
            parse_suffix(suffix).ok_or_else(|| QuantityError::InvalidSuffix {
                input: input.to_string(),
                suffix: suffix.to_string(),
            })?;

        let out_of_range = || QuantityError::OutOfRange(input.to_string());
        let fraction_len = i32::try_from(fraction.len()).map_err(|_| out_of_range())?;
        let nanos = match scale {
            Scale::Decimal(exp) => exp
                .checked_sub(fraction_len)
                .and_then(|e| e.checked_add(9))
                .and_then(|e| scale_decimal(mantissa, e)),
            Scale::Binary(power) => scale_binary(mantissa, power, fraction_len),
        }
        .ok_or_else(out_of_range)?;

        Ok(Self { nanos, format })
    }

    /// Value in nano-units.
    pub fn nanos(&self) -> i128 {
        self.nanos
    }

    /// Value in milli-units, rounded up.
    pub fn milli_value(&self) -> i128 {
        ceil_div(self.nanos, 1_000_000)
    }

    /// Value in whole units, rounded up.
    pub fn value(&self) -> i128 {
        ceil_div(self.nanos, NANOS_PER_UNIT)
    }

    pub fn as_f64(&self) -> f64 {
        self.nanos as f64 / NANOS_PER_UNIT as f64
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn is_zero(&self) -> bool {
        self.nanos == 0
    }
}

fn parse_suffix(suffix: &str) -> Option<(Scale, Format)> {
    let decimal = |exp| Some((Scale::Decimal(exp), Format::DecimalSi));
    let binary = |power| Some((Scale::Binary(power), Format::BinarySi));

    match suffix {
        "" => decimal(0),
        "n" => decimal(-9),
        "u" => decimal(-6),
        "m" => decimal(-3),
        "k" => decimal(3),
        "M" => decimal(6),
        "G" => decimal(9),
        "T" => decimal(12),
        "P" => decimal(15),
        "E" => decimal(18),
        "Ki" => binary(1),
        "Mi" => binary(2),
        "Gi" => binary(3),
        "Ti" => binary(4),
        "Pi" => binary(5),
        "Ei" => binary(6),
        _ => {
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            let exp: i32 = exponent.parse().ok()?;
            Some((Scale::Decimal(exp), Format::DecimalExponent))
        }
    }
}

/// `mantissa * 10^exp`, rounding sub-nano remainders up.
fn scale_decimal(mantissa: i128, exp: i32) -> Option<i128> {
    if mantissa == 0 {
        return Some(0);
    }
    if exp >= 0 {
        mantissa.checked_mul(10i128.checked_pow(exp as u32)?)
    } else {
        match 10i128.checked_pow(exp.unsigned_abs()) {
            Some(divisor) => Some(ceil_div(mantissa, divisor)),
            // Smaller than any representable divisor: one nano-unit.
            None => Some(1),
        }
    }
}

fn scale_binary(mantissa: i128, power: u32, fraction_len: i32) -> Option<i128> {
    let scaled = mantissa
        .checked_mul(1i128 << (10 * power))?
        .checked_mul(NANOS_PER_UNIT)?;
    Some(ceil_div(scaled, 10i128.checked_pow(fraction_len as u32)?))
}

fn ceil_div(value: i128, divisor: i128) -> i128 {
    (value + divisor - 1) / divisor
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Quantity {
    /// Canonical form: binary inputs keep the largest exact binary suffix,
    /// everything else uses the largest exact SI suffix.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nanos == 0 {
            return f.write_str("0");
        }

        if self.format == Format::BinarySi && self.nanos % NANOS_PER_UNIT == 0 {
            let units = self.nanos / NANOS_PER_UNIT;
            for (power, suffix) in BINARY_SUFFIXES {
                let factor = 1i128 << (10 * power);
                if units % factor == 0 {
                    return write!(f, "{}{suffix}", units / factor);
                }
            }
        }

        for (exp, suffix) in DECIMAL_SUFFIXES {
            let factor = 10i128.pow((exp + 9) as u32);
            if self.nanos % factor == 0 {
                return write!(f, "{}{suffix}", self.nanos / factor);
            }
        }
        write!(f, "{}n", self.nanos)
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.nanos == other.nanos
    }
}

impl Eq for Quantity {}

impl Hash for Quantity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nanos.hash(state);
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.nanos.cmp(&other.nanos)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Quantity::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> Quantity {
        Quantity::parse(s).unwrap()
    }

    #[test]
    fn millicores_equal_decimal_fraction() {
        assert_eq!(q("250m"), q("0.25"));
        assert_eq!(q("250m").milli_value(), 250);
        assert_eq!(q("0.25").as_f64(), 0.25);
    }

    #[test]
    fn binary_suffix_is_exact() {
        assert_eq!(q("128Mi").value(), 128 * 1024 * 1024);
        assert_eq!(q("1Gi"), q("1024Mi"));
        assert_eq!(q("1.5Gi").value(), 1_610_612_736);
    }

    #[test]
    fn decimal_suffixes() {
        assert_eq!(q("1k").value(), 1_000);
        assert_eq!(q("2M").value(), 2_000_000);
        assert_eq!(q("3G").value(), 3_000_000_000);
        assert_eq!(q("1T").value(), 1_000_000_000_000);
        assert_eq!(q("500u").nanos(), 500_000);
        assert_eq!(q("7n").nanos(), 7);
    }

    #[test]
    fn exponent_notation() {
        assert_eq!(q("1e3"), q("1k"));
        assert_eq!(q("5E-1"), q("500m"));
        assert_eq!(q("1.5e+2").value(), 150);
    }

    #[test]
    fn plain_and_signed_numbers() {
        assert_eq!(q("2").value(), 2);
        assert_eq!(q("+2"), q("2"));
        assert_eq!(q(".5"), q("500m"));
        assert_eq!(q("1."), q("1"));
        assert!(q("0").is_zero());
    }

    #[test]
    fn sub_nano_fraction_rounds_up() {
        assert_eq!(q("0.0000000001").nanos(), 1);
        assert_eq!(q("1.5n").nanos(), 2);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(Quantity::parse(""), Err(QuantityError::Empty));
        assert!(matches!(
            Quantity::parse("abc"),
            Err(QuantityError::Malformed(_))
        ));
        assert!(matches!(
            Quantity::parse("1.2.3"),
            Err(QuantityError::Malformed(_))
        ));
        assert!(matches!(
            Quantity::parse("-1"),
            Err(QuantityError::Negative(_))
        ));
        assert!(matches!(
            Quantity::parse("5Xi"),
            Err(QuantityError::InvalidSuffix { .. })
        ));
        assert!(matches!(
            Quantity::parse("1e"),
            Err(QuantityError::InvalidSuffix { .. })
        ));
        assert!(matches!(
            Quantity::parse("128 Mi"),
            Err(QuantityError::InvalidSuffix { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(matches!(
            Quantity::parse("1e40"),
            Err(QuantityError::OutOfRange(_))
        ));
        assert!(matches!(
            Quantity::parse("1234567890123456789012345678901234"),
            Err(QuantityError::OutOfRange(_))
        ));
        assert!(matches!(
            Quantity::parse("1e2147483647"),
            Err(QuantityError::OutOfRange(_))
        ));
        assert!(matches!(
            Quantity::parse("1.5e-2147483648"),
            Err(QuantityError::OutOfRange(_))
        ));
    }

    #[test]
    fn canonical_display() {
        assert_eq!(q("250m").to_string(), "250m");
        assert_eq!(q("0.25").to_string(), "250m");
        assert_eq!(q("128Mi").to_string(), "128Mi");
        assert_eq!(q("1.5Gi").to_string(), "1536Mi");
        assert_eq!(q("0.5Ki").to_string(), "512");
        assert_eq!(q("1000").to_string(), "1k");
        assert_eq!(q("1e3").to_string(), "1k");
        assert_eq!(q("0").to_string(), "0");
        assert_eq!(q("7n").to_string(), "7n");
    }

    #[test]
    fn serde_uses_canonical_string() {
        let json = serde_json_like(&q("0.5"));
        assert_eq!(json, "500m");
        let back: Quantity = serde_yaml::from_str("128Mi").unwrap();
        assert_eq!(back, q("128Mi"));
        assert!(serde_yaml::from_str::<Quantity>("lots").is_err());
    }

    fn serde_json_like(quantity: &Quantity) -> String {
        serde_yaml::to_string(quantity).unwrap().trim().to_string()
    }
}
