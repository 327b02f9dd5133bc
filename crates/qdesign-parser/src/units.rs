use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Physical length units understood by the parser.
///
/// Every unit-suffixed literal is normalized into the design's default unit,
/// so `"1nm"` becomes `1e-6` when the design works in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "cm")]
    Centimeter,
    #[default]
    #[serde(rename = "mm")]
    Millimeter,
    #[serde(rename = "um", alias = "µm", alias = "μm")]
    Micrometer,
    #[serde(rename = "nm")]
    Nanometer,
    #[serde(rename = "pm")]
    Picometer,
    #[serde(rename = "fm")]
    Femtometer,
    #[serde(rename = "in")]
    Inch,
    #[serde(rename = "mil")]
    Mil,
}

impl LengthUnit {
    pub const ALL: [LengthUnit; 9] = [
        LengthUnit::Meter,
        LengthUnit::Centimeter,
        LengthUnit::Millimeter,
        LengthUnit::Micrometer,
        LengthUnit::Nanometer,
        LengthUnit::Picometer,
        LengthUnit::Femtometer,
        LengthUnit::Inch,
        LengthUnit::Mil,
    ];

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            LengthUnit::Meter => "m",
            LengthUnit::Centimeter => "cm",
            LengthUnit::Millimeter => "mm",
            LengthUnit::Micrometer => "um",
            LengthUnit::Nanometer => "nm",
            LengthUnit::Picometer => "pm",
            LengthUnit::Femtometer => "fm",
            LengthUnit::Inch => "in",
            LengthUnit::Mil => "mil",
        }
    }

    /// Size of one unit in metres.
    #[must_use]
    pub fn meters(self) -> f64 {
        match self {
            LengthUnit::Meter => 1.0,
            LengthUnit::Centimeter => 1e-2,
            LengthUnit::Millimeter => 1e-3,
            LengthUnit::Micrometer => 1e-6,
            LengthUnit::Nanometer => 1e-9,
            LengthUnit::Picometer => 1e-12,
            LengthUnit::Femtometer => 1e-15,
            LengthUnit::Inch => 0.0254,
            LengthUnit::Mil => 0.0254e-3,
        }
    }

    /// Multiplier that converts a value in `self` into `target`.
    #[must_use]
    pub fn factor_to(self, target: LengthUnit) -> f64 {
        if self == target {
            return 1.0;
        }
        // Ratio of exact decimal powers, so nm -> mm is 1e-6 and not 1.0000000000000002e-6.
        let ratio = self.meters() / target.meters();
        let rounded = format!("{ratio:.12e}");
        rounded.parse().unwrap_or(ratio)
    }

    #[must_use]
    pub fn convert(self, value: f64, target: LengthUnit) -> f64 {
        value * self.factor_to(target)
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for LengthUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s.trim() {
            "m" | "meter" | "meters" => LengthUnit::Meter,
            "cm" => LengthUnit::Centimeter,
            "mm" => LengthUnit::Millimeter,
            "um" | "µm" | "μm" | "micron" | "microns" => LengthUnit::Micrometer,
            "nm" => LengthUnit::Nanometer,
            "pm" => LengthUnit::Picometer,
            "fm" => LengthUnit::Femtometer,
            "in" | "inch" => LengthUnit::Inch,
            "mil" | "mils" => LengthUnit::Mil,
            other => {
                return Err(Error::UnknownUnit {
                    input: s.to_string(),
                    unit: other.to_string(),
                })
            }
        };
        Ok(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nanometre_to_millimetre_is_exact() {
        assert_eq!(LengthUnit::Nanometer.convert(1.0, LengthUnit::Millimeter), 1e-6);
        assert_eq!(LengthUnit::Micrometer.convert(1.0, LengthUnit::Millimeter), 1e-3);
    }

    #[test]
    fn imperial_units_convert() {
        assert_relative_eq!(
            LengthUnit::Inch.convert(1.0, LengthUnit::Millimeter),
            25.4,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            LengthUnit::Mil.convert(1000.0, LengthUnit::Inch),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn symbols_round_trip_through_from_str() {
        for unit in LengthUnit::ALL {
            assert_eq!(unit.symbol().parse::<LengthUnit>().unwrap(), unit);
        }
        assert_eq!("µm".parse::<LengthUnit>().unwrap(), LengthUnit::Micrometer);
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        let err = "parsec".parse::<LengthUnit>().unwrap_err();
        assert_eq!(
            err,
            Error::UnknownUnit {
                input: "parsec".to_string(),
                unit: "parsec".to_string()
            }
        );
    }
}
