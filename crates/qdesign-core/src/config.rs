use indexmap::IndexMap;
use qdesign_parser::{LengthUnit, ParamValue};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A chip surface components and connectors sit on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chip {
    pub name: String,
    /// `[x, y]` extent in design units.
    pub size: [f64; 2],
    /// Height of the chip surface in design units.
    #[serde(default)]
    pub z: f64,
    #[serde(default = "default_material")]
    pub material: String,
}

fn default_material() -> String {
    "silicon".to_string()
}

impl Chip {
    #[must_use]
    pub fn new(name: impl Into<String>, size: [f64; 2], z: f64) -> Self {
        Self {
            name: name.into(),
            size,
            z,
            material: default_material(),
        }
    }
}

/// Per-design defaults: unit system, initial chips and default component options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignConfig {
    #[serde(default)]
    pub units: LengthUnit,

    #[serde(default = "default_chips")]
    pub chips: Vec<Chip>,

    #[serde(default)]
    pub default_options: IndexMap<String, ParamValue>,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            units: LengthUnit::default(),
            chips: default_chips(),
            default_options: IndexMap::new(),
        }
    }
}

fn default_chips() -> Vec<Chip> {
    vec![Chip::new("main", [9.0, 6.0], 0.0)]
}

impl DesignConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, Error> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let cfg = DesignConfig::from_yaml_str("{}").unwrap();
        assert_eq!(cfg, DesignConfig::default());
        assert_eq!(cfg.units, LengthUnit::Millimeter);
        assert_eq!(cfg.chips[0].name, "main");
    }

    #[test]
    fn yaml_overrides() {
        let cfg = DesignConfig::from_yaml_str(
            "units: um\n\
             chips:\n  - {name: main, size: [9000, 6000]}\n  - {name: flip, size: [4000, 4000], z: 8, material: sapphire}\n\
             default_options:\n  pos_x: 0um\n  chip: main\n",
        )
        .unwrap();
        assert_eq!(cfg.units, LengthUnit::Micrometer);
        assert_eq!(cfg.chips.len(), 2);
        assert_eq!(cfg.chips[0].material, "silicon");
        assert_eq!(cfg.chips[1].z, 8.0);
        assert_eq!(cfg.chips[1].material, "sapphire");
        assert_eq!(cfg.default_options["pos_x"], ParamValue::from("0um"));
    }

    #[test]
    fn bad_unit_is_a_config_error() {
        assert!(matches!(
            DesignConfig::from_yaml_str("units: furlong"),
            Err(Error::Config(_))
        ));
    }
}
