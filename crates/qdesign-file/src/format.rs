//! On-disk shape of a design.

use std::path::Path;

use indexmap::IndexMap;
use qdesign_core::{Chip, ComponentBase, Connector, Design, DesignConfig, Metadata};
use qdesign_parser::{ParamValue, Variables};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;
use crate::factory::ComponentFactory;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            _ => Err(Error::UnsupportedFormat(ext)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    pub class: String,
    pub module: String,
    #[serde(default)]
    pub options: IndexMap<String, ParamValue>,
    #[serde(default)]
    pub connector_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignFile {
    pub version: u32,
    #[serde(default)]
    pub config: DesignConfig,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub variables: Variables,
    #[serde(default)]
    pub chips: Vec<Chip>,
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
    #[serde(default)]
    pub connectors: IndexMap<String, Connector>,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

impl DesignFile {
    #[must_use]
    pub fn from_design(design: &Design) -> Self {
        let components = design
            .components()
            .values()
            .map(|c| ComponentRecord {
                name: c.name().to_string(),
                class: c.class_name().to_string(),
                module: c.module_name().to_string(),
                options: c.options().clone(),
                connector_names: c.connector_names().iter().cloned().collect(),
            })
            .collect();

        Self {
            version: FORMAT_VERSION,
            config: design.config().clone(),
            metadata: design.metadata().clone(),
            variables: design.variables().clone(),
            chips: design.chips().values().cloned().collect(),
            components,
            connectors: design.connectors().clone(),
        }
    }

    /// Rebuilds a design. Components come back `Unbuilt` with their saved connectors attached.
    pub fn into_design(self, factory: &ComponentFactory) -> Result<Design, Error> {
        let mut design = Design::with_config(self.config);
        *design.metadata_mut() = self.metadata;
        for (name, value) in self.variables.iter() {
            design.set_variable(name, value.clone());
        }
        for chip in self.chips {
            design.add_chip(chip);
        }

        let mut expected = Vec::new();
        for record in self.components {
            let base = ComponentBase::new(record.name.clone(), record.options);
            design.add_component(factory.create(&record.class, base)?)?;
            expected.push((record.name, record.connector_names));
        }
        for (name, connector) in self.connectors {
            design.insert_connector(&name, connector)?;
        }

        for (name, names) in expected {
            let Some(component) = design.component(&name) else {
                continue;
            };
            for missing in names.iter().filter(|n| !component.connector_names().contains(*n)) {
                warn!(component = %name, connector = %missing, "saved connector not found in file");
            }
        }
        Ok(design)
    }

    pub fn to_text(&self, format: Format) -> Result<String, Error> {
        Ok(match format {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Yaml => serde_yaml::to_string(self)?,
        })
    }

    pub fn from_text(input: &str, format: Format) -> Result<Self, Error> {
        let probe: VersionProbe = match format {
            Format::Json => serde_json::from_str(input)?,
            Format::Yaml => serde_yaml::from_str(input)?,
        };
        if probe.version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion {
                found: probe.version,
                supported: FORMAT_VERSION,
            });
        }
        Ok(match format {
            Format::Json => serde_json::from_str(input)?,
            Format::Yaml => serde_yaml::from_str(input)?,
        })
    }
}
