//! Reading and writing design files.
//!
//! A design is stored as JSON (`.json`) or YAML (`.yaml`, `.yml`); see [`DesignFile`] for the
//! layout. Components are rebuilt on load through a [`ComponentFactory`].

pub mod error;
pub mod factory;
pub mod format;

use std::path::Path;

use qdesign_core::Design;
use tracing::info;

pub use error::Error;
pub use factory::{ComponentFactory, Constructor};
pub use format::{ComponentRecord, DesignFile, Format, FORMAT_VERSION};

pub fn save_design(design: &Design, path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let text = DesignFile::from_design(design).to_text(format)?;
    std::fs::write(path, text).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        components = design.components().len(),
        "saved design"
    );
    Ok(())
}

pub fn load_design(path: impl AsRef<Path>, factory: &ComponentFactory) -> Result<Design, Error> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let design = DesignFile::from_text(&text, format)?.into_design(factory)?;
    info!(
        path = %path.display(),
        components = design.components().len(),
        "loaded design"
    );
    Ok(design)
}
