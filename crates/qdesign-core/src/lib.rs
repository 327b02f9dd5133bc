//! Design registry for superconducting chip layouts.
//!
//! A [`Design`] owns named components, the connectors they expose for routing, the design
//! variables their options are parsed against, and the chips they sit on.

pub mod component;
pub mod config;
pub mod connector;
pub mod design;
pub mod error;
pub mod events;
pub mod library;
pub mod table;

pub use component::{Component, ComponentBase, MakeContext, Status};
pub use config::{Chip, DesignConfig};
pub use connector::{make_connector, Connector, DEFAULT_CHIP, NO_PARENT};
pub use design::{is_valid_name, BuildReport, ConnectorParent, Design, Metadata, RenameResult};
pub use error::{Error, GeometryError, MakeError};
pub use events::{DesignEvent, EventBus};
pub use table::ComponentsTable;
