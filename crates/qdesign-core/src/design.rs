//! The design registry: components, connectors, variables, chips and metadata.

use indexmap::{IndexMap, IndexSet};
use qdesign_parser::{parse_params, parse_value, ParamNames, ParamValue, Variables};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crossbeam::channel::Receiver;

use crate::component::{Component, MakeContext, Status};
use crate::config::{Chip, DesignConfig};
use crate::connector::{make_connector, Connector, NO_PARENT};
use crate::error::{Error, MakeError};
use crate::events::{DesignEvent, EventBus};

/// Free-form notes stored alongside a design.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub notes: String,
    #[serde(flatten)]
    pub extra: IndexMap<String, ParamValue>,
}

/// Owner of a connector passed to [`Design::add_connector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorParent<'a> {
    Component(&'a str),
    None,
}

impl<'a> ConnectorParent<'a> {
    fn name(self) -> &'a str {
        match self {
            ConnectorParent::Component(name) => name,
            ConnectorParent::None => NO_PARENT,
        }
    }
}

impl<'a> From<Option<&'a str>> for ConnectorParent<'a> {
    fn from(parent: Option<&'a str>) -> Self {
        parent.map_or(ConnectorParent::None, ConnectorParent::Component)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameResult {
    Renamed,
    /// The new name is already taken.
    Conflict,
    InvalidName,
    /// No component has the old name.
    NotFound,
}

/// Outcome of a rebuild pass, in build order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub good: Vec<String>,
    pub failed: Vec<(String, MakeError)>,
}

impl BuildReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    #[must_use]
    pub fn built(&self) -> usize {
        self.good.len() + self.failed.len()
    }
}

/// Identifier-like: a letter or `_`, then letters, digits or `_`.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// Top-level container of a chip layout.
///
/// Every mutation takes `&mut self` and finishes before any [`DesignEvent`] goes out, so a
/// reader sharing the design behind a lock never observes a half-applied operation.
#[derive(Debug)]
pub struct Design {
    components: IndexMap<String, Box<dyn Component>>,
    connectors: IndexMap<String, Connector>,
    variables: Variables,
    chips: IndexMap<String, Chip>,
    metadata: Metadata,
    config: DesignConfig,
    events: EventBus,
}

impl Default for Design {
    fn default() -> Self {
        Self::with_config(DesignConfig::default())
    }
}

impl Design {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: DesignConfig) -> Self {
        Self {
            components: IndexMap::new(),
            connectors: IndexMap::new(),
            variables: Variables::new(),
            chips: chips_from(&config),
            metadata: Metadata::default(),
            config,
            events: EventBus::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DesignConfig {
        &self.config
    }

    #[must_use]
    pub fn default_options(&self) -> &IndexMap<String, ParamValue> {
        &self.config.default_options
    }

    /// Receives a [`DesignEvent`] after every structural change.
    pub fn subscribe(&mut self) -> Receiver<DesignEvent> {
        self.events.subscribe()
    }

    // ---- components ------------------------------------------------------------------------

    #[must_use]
    pub fn components(&self) -> &IndexMap<String, Box<dyn Component>> {
        &self.components
    }

    #[must_use]
    pub fn component(&self, name: &str) -> Option<&dyn Component> {
        self.components.get(name).map(|c| c.as_ref())
    }

    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Raw options of a component, for editing before the next rebuild.
    pub fn options_mut(&mut self, name: &str) -> Option<&mut IndexMap<String, ParamValue>> {
        self.components
            .get_mut(name)
            .map(|c| &mut c.base_mut().options)
    }

    /// Adds `component` at the end of the ordering, filling unset options from the
    /// configured defaults.
    pub fn add_component(&mut self, mut component: Box<dyn Component>) -> Result<(), Error> {
        let name = component.name().to_string();
        if !is_valid_name(&name) {
            return Err(Error::InvalidName { name });
        }
        if self.components.contains_key(&name) {
            return Err(Error::DuplicateName {
                kind: "components",
                name,
            });
        }

        let base = component.base_mut();
        base.status = Status::Unbuilt;
        for (k, v) in &self.config.default_options {
            if !base.options.contains_key(k) {
                base.options.insert(k.clone(), v.clone());
            }
        }

        debug!(component = %name, class = component.class_name(), "adding component");
        self.components.insert(name.clone(), component);
        self.events.emit(DesignEvent::ComponentAdded { name });
        Ok(())
    }

    /// Components other than `name` whose references include `name`.
    #[must_use]
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.components
            .iter()
            .filter(|(other, c)| other.as_str() != name && c.references().iter().any(|r| r == name))
            .map(|(other, _)| other.clone())
            .collect()
    }

    /// Deletes a component and every connector attached to it.
    ///
    /// Returns `true` when nothing by that name exists. With dependents and `force == false`
    /// nothing is deleted and `false` is returned.
    pub fn delete_component(&mut self, name: &str, force: bool) -> bool {
        if !self.components.contains_key(name) {
            info!(component = name, "delete requested, but no such component in the design");
            return true;
        }
        match self.try_delete_component(name, force) {
            Ok(()) => true,
            Err(err) => {
                warn!(component = name, error = %err, "refusing to delete component");
                false
            }
        }
    }

    /// Like [`Design::delete_component`], reporting a refusal as
    /// [`Error::DependencyConflict`].
    pub fn try_delete_component(&mut self, name: &str, force: bool) -> Result<(), Error> {
        if !self.components.contains_key(name) {
            return Ok(());
        }
        if !force {
            let dependents = self.dependents_of(name);
            if !dependents.is_empty() {
                return Err(Error::DependencyConflict {
                    name: name.to_string(),
                    dependents,
                });
            }
        }

        self.connectors.retain(|_, c| c.parent_name != name);
        self.components.shift_remove(name);
        debug!(component = name, force, "deleted component");
        self.events.emit(DesignEvent::ComponentRemoved {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Clears every component and, with them, every connector (free-standing ones included).
    pub fn delete_all_components(&mut self) {
        self.components.clear();
        self.connectors.clear();
        debug!("cleared all components and connectors");
        self.events.emit(DesignEvent::ComponentsCleared);
    }

    pub fn rename_component(&mut self, old: &str, new: &str) -> RenameResult {
        let Some(index) = self.components.get_index_of(old) else {
            info!(old, new, "cannot rename: no such component");
            return RenameResult::NotFound;
        };
        if old == new {
            return RenameResult::Renamed;
        }
        if self.components.contains_key(new) {
            info!(old, new, "cannot rename: {new} exists");
            return RenameResult::Conflict;
        }
        if !is_valid_name(new) {
            info!(old, new, "cannot rename: invalid name");
            return RenameResult::InvalidName;
        }

        let Some((_, mut component)) = self.components.shift_remove_index(index) else {
            return RenameResult::NotFound;
        };
        component.base_mut().name = new.to_string();
        self.components.shift_insert(index, new.to_string(), component);

        self.connectors = std::mem::take(&mut self.connectors)
            .into_iter()
            .map(|(k, c)| {
                if c.parent_name == old {
                    (k, c.with_parent(new))
                } else {
                    (k, c)
                }
            })
            .collect();

        let rewritten: usize = self
            .components
            .values_mut()
            .map(|c| c.rename_references(old, new))
            .sum();

        debug!(old, new, rewritten, "renamed component");
        self.events.emit(DesignEvent::ComponentRenamed {
            old: old.to_string(),
            new: new.to_string(),
        });
        RenameResult::Renamed
    }

    /// Remakes every component in insertion order.
    ///
    /// A failing `make()` marks that component [`Status::Failed`] and the pass carries on.
    pub fn make_all_components(&mut self) -> BuildReport {
        let names: Vec<String> = self.components.keys().cloned().collect();
        let mut report = BuildReport::default();
        for name in &names {
            self.make_one(name, &mut report);
        }
        self.finish_build(&report);
        report
    }

    /// Remakes `name` and, when `dependencies` is set, every component that (transitively)
    /// references it.
    pub fn update_component(&mut self, name: &str, dependencies: bool) -> Result<BuildReport, Error> {
        if !self.components.contains_key(name) {
            return Err(Error::NotFound {
                name: name.to_string(),
            });
        }

        let mut targets: IndexSet<String> = IndexSet::from([name.to_string()]);
        if dependencies {
            loop {
                let before = targets.len();
                for (other, c) in &self.components {
                    if !targets.contains(other)
                        && c.references().iter().any(|r| targets.contains(r))
                    {
                        targets.insert(other.clone());
                    }
                }
                if targets.len() == before {
                    break;
                }
            }
        }

        let order: Vec<String> = self
            .components
            .keys()
            .filter(|k| targets.contains(*k))
            .cloned()
            .collect();
        let mut report = BuildReport::default();
        for name in &order {
            self.make_one(name, &mut report);
        }
        self.finish_build(&report);
        Ok(report)
    }

    fn make_one(&mut self, name: &str, report: &mut BuildReport) {
        let Self {
            components,
            connectors,
            variables,
            config,
            ..
        } = self;
        let Some(component) = components.get_mut(name) else {
            return;
        };

        component.base_mut().status = Status::Building;
        let mut ctx = MakeContext::new(name, variables, config.units);
        let outcome = match component.make(&mut ctx) {
            Ok(()) => claim_connectors(name, ctx.into_connectors(), connectors),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(declared) => {
                connectors.retain(|_, c| c.parent_name != name);
                let base = component.base_mut();
                base.connector_names = declared.keys().cloned().collect();
                base.status = Status::Good;
                connectors.extend(declared);
                debug!(component = name, "built");
                report.good.push(name.to_string());
            }
            Err(err) => {
                warn!(component = name, error = %err, "component failed to build");
                component.base_mut().status = Status::Failed;
                report.failed.push((name.to_string(), err));
            }
        }
    }

    fn finish_build(&mut self, report: &BuildReport) {
        info!(
            good = report.good.len(),
            failed = report.failed.len(),
            "rebuilt components"
        );
        self.events.emit(DesignEvent::ComponentsRebuilt {
            good: report.good.len(),
            failed: report.failed.len(),
        });
    }

    // ---- connectors ------------------------------------------------------------------------

    #[must_use]
    pub fn connectors(&self) -> &IndexMap<String, Connector> {
        &self.connectors
    }

    #[must_use]
    pub fn connector(&self, name: &str) -> Option<&Connector> {
        self.connectors.get(name)
    }

    /// Builds a connector from two points and registers it under `name`.
    pub fn add_connector(
        &mut self,
        name: &str,
        points: &[[f64; 2]],
        parent: ConnectorParent<'_>,
        flip: bool,
        chip: &str,
    ) -> Result<(), Error> {
        if self.connectors.contains_key(name) {
            return Err(Error::DuplicateName {
                kind: "connectors",
                name: name.to_string(),
            });
        }
        let connector = make_connector(points, parent.name(), flip, chip)?;
        self.insert_connector(name, connector)
    }

    /// Registers an already built connector, e.g. one read back from a design file.
    pub fn insert_connector(&mut self, name: &str, connector: Connector) -> Result<(), Error> {
        if self.connectors.contains_key(name) {
            return Err(Error::DuplicateName {
                kind: "connectors",
                name: name.to_string(),
            });
        }
        if let Some(parent) = self.components.get_mut(&connector.parent_name) {
            parent.base_mut().connector_names.insert(name.to_string());
        }
        debug!(connector = name, parent = %connector.parent_name, "adding connector");
        self.connectors.insert(name.to_string(), connector);
        self.events.emit(DesignEvent::ConnectorAdded {
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn delete_all_connectors(&mut self) {
        self.connectors.clear();
        for component in self.components.values_mut() {
            component.base_mut().connector_names.clear();
        }
        self.events.emit(DesignEvent::ConnectorsCleared);
    }

    // ---- variables -------------------------------------------------------------------------

    #[must_use]
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.variables.set(name, value);
        self.events.emit(DesignEvent::VariablesChanged);
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<ParamValue> {
        let removed = self.variables.remove(name);
        if removed.is_some() {
            self.events.emit(DesignEvent::VariablesChanged);
        }
        removed
    }

    pub fn clear_variables(&mut self) {
        self.variables.clear();
        self.events.emit(DesignEvent::VariablesChanged);
    }

    /// Parses `value` against this design's variables and unit system.
    pub fn parse_value(&self, value: &ParamValue) -> Result<ParamValue, Error> {
        Ok(parse_value(value, &self.variables, self.config.units)?)
    }

    /// Parses only the named entries of `params`, e.g. `"x,y,cpw_width"`.
    pub fn parse_params(
        &self,
        params: &IndexMap<String, ParamValue>,
        names: impl Into<ParamNames>,
    ) -> Result<IndexMap<String, ParamValue>, Error> {
        Ok(parse_params(params, names, &self.variables, self.config.units)?)
    }

    // ---- chips and metadata ----------------------------------------------------------------

    #[must_use]
    pub fn chips(&self) -> &IndexMap<String, Chip> {
        &self.chips
    }

    /// Adds or replaces a chip.
    pub fn add_chip(&mut self, chip: Chip) {
        self.chips.insert(chip.name.clone(), chip);
        self.events.emit(DesignEvent::ChipsChanged);
    }

    pub fn chip_size(&self, name: &str) -> Result<[f64; 2], Error> {
        self.chip(name).map(|c| c.size)
    }

    pub fn chip_z(&self, name: &str) -> Result<f64, Error> {
        self.chip(name).map(|c| c.z)
    }

    fn chip(&self, name: &str) -> Result<&Chip, Error> {
        self.chips.get(name).ok_or_else(|| Error::UnknownChip {
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Back to a fresh design with the same config.
    pub fn reset(&mut self) {
        self.components.clear();
        self.connectors.clear();
        self.variables.clear();
        self.metadata = Metadata::default();
        self.chips = chips_from(&self.config);
        debug!("design reset");
        self.events.emit(DesignEvent::Reset);
    }
}

fn chips_from(config: &DesignConfig) -> IndexMap<String, Chip> {
    config
        .chips
        .iter()
        .map(|c| (c.name.clone(), c.clone()))
        .collect()
}

/// Checks that none of `declared` belongs to another component.
fn claim_connectors(
    owner: &str,
    declared: IndexMap<String, Connector>,
    existing: &IndexMap<String, Connector>,
) -> Result<IndexMap<String, Connector>, MakeError> {
    for name in declared.keys() {
        if let Some(current) = existing.get(name) {
            if current.parent_name != owner {
                return Err(MakeError::ConnectorTaken {
                    name: name.clone(),
                    owner: current.parent_name.clone(),
                });
            }
        }
    }
    Ok(declared)
}
