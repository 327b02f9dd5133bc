//! The component capability and the state every component carries.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use qdesign_parser::{parse_params, parse_value, LengthUnit, ParamNames, ParamValue, Variables};
use serde::{Deserialize, Serialize};

use crate::connector::{make_connector, Connector, DEFAULT_CHIP};
use crate::error::MakeError;

/// Build status of a component.
///
/// `Unbuilt -> Building -> {Good, Failed}`; every rebuild goes back through `Building`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Unbuilt,
    Building,
    Good,
    Failed,
}

impl Status {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Unbuilt => "unbuilt",
            Status::Building => "building",
            Status::Good => "good",
            Status::Failed => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name, raw options, status and owned connector names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentBase {
    pub name: String,
    pub options: IndexMap<String, ParamValue>,
    pub(crate) status: Status,
    pub connector_names: IndexSet<String>,
}

impl ComponentBase {
    #[must_use]
    pub fn new(name: impl Into<String>, options: IndexMap<String, ParamValue>) -> Self {
        Self {
            name: name.into(),
            options,
            status: Status::Unbuilt,
            connector_names: IndexSet::new(),
        }
    }

    /// Fills in `defaults` for every option the user left unset.
    #[must_use]
    pub fn with_defaults(mut self, defaults: &IndexMap<String, ParamValue>) -> Self {
        for (k, v) in defaults {
            if !self.options.contains_key(k) {
                self.options.insert(k.clone(), v.clone());
            }
        }
        self
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }
}

/// A placed, parameterized element whose geometry comes from [`Component::make`].
///
/// The design owns every component; status is driven by the design around each `make()`.
pub trait Component: fmt::Debug + Send + Sync {
    fn base(&self) -> &ComponentBase;

    fn base_mut(&mut self) -> &mut ComponentBase;

    fn class_name(&self) -> &str;

    fn module_name(&self) -> &str;

    /// Recomputes geometry from the current options and declares connectors on `ctx`.
    fn make(&mut self, ctx: &mut MakeContext<'_>) -> Result<(), MakeError>;

    fn name(&self) -> &str {
        &self.base().name
    }

    fn status(&self) -> Status {
        self.base().status
    }

    fn connector_names(&self) -> &IndexSet<String> {
        &self.base().connector_names
    }

    fn options(&self) -> &IndexMap<String, ParamValue> {
        &self.base().options
    }

    /// Whether option `key` may name another component.
    ///
    /// `chip` names a chip, never a component. Classes with geometric options narrow this
    /// further so a chip or length that happens to match a component name is not a link.
    fn is_reference_option(&self, key: &str) -> bool {
        key != "chip"
    }

    /// Names this component may depend on.
    ///
    /// Every string, however nested, under a reference option. The design keeps only those
    /// naming another component.
    fn references(&self) -> Vec<String> {
        self.options()
            .iter()
            .filter(|(key, _)| self.is_reference_option(key))
            .flat_map(|(_, value)| value.strings())
            .map(str::to_string)
            .collect()
    }

    /// Rewrites every reference to `old` into `new`. Returns how many strings changed.
    fn rename_references(&mut self, old: &str, new: &str) -> usize {
        let keys: Vec<String> = self
            .options()
            .keys()
            .filter(|key| self.is_reference_option(key))
            .cloned()
            .collect();
        let options = &mut self.base_mut().options;
        let mut changed = 0;
        for key in &keys {
            if let Some(value) = options.get_mut(key) {
                changed += value.replace_strings(old, new);
            }
        }
        changed
    }
}

/// What a component sees while it is being made.
///
/// Connectors declared here are committed by the design once `make()` returns `Ok`.
pub struct MakeContext<'a> {
    name: &'a str,
    variables: &'a Variables,
    units: LengthUnit,
    connectors: IndexMap<String, Connector>,
}

impl<'a> MakeContext<'a> {
    #[must_use]
    pub fn new(name: &'a str, variables: &'a Variables, units: LengthUnit) -> Self {
        Self {
            name,
            variables,
            units,
            connectors: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn component_name(&self) -> &str {
        self.name
    }

    #[must_use]
    pub fn units(&self) -> LengthUnit {
        self.units
    }

    pub fn parse_value(&self, value: &ParamValue) -> Result<ParamValue, MakeError> {
        Ok(parse_value(value, self.variables, self.units)?)
    }

    pub fn parse_params(
        &self,
        params: &IndexMap<String, ParamValue>,
        names: impl Into<ParamNames>,
    ) -> Result<IndexMap<String, ParamValue>, MakeError> {
        Ok(parse_params(params, names, self.variables, self.units)?)
    }

    /// Parses option `key` of `options` and requires a number.
    pub fn number(
        &self,
        options: &IndexMap<String, ParamValue>,
        key: &str,
    ) -> Result<f64, MakeError> {
        let parsed = self.parse_params(options, [key])?;
        parsed[key]
            .as_f64()
            .ok_or_else(|| MakeError::NotANumber(key.to_string()))
    }

    /// Parses option `key` of `options` and requires an `[x, y]` point.
    pub fn point(
        &self,
        options: &IndexMap<String, ParamValue>,
        key: &str,
    ) -> Result<[f64; 2], MakeError> {
        let parsed = self.parse_params(options, [key])?;
        parsed[key]
            .as_xy()
            .ok_or_else(|| MakeError::NotAPoint(key.to_string()))
    }

    /// Declares a connector owned by the component being made.
    pub fn add_connector(
        &mut self,
        name: impl Into<String>,
        points: &[[f64; 2]],
        flip: bool,
        chip: Option<&str>,
    ) -> Result<(), MakeError> {
        let name = name.into();
        if self.connectors.contains_key(&name) {
            return Err(MakeError::DuplicateConnector(name));
        }
        let connector = make_connector(points, self.name, flip, chip.unwrap_or(DEFAULT_CHIP))?;
        self.connectors.insert(name, connector);
        Ok(())
    }

    pub(crate) fn into_connectors(self) -> IndexMap<String, Connector> {
        self.connectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, ParamValue)]) -> IndexMap<String, ParamValue> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn defaults_do_not_override_user_options() {
        let base = ComponentBase::new("Q1", options(&[("width", "10um".into())])).with_defaults(
            &options(&[("width", "1mm".into()), ("chip", "main".into())]),
        );
        assert_eq!(base.options["width"], ParamValue::from("10um"));
        assert_eq!(base.options["chip"], ParamValue::from("main"));
        assert_eq!(base.options.keys().collect::<Vec<_>>(), ["width", "chip"]);
        assert_eq!(base.status(), Status::Unbuilt);
    }

    #[test]
    fn context_parses_numbers_and_points() {
        let vars: Variables = [("w", "20um")].into_iter().collect();
        let ctx = MakeContext::new("Q1", &vars, LengthUnit::Micrometer);
        let opts = options(&[
            ("width", "w".into()),
            ("pos", vec!["1mm", "2um"].into()),
            ("label", "pad".into()),
        ]);

        assert_eq!(ctx.number(&opts, "width").unwrap(), 20.0);
        assert_eq!(ctx.point(&opts, "pos").unwrap(), [1000.0, 2.0]);
        assert_eq!(
            ctx.number(&opts, "label").unwrap_err(),
            MakeError::NotANumber("label".to_string())
        );
    }

    #[test]
    fn declared_connectors_belong_to_component() {
        let vars = Variables::new();
        let mut ctx = MakeContext::new("Q1", &vars, LengthUnit::Millimeter);
        ctx.add_connector("a", &[[0.0, 0.0], [1.0, 0.0]], false, None)
            .unwrap();
        assert_eq!(
            ctx.add_connector("a", &[[0.0, 0.0], [1.0, 0.0]], false, None),
            Err(MakeError::DuplicateConnector("a".to_string()))
        );

        let connectors = ctx.into_connectors();
        assert_eq!(connectors["a"].parent_name, "Q1");
        assert_eq!(connectors["a"].chip, "main");
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(Status::Good.to_string(), "good");
        assert_eq!(serde_yaml::to_string(&Status::Failed).unwrap().trim(), "failed");
    }
}
