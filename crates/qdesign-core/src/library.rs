//! Built-in component classes.

use indexmap::IndexMap;
use qdesign_parser::ParamValue;

use crate::component::{Component, ComponentBase, MakeContext};
use crate::error::MakeError;

fn options_from<'a>(
    pairs: impl IntoIterator<Item = (&'a str, ParamValue)>,
) -> IndexMap<String, ParamValue> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Axis-aligned rectangular pad with one connector on its east edge.
#[derive(Debug, Clone)]
pub struct RectanglePad {
    base: ComponentBase,
    /// Corners, counter-clockwise from bottom-left, after the last successful make.
    pub outline: Vec<[f64; 2]>,
}

impl RectanglePad {
    pub const CLASS: &'static str = "RectanglePad";
    /// Options that never name another component.
    pub const LAYOUT_OPTIONS: &'static [&'static str] =
        &["pos_x", "pos_y", "width", "height", "chip"];

    #[must_use]
    pub fn default_options() -> IndexMap<String, ParamValue> {
        options_from([
            ("pos_x", "0um".into()),
            ("pos_y", "0um".into()),
            ("width", "500um".into()),
            ("height", "300um".into()),
            ("chip", "main".into()),
        ])
    }

    pub fn new<'a>(
        name: &str,
        options: impl IntoIterator<Item = (&'a str, ParamValue)>,
    ) -> Self {
        Self::from_base(ComponentBase::new(name, options_from(options)))
    }

    /// Wraps an existing base, filling unset options with [`RectanglePad::default_options`].
    #[must_use]
    pub fn from_base(base: ComponentBase) -> Self {
        Self {
            base: base.with_defaults(&Self::default_options()),
            outline: Vec::new(),
        }
    }

    #[must_use]
    pub fn pin_name(&self) -> String {
        format!("{}_pin", self.base.name)
    }
}

impl Component for RectanglePad {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn class_name(&self) -> &str {
        Self::CLASS
    }

    fn module_name(&self) -> &str {
        module_path!()
    }

    fn is_reference_option(&self, key: &str) -> bool {
        !Self::LAYOUT_OPTIONS.contains(&key)
    }

    fn make(&mut self, ctx: &mut MakeContext<'_>) -> Result<(), MakeError> {
        let opts = &self.base.options;
        let x = ctx.number(opts, "pos_x")?;
        let y = ctx.number(opts, "pos_y")?;
        let w = ctx.number(opts, "width")?;
        let h = ctx.number(opts, "height")?;
        if w <= 0.0 || h <= 0.0 {
            return Err(MakeError::Invalid(format!(
                "pad size must be positive, got {w} x {h}"
            )));
        }
        let chip = opts.get("chip").and_then(ParamValue::as_str).map(str::to_string);

        let (hw, hh) = (w / 2.0, h / 2.0);
        let outline = vec![
            [x - hw, y - hh],
            [x + hw, y - hh],
            [x + hw, y + hh],
            [x - hw, y + hh],
        ];

        // East edge runs upward, so its unflipped normal points into the pad.
        ctx.add_connector(
            self.pin_name(),
            &[outline[1], outline[2]],
            true,
            chip.as_deref(),
        )?;
        self.outline = outline;
        Ok(())
    }
}

/// Straight coplanar-waveguide segment with a connector at each end.
#[derive(Debug, Clone)]
pub struct CpwStraight {
    base: ComponentBase,
    pub length: f64,
}

impl CpwStraight {
    pub const CLASS: &'static str = "CpwStraight";
    pub const LAYOUT_OPTIONS: &'static [&'static str] =
        &["start", "end", "trace_width", "trace_gap", "chip"];

    #[must_use]
    pub fn default_options() -> IndexMap<String, ParamValue> {
        options_from([
            ("start", vec!["0um", "0um"].into()),
            ("end", vec!["1mm", "0um"].into()),
            ("trace_width", "10um".into()),
            ("trace_gap", "6um".into()),
            ("chip", "main".into()),
        ])
    }

    pub fn new<'a>(
        name: &str,
        options: impl IntoIterator<Item = (&'a str, ParamValue)>,
    ) -> Self {
        Self::from_base(ComponentBase::new(name, options_from(options)))
    }

    #[must_use]
    pub fn from_base(base: ComponentBase) -> Self {
        Self {
            base: base.with_defaults(&Self::default_options()),
            length: 0.0,
        }
    }
}

impl Component for CpwStraight {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn class_name(&self) -> &str {
        Self::CLASS
    }

    fn module_name(&self) -> &str {
        module_path!()
    }

    fn is_reference_option(&self, key: &str) -> bool {
        !Self::LAYOUT_OPTIONS.contains(&key)
    }

    fn make(&mut self, ctx: &mut MakeContext<'_>) -> Result<(), MakeError> {
        let opts = &self.base.options;
        let start = ctx.point(opts, "start")?;
        let end = ctx.point(opts, "end")?;
        let width = ctx.number(opts, "trace_width")?;
        let gap = ctx.number(opts, "trace_gap")?;
        if width <= 0.0 || gap < 0.0 {
            return Err(MakeError::Invalid(format!(
                "bad trace cross-section: width {width}, gap {gap}"
            )));
        }
        let chip = opts.get("chip").and_then(ParamValue::as_str).map(str::to_string);

        let d = [end[0] - start[0], end[1] - start[1]];
        let length = d[0].hypot(d[1]);
        if length == 0.0 {
            return Err(MakeError::Invalid("start and end coincide".to_string()));
        }
        let n = [-d[1] / length * width / 2.0, d[0] / length * width / 2.0];
        let across = |p: [f64; 2]| [[p[0] + n[0], p[1] + n[1]], [p[0] - n[0], p[1] - n[1]]];

        // Both ends are drawn with the same handedness, so the start normal faces along the
        // trace until flipped.
        let name = &self.base.name;
        ctx.add_connector(format!("{name}_start"), &across(start), true, chip.as_deref())?;
        ctx.add_connector(format!("{name}_end"), &across(end), false, chip.as_deref())?;
        self.length = length;
        Ok(())
    }
}
