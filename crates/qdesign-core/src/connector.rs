//! Two-point connectors used for routing between components.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Parent name recorded on connectors that belong to no component.
pub const NO_PARENT: &str = "none";

/// Chip a connector sits on unless told otherwise.
pub const DEFAULT_CHIP: &str = "main";

/// Immutable connector geometry, in design units.
///
/// Moving or re-parenting a connector means building a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub points: [[f64; 2]; 2],
    pub middle: [f64; 2],
    /// Unit vector perpendicular to the segment.
    pub normal: [f64; 2],
    /// Unit vector from the first point to the second.
    pub tangent: [f64; 2],
    /// Segment length.
    pub width: f64,
    pub chip: String,
    pub parent_name: String,
}

impl Connector {
    /// Same geometry, owned by `parent_name`.
    #[must_use]
    pub fn with_parent(self, parent_name: impl Into<String>) -> Self {
        Self {
            parent_name: parent_name.into(),
            ..self
        }
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.parent_name != NO_PARENT
    }
}

/// Builds a connector from two endpoints.
///
/// The normal is the tangent rotated by +90 degrees, negated when `flip` is set.
pub fn make_connector(
    points: &[[f64; 2]],
    parent_name: &str,
    flip: bool,
    chip: &str,
) -> Result<Connector, GeometryError> {
    let [p0, p1] = points else {
        return Err(GeometryError::InvalidGeometry(format!(
            "{} point(s)",
            points.len()
        )));
    };
    if !p0.iter().chain(p1.iter()).all(|c| c.is_finite()) {
        return Err(GeometryError::InvalidGeometry(format!(
            "non-finite coordinates {p0:?}, {p1:?}"
        )));
    }

    let d = [p1[0] - p0[0], p1[1] - p0[1]];
    let width = d[0].hypot(d[1]);
    if width == 0.0 {
        return Err(GeometryError::DegenerateConnector { x: p0[0], y: p0[1] });
    }

    let tangent = [d[0] / width, d[1] / width];
    let mut normal = [-tangent[1], tangent[0]];
    if flip {
        normal = [-normal[0], -normal[1]];
    }

    Ok(Connector {
        points: [*p0, *p1],
        middle: [(p0[0] + p1[0]) / 2.0, (p0[1] + p1[1]) / 2.0],
        normal,
        tangent,
        width,
        chip: chip.to_string(),
        parent_name: parent_name.to_string(),
    })
}
