use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("connector needs exactly two finite 2D points, got {0}")]
    InvalidGeometry(String),

    #[error("connector points coincide at ({x}, {y})")]
    DegenerateConnector { x: f64, y: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] qdesign_parser::Error),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("\"{name}\" already exists in the design {kind}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("\"{name}\" is not a valid component name")]
    InvalidName { name: String },

    #[error("cannot delete \"{name}\": referenced by {}", .dependents.join(", "))]
    DependencyConflict { name: String, dependents: Vec<String> },

    #[error("no component named \"{name}\"")]
    NotFound { name: String },

    #[error("no chip named \"{name}\"")]
    UnknownChip { name: String },

    #[error("invalid design config: {0}")]
    Config(String),
}

/// Failure reported by a component's `make()`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MakeError {
    #[error(transparent)]
    Parse(#[from] qdesign_parser::Error),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("option \"{0}\" must resolve to a number")]
    NotANumber(String),

    #[error("option \"{0}\" must resolve to an [x, y] point")]
    NotAPoint(String),

    #[error("connector \"{0}\" declared twice")]
    DuplicateConnector(String),

    #[error("connector \"{name}\" already belongs to \"{owner}\"")]
    ConnectorTaken { name: String, owner: String },

    #[error("{0}")]
    Invalid(String),
}
