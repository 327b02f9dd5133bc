use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("unknown unit \"{unit}\" in \"{input}\"")]
    UnknownUnit { input: String, unit: String },

    #[error("invalid number \"{input}\"")]
    InvalidNumber { input: String },

    #[error("invalid expression \"{expr}\" near \"{near}\"")]
    InvalidExpression { expr: String, near: String },

    #[error("unknown variable \"{name}\" referenced while evaluating \"{expr}\"")]
    UnknownVariable { expr: String, name: String },

    #[error("variable \"{name}\" used in \"{expr}\" does not resolve to a number")]
    NonNumericVariable { expr: String, name: String },

    #[error("circular variable reference: {cycle}")]
    CircularVariable { cycle: String },

    #[error("expression evaluation failed for \"{expr}\": {message}")]
    Eval { expr: String, message: String },

    #[error("parameter \"{name}\" is not present")]
    MissingParam { name: String },

    #[error("failed to parse YAML: {0}")]
    Yaml(String),
}
