//! Unit-aware parsing of component options and design variables.
//!
//! Values are strings, numbers, sequences or mappings ([`ParamValue`]). Strings may name a
//! variable, carry a length unit (`"10 um"`), or hold a small arithmetic expression
//! (`"2*gap + 1um"`); everything is normalized into the design's default [`LengthUnit`].

pub mod error;
mod eval;
mod parse;
pub mod units;
pub mod value;
pub mod variables;

pub use error::Error;
pub use parse::{parse_params, parse_value, ParamNames};
pub use units::LengthUnit;
pub use value::ParamValue;
pub use variables::Variables;
