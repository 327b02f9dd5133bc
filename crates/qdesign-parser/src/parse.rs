use indexmap::IndexMap;

use crate::error::Error;
use crate::eval::{eval_expression, is_expression, is_identifier, parse_literal};
use crate::units::LengthUnit;
use crate::value::ParamValue;
use crate::variables::Variables;

/// Main parsing entry point.
///
/// Strings are resolved in order: a bound variable name, a `<number><unit>` literal, an
/// arithmetic expression. Anything else (a component name, say) comes back unchanged.
/// Mappings and sequences are parsed element by element; numbers, booleans and null are
/// returned as they are.
///
/// ```
/// use qdesign_parser::{parse_value, LengthUnit, ParamValue, Variables};
///
/// let vars: Variables = [("x", "3")].into_iter().collect();
/// let got = parse_value(&"2*x".into(), &vars, LengthUnit::Millimeter).unwrap();
/// assert_eq!(got.as_f64(), Some(6.0));
/// ```
pub fn parse_value(
    value: &ParamValue,
    variables: &Variables,
    units: LengthUnit,
) -> Result<ParamValue, Error> {
    Resolver::new(variables, units).value(value)
}

/// Parses only the entries of `params` named by `names`.
///
/// The result holds exactly the selected names, in selector order.
pub fn parse_params(
    params: &IndexMap<String, ParamValue>,
    names: impl Into<ParamNames>,
    variables: &Variables,
    units: LengthUnit,
) -> Result<IndexMap<String, ParamValue>, Error> {
    let mut resolver = Resolver::new(variables, units);
    let mut out = IndexMap::new();
    for name in names.into().0 {
        let raw = params
            .get(&name)
            .ok_or_else(|| Error::MissingParam { name: name.clone() })?;
        let parsed = resolver.value(raw)?;
        out.insert(name, parsed);
    }
    Ok(out)
}

/// Selector for [`parse_params`]: `"x, y,width"` or a list of names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamNames(Vec<String>);

impl ParamNames {
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for ParamNames {
    fn from(s: &str) -> Self {
        ParamNames(
            s.split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl From<&[&str]> for ParamNames {
    fn from(names: &[&str]) -> Self {
        ParamNames(names.iter().map(|n| (*n).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ParamNames {
    fn from(names: [&str; N]) -> Self {
        ParamNames(names.iter().map(|n| (*n).to_string()).collect())
    }
}

impl From<Vec<String>> for ParamNames {
    fn from(names: Vec<String>) -> Self {
        ParamNames(names)
    }
}

struct Resolver<'a> {
    variables: &'a Variables,
    units: LengthUnit,
    /// Variables currently being substituted, to catch `a -> b -> a`.
    stack: Vec<String>,
    /// Variables already resolved during this call.
    resolved: IndexMap<String, ParamValue>,
}

impl<'a> Resolver<'a> {
    fn new(variables: &'a Variables, units: LengthUnit) -> Self {
        Self {
            variables,
            units,
            stack: Vec::new(),
            resolved: IndexMap::new(),
        }
    }

    fn value(&mut self, value: &ParamValue) -> Result<ParamValue, Error> {
        match value {
            ParamValue::String(s) => self.string(s),
            ParamValue::Seq(items) => Ok(ParamValue::Seq(
                items
                    .iter()
                    .map(|v| self.value(v))
                    .collect::<Result<_, _>>()?,
            )),
            ParamValue::Map(m) => {
                let mut out = IndexMap::with_capacity(m.len());
                for (k, v) in m {
                    out.insert(k.clone(), self.value(v)?);
                }
                Ok(ParamValue::Map(out))
            }
            other => Ok(other.clone()),
        }
    }

    fn string(&mut self, raw: &str) -> Result<ParamValue, Error> {
        let s = raw.trim();

        if is_identifier(s) {
            if let Some(bound) = self.variables.get(s) {
                return self.substitute(s, bound);
            }
        }

        if let Some(literal) = parse_literal(s, self.units)? {
            return Ok(literal);
        }

        let variables = self.variables;
        if is_expression(s, |name| variables.contains(name)) {
            let units = self.units;
            let value = eval_expression(s, units, &mut |name| self.numeric_variable(name, s))?;
            return Ok(ParamValue::Float(value));
        }

        Ok(ParamValue::String(raw.to_string()))
    }

    fn substitute(&mut self, name: &str, bound: &ParamValue) -> Result<ParamValue, Error> {
        if let Some(done) = self.resolved.get(name) {
            return Ok(done.clone());
        }
        if self.stack.iter().any(|n| n == name) {
            let mut cycle = self.stack.clone();
            cycle.push(name.to_string());
            return Err(Error::CircularVariable {
                cycle: cycle.join(" -> "),
            });
        }
        self.stack.push(name.to_string());
        let resolved = self.value(bound);
        self.stack.pop();
        let resolved = resolved?;
        self.resolved.insert(name.to_string(), resolved.clone());
        Ok(resolved)
    }

    fn numeric_variable(&mut self, name: &str, expr: &str) -> Result<f64, Error> {
        let bound = self
            .variables
            .get(name)
            .ok_or_else(|| Error::UnknownVariable {
                expr: expr.to_string(),
                name: name.to_string(),
            })?;
        self.substitute(name, bound)?
            .as_f64()
            .ok_or_else(|| Error::NonNumericVariable {
                expr: expr.to_string(),
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MM: LengthUnit = LengthUnit::Millimeter;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs.iter().copied().collect()
    }

    fn parse(value: impl Into<ParamValue>, variables: &Variables) -> Result<ParamValue, Error> {
        parse_value(&value.into(), variables, MM)
    }

    #[test]
    fn numbers_pass_through_unchanged() {
        let v = Variables::new();
        assert_eq!(parse(3, &v).unwrap(), ParamValue::Int(3));
        assert_eq!(parse(2.5, &v).unwrap(), ParamValue::Float(2.5));
        assert_eq!(parse(true, &v).unwrap(), ParamValue::Bool(true));
        assert_eq!(parse(ParamValue::Null, &v).unwrap(), ParamValue::Null);
    }

    #[test]
    fn unit_strings_convert_to_default_unit() {
        let v = Variables::new();
        assert_eq!(parse("1nm", &v).unwrap(), ParamValue::Float(1e-6));
        assert_eq!(parse("1 um", &v).unwrap(), ParamValue::Float(1e-3));
        assert_eq!(parse("12", &v).unwrap(), ParamValue::Int(12));

        let in_um = parse_value(&"1mm".into(), &v, LengthUnit::Micrometer).unwrap();
        assert_eq!(in_um, ParamValue::Float(1000.0));
    }

    #[test]
    fn variables_substitute_and_chain() {
        let v = vars(&[("gap", "width"), ("width", "10um"), ("x", "3")]);
        assert_relative_eq!(parse("width", &v).unwrap().as_f64().unwrap(), 1e-2, epsilon = 1e-15);
        assert_relative_eq!(parse("gap", &v).unwrap().as_f64().unwrap(), 1e-2, epsilon = 1e-15);
        assert_eq!(parse("2*x", &v).unwrap().as_f64(), Some(6.0));
        assert_relative_eq!(
            parse("width + 5um", &v).unwrap().as_f64().unwrap(),
            0.015,
            epsilon = 1e-12
        );
    }

    #[test]
    fn circular_variables_are_reported() {
        let v = vars(&[("a", "b"), ("b", "a + 1")]);
        let err = parse("a", &v).unwrap_err();
        assert_eq!(
            err,
            Error::CircularVariable {
                cycle: "a -> b -> a".to_string()
            }
        );
    }

    #[test]
    fn non_numeric_variable_in_arithmetic() {
        let v = vars(&[("pad", "Q1"), ("x", "1")]);
        assert_eq!(parse("pad", &v).unwrap(), ParamValue::from("Q1"));
        let err = parse("x + pad", &v).unwrap_err();
        assert!(matches!(err, Error::NonNumericVariable { name, .. } if name == "pad"));
    }

    #[test]
    fn plain_names_are_left_alone() {
        let v = Variables::new();
        assert_eq!(parse("Q1", &v).unwrap(), ParamValue::from("Q1"));
        assert_eq!(parse(" cpw-left ", &v).unwrap(), ParamValue::from(" cpw-left "));
    }

    #[test]
    fn shared_variables_resolve_once() {
        let depth = 40;
        let mut v: Variables = (0..depth)
            .map(|i| (format!("v{i}"), format!("v{n} + v{n}", n = i + 1)))
            .collect();
        v.set(format!("v{depth}"), "1");
        assert_eq!(parse("v0", &v).unwrap().as_f64(), Some(2f64.powi(depth)));
    }

    #[test]
    fn hyphenated_names_stay_text_with_bound_prefix() {
        let v = vars(&[("pad", "Q1"), ("x", "2")]);
        assert_eq!(parse("pad-left", &v).unwrap(), ParamValue::from("pad-left"));
        assert_eq!(parse("x-1", &v).unwrap().as_f64(), Some(1.0));
    }

    #[test]
    fn malformed_arithmetic_never_becomes_zero() {
        let v = Variables::new();
        assert!(matches!(parse("2 * (3", &v), Err(Error::InvalidExpression { .. })));
        assert!(matches!(parse("2 furlongs", &v), Err(Error::UnknownUnit { unit, .. }) if unit == "furlongs"));
        assert!(matches!(parse("1 + nope", &v), Err(Error::UnknownVariable { name, .. }) if name == "nope"));
    }

    #[test]
    fn mappings_keep_keys_and_order() {
        let v = Variables::new();
        let mut m = IndexMap::new();
        m.insert("a".to_string(), ParamValue::from("1nm"));
        m.insert("b".to_string(), ParamValue::Int(2));
        let got = parse(m, &v).unwrap();
        let got = got.as_map().unwrap();
        assert_eq!(got.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(got["a"], ParamValue::Float(1e-6));
        assert_eq!(got["b"], ParamValue::Int(2));
    }

    #[test]
    fn sequences_parse_each_element() {
        let v = vars(&[("x", "2mm")]);
        let got = parse(vec!["x", "1um", "name"], &v).unwrap();
        assert_eq!(
            got,
            ParamValue::Seq(vec![
                ParamValue::Float(2.0),
                ParamValue::Float(1e-3),
                ParamValue::from("name"),
            ])
        );
    }

    #[test]
    fn parse_params_only_touches_selection() {
        let v = vars(&[("w", "10um")]);
        let mut params = IndexMap::new();
        params.insert("pos_x".to_string(), ParamValue::from("1mm"));
        params.insert("width".to_string(), ParamValue::from("w"));
        params.insert("layer".to_string(), ParamValue::from("1 + oops"));

        let got = parse_params(&params, "width, pos_x", &v, MM).unwrap();
        assert_eq!(got.keys().collect::<Vec<_>>(), ["width", "pos_x"]);
        assert_relative_eq!(got["width"].as_f64().unwrap(), 1e-2, epsilon = 1e-15);
        assert_eq!(got["pos_x"], ParamValue::Float(1.0));

        let got = parse_params(&params, ["pos_x"], &v, MM).unwrap();
        assert_eq!(got.len(), 1);

        let err = parse_params(&params, "height", &v, MM).unwrap_err();
        assert_eq!(
            err,
            Error::MissingParam {
                name: "height".to_string()
            }
        );
    }
}
