use std::str::FromStr;

use crate::error::Error;
use crate::units::LengthUnit;
use crate::value::ParamValue;

/// Reads a `<number><optional unit>` literal such as `"1"`, `"-2.5e3"` or `"1 um"`.
///
/// Returns `Ok(None)` when `input` is not shaped like a literal at all. A bare number keeps its
/// integer/float kind; a unit-suffixed one is converted into `units`.
pub(crate) fn parse_literal(input: &str, units: LengthUnit) -> Result<Option<ParamValue>, Error> {
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    if matches!(chars.first(), Some('+' | '-')) {
        i += 1;
    }
    let Some(end) = scan_number(&chars, i) else {
        return Ok(None);
    };
    let number: String = chars[..end].iter().collect();

    let mut j = end;
    while j < chars.len() && chars[j].is_whitespace() {
        j += 1;
    }
    let rest: String = chars[j..].iter().collect();

    if rest.is_empty() {
        let is_float = number.contains(['.', 'e', 'E']);
        let value = if is_float {
            ParamValue::Float(parse_f64(&number, input)?)
        } else {
            match number.parse::<i64>() {
                Ok(n) => ParamValue::Int(n),
                Err(_) => ParamValue::Float(parse_f64(&number, input)?),
            }
        };
        return Ok(Some(value));
    }

    if !rest.chars().all(char::is_alphabetic) {
        return Ok(None);
    }
    let unit = LengthUnit::from_str(&rest).map_err(|_| Error::UnknownUnit {
        input: input.to_string(),
        unit: rest.clone(),
    })?;
    let value = parse_f64(&number, input)?;
    Ok(Some(ParamValue::Float(unit.convert(value, units))))
}

/// Whether `input` should be handed to [`eval_expression`] instead of being kept as text.
///
/// It must contain an operator or parenthesis. Input starting with something numeric always
/// qualifies. Input starting with a name qualifies only when every name in it, unit suffixes
/// aside, is known to `is_variable`, so `"pad-left"` stays text even with `pad` bound.
pub(crate) fn is_expression(input: &str, is_variable: impl Fn(&str) -> bool) -> bool {
    if !input.contains(['+', '-', '*', '/', '(', ')']) {
        return false;
    }
    let chars: Vec<char> = input.trim_start().chars().collect();
    match chars.first() {
        Some(c) if c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | '(') => true,
        Some(c) if is_ident_start(*c) => free_identifiers(&chars).iter().all(|n| is_variable(n)),
        _ => false,
    }
}

/// Names in `chars` that are not the unit of a preceding number.
fn free_identifiers(chars: &[char]) -> Vec<String> {
    let mut names = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) {
            i = scan_number(chars, i).unwrap_or(i + 1);
            let mut j = i;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && is_ident_start(chars[j]) {
                i = scan_ident(chars, j);
            }
        } else if is_ident_start(c) {
            let end = scan_ident(chars, i);
            names.push(chars[i..end].iter().collect());
            i = end;
        } else {
            i += 1;
        }
    }
    names
}

/// Evaluates a restricted arithmetic expression (`+ - * /` and parentheses).
///
/// Numeric literals may carry a length unit, which is converted into `units` before
/// evaluation. Every other identifier is resolved through `lookup`.
pub(crate) fn eval_expression(
    expr: &str,
    units: LengthUnit,
    lookup: &mut dyn FnMut(&str) -> Result<f64, Error>,
) -> Result<f64, Error> {
    let chars: Vec<char> = expr.chars().collect();
    let mut rewritten = String::with_capacity(expr.len() + 8);
    let mut ctx = meval::Context::new();
    let mut literals = 0usize;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) {
            let end = scan_number(&chars, i).ok_or_else(|| invalid(expr, &chars[i..]))?;
            let text: String = chars[i..end].iter().collect();
            let mut value = parse_f64(&text, expr)?;
            i = end;

            let mut j = i;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && is_ident_start(chars[j]) {
                let unit_end = scan_ident(&chars, j);
                let unit: String = chars[j..unit_end].iter().collect();
                let unit = LengthUnit::from_str(&unit).map_err(|_| Error::UnknownUnit {
                    input: expr.to_string(),
                    unit: unit.clone(),
                })?;
                value = unit.convert(value, units);
                i = unit_end;
            }

            let name = format!("n_{literals}");
            literals += 1;
            ctx.var(name.clone(), value);
            rewritten.push_str(&name);
        } else if is_ident_start(c) {
            let end = scan_ident(&chars, i);
            let ident: String = chars[i..end].iter().collect();
            let value = lookup(&ident)?;
            let safe = sanitize_ident(&ident);
            ctx.var(safe.clone(), value);
            rewritten.push_str(&safe);
            i = end;
        } else if c.is_whitespace() || matches!(c, '+' | '-' | '*' | '/' | '(' | ')') {
            rewritten.push(c);
            i += 1;
        } else {
            return Err(invalid(expr, &chars[i..]));
        }
    }

    tracing::trace!(expr, rewritten = %rewritten, "evaluating expression");

    let parsed = meval::Expr::from_str(&rewritten).map_err(|_| Error::InvalidExpression {
        expr: expr.to_string(),
        near: expr.to_string(),
    })?;
    let value = parsed.eval_with_context(ctx).map_err(|e| Error::Eval {
        expr: expr.to_string(),
        message: format!("{e}"),
    })?;
    if !value.is_finite() {
        return Err(Error::Eval {
            expr: expr.to_string(),
            message: "result is not a finite number".to_string(),
        });
    }
    Ok(value)
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => chars.all(is_ident_continue),
        _ => false,
    }
}

/// Index one past the end of the number starting at `start`, exponent included.
fn scan_number(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start;
    let mut digits = 0;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < chars.len() && chars[i] == '.' {
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }

    // Only consume an exponent when digits follow, so "2em" stays a (bad) unit.
    if i < chars.len() && matches!(chars[i], 'e' | 'E') {
        let mut j = i + 1;
        if j < chars.len() && matches!(chars[j], '+' | '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    Some(i)
}

fn scan_ident(chars: &[char], start: usize) -> usize {
    let mut i = start + 1;
    while i < chars.len() && is_ident_continue(chars[i]) {
        i += 1;
    }
    i
}

fn parse_f64(text: &str, input: &str) -> Result<f64, Error> {
    text.parse::<f64>().map_err(|_| Error::InvalidNumber {
        input: input.to_string(),
    })
}

fn invalid(expr: &str, rest: &[char]) -> Error {
    Error::InvalidExpression {
        expr: expr.to_string(),
        near: rest.iter().collect(),
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn sanitize_ident(raw: &str) -> String {
    let mut out = String::from("v_");
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push('_');
            out.push_str(&format!("{:x}", c as u32));
            out.push('_');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn no_vars(name: &str) -> Result<f64, Error> {
        Err(Error::UnknownVariable {
            expr: "<test>".to_string(),
            name: name.to_string(),
        })
    }

    fn eval(expr: &str) -> Result<f64, Error> {
        eval_expression(expr, LengthUnit::Millimeter, &mut no_vars)
    }

    #[test]
    fn literal_kinds() {
        let mm = LengthUnit::Millimeter;
        assert_eq!(parse_literal("3", mm).unwrap(), Some(ParamValue::Int(3)));
        assert_eq!(parse_literal("-3", mm).unwrap(), Some(ParamValue::Int(-3)));
        assert_eq!(parse_literal("3.5", mm).unwrap(), Some(ParamValue::Float(3.5)));
        assert_eq!(parse_literal("1e3", mm).unwrap(), Some(ParamValue::Float(1000.0)));
        assert_eq!(parse_literal(".5", mm).unwrap(), Some(ParamValue::Float(0.5)));
        assert_eq!(parse_literal("1nm", mm).unwrap(), Some(ParamValue::Float(1e-6)));
        assert_eq!(parse_literal("1 um", mm).unwrap(), Some(ParamValue::Float(1e-3)));
        assert_eq!(parse_literal("Q1", mm).unwrap(), None);
        assert_eq!(parse_literal("1+2", mm).unwrap(), None);
    }

    #[test]
    fn literal_with_unknown_unit_fails() {
        let err = parse_literal("3 parsecs", LengthUnit::Millimeter).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownUnit {
                input: "3 parsecs".to_string(),
                unit: "parsecs".to_string()
            }
        );
    }

    #[test]
    fn arithmetic_with_units() {
        assert_relative_eq!(eval("-2 * 1e5 nm").unwrap(), -0.2, epsilon = 1e-12);
        assert_relative_eq!(eval("(1mm + 500um) / 2").unwrap(), 0.75, epsilon = 1e-12);
        assert_relative_eq!(eval("1 + 2 * 3").unwrap(), 7.0, epsilon = 1e-12);
    }

    #[test]
    fn identifiers_go_through_lookup() {
        let mut lookup = |name: &str| match name {
            "x" => Ok(3.0),
            other => no_vars(other),
        };
        let got = eval_expression("2*x", LengthUnit::Millimeter, &mut lookup).unwrap();
        assert_eq!(got, 6.0);
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(matches!(eval("2 *"), Err(Error::InvalidExpression { .. })));
        assert!(matches!(eval("2 ^ 3"), Err(Error::InvalidExpression { near, .. }) if near == "^ 3"));
        assert!(matches!(eval("1/0"), Err(Error::Eval { .. })));
        assert!(matches!(eval("y + 1"), Err(Error::UnknownVariable { name, .. }) if name == "y"));
    }

    #[test]
    fn expression_detection() {
        let known = |n: &str| n == "x";
        assert!(is_expression("2*x", known));
        assert!(is_expression("x - 1", known));
        assert!(is_expression("(1 + 2)", known));
        assert!(!is_expression("pad-left", known));
        assert!(!is_expression("Q1", known));
        assert!(is_expression("x * 2um + 1e3nm", known));
    }

    #[test]
    fn hyphenated_name_with_bound_prefix_is_text() {
        let known = |n: &str| n == "pad";
        assert!(!is_expression("pad-left", known));
        assert!(!is_expression("pad - left", known));
        assert!(is_expression("pad - 1", known));
        assert!(is_expression("2 - left", known));
    }
}
