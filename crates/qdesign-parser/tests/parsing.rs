use indexmap::IndexMap;
use qdesign_parser::{parse_params, parse_value, Error, LengthUnit, ParamValue, Variables};

fn v(j: serde_json::Value) -> ParamValue {
    serde_json::from_value(j).unwrap()
}

#[test]
fn nanometre_literal_in_millimetre_design() {
    let got = parse_value(&v(serde_json::json!("1nm")), &Variables::new(), LengthUnit::Millimeter)
        .unwrap();
    assert_eq!(got, ParamValue::Float(1e-6));
}

#[test]
fn expression_with_variable() {
    let vars: Variables = [("x", "3")].into_iter().collect();
    let got = parse_value(&v(serde_json::json!("2*x")), &vars, LengthUnit::Millimeter).unwrap();
    assert_eq!(got.as_f64(), Some(6.0));
}

#[test]
fn mapping_converts_strings_and_keeps_numbers() {
    let got = parse_value(
        &v(serde_json::json!({"a": "1nm", "b": 2})),
        &Variables::new(),
        LengthUnit::Millimeter,
    )
    .unwrap();
    assert_eq!(got, v(serde_json::json!({"a": 1e-6, "b": 2})));
}

#[test]
fn nested_component_options() {
    let vars: Variables = [("cpw_width", "10um"), ("cpw_gap", "6um")].into_iter().collect();
    let options = v(serde_json::json!({
        "start": ["0mm", "-1mm"],
        "end": ["2.5mm", "-1mm"],
        "trace": {"width": "cpw_width", "gap": "cpw_gap + 0um"},
        "anchor": "Q1",
    }));

    let got = parse_value(&options, &vars, LengthUnit::Millimeter).unwrap();
    let m = got.as_map().unwrap();
    assert_eq!(m["start"].as_xy(), Some([0.0, -1.0]));
    assert_eq!(m["end"].as_xy(), Some([2.5, -1.0]));
    assert_eq!(m["anchor"], ParamValue::from("Q1"));

    let trace = m["trace"].as_map().unwrap();
    assert!((trace["width"].as_f64().unwrap() - 0.010).abs() < 1e-12);
    assert!((trace["gap"].as_f64().unwrap() - 0.006).abs() < 1e-12);
}

#[test]
fn parse_params_reports_offending_expression() {
    let params: IndexMap<String, ParamValue> = IndexMap::from([
        ("width".to_string(), ParamValue::from("3 * (2um")),
        ("height".to_string(), ParamValue::from("1um")),
    ]);

    let err = parse_params(&params, "height,width", &Variables::new(), LengthUnit::Millimeter)
        .unwrap_err();
    match err {
        Error::InvalidExpression { expr, .. } => assert_eq!(expr, "3 * (2um"),
        other => panic!("unexpected error: {other:?}"),
    }
}
