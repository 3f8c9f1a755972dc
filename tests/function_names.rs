use jsname::interpreter::NameRecord;
use jsname::naming::NameableKind;
use jsname::{EngineError, RunOptions, run_source};
use std::path::Path;

fn run_fixture(name: &str) {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let source = std::fs::read_to_string(&path).unwrap();
    if let Err(e) = run_source(&source, &RunOptions::default()) {
        panic!("{name}: {e}");
    }
}

fn recorded(source: &str) -> Vec<NameRecord> {
    run_source(source, &RunOptions { record_names: true })
        .unwrap()
        .names
}

fn names(source: &str) -> Vec<Option<String>> {
    recorded(source).into_iter().map(|r| r.name).collect()
}

fn some(names: &[&str]) -> Vec<Option<String>> {
    names.iter().map(|n| Some(n.to_string())).collect()
}

#[test]
fn function_name_fixture() {
    run_fixture("function-name.js");
}

#[test]
fn named_evaluation_fixture() {
    run_fixture("named-evaluation.js");
}

#[test]
fn records_every_kind_in_declarators() {
    let records = recorded(
        "var f = function() {}; let a = () => 1; const g = function*() {};\n\
         var af = async function() {}; var C = class {};",
    );
    let kinds: Vec<NameableKind> = records.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NameableKind::Function,
            NameableKind::Arrow,
            NameableKind::Generator,
            NameableKind::AsyncFunction,
            NameableKind::Class,
        ]
    );
    assert_eq!(
        records.iter().map(|r| r.name.clone()).collect::<Vec<_>>(),
        some(&["f", "a", "g", "af", "C"])
    );
    assert_eq!(records[1].source_text, "() => 1");
}

#[test]
fn explicit_names_win() {
    assert_eq!(
        names("var x = function explicit() {}; var K = class Own {};"),
        some(&["explicit", "Own"])
    );
}

#[test]
fn class_with_static_name_member_keeps_it() {
    assert_eq!(names("var c = class { static name() {} };"), vec![None, Some("name".to_string())]);
}

#[test]
fn accessor_and_key_forms() {
    assert_eq!(
        names("var o = { get d() {}, set d(v) {}, 42: () => {}, 1e21: () => {}, 'str key': function() {} };"),
        some(&["get d", "set d", "42", "1e+21", "str key"])
    );
}

#[test]
fn legacy_octal_keys_name_by_value() {
    assert_eq!(
        names("var o = { 010: function() {}, 09: () => {} };"),
        some(&["8", "9"])
    );
}

#[test]
fn proto_setter_value_is_not_named() {
    assert_eq!(
        names("var o = { __proto__: function() {}, ['__proto__']: function() {} };"),
        some(&["", "__proto__"])
    );
}

#[test]
fn symbol_keys_use_description() {
    assert_eq!(
        names("var s = Symbol('d'), t = Symbol(); var o = { [s]: () => {}, [t]: () => {} };"),
        some(&["[d]", ""])
    );
}

#[test]
fn computed_key_is_evaluated_once_before_naming() {
    let source = "var count = 0; function key() { count++; return 'k'; }\n\
                  var o = { [key()]: function() {} };\n\
                  assertEquals(1, count); assertEquals('k', o.k.name);";
    run_source(source, &RunOptions::default()).unwrap();
}

#[test]
fn returned_functions_stay_anonymous() {
    assert_eq!(
        names("function make() { return () => {}; } var o = { [ 'k' ]: make() };"),
        some(&["make", ""])
    );
}

#[test]
fn private_elements_are_named_with_hash() {
    let names = names("class P { #f = () => {}; #m() {} get #g() {} static #s = function() {} }");
    assert_eq!(names[0], Some("P".to_string()));
    assert!(names.contains(&Some("#m".to_string())));
    assert!(names.contains(&Some("get #g".to_string())));
    assert!(names.contains(&Some("#s".to_string())));
}

#[test]
fn uncaught_assertion_failure_is_reported() {
    let err = run_source("assertEquals('a', (function() {}).name);", &RunOptions::default()).unwrap_err();
    match err {
        EngineError::Uncaught(msg) => assert!(msg.contains("expected <\"a\"> found <\"\">"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn records_serialize_as_json_lines() {
    let records = recorded("var af = async () => {};");
    let json = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(json["kind"], "arrow");
    assert_eq!(json["name"], "af");
    assert_eq!(json["source_text"], "async () => {}");
}
