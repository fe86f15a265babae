//! # Command Line Scenarios
//!
//! Runs the `tyaml` command through [`tyaml_cli::run`] with in-memory
//! output streams against the files in `testdata/`.

use tyaml_cli::run;

fn testdata(name: &str) -> String {
    format!("{}/testdata/{name}", env!("CARGO_MANIFEST_DIR"))
}

struct Outcome {
    code: u8,
    out: String,
    err: String,
}

fn tyaml(args: &[&str]) -> Outcome {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let argv = std::iter::once("tyaml").chain(args.iter().copied());
    let code = run(argv, &mut out, &mut err);
    Outcome {
        code,
        out: String::from_utf8(out).unwrap(),
        err: String::from_utf8(err).unwrap(),
    }
}

fn validate(input: &str, spec: &str, verbose: bool) -> Outcome {
    let input = testdata(input);
    let spec = testdata(spec);
    let mut args = vec!["validate", "--input", input.as_str(), "--spec", spec.as_str()];
    if verbose {
        args.push("--verbose");
    }
    tyaml(&args)
}

// ---------------------------------------------------------------------------
// Valid input
// ---------------------------------------------------------------------------

#[test]
fn valid_brief_prints_nothing() {
    for spec in ["servicespec.yaml", "servicespec.tdl"] {
        let r = validate("service.yaml", spec, false);
        assert_eq!(r.code, 0, "{spec}: {}", r.err);
        assert_eq!(r.out, "");
        assert_eq!(r.err, "");
    }
}

#[test]
fn valid_verbose_lists_every_key() {
    let r = validate("service.yaml", "servicespec.yaml", true);
    assert_eq!(r.code, 0);
    assert!(r.out.starts_with("Got input yaml with:\n  host: example.com\n  port: 22\n"));
    assert!(r.out.contains("Validating 'host' against definition string[1]\n  'host' OK!\n"));
    assert!(r.out.contains("Validating 'port' against definition 1..999\n  'port' OK!\n"));
}

#[test]
fn json_input_is_accepted() {
    let r = validate("service.json", "servicespec.tdl", false);
    assert_eq!(r.code, 0, "{}", r.err);
    assert_eq!(r.out, "");
}

// ---------------------------------------------------------------------------
// Invalid input
// ---------------------------------------------------------------------------

#[test]
fn bad_port() {
    let r = validate("service_bad_port.yaml", "servicespec.yaml", false);
    assert_eq!(r.code, 1);
    assert_eq!(r.out, "parameter 'port' is not an instance of type 1..999\n");

    let r = validate("service_bad_port.yaml", "servicespec.yaml", true);
    assert_eq!(r.code, 1);
    assert!(r.out.contains(
        "  'port' FAILED!\n  Reason: expected a value of type 1..999, got 2222\n"
    ));
}

#[test]
fn extraneous_parameter() {
    let r = validate("service_extraneous_param.yaml", "servicespec.tdl", false);
    assert_eq!(r.code, 1);
    assert_eq!(r.out, "unknown parameter 'login'\n");

    let r = validate("service_extraneous_param.yaml", "servicespec.tdl", true);
    assert_eq!(r.code, 1);
    assert!(r.out.contains(
        "Validating 'login'\n  'login' FAILED!\n  Reason: key is not found in definition\n"
    ));
}

#[test]
fn missing_required_parameter() {
    let r = validate("service_missing_host.yaml", "servicespec.yaml", false);
    assert_eq!(r.code, 1);
    assert_eq!(r.out, "missing required parameter 'host'\n");

    let r = validate("service_missing_host.yaml", "servicespec.yaml", true);
    assert!(r.out.contains("  'host' FAILED!\n  Reason: required key not found in input\n"));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn missing_files() {
    let r = validate("server.yaml", "servicespec.yaml", false);
    assert_eq!(r.code, 1);
    assert!(r.err.starts_with("Error: "));
    assert!(r.err.contains("server.yaml: no such file or directory"), "{}", r.err);

    let r = validate("service.yaml", "serverspec.tdl", false);
    assert_eq!(r.code, 1);
    assert!(r.err.contains("serverspec.tdl: no such file or directory"), "{}", r.err);
}

#[test]
fn non_map_data() {
    let r = validate("service_array.yaml", "servicespec.yaml", false);
    assert_eq!(r.code, 1);
    assert_eq!(r.err, "Error: expecting data to be a map\n");

    let r = validate("service.yaml", "servicespec_array.yaml", false);
    assert_eq!(r.code, 1);
    assert_eq!(r.err, "Error: expecting data to be a map\n");
}

#[test]
fn malformed_yaml() {
    let r = validate("bad.yaml", "servicespec.yaml", false);
    assert_eq!(r.code, 1);
    assert!(r.err.contains("did not find expected key"), "{}", r.err);
}

#[test]
fn bad_extensions() {
    let r = validate("service.pson", "servicespec.yaml", false);
    assert_eq!(r.code, 1);
    assert!(r.err.contains("expected file name to end with .yaml or .json"));

    let r = validate("service.yaml", "servicespec.go", false);
    assert_eq!(r.code, 1);
    assert!(r.err.contains("expected file name to end with .yaml, .json, or .tdl"));
}

#[test]
fn bad_type_syntax() {
    let r = validate("service.yaml", "servicespec_bad.tdl", false);
    assert_eq!(r.code, 1);
    assert_eq!(r.err, "Error: mix of elements and map entries\n");

    let r = validate("service.yaml", "servicespec_bad_type.tdl", false);
    assert_eq!(r.code, 1);
    assert!(r.err.contains("does not contain a struct definition"));
}

// ---------------------------------------------------------------------------
// Command line usage
// ---------------------------------------------------------------------------

#[test]
fn missing_command() {
    let r = tyaml(&[]);
    assert_eq!(r.code, 1);
    assert_eq!(r.err, "missing required command\n");
}

#[test]
fn unknown_command() {
    let r = tyaml(&["what"]);
    assert_eq!(r.code, 1);
    assert_eq!(r.err, "unknown command: what\n");
}

#[test]
fn unknown_flag() {
    let r = tyaml(&["validate", "--what"]);
    assert_eq!(r.code, 1);
    assert!(!r.err.is_empty());
}

#[test]
fn missing_required_options() {
    let r = tyaml(&["validate"]);
    assert_eq!(r.code, 1);
    assert_eq!(r.err, "missing required option: -input\n");

    let input = testdata("service.yaml");
    let r = tyaml(&["validate", "--input", &input]);
    assert_eq!(r.code, 1);
    assert_eq!(r.err, "missing required option: -spec\n");
}

#[test]
fn help() {
    for args in [&["help"][..], &["--help"][..]] {
        let r = tyaml(args);
        assert_eq!(r.code, 0);
        assert!(r.out.contains("validate"));
        assert!(r.out.contains("dump"));
        assert!(r.out.contains("--verbose"));
    }

    let r = tyaml(&["help", "validate"]);
    assert_eq!(r.code, 0);
    assert!(r.out.contains("--input"));
    assert!(r.out.contains("--spec"));

    let r = tyaml(&["help", "what"]);
    assert_eq!(r.code, 1);
    assert_eq!(r.err, "unknown command: what\n");
}

// ---------------------------------------------------------------------------
// Dump
// ---------------------------------------------------------------------------

#[test]
fn dump_yaml_keeps_tags() {
    let input = testdata("document.yaml");
    let r = tyaml(&["dump", "--input", &input]);
    assert_eq!(r.code, 0, "{}", r.err);
    assert!(r.out.starts_with("name: sample\n"));
    assert!(r.out.contains("!!binary AQQD"));
    assert!(r.out.contains("!!timestamp 2019-10-06T07:15:00-07:00"));
    assert!(r.out.ends_with("ports:\n  - 22\n  - 80\n"));

    let again = tyaml_core::decode(r.out.as_bytes()).unwrap();
    let original = tyaml_core::decode(&std::fs::read(&input).unwrap()).unwrap();
    assert_eq!(again, original);
}

#[test]
fn dump_json() {
    let input = testdata("document.yaml");
    let r = tyaml(&["dump", "--input", &input, "--format", "json"]);
    assert_eq!(r.code, 0, "{}", r.err);
    let json: serde_json::Value = serde_json::from_str(&r.out).unwrap();
    assert_eq!(json["name"], "sample");
    assert_eq!(json["data"], "AQQD");
    assert_eq!(json["ports"], serde_json::json!([22, 80]));
}

#[test]
fn dump_reports_the_file_on_decode_errors() {
    let input = testdata("bad.yaml");
    let r = tyaml(&["dump", "--input", &input]);
    assert_eq!(r.code, 1);
    assert!(r.err.starts_with("Error: failed to decode "));
    assert!(r.err.contains("bad.yaml: yaml: line 1"), "{}", r.err);
}

#[test]
fn dump_written_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested.json");
    std::fs::write(&path, r#"{"a": {"b": [1, "two", null]}}"#).unwrap();
    let r = tyaml(&["dump", "--input", path.to_str().unwrap()]);
    assert_eq!(r.code, 0, "{}", r.err);
    assert_eq!(r.out, "a:\n  b:\n    - 1\n    - two\n    - null\n");
}
