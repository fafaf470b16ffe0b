mod common;

use common::TestEnv;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

fn load_schema(name: &str) -> Value {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let raw = fs::read_to_string(root.join("docs/contracts").join(name)).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn validate(schema_name: &str, data: &Value) {
    let schema = load_schema(schema_name);
    let validator = JSONSchema::compile(&schema).expect("compile schema");
    let msgs: Vec<String> = match validator.validate(data) {
        Ok(()) => return,
        Err(errors) => errors.map(|e| e.to_string()).collect(),
    };
    panic!("schema validation failed: {}", msgs.join(" | "));
}

#[test]
fn contracts_check() {
    let env = TestEnv::new();

    let full = env.run_json("labX", "2023-01-01", "2023-01-31", &env.pdf("labx.pdf"));
    validate("report.schema.json", &full);

    let quiet = env.run_json("quietlab", "2023-01-01", "2023-01-31", &env.pdf("quiet.pdf"));
    validate("report.schema.json", &quiet);

    let empty = env.run_json("ghostlab", "2023-01-01", "2023-01-31", &env.pdf("ghost.pdf"));
    validate("report.schema.json", &empty);

    for (group, start, end, code) in [
        ("labX", "2023-02-01", "2023-01-01", 2),
        ("nosuchgroup", "2023-01-01", "2023-01-31", 3),
        ("brokenlab", "2023-01-01", "2023-01-31", 4),
    ] {
        let err = env.run_json_failure(group, start, end, &env.pdf("err.pdf"), code);
        validate("error.schema.json", &err);
    }
}
