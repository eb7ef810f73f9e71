use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Output};

use geff::metadata::Axis;
use geff::{GeffMetadata, InMemoryGeff, NdArray, WriteOptions, write_to_path};
use serde_json::Value;

fn geff() -> Command {
    Command::new(env!("CARGO_BIN_EXE_geff"))
}

fn run(args: &[&str]) -> Output {
    geff().args(args).output().expect("run geff")
}

fn write_graph(path: &Path, edges: &[[i64; 2]]) {
    let graph = InMemoryGeff {
        metadata: GeffMetadata::new(true).with_axes(vec![Axis::space("x").with_bounds(0.5, 2.5)]),
        node_ids: NdArray::from_vec_1d(vec![0i64, 1, 2]),
        edge_ids: NdArray::from_rows(edges),
        node_props: BTreeMap::from([(
            "x".to_string(),
            geff::PropArrays::new(NdArray::from_vec_1d(vec![0.5f64, 1.5, 2.5])).into(),
        )]),
        edge_props: BTreeMap::new(),
    };
    write_to_path(path, &graph, &WriteOptions::default()).expect("write store");
}

#[test]
fn validate_accepts_written_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.geff");
    write_graph(&path, &[[0, 1], [1, 2]]);
    let path = path.to_str().unwrap();

    let out = run(&["validate", path, "--data"]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), format!("{path} is valid"));
}

#[test]
fn validate_rejects_missing_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.geff");
    let out = run(&["validate", path.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
}

#[test]
fn data_flag_catches_self_edges() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.geff");
    write_graph(&path, &[[0, 0], [1, 2]]);
    let path = path.to_str().unwrap();

    assert!(run(&["validate", path]).status.success());
    let out = run(&["validate", path, "--data"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Self edges found"));
}

#[test]
fn info_prints_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.geff");
    write_graph(&path, &[[0, 1]]);

    let out = run(&["info", path.to_str().unwrap()]);
    assert!(out.status.success());
    let doc: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(doc["directed"], Value::Bool(true));
    assert_eq!(doc["geff_version"], Value::String(geff::GEFF_VERSION.to_string()));
    assert_eq!(doc["axes"][0]["name"], "x");
    assert_eq!(doc["axes"][0]["min"], 0.5);
    assert_eq!(doc["node_props_metadata"]["x"]["dtype"], "float64");
}
