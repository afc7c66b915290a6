#![allow(deprecated)]

/// End-to-end tests for the kwyk2nidm binary
use assert_cmd::Command;
use oxrdf::{Graph, Literal, NamedNode, NamedNodeRef, TripleRef};
use oxttl::TurtleParser;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const KWYK: &str = "http://purl.org/nidash/kwyk#";
const NIDM: &str = "http://purl.org/nidash/nidm#";
const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";

const REGISTRY: &str = r#"{
  "count": 2,
  "KWYK(structure='Left-Hippocampus', measure='number_voxels', unit='voxels')": {
    "id": "000001",
    "structure_id": 17,
    "label": "Left-Hippocampus number_voxels (voxels)",
    "isAbout": "http://purl.obolibrary.org/obo/UBERON_0001954"
  },
  "KWYK(structure='Left-Hippocampus', measure='vol_inmm3', unit='mm^3')": {
    "id": "000002",
    "structure_id": 17,
    "label": "Left-Hippocampus vol_inmm3 (mm^3)",
    "isAbout": "http://purl.obolibrary.org/obo/UBERON_0001954"
  }
}
"#;

const MAPPING: &str = r#"{
  "Measures": {
    "vol_inmm3": {
      "datumType": "http://uri.interlex.org/base/ilx_0738276",
      "hasUnit": "mm^3",
      "measureOf": "http://uri.interlex.org/base/ilx_0112559"
    }
  },
  "Structures": {}
}
"#;

const KNOWN_STATS: &str = "label kwyk_index number_voxels vol_inmm3\n\
                           Left-Hippocampus 17 4123 3987.5\n";

const UNKNOWN_STATS: &str = "label kwyk_index number_voxels vol_inmm3\n\
                             Brain-Stem 16 100 95.5\n";

/// Temp working dir with a registry, mapping and one stats file
fn workspace(stats: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("kwyk-cdes.json"), REGISTRY).unwrap();
    fs::write(temp_dir.path().join("kwykmap.json"), MAPPING).unwrap();
    fs::write(temp_dir.path().join("sub-01.stats"), stats).unwrap();
    temp_dir
}

fn iri(base: &str, local: &str) -> NamedNode {
    NamedNode::new(format!("{}{}", base, local)).unwrap()
}

fn read_graph(path: &Path) -> Graph {
    let content = fs::read_to_string(path).unwrap();
    let mut graph = Graph::new();
    for triple in TurtleParser::new().for_reader(content.as_bytes()) {
        graph.insert(&triple.unwrap());
    }
    graph
}

fn kwyk2nidm(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kwyk2nidm").unwrap();
    cmd.current_dir(dir)
        .arg("--cde-file")
        .arg("kwyk-cdes.json")
        .arg("--map-file")
        .arg("kwykmap.json");
    cmd
}

/// Known structures convert with the default output name
#[test]
fn test_convert_known_structures() {
    let temp_dir = workspace(KNOWN_STATS);

    kwyk2nidm(temp_dir.path())
        .arg("-f")
        .arg("sub-01.stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 measurements"));

    let ttl = fs::read_to_string(temp_dir.path().join("sub-01.stats.ttl")).unwrap();
    assert!(ttl.contains("@prefix kwyk: <http://purl.org/nidash/kwyk#> ."));

    let graph = read_graph(&temp_dir.path().join("sub-01.stats.ttl"));
    let collection_type = iri(NIDM, "KWYKStatsCollection");
    let collection = graph
        .subject_for_predicate_object(NamedNodeRef::new_unchecked(RDF_TYPE), collection_type.as_ref())
        .unwrap();

    let voxels = iri(KWYK, "kwyk_000001");
    let integer = iri(XSD, "integer");
    assert!(graph.contains(TripleRef::new(
        collection,
        voxels.as_ref(),
        Literal::new_typed_literal("4123", integer).as_ref(),
    )));
    let volume = iri(KWYK, "kwyk_000002");
    let float = iri(XSD, "float");
    assert!(graph.contains(TripleRef::new(
        collection,
        volume.as_ref(),
        Literal::new_typed_literal("3987.5", float).as_ref(),
    )));
    let agent_type = NamedNode::new_unchecked("http://www.w3.org/ns/prov#SoftwareAgent");
    assert!(graph
        .subject_for_predicate_object(NamedNodeRef::new_unchecked(RDF_TYPE), agent_type.as_ref())
        .is_some());

    let registry = fs::read_to_string(temp_dir.path().join("kwyk-cdes.json")).unwrap();
    assert_eq!(registry, REGISTRY, "Registry should not be rewritten");
}

/// Strict mode rejects an unknown structure and leaves the registry alone
#[test]
fn test_strict_unknown_structure_fails() {
    let temp_dir = workspace(UNKNOWN_STATS);

    kwyk2nidm(temp_dir.path())
        .arg("--kwyk_stats")
        .arg("sub-01.stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Brain-Stem"));

    let registry = fs::read_to_string(temp_dir.path().join("kwyk-cdes.json")).unwrap();
    assert_eq!(registry, REGISTRY);
    assert!(!temp_dir.path().join("sub-01.stats.ttl").exists());
}

/// Non-strict mode registers new structures with the next ids
#[test]
fn test_no_strict_registers_new_structures() {
    let temp_dir = workspace(UNKNOWN_STATS);

    kwyk2nidm(temp_dir.path())
        .arg("-f")
        .arg("sub-01.stats")
        .arg("--no-strict")
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered new data elements"));

    let registry: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp_dir.path().join("kwyk-cdes.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(registry["count"], 4);
    assert_eq!(
        registry["KWYK(structure='Brain-Stem', measure='vol_inmm3', unit='mm^3')"]["id"],
        "000004"
    );
}

/// Output name override and CDE graph generation
#[test]
fn test_outfile_and_gen_nidm() {
    let temp_dir = workspace(KNOWN_STATS);

    kwyk2nidm(temp_dir.path())
        .arg("-f")
        .arg("sub-01.stats")
        .arg("-o")
        .arg("out.ttl")
        .arg("-g")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote CDE graph"));

    assert!(temp_dir.path().join("out.ttl").exists());
    assert!(!temp_dir.path().join("sub-01.stats.ttl").exists());

    let graph = read_graph(&temp_dir.path().join("KWYK-NIDM.ttl"));
    let data_element = iri(KWYK, "DataElement");
    let nidm_data_element = iri(NIDM, "DataElement");
    assert!(graph.contains(TripleRef::new(
        data_element.as_ref(),
        NamedNodeRef::new_unchecked(RDFS_SUBCLASS_OF),
        nidm_data_element.as_ref(),
    )));

    let cde = iri(KWYK, "kwyk_000001");
    let is_about = iri(NIDM, "isAbout");
    let hippocampus = NamedNode::new_unchecked("http://purl.obolibrary.org/obo/UBERON_0001954");
    assert!(graph.contains(TripleRef::new(
        cde.as_ref(),
        is_about.as_ref(),
        hippocampus.as_ref(),
    )));
    let structure = iri(KWYK, "structure");
    assert!(graph.contains(TripleRef::new(
        cde.as_ref(),
        structure.as_ref(),
        Literal::new_simple_literal("Left-Hippocampus").as_ref(),
    )));
}

/// Merging the mapping annotates records and records placeholders
#[test]
fn test_merge_mapping() {
    let temp_dir = workspace(KNOWN_STATS);

    kwyk2nidm(temp_dir.path())
        .arg("-f")
        .arg("sub-01.stats")
        .arg("--merge-mapping")
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged mapping"));

    let registry = fs::read_to_string(temp_dir.path().join("kwyk-cdes.json")).unwrap();
    assert!(registry.contains("ilx_0112559"));

    let mapping: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp_dir.path().join("kwykmap.json")).unwrap(),
    )
    .unwrap();
    assert!(mapping["Structures"]["Left-Hippocampus"].is_object());
    assert!(mapping["Measures"]["number_voxels"].is_object());
}

/// Config file values apply, flags override them
#[test]
fn test_config_file() {
    let temp_dir = workspace(UNKNOWN_STATS);
    fs::write(
        temp_dir.path().join("kwyk2nidm.toml"),
        "[registry]\nstrict = false\n",
    )
    .unwrap();

    kwyk2nidm(temp_dir.path())
        .arg("-f")
        .arg("sub-01.stats")
        .assert()
        .success();

    let registry = fs::read_to_string(temp_dir.path().join("kwyk-cdes.json")).unwrap();
    assert!(registry.contains("Brain-Stem"));
}

/// Missing stats file is an error
#[test]
fn test_missing_stats_file() {
    let temp_dir = workspace(KNOWN_STATS);

    kwyk2nidm(temp_dir.path())
        .arg("-f")
        .arg("nope.stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.stats"));
}

/// The stats argument is required
#[test]
fn test_requires_stats_argument() {
    let mut cmd = Command::cargo_bin("kwyk2nidm").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--kwyk_stats"));
}
