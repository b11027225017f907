//! Tests d'intégration de l'export complet (dump JSON → fichier GeoJSON)

use std::path::PathBuf;

use datafangst::{Dump, FailurePolicy, Filters};
use datafangst_geojson::export::GeometryStyle;
use datafangst_geojson::{export_dump, ExportConfig, ExportOptions, ExportStatus};
use serde_json::{json, Value};

fn write_dump(name: &str) -> PathBuf {
    let dump = json!({
        "eksportdato": "2024-05-02 10:15:00",
        "feature2": [
            {"id": "a", "name": "Kum ved Ørje", "alias": "K-1", "type_id": 83, "data_catalog_version": "2.35", "operation": "REGISTER"},
            {"id": "b", "name": "Stikkrenne", "alias": "S-1", "type_id": 79, "data_catalog_version": "2.35", "operation": "CORRECT"},
            {"id": "c", "name": "Ukjent høyde", "alias": "U-1", "type_id": 79, "data_catalog_version": "2.35", "operation": "CORRECT"}
        ],
        "feature_geometry": [
            {"feature_id": "a", "geometry": json!({
                "type": "POINT",
                "shape": {"position": {"northing": 6586865.24, "easting": -48327.84, "height": 6.885}},
                "srid": 25833, "heightRef": "NN2000",
                "properties": {"map": {"ACCURACY": "5", "CAPTURE_DATE": "2023-06-13"}}
            }).to_string()},
            {"feature_id": "b", "geometry": json!({
                "type": "LINE",
                "shape": {"positions": [
                    {"northing": 1.0, "easting": 2.0, "height": "nan"},
                    {"northing": 3.0, "easting": 4.0, "height": "nan"}
                ]},
                "srid": 5973, "heightRef": "NN2000",
                "properties": {"map": {"ACCURACY_HEIGHT": "10"}}
            }).to_string()},
            {"feature_id": "c", "geometry": json!({
                "type": "POINT",
                "shape": {"position": {"northing": 1.0, "easting": 2.0, "height": 3.0}},
                "srid": 25833, "heightRef": "NN1954"
            }).to_string()}
        ],
        "comment": [
            {"feature_id": "a", "text": "Lokk byttet"}
        ]
    });

    let path = std::env::temp_dir().join(name);
    std::fs::write(&path, serde_json::to_string_pretty(&dump).unwrap()).unwrap();
    path
}

fn read_output(path: &PathBuf) -> Value {
    let content = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn test_export_with_isolated_failure() {
    let dump_path = write_dump("test_datafangst_dump_isolate.json");
    let output = std::env::temp_dir().join("test_datafangst_isolate.geojson");
    let dump = Dump::from_path(&dump_path).unwrap();

    let options = ExportOptions {
        config: ExportConfig {
            failure_policy: FailurePolicy::Isolate,
            ..Default::default()
        },
        ..Default::default()
    };
    let report = export_dump(&dump, "dump", &options, &output).unwrap();

    assert_eq!(report.status, ExportStatus::PartialSuccess);
    assert_eq!(report.exported, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].feature_id, "c");
    assert_eq!(report.metadata_issues.len(), 1);
    assert_eq!(report.metadata_issues[0].feature_id, "b");

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.contains("Kum ved Ørje"));

    let value = read_output(&output);
    assert_eq!(value["crs"]["properties"]["name"], "EPSG:5973");
    assert_eq!(value["features"][0]["geometry"]["type"], "point");
    assert_eq!(
        value["features"][0]["properties"]["comment"],
        "Eksportert fra datafangst 2024-05-02 10:15:00; Lokk byttet"
    );
    assert_eq!(
        value["features"][1]["properties"]["comment"],
        "Eksportert fra datafangst 2024-05-02 10:15:00"
    );

    std::fs::remove_file(dump_path).ok();
    std::fs::remove_file(output).ok();
}

#[test]
fn test_export_aborts_by_default() {
    let dump_path = write_dump("test_datafangst_dump_abort.json");
    let output = std::env::temp_dir().join("test_datafangst_abort.geojson");
    let dump = Dump::from_path(&dump_path).unwrap();

    let result = export_dump(&dump, "dump", &ExportOptions::default(), &output);
    assert!(result.is_err());

    std::fs::remove_file(dump_path).ok();
}

#[test]
fn test_export_filtered_standard_geometry() {
    let dump_path = write_dump("test_datafangst_dump_filtered.json");
    let output = std::env::temp_dir().join("test_datafangst_filtered.geojson");
    let dump = Dump::from_path(&dump_path).unwrap();

    let options = ExportOptions {
        filters: Filters {
            operations: vec!["registrer".to_string()],
            ..Default::default()
        },
        style: GeometryStyle::Standard,
        ..Default::default()
    };
    let report = export_dump(&dump, "dump", &options, &output).unwrap();

    assert_eq!(report.status, ExportStatus::Success);
    assert_eq!(report.collection, "datafangst operation=CREATE");

    let value = read_output(&output);
    assert_eq!(value["name"], "datafangst operation=CREATE");
    assert_eq!(value["features"].as_array().unwrap().len(), 1);
    assert_eq!(value["features"][0]["geometry"]["type"], "Point");
    assert_eq!(
        value["features"][0]["properties"]["geometryAttributes"]["captureDate"],
        "2023-06-13"
    );

    std::fs::remove_file(dump_path).ok();
    std::fs::remove_file(output).ok();
}

#[test]
fn test_export_no_match_writes_empty_collection() {
    let dump_path = write_dump("test_datafangst_dump_empty.json");
    let output = std::env::temp_dir().join("test_datafangst_empty.geojson");
    let dump = Dump::from_path(&dump_path).unwrap();

    let options = ExportOptions {
        filters: Filters {
            object_types: vec![10, 20],
            ..Default::default()
        },
        ..Default::default()
    };
    let report = export_dump(&dump, "dump", &options, &output).unwrap();

    assert_eq!(report.exported, 0);
    assert_eq!(report.status, ExportStatus::Success);
    assert_eq!(read_output(&output)["features"], json!([]));

    std::fs::remove_file(dump_path).ok();
    std::fs::remove_file(output).ok();
}
