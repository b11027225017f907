//! Écriture d'une FeatureCollection en GeoJSON
//!
//! JSON indenté, UTF-8, caractères non ASCII écrits tels quels.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geojson::JsonObject;
use serde_json::Value;

use datafangst::FeatureCollection;

/// Orthographe des types de géométrie en sortie
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeometryStyle {
    /// Format datafangst : `"point"` en minuscules
    #[default]
    Native,
    /// GeoJSON strict : `"Point"`
    Standard,
}

/// Écrit la collection dans un fichier
pub fn write_collection(
    collection: &FeatureCollection,
    style: GeometryStyle,
    output_path: &Path,
) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    write_collection_to(&mut writer, collection, style)?;
    writer.flush()?;

    Ok(())
}

/// Écrit la collection dans un flux quelconque
pub fn write_collection_to<W: Write>(
    writer: &mut W,
    collection: &FeatureCollection,
    style: GeometryStyle,
) -> Result<()> {
    match style {
        GeometryStyle::Native => serde_json::to_writer_pretty(&mut *writer, collection)?,
        GeometryStyle::Standard => {
            serde_json::to_writer_pretty(&mut *writer, &to_standard(collection)?)?
        }
    }
    writeln!(writer)?;
    Ok(())
}

/// Convertit vers les types du crate `geojson` (membres `name` et `crs` en foreign members)
fn to_standard(collection: &FeatureCollection) -> Result<geojson::FeatureCollection> {
    let features = collection
        .features
        .iter()
        .map(|feature| -> Result<geojson::Feature> {
            let properties = match serde_json::to_value(&feature.properties)? {
                Value::Object(map) => map,
                _ => JsonObject::new(),
            };
            Ok(geojson::Feature {
                bbox: None,
                geometry: Some(feature.geometry.to_geojson()),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut foreign = JsonObject::new();
    foreign.insert("name".to_string(), Value::String(collection.name.clone()));
    foreign.insert(
        "crs".to_string(),
        serde_json::json!({"type": "name", "properties": {"name": collection.crs}}),
    );

    Ok(geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafangst::output::Properties;
    use datafangst::{Feature, Geometry};
    use std::io::Cursor;

    fn collection() -> FeatureCollection {
        FeatureCollection {
            name: "datafangst".to_string(),
            crs: "EPSG:5973".to_string(),
            features: vec![Feature {
                geometry: Geometry::Point(vec![10.0, 60.0, 1.5]),
                properties: Properties {
                    tag: Some("Bru over Åelva".to_string()),
                    type_id: Some(60),
                    ..Default::default()
                },
            }],
        }
    }

    #[test]
    fn test_native_output_keeps_utf8() {
        let mut buffer = Cursor::new(Vec::new());
        write_collection_to(&mut buffer, &collection(), GeometryStyle::Native).unwrap();

        let json = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(json.contains("Bru over Åelva"));
        assert!(json.contains(r#""type": "point""#));
        assert!(json.contains("EPSG:5973"));
        assert!(json.ends_with('\n'));
        // indentation
        assert!(json.contains("\n  \"features\""));
    }

    #[test]
    fn test_standard_output() {
        let mut buffer = Cursor::new(Vec::new());
        write_collection_to(&mut buffer, &collection(), GeometryStyle::Standard).unwrap();

        let value: Value = serde_json::from_slice(&buffer.into_inner()).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["name"], "datafangst");
        assert_eq!(value["crs"]["properties"]["name"], "EPSG:5973");
        assert_eq!(value["features"][0]["geometry"]["type"], "Point");
        assert_eq!(value["features"][0]["properties"]["type_id"], 60);
    }

    #[test]
    fn test_write_collection_file() {
        let path = std::env::temp_dir().join("test_datafangst_export.geojson");

        write_collection(&collection(), GeometryStyle::Native, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains(r#""type": "FeatureCollection""#));

        std::fs::remove_file(path).ok();
    }
}
