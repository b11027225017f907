//! Décodage d'une géométrie brute datafangst vers une feature GeoJSON
//!
//! Principe "fail early" : toute complexité non prise en charge (anneaux
//! intérieurs, SRID ou référence de hauteur inconnus) est une erreur.

use geojson::Position;
use tracing::trace;

use crate::error::{DatafangstError, Result};
use crate::keys::camel_case;
use crate::output::{Feature, Geometry, Properties};
use crate::types::{
    AttributeMap, Coord, RawGeometry, Shape, SUPPORTED_HEIGHT_REF, SUPPORTED_SRIDS,
};

/// Construit une position `[est, nord]`, plus la hauteur si elle existe
///
/// L'ordre x avant y est imposé par GeoJSON.
pub fn make_position(coord: &Coord) -> Position {
    match coord.height {
        Some(h) => vec![coord.easting, coord.northing, h],
        None => vec![coord.easting, coord.northing],
    }
}

fn make_positions(coords: &[Coord]) -> Vec<Position> {
    coords.iter().map(make_position).collect()
}

/// Décode une géométrie brute en feature GeoJSON
///
/// Seul `properties.geometryAttributes` est renseigné : les métadonnées
/// d'identité (tag, type_id...) sont ajoutées par l'assemblage.
///
/// # Errors
///
/// - `UnsupportedPolygonFeature` si un polygone a des anneaux intérieurs
/// - `UnsupportedReferenceSystem` si le SRID n'est pas dans [`SUPPORTED_SRIDS`]
/// - `UnsupportedHeightReference` si la référence de hauteur n'est pas NN2000
pub fn decode(raw: &RawGeometry) -> Result<Feature> {
    let geometry = match &raw.shape {
        Shape::Point { position } => Geometry::Point(make_position(position)),
        Shape::Line { positions } => Geometry::LineString(make_positions(positions)),
        Shape::Polygon {
            exterior_ring,
            interior_rings,
        } => {
            if !interior_rings.is_empty() {
                return Err(DatafangstError::UnsupportedPolygonFeature {
                    interior_rings: interior_rings.len(),
                });
            }
            Geometry::Polygon(vec![make_positions(&exterior_ring.positions)])
        }
    };

    if !SUPPORTED_SRIDS.contains(&raw.srid) {
        return Err(DatafangstError::UnsupportedReferenceSystem(raw.srid));
    }
    if raw.height_ref != SUPPORTED_HEIGHT_REF {
        return Err(DatafangstError::UnsupportedHeightReference(
            raw.height_ref.clone(),
        ));
    }

    trace!(kind = raw.kind().as_str(), srid = raw.srid, "Decoded geometry");

    Ok(Feature {
        geometry,
        properties: Properties {
            geometry_attributes: raw.attributes.as_ref().map(convert_attributes),
            ..Default::default()
        },
    })
}

/// Parse puis décode un document géométrique sérialisé
pub fn decode_json(document: &str) -> Result<Feature> {
    decode(&RawGeometry::from_json(document)?)
}

/// Renomme les clés en lowerCamelCase, valeurs et ordre inchangés
fn convert_attributes(map: &AttributeMap) -> AttributeMap {
    map.iter()
        .map(|(key, value)| (camel_case(key), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Ring;
    use serde_json::json;

    fn raw(shape: Shape, srid: i64, height_ref: &str) -> RawGeometry {
        RawGeometry {
            shape,
            srid,
            height_ref: height_ref.to_string(),
            attributes: None,
        }
    }

    fn point_3d() -> Shape {
        Shape::Point {
            position: Coord::new_3d(-48327.84, 6586865.24, 6.885),
        }
    }

    #[test]
    fn test_make_position() {
        assert_eq!(
            make_position(&Coord::new_3d(10.0, 20.0, 30.0)),
            vec![10.0, 20.0, 30.0]
        );
        assert_eq!(make_position(&Coord::new_2d(10.0, 20.0)), vec![10.0, 20.0]);
    }

    #[test]
    fn test_decode_point_example() {
        let doc = json!({
            "type": "POINT",
            "shape": {"position": {"easting": -48327.84, "northing": 6586865.24, "height": 6.885}},
            "srid": 25833,
            "heightRef": "NN2000",
            "properties": {"map": {"ACCURACY": "5", "CAPTURE_DATE": "2023-06-13"}}
        });

        let feature = decode_json(&doc.to_string()).unwrap();

        assert_eq!(
            serde_json::to_value(&feature).unwrap(),
            json!({
                "type": "Feature",
                "geometry": {"type": "point", "coordinates": [-48327.84, 6586865.24, 6.885]},
                "properties": {"geometryAttributes": {"accuracy": "5", "captureDate": "2023-06-13"}}
            })
        );
    }

    #[test]
    fn test_attribute_order_preserved() {
        let mut attributes = AttributeMap::new();
        attributes.insert("VISIBILITY".to_string(), "0".to_string());
        attributes.insert("ACCURACY".to_string(), "5".to_string());
        let mut geom = raw(point_3d(), 25833, "NN2000");
        geom.attributes = Some(attributes);

        let feature = decode(&geom).unwrap();
        let keys: Vec<_> = feature
            .properties
            .geometry_attributes
            .unwrap()
            .into_keys()
            .collect();
        assert_eq!(keys, vec!["visibility", "accuracy"]);
    }

    #[test]
    fn test_decode_line_2d() {
        let shape = Shape::Line {
            positions: vec![Coord::new_2d(1.0, 2.0), Coord::new_2d(3.0, 4.0)],
        };
        let feature = decode(&raw(shape, 5973, "NN2000")).unwrap();
        assert_eq!(
            feature.geometry,
            Geometry::LineString(vec![vec![1.0, 2.0], vec![3.0, 4.0]])
        );
        assert!(feature.properties.geometry_attributes.is_none());
    }

    #[test]
    fn test_decode_polygon() {
        let ring = Ring {
            positions: vec![
                Coord::new_3d(0.0, 0.0, 1.0),
                Coord::new_3d(1.0, 0.0, 1.0),
                Coord::new_3d(0.0, 1.0, 1.0),
                Coord::new_3d(0.0, 0.0, 1.0),
            ],
        };
        let shape = Shape::Polygon {
            exterior_ring: ring,
            interior_rings: vec![],
        };
        let feature = decode(&raw(shape, 25833, "NN2000")).unwrap();
        match feature.geometry {
            Geometry::Polygon(rings) => {
                assert_eq!(rings.len(), 1);
                assert_eq!(rings[0].len(), 4);
                assert_eq!(rings[0][1], vec![1.0, 0.0, 1.0]);
            }
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn test_polygon_with_interior_ring_fails() {
        let shape = Shape::Polygon {
            exterior_ring: Ring::default(),
            interior_rings: vec![Ring {
                positions: vec![Coord::new_2d(0.5, 0.5)],
            }],
        };
        let err = decode(&raw(shape, 25833, "NN2000")).unwrap_err();
        assert!(matches!(
            err,
            DatafangstError::UnsupportedPolygonFeature { interior_rings: 1 }
        ));
    }

    #[test]
    fn test_reference_system_whitelist() {
        for srid in SUPPORTED_SRIDS {
            assert!(decode(&raw(point_3d(), *srid, "NN2000")).is_ok());
        }

        let err = decode(&raw(point_3d(), 4326, "NN2000")).unwrap_err();
        assert!(matches!(err, DatafangstError::UnsupportedReferenceSystem(4326)));

        let err = decode(&raw(point_3d(), 25833, "NN1954")).unwrap_err();
        assert!(matches!(err, DatafangstError::UnsupportedHeightReference(ref h) if h == "NN1954"));

        let err = decode(&raw(point_3d(), 25833, "")).unwrap_err();
        assert!(matches!(err, DatafangstError::UnsupportedHeightReference(_)));
    }

    #[test]
    fn test_unsupported_type() {
        let err = decode_json(
            r#"{"type":"MULTILINE","shape":{},"srid":25833,"heightRef":"NN2000"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DatafangstError::UnsupportedGeometryType(ref t) if t == "MULTILINE"));
    }

    #[test]
    fn test_decode_does_not_touch_input() {
        let mut attributes = AttributeMap::new();
        attributes.insert("CAPTURE_DATE".to_string(), "2023-06-13".to_string());
        let mut geom = raw(point_3d(), 25833, "NN2000");
        geom.attributes = Some(attributes);
        let before = geom.clone();

        let first = decode(&geom).unwrap();
        let second = decode(&geom).unwrap();

        assert_eq!(geom, before);
        assert_eq!(first, second);
    }
}
