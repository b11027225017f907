//! Structures GeoJSON produites par le décodeur
//!
//! La sérialisation suit le format attendu par les consommateurs du dump :
//! un point s'écrit `"type": "point"` (minuscule), lignes et polygones avec
//! la casse standard. [`Geometry::to_geojson`] donne la version standard.

use geojson::Position;
use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::types::AttributeMap;

/// Géométrie décodée (pas de multi-géométries ni d'anneaux intérieurs)
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    Polygon(Vec<Vec<Position>>),
}

impl Geometry {
    /// Valeur du champ `type` en sortie
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Point(_) => "point",
            Self::LineString(_) => "LineString",
            Self::Polygon(_) => "Polygon",
        }
    }

    /// Conversion vers une géométrie GeoJSON standard (`"Point"`)
    pub fn to_geojson(&self) -> geojson::Geometry {
        let value = match self {
            Self::Point(p) => geojson::Value::Point(p.clone()),
            Self::LineString(ls) => geojson::Value::LineString(ls.clone()),
            Self::Polygon(rings) => geojson::Value::Polygon(rings.clone()),
        };
        geojson::Geometry::new(value)
    }
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Geometry", 2)?;
        state.serialize_field("type", self.type_name())?;
        match self {
            Self::Point(p) => state.serialize_field("coordinates", p)?,
            Self::LineString(ls) => state.serialize_field("coordinates", ls)?,
            Self::Polygon(rings) => state.serialize_field("coordinates", rings)?,
        }
        state.end()
    }
}

/// Propriétés d'une feature
///
/// Le décodeur ne remplit que `geometry_attributes`, le reste vient de
/// l'assemblage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Properties {
    #[serde(rename = "geometryAttributes", skip_serializing_if = "Option::is_none")]
    pub geometry_attributes: Option<AttributeMap>,

    /// Nom de la feature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_catalog_version: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i64>,

    /// Valeurs d'attributs, par id de type d'attribut
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<IndexMap<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Une feature GeoJSON
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Properties,
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Feature", 3)?;
        state.serialize_field("type", "Feature")?;
        state.serialize_field("geometry", &self.geometry)?;
        state.serialize_field("properties", &self.properties)?;
        state.end()
    }
}

/// Collection de features avec CRS nommé
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    /// Libellé descriptif (filtres appliqués), informatif seulement
    pub name: String,
    /// Nom du CRS, ex: `EPSG:5973`
    pub crs: String,
    pub features: Vec<Feature>,
}

#[derive(Serialize)]
struct NamedCrs<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    properties: CrsProperties<'a>,
}

#[derive(Serialize)]
struct CrsProperties<'a> {
    name: &'a str,
}

impl Serialize for FeatureCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FeatureCollection", 4)?;
        state.serialize_field("type", "FeatureCollection")?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field(
            "crs",
            &NamedCrs {
                kind: "name",
                properties: CrsProperties { name: &self.crs },
            },
        )?;
        state.serialize_field("features", &self.features)?;
        state.end()
    }
}
