//! Modèle des géométries brutes de la base datafangst
//!
//! Une géométrie brute est un document JSON de la forme :
//!
//! ```json
//! {
//!     "type": "POINT",
//!     "shape": { "position": { "northing": 6586865.24, "easting": -48327.84, "height": 6.885 } },
//!     "srid": 25833,
//!     "heightRef": "NN2000",
//!     "properties": { "map": { "ACCURACY": "5", "CAPTURE_DATE": "2023-06-13" } }
//! }
//! ```
//!
//! Le champ `type` sélectionne la forme de `shape` : on le traduit en enum
//! fermé dès la lecture, un type inconnu est une erreur et jamais ignoré.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{DatafangstError, Result};

/// SRID acceptés par le décodeur
pub const SUPPORTED_SRIDS: &[i64] = &[25833, 5973];

/// Seule référence de hauteur acceptée
pub const SUPPORTED_HEIGHT_REF: &str = "NN2000";

/// Attributs libres de qualité géométrique (clé -> valeur), ordre conservé
pub type AttributeMap = IndexMap<String, String>;

/// Une position nord/est avec hauteur optionnelle
///
/// `height == None` signifie une coordonnée 2D.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coord {
    pub easting: f64,
    pub northing: f64,
    #[serde(default, deserialize_with = "deserialize_height")]
    pub height: Option<f64>,
}

impl Coord {
    pub fn new_2d(easting: f64, northing: f64) -> Self {
        Self {
            easting,
            northing,
            height: None,
        }
    }

    pub fn new_3d(easting: f64, northing: f64, height: f64) -> Self {
        Self {
            easting,
            northing,
            height: Some(height),
        }
    }

    pub fn is_3d(&self) -> bool {
        self.height.is_some()
    }
}

/// Hauteur telle qu'elle apparaît dans le dump : nombre, ou marqueur texte "nan"
#[derive(Deserialize)]
#[serde(untagged)]
enum HeightRepr {
    Number(f64),
    Text(String),
}

fn deserialize_height<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<HeightRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(HeightRepr::Number(h)) if h.is_finite() => Ok(Some(h)),
        Some(HeightRepr::Number(_)) => Ok(None),
        Some(HeightRepr::Text(t)) if t.trim().eq_ignore_ascii_case("nan") => Ok(None),
        Some(HeightRepr::Text(t)) => Err(D::Error::custom(format!("invalid height value: {t:?}"))),
    }
}

/// Suite ordonnée de positions
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Ring {
    #[serde(default)]
    pub positions: Vec<Coord>,
}

/// Types de géométrie connus de la base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

impl GeometryKind {
    /// Lit le champ `type` du document brut
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "POINT" => Ok(Self::Point),
            "LINE" => Ok(Self::Line),
            "POLYGON" => Ok(Self::Polygon),
            other => Err(DatafangstError::UnsupportedGeometryType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Point => "POINT",
            Self::Line => "LINE",
            Self::Polygon => "POLYGON",
        }
    }
}

/// Forme géométrique, une variante par type brut
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point {
        position: Coord,
    },
    Line {
        positions: Vec<Coord>,
    },
    Polygon {
        exterior_ring: Ring,
        interior_rings: Vec<Ring>,
    },
}

#[derive(Deserialize)]
struct PointShape {
    position: Coord,
}

#[derive(Deserialize)]
struct LineShape {
    positions: Vec<Coord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolygonShape {
    exterior_ring: Ring,
    #[serde(default)]
    interior_rings: Option<Vec<Ring>>,
}

impl Shape {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Point { .. } => GeometryKind::Point,
            Self::Line { .. } => GeometryKind::Line,
            Self::Polygon { .. } => GeometryKind::Polygon,
        }
    }

    /// Lit le payload `shape` selon le type annoncé
    fn from_value(kind: GeometryKind, shape: Value) -> std::result::Result<Self, serde_json::Error> {
        Ok(match kind {
            GeometryKind::Point => {
                let PointShape { position } = serde_json::from_value(shape)?;
                Self::Point { position }
            }
            GeometryKind::Line => {
                let LineShape { positions } = serde_json::from_value(shape)?;
                Self::Line { positions }
            }
            GeometryKind::Polygon => {
                let PolygonShape {
                    exterior_ring,
                    interior_rings,
                } = serde_json::from_value(shape)?;
                Self::Polygon {
                    exterior_ring,
                    interior_rings: interior_rings.unwrap_or_default(),
                }
            }
        })
    }
}

/// Document brut tel que stocké dans la colonne `geometry`
///
/// Les champs ignorés (`representationPoint`, `length`, `operation`...) sont
/// acceptés et perdus.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGeometryDocument {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    shape: Value,
    srid: i64,
    #[serde(default)]
    height_ref: Option<String>,
    #[serde(default)]
    properties: Option<RawProperties>,
}

#[derive(Deserialize)]
struct RawProperties {
    #[serde(default)]
    map: Option<AttributeMap>,
}

/// Géométrie brute typée, lue une fois et jamais modifiée en place
#[derive(Debug, Clone, PartialEq)]
pub struct RawGeometry {
    pub shape: Shape,
    pub srid: i64,
    pub height_ref: String,
    /// `None` quand `properties.map` est absent du document
    pub attributes: Option<AttributeMap>,
}

impl RawGeometry {
    /// Parse un document JSON sérialisé
    pub fn from_json(document: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(document)?;
        Self::from_value(value)
    }

    /// Construit la géométrie typée depuis un document déjà parsé
    ///
    /// Le type est vérifié avant la forme du payload, pour qu'un type inconnu
    /// donne toujours `UnsupportedGeometryType`.
    pub fn from_value(value: Value) -> Result<Self> {
        let doc: RawGeometryDocument = serde_json::from_value(value)?;
        let kind = GeometryKind::parse(&doc.kind)?;
        let shape = Shape::from_value(kind, doc.shape)?;

        Ok(Self {
            shape,
            srid: doc.srid,
            height_ref: doc.height_ref.unwrap_or_default(),
            attributes: doc.properties.and_then(|p| p.map),
        })
    }

    pub fn kind(&self) -> GeometryKind {
        self.shape.kind()
    }

    /// Toutes les positions de la géométrie, anneaux intérieurs compris
    pub fn coords(&self) -> Box<dyn Iterator<Item = &Coord> + '_> {
        match &self.shape {
            Shape::Point { position } => Box::new(std::iter::once(position)),
            Shape::Line { positions } => Box::new(positions.iter()),
            Shape::Polygon {
                exterior_ring,
                interior_rings,
            } => Box::new(
                exterior_ring
                    .positions
                    .iter()
                    .chain(interior_rings.iter().flat_map(|r| r.positions.iter())),
            ),
        }
    }
}
