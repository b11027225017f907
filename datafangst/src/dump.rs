//! Tables d'un dump de la base datafangst, déjà chargées en mémoire
//!
//! Un dump est un objet JSON avec une clé par table (liste de lignes) et un
//! horodatage d'export optionnel `eksportdato`. Les tables inconnues sont
//! ignorées, une table absente est traitée comme vide.
//!
//! `feature_id` peut être nul dans les tables secondaires (commentaire de
//! projet par exemple) : ces lignes sont chargées mais ne sont rattachées à
//! aucune feature.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{DatafangstError, Result};
use crate::types::RawGeometry;

/// Une ligne de la table `feature`
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureRow {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    pub type_id: i64,
    #[serde(default)]
    pub data_catalog_version: Option<Value>,
    /// Opération d'écriture (CREATE, CORRECT...), telle que stockée
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    /// Colonnes non modélisées, conservées telles quelles
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Contenu de la colonne `geometry` : texte JSON ou document déjà parsé
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GeometryColumn {
    Text(String),
    Document(Value),
}

/// Une ligne de la table `feature_geometry`
#[derive(Debug, Clone, Deserialize)]
pub struct GeometryRow {
    #[serde(default)]
    pub feature_id: Option<String>,
    pub geometry: GeometryColumn,
}

impl GeometryRow {
    /// Parse la colonne géométrie en géométrie brute typée
    ///
    /// Les erreurs JSON sont rattachées à la feature. Les erreurs structurelles
    /// (type inconnu...) remontent telles quelles.
    pub fn raw_geometry(&self) -> Result<RawGeometry> {
        let feature_id = self.feature_id.as_deref().unwrap_or_default();
        let value = match &self.geometry {
            GeometryColumn::Text(text) => serde_json::from_str(text)
                .map_err(|e| DatafangstError::invalid_document(feature_id, e.to_string()))?,
            GeometryColumn::Document(value) => value.clone(),
        };

        RawGeometry::from_value(value).map_err(|e| match e {
            DatafangstError::Json(e) => DatafangstError::invalid_document(feature_id, e.to_string()),
            other => other,
        })
    }
}

/// Une ligne de la table `feature_attribute`
#[derive(Debug, Clone, Deserialize)]
pub struct AttributeRow {
    #[serde(default)]
    pub feature_id: Option<String>,
    /// Id du type d'attribut
    pub type_id: i64,
    #[serde(default)]
    pub value: Value,
}

/// Une ligne de la table `comment`
#[derive(Debug, Clone, Deserialize)]
pub struct CommentRow {
    /// Nul pour un commentaire de projet
    #[serde(default)]
    pub feature_id: Option<String>,
    #[serde(alias = "comment")]
    pub text: String,
}

/// Dump complet d'un projet
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dump {
    /// Date d'export du dump
    #[serde(default, alias = "export_date")]
    pub eksportdato: Option<String>,

    #[serde(default, alias = "feature2")]
    feature: Option<Vec<FeatureRow>>,

    #[serde(default)]
    feature_geometry: Option<Vec<GeometryRow>>,

    #[serde(default, alias = "feature_attribute2")]
    feature_attribute: Option<Vec<AttributeRow>>,

    #[serde(default)]
    comment: Option<Vec<CommentRow>>,
}

impl Dump {
    /// Construit un dump à partir de tables déjà chargées
    pub fn new(
        features: Vec<FeatureRow>,
        geometries: Vec<GeometryRow>,
        attributes: Vec<AttributeRow>,
        comments: Vec<CommentRow>,
    ) -> Self {
        Self {
            eksportdato: None,
            feature: Some(features),
            feature_geometry: Some(geometries),
            feature_attribute: Some(attributes),
            comment: Some(comments),
        }
    }

    /// Lit un dump JSON depuis un fichier
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Lit un dump JSON
    pub fn from_json(content: &str) -> Result<Self> {
        let dump: Self = serde_json::from_str(content)?;
        dump.log_missing_tables();
        dump.log_unkeyed_rows();
        Ok(dump)
    }

    fn log_unkeyed_rows(&self) {
        let tables = [
            (
                "feature_geometry",
                self.geometries().iter().filter(|g| g.feature_id.is_none()).count(),
            ),
            (
                "feature_attribute",
                self.attributes().iter().filter(|a| a.feature_id.is_none()).count(),
            ),
            (
                "comment",
                self.comments().iter().filter(|c| c.feature_id.is_none()).count(),
            ),
        ];
        for (table, count) in tables {
            if count > 0 {
                debug!(table, count, "Rows without feature_id, not attached to any feature");
            }
        }
    }

    fn log_missing_tables(&self) {
        let tables = [
            ("feature", self.feature.is_none()),
            ("feature_geometry", self.feature_geometry.is_none()),
            ("feature_attribute", self.feature_attribute.is_none()),
            ("comment", self.comment.is_none()),
        ];
        for (table, missing) in tables {
            if missing {
                debug!(table, "Table missing from dump, treated as empty");
            }
        }
    }

    pub fn features(&self) -> &[FeatureRow] {
        self.feature.as_deref().unwrap_or_default()
    }

    pub fn geometries(&self) -> &[GeometryRow] {
        self.feature_geometry.as_deref().unwrap_or_default()
    }

    pub fn attributes(&self) -> &[AttributeRow] {
        self.feature_attribute.as_deref().unwrap_or_default()
    }

    pub fn comments(&self) -> &[CommentRow] {
        self.comment.as_deref().unwrap_or_default()
    }

    /// Lignes `feature` ayant cet identifiant
    pub fn features_with_id<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a FeatureRow> + 'a {
        self.features().iter().filter(move |f| f.id == id)
    }

    /// Commentaires sans feature (niveau projet)
    pub fn project_comments(&self) -> impl Iterator<Item = &CommentRow> {
        self.comments().iter().filter(|c| c.feature_id.is_none())
    }

    /// Lignes géométrie d'une feature
    pub fn geometries_of<'a>(&'a self, feature_id: &'a str) -> impl Iterator<Item = &'a GeometryRow> + 'a {
        self.geometries()
            .iter()
            .filter(move |g| g.feature_id.as_deref() == Some(feature_id))
    }

    /// Lignes attribut d'une feature
    pub fn attributes_of<'a>(&'a self, feature_id: &'a str) -> impl Iterator<Item = &'a AttributeRow> + 'a {
        self.attributes()
            .iter()
            .filter(move |a| a.feature_id.as_deref() == Some(feature_id))
    }

    /// Commentaires d'une feature
    pub fn comments_of<'a>(&'a self, feature_id: &'a str) -> impl Iterator<Item = &'a CommentRow> + 'a {
        self.comments()
            .iter()
            .filter(move |c| c.feature_id.as_deref() == Some(feature_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeometryKind;
    use serde_json::json;

    #[test]
    fn test_parse_dump_with_aliases() {
        let dump = Dump::from_json(
            &json!({
                "eksportdato": "2024-03-01T12:00:00",
                "feature2": [
                    {"id": "f1", "name": "Skilt", "type_id": 96, "project_id": "p1", "nvdb_id": null}
                ],
                "feature_geometry": [
                    {"feature_id": "f1", "geometry": "{\"type\":\"POINT\",\"shape\":{\"position\":{\"easting\":1.0,\"northing\":2.0}},\"srid\":25833,\"heightRef\":\"NN2000\"}"}
                ],
                "feature_attribute2": [
                    {"feature_id": "f1", "type_id": 1876, "value": "Forbud"}
                ],
                "project": [{"id": "p1"}]
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(dump.eksportdato.as_deref(), Some("2024-03-01T12:00:00"));
        assert_eq!(dump.features().len(), 1);
        assert!(dump.features()[0].extra.contains_key("nvdb_id"));
        assert_eq!(dump.attributes_of("f1").count(), 1);
        assert!(dump.comments().is_empty());

        let raw = dump.geometries()[0].raw_geometry().unwrap();
        assert_eq!(raw.kind(), GeometryKind::Point);
    }

    #[test]
    fn test_inline_geometry_document() {
        let row: GeometryRow = serde_json::from_value(json!({
            "feature_id": "f2",
            "geometry": {
                "type": "LINE",
                "shape": {"positions": [{"easting": 1.0, "northing": 2.0, "height": "nan"}]},
                "srid": 5973,
                "heightRef": "NN2000"
            }
        }))
        .unwrap();

        assert_eq!(row.raw_geometry().unwrap().kind(), GeometryKind::Line);
    }

    #[test]
    fn test_unreadable_geometry_column() {
        let row = GeometryRow {
            feature_id: Some("f3".to_string()),
            geometry: GeometryColumn::Text("{not json".to_string()),
        };
        let err = row.raw_geometry().unwrap_err();
        assert!(matches!(err, DatafangstError::InvalidGeometryDocument { ref feature_id, .. } if feature_id == "f3"));
    }

    #[test]
    fn test_comment_column_alias() {
        let row: CommentRow =
            serde_json::from_value(json!({"feature_id": "f1", "comment": "Målt på nytt"})).unwrap();
        assert_eq!(row.text, "Målt på nytt");
    }

    #[test]
    fn test_project_level_comment() {
        let dump = Dump::from_json(
            r#"{"feature":[{"id":"a","type_id":1}],"feature_geometry":[],"comment":[{"feature_id":null,"text":"prosjektkommentar"},{"feature_id":"a","text":"Sjekket"}]}"#,
        )
        .unwrap();

        assert_eq!(dump.comments().len(), 2);
        assert_eq!(dump.comments_of("a").count(), 1);
        let project: Vec<_> = dump.project_comments().map(|c| c.text.as_str()).collect();
        assert_eq!(project, vec!["prosjektkommentar"]);
    }

    #[test]
    fn test_unkeyed_attribute_and_geometry_rows() {
        let dump = Dump::from_json(
            &json!({
                "feature": [{"id": "a", "type_id": 1}],
                "feature_geometry": [{"geometry": "{}"}],
                "feature_attribute": [{"feature_id": null, "type_id": 5, "value": 1}]
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(dump.geometries().len(), 1);
        assert_eq!(dump.geometries_of("a").count(), 0);
        assert_eq!(dump.attributes_of("a").count(), 0);
    }
}
