//! Assemblage d'une feature : géométrie + attributs + commentaires

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::decoder;
use crate::dump::Dump;
use crate::error::{DatafangstError, Result};
use crate::output::Feature;

/// Séparateur entre commentaires d'une même feature
pub const COMMENT_SEPARATOR: &str = "; ";

/// Construit le commentaire de base, toujours horodaté
pub fn base_comment(prefix: &str, exported_at: &str) -> String {
    format!("{prefix} {exported_at}")
}

/// Assemble les features d'un dump
#[derive(Debug, Clone)]
pub struct FeatureAssembler<'a> {
    dump: &'a Dump,
    base_comment: String,
}

impl<'a> FeatureAssembler<'a> {
    /// `base_comment` doit contenir le marqueur d'export (voir [`base_comment`])
    pub fn new(dump: &'a Dump, base_comment: impl Into<String>) -> Self {
        Self {
            dump,
            base_comment: base_comment.into(),
        }
    }

    pub fn dump(&self) -> &'a Dump {
        self.dump
    }

    /// Assemble la feature `feature_id`
    ///
    /// Retourne `Ok(None)` si aucune ligne `feature` ne correspond.
    ///
    /// # Errors
    ///
    /// - `DuplicateFeatureRecord` si plusieurs lignes ont cet identifiant
    /// - `MissingOrDuplicateGeometry` si la feature n'a pas exactement une géométrie
    /// - toute erreur du décodeur
    pub fn assemble(&self, feature_id: &str) -> Result<Option<Feature>> {
        let matches: Vec<_> = self.dump.features_with_id(feature_id).collect();
        let record = match matches.as_slice() {
            [] => {
                debug!(feature_id, "No feature record found");
                return Ok(None);
            }
            [record] => *record,
            _ => {
                return Err(DatafangstError::DuplicateFeatureRecord {
                    feature_id: feature_id.to_string(),
                    count: matches.len(),
                })
            }
        };

        let geometries: Vec<_> = self.dump.geometries_of(feature_id).collect();
        let [geometry_row] = geometries.as_slice() else {
            return Err(DatafangstError::MissingOrDuplicateGeometry {
                feature_id: feature_id.to_string(),
                count: geometries.len(),
            });
        };

        let raw = geometry_row.raw_geometry()?;
        let mut feature = decoder::decode(&raw)?;

        let properties = &mut feature.properties;
        properties.tag = record.name.clone();
        properties.data_catalog_version = record.data_catalog_version.clone();
        properties.type_id = Some(record.type_id);

        let attributes = self.collect_attributes(feature_id);
        if !attributes.is_empty() {
            properties.attributes = Some(attributes);
        }

        properties.comment = Some(self.compose_comment(feature_id));

        Ok(Some(feature))
    }

    fn collect_attributes(&self, feature_id: &str) -> IndexMap<String, Value> {
        let mut attributes = IndexMap::new();
        for row in self.dump.attributes_of(feature_id) {
            let key = row.type_id.to_string();
            if let Some(previous) = attributes.insert(key, row.value.clone()) {
                warn!(
                    feature_id,
                    type_id = row.type_id,
                    previous = %previous,
                    "Attribute type appears twice, keeping last value"
                );
            }
        }
        attributes
    }

    fn compose_comment(&self, feature_id: &str) -> String {
        let comments: Vec<&str> = self
            .dump
            .comments_of(feature_id)
            .map(|c| c.text.as_str())
            .collect();

        if comments.is_empty() {
            self.base_comment.clone()
        } else {
            format!(
                "{}{}{}",
                self.base_comment,
                COMMENT_SEPARATOR,
                comments.join(COMMENT_SEPARATOR)
            )
        }
    }
}
