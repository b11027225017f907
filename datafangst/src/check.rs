//! Contrôles de cohérence d'un dump, en lecture seule
//!
//! - métadonnées de hauteur (`ACCURACY_HEIGHT`...) sur des géométries qui
//!   ne sont pas entièrement 3D
//! - doublons de features et cardinalité des géométries

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::dump::Dump;
use crate::keys::is_height_key;
use crate::types::RawGeometry;

/// Dimension des coordonnées d'une géométrie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dimension {
    /// Aucune coordonnée n'a de hauteur
    TwoD,
    /// Toutes les coordonnées ont une hauteur
    ThreeD,
    /// Mélange de 2D et 3D
    Mixed,
}

impl RawGeometry {
    /// Dimension déduite des hauteurs présentes
    ///
    /// Une géométrie sans aucune coordonnée est considérée 2D.
    pub fn dimension(&self) -> Dimension {
        let (mut with_height, mut without_height) = (0usize, 0usize);
        for coord in self.coords() {
            if coord.is_3d() {
                with_height += 1;
            } else {
                without_height += 1;
            }
        }

        match (with_height, without_height) {
            (0, _) => Dimension::TwoD,
            (_, 0) => Dimension::ThreeD,
            _ => Dimension::Mixed,
        }
    }

    /// Clés de hauteur présentes dans les attributs géométriques
    pub fn height_attribute_keys(&self) -> Vec<String> {
        self.attributes
            .iter()
            .flat_map(|map| map.keys())
            .filter(|key| is_height_key(key))
            .cloned()
            .collect()
    }

    /// Copie sans les attributs de hauteur, l'original est inchangé
    pub fn without_height_metadata(&self) -> RawGeometry {
        let mut cleaned = self.clone();
        if let Some(map) = cleaned.attributes.as_mut() {
            map.retain(|key, _| !is_height_key(key));
        }
        cleaned
    }
}

/// Géométrie 2D ou mixte portant des métadonnées de hauteur
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataIssue {
    pub feature_id: String,
    /// `TwoD` ou `Mixed`
    pub dimension: Dimension,
    pub keys: Vec<String>,
}

/// Liste les géométries non entièrement 3D qui portent des métadonnées de hauteur
///
/// Une géométrie mixte a au moins un point sans hauteur : ses métadonnées
/// de hauteur sont signalées comme pour une géométrie 2D.
///
/// Les géométries illisibles ou sans `feature_id` sont ignorées ici
/// (loggées), le contrôle de structure et l'export les signalent déjà.
pub fn find_misplaced_height_metadata(dump: &Dump) -> Vec<MetadataIssue> {
    let mut issues = Vec::new();

    for row in dump.geometries() {
        let Some(feature_id) = row.feature_id.as_deref() else {
            debug!("Geometry without feature_id skipped");
            continue;
        };
        let raw = match row.raw_geometry() {
            Ok(raw) => raw,
            Err(e) => {
                debug!(feature_id, error = %e, "Unreadable geometry skipped");
                continue;
            }
        };

        let dimension = raw.dimension();
        if dimension == Dimension::ThreeD {
            continue;
        }

        let keys = raw.height_attribute_keys();
        if !keys.is_empty() {
            warn!(feature_id, ?dimension, keys = ?keys, "Height metadata on geometry without full 3D");
            issues.push(MetadataIssue {
                feature_id: feature_id.to_string(),
                dimension,
                keys,
            });
        }
    }

    issues
}

/// Incohérence structurelle d'un dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructureIssue {
    /// Plusieurs lignes `feature` avec le même id
    DuplicateFeature { feature_id: String, count: usize },
    /// Feature sans géométrie ou avec plusieurs
    GeometryCardinality { feature_id: String, count: usize },
    /// Géométrie dont la feature n'existe pas
    OrphanGeometry { feature_id: String },
    /// Géométries sans `feature_id`
    UnkeyedGeometry { count: usize },
}

/// Contrôle les doublons et la cardinalité feature/géométrie
pub fn check_structure(dump: &Dump) -> Vec<StructureIssue> {
    let mut feature_counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    for row in dump.features() {
        let count = feature_counts.entry(row.id.as_str()).or_insert(0);
        if *count == 0 {
            order.push(row.id.as_str());
        }
        *count += 1;
    }

    let mut geometry_counts: HashMap<&str, usize> = HashMap::new();
    let mut unkeyed = 0;
    for row in dump.geometries() {
        match row.feature_id.as_deref() {
            Some(id) => *geometry_counts.entry(id).or_insert(0) += 1,
            None => unkeyed += 1,
        }
    }

    let mut issues = Vec::new();
    for id in &order {
        let count = feature_counts[id];
        if count > 1 {
            issues.push(StructureIssue::DuplicateFeature {
                feature_id: id.to_string(),
                count,
            });
        }
        let geometries = geometry_counts.get(id).copied().unwrap_or(0);
        if geometries != 1 {
            issues.push(StructureIssue::GeometryCardinality {
                feature_id: id.to_string(),
                count: geometries,
            });
        }
    }

    let mut orphans: Vec<&str> = geometry_counts
        .keys()
        .filter(|id| !feature_counts.contains_key(*id))
        .copied()
        .collect();
    orphans.sort_unstable();
    issues.extend(orphans.into_iter().map(|id| StructureIssue::OrphanGeometry {
        feature_id: id.to_string(),
    }));
    if unkeyed > 0 {
        issues.push(StructureIssue::UnkeyedGeometry { count: unkeyed });
    }

    issues
}
