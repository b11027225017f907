//! Types d'erreurs pour le crate datafangst

use thiserror::Error;

/// Erreurs pouvant survenir lors du décodage d'un dump datafangst
///
/// Les variantes `Unsupported*`, `DuplicateFeatureRecord` et
/// `MissingOrDuplicateGeometry` signalent une donnée source qui viole un
/// invariant : le décodage de l'entité concernée est abandonné.
#[derive(Debug, Error)]
pub enum DatafangstError {
    /// Erreur d'I/O lors de la lecture du dump
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON illisible
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Type de géométrie hors de {POINT, LINE, POLYGON}
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometryType(String),

    /// SRID hors de la liste blanche
    #[error("Unsupported reference system: SRID={0}")]
    UnsupportedReferenceSystem(i64),

    /// Référence de hauteur autre que NN2000
    #[error("Unsupported height reference: {0}")]
    UnsupportedHeightReference(String),

    /// Polygone avec anneaux intérieurs
    #[error("Unsupported polygon feature: {interior_rings} interior ring(s)")]
    UnsupportedPolygonFeature { interior_rings: usize },

    /// Plusieurs lignes `feature` pour le même identifiant
    #[error("Duplicate feature record {feature_id}: {count} rows")]
    DuplicateFeatureRecord { feature_id: String, count: usize },

    /// Une feature doit avoir exactement une géométrie
    #[error("Feature {feature_id} has {count} geometry rows, expected exactly 1")]
    MissingOrDuplicateGeometry { feature_id: String, count: usize },

    /// Colonne géométrie illisible ou shape de mauvaise forme
    #[error("Invalid geometry document for {feature_id}: {reason}")]
    InvalidGeometryDocument { feature_id: String, reason: String },
}

impl DatafangstError {
    /// Crée une erreur de document géométrique invalide avec contexte
    pub fn invalid_document(feature_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeometryDocument {
            feature_id: feature_id.into(),
            reason: reason.into(),
        }
    }

    /// Vrai pour les violations d'invariant de la donnée source
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::Json(_))
    }
}

pub type Result<T> = std::result::Result<T, DatafangstError>;
