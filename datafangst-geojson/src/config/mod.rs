//! Configuration de l'export

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use datafangst::collection::DEFAULT_CRS;
use datafangst::FailurePolicy;

/// Variable d'environnement pointant vers le fichier de configuration
pub const CONFIG_ENV: &str = "DATAFANGST_CONFIG";

/// Configuration de l'export GeoJSON
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Nom du CRS annoncé dans la collection
    pub crs_name: String,

    /// Début du commentaire ajouté à chaque feature (suivi de la date d'export)
    pub comment_prefix: String,

    /// Abandon à la première erreur ou isolation par feature
    pub failure_policy: FailurePolicy,

    /// Début du nom de la collection
    pub name_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            crs_name: DEFAULT_CRS.to_string(),
            comment_prefix: "Eksportert fra datafangst".to_string(),
            failure_policy: FailurePolicy::Abort,
            name_prefix: "datafangst".to_string(),
        }
    }
}

impl ExportConfig {
    /// Charge une configuration depuis un fichier JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Fichier explicite, sinon `DATAFANGST_CONFIG`, sinon valeurs par défaut
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        match path {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ExportConfig =
            serde_json::from_str(r#"{"failure_policy": "isolate"}"#).unwrap();

        assert_eq!(config.failure_policy, FailurePolicy::Isolate);
        assert_eq!(config.crs_name, "EPSG:5973");
        assert_eq!(config.name_prefix, "datafangst");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("datafangst_config_test.json");
        std::fs::write(&path, r#"{"crs_name": "EPSG:25833", "comment_prefix": "Eksport"}"#).unwrap();

        let config = ExportConfig::resolve(Some(&path)).unwrap();
        assert_eq!(config.crs_name, "EPSG:25833");
        assert_eq!(config.comment_prefix, "Eksport");
        assert_eq!(config.failure_policy, FailurePolicy::Abort);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_unknown_policy_rejected() {
        assert!(serde_json::from_str::<ExportConfig>(r#"{"failure_policy": "ignore"}"#).is_err());
    }
}
