//! # datafangst-geojson
//!
//! Export des dumps de la base NVDB datafangst vers GeoJSON.
//!
//! ## Features
//!
//! - Filtres par type d'objet, nom, alias et opération d'écriture
//! - Échec à la première erreur ou isolation par feature
//! - Rapport d'export avec contrôles du dump (métadonnées 3D sur 2D)
//! - GeoJSON indenté en UTF-8
//!
//! ## Usage CLI
//!
//! ```bash
//! # Export complet
//! datafangst-geojson export --dump ./dump.json --output ./features.geojson
//!
//! # Panneaux (type 96) créés ou corrigés
//! datafangst-geojson export --dump ./dump.json --output ./skilt.geojson \
//!     --object-type 96 --operation REGISTER --operation CORRECT
//!
//! # Contrôles seuls
//! datafangst-geojson check --dump ./dump.json
//! ```

pub mod config;
pub mod export;
pub mod report;

pub use config::ExportConfig;
pub use export::{export_dump, ExportOptions};
pub use report::{ExportReport, ExportStatus};
