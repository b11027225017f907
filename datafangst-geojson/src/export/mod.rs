//! Export d'un dump datafangst vers GeoJSON

pub mod geojson;

pub use self::geojson::{write_collection, GeometryStyle};

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use datafangst::assembler::base_comment;
use datafangst::check::{check_structure, find_misplaced_height_metadata};
use datafangst::{CollectionBuilder, Dump, FeatureAssembler, Filters};

use crate::config::ExportConfig;
use crate::report::ExportReport;

/// Horodatage d'export : `eksportdato` du dump, sinon l'heure locale
pub fn export_timestamp(dump: &Dump) -> String {
    dump.eksportdato
        .clone()
        .unwrap_or_else(|| Local::now().format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Options d'un export
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub filters: Filters,
    pub config: ExportConfig,
    pub style: GeometryStyle,
}

/// Construit la collection filtrée et l'écrit dans `output_path`
///
/// Les contrôles du dump (métadonnées 3D sur 2D, cardinalités) sont joints
/// au rapport sans bloquer l'export.
pub fn export_dump(
    dump: &Dump,
    dump_label: &str,
    options: &ExportOptions,
    output_path: &Path,
) -> Result<ExportReport> {
    let start = Instant::now();
    let config = &options.config;

    let comment = base_comment(&config.comment_prefix, &export_timestamp(dump));
    let assembler = FeatureAssembler::new(dump, comment);
    let builder = CollectionBuilder::new(assembler)
        .with_policy(config.failure_policy)
        .with_name_prefix(config.name_prefix.as_str())
        .with_crs(config.crs_name.as_str());

    let outcome = builder
        .build(&options.filters)
        .context(format!("Failed to build feature collection from {}", dump_label))?;

    write_collection(&outcome.collection, options.style, output_path)?;

    info!(
        output = %output_path.display(),
        features = outcome.collection.features.len(),
        "GeoJSON written"
    );

    let mut report = ExportReport::from_outcome(dump_label, &outcome)
        .with_issues(find_misplaced_height_metadata(dump), check_structure(dump));
    report.set_duration(start.elapsed());

    Ok(report)
}
