//! Définition et implémentation des commandes CLI
//!
//! - `export`: dump datafangst → GeoJSON
//! - `check`: contrôles du dump, sans export

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::{info, warn};

use datafangst::check::{check_structure, find_misplaced_height_metadata};
use datafangst::{Dump, FailurePolicy, Filters};
use datafangst_geojson::export::GeometryStyle;
use datafangst_geojson::{export_dump, ExportConfig, ExportOptions, ExportStatus};

#[derive(Subcommand)]
pub enum Commands {
    /// Export a datafangst database dump to a GeoJSON FeatureCollection
    Export {
        /// Path to the JSON database dump
        #[arg(short, long)]
        dump: PathBuf,

        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,

        /// Keep only these object type ids (repeatable or comma separated)
        #[arg(long = "object-type", value_delimiter = ',')]
        object_types: Vec<i64>,

        /// Case-insensitive substring of the feature name
        #[arg(long)]
        name: Option<String>,

        /// Case-insensitive substring of the feature alias
        #[arg(long)]
        alias: Option<String>,

        /// Write operations: CREATE, CORRECT, UPDATE, CLOSE or a synonym (REGISTER, LUKK...)
        #[arg(long = "operation", value_delimiter = ',')]
        operations: Vec<String>,

        /// Skip failing features instead of aborting the export
        #[arg(long)]
        isolate_failures: bool,

        /// Write standard GeoJSON geometry types ("Point" instead of "point")
        #[arg(long)]
        standard: bool,

        /// Path to a JSON config (défaut : env DATAFANGST_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Save the export report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Check a dump for height metadata on 2D/mixed geometries and broken feature/geometry links
    Check {
        /// Path to the JSON database dump
        #[arg(short, long)]
        dump: PathBuf,
    },
}

/// Paramètres de la commande export
pub struct ExportArgs {
    pub dump: PathBuf,
    pub output: PathBuf,
    pub filters: Filters,
    pub isolate_failures: bool,
    pub standard: bool,
    pub config: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

/// Exécute la commande export
pub fn cmd_export(args: ExportArgs) -> Result<()> {
    let mut config = ExportConfig::resolve(args.config.as_deref())?;
    if args.isolate_failures {
        config.failure_policy = FailurePolicy::Isolate;
    }

    let dump = load_dump(&args.dump)?;

    println!("=== Export {} ===", args.dump.display());
    println!("Output: {}", args.output.display());
    println!("CRS: {}", config.crs_name);
    println!("Failure policy: {:?}", config.failure_policy);

    let options = ExportOptions {
        filters: args.filters,
        config,
        style: if args.standard {
            GeometryStyle::Standard
        } else {
            GeometryStyle::Native
        },
    };

    let label = args.dump.display().to_string();
    let report = export_dump(&dump, &label, &options, &args.output)?;
    report.display();

    if let Some(path) = &args.report {
        report.save_to_file(path)?;
        info!(report = %path.display(), "Report saved");
    }

    if report.status == ExportStatus::Failed {
        anyhow::bail!("Export failed: no feature could be exported");
    }

    Ok(())
}

/// Exécute la commande check
pub fn cmd_check(dump_path: &Path) -> Result<()> {
    let dump = load_dump(dump_path)?;

    let metadata = find_misplaced_height_metadata(&dump);
    let structure = check_structure(&dump);

    println!("=== Check {} ===", dump_path.display());
    println!(
        "Features: {}, geometries: {}, attributes: {}, comments: {}",
        dump.features().len(),
        dump.geometries().len(),
        dump.attributes().len(),
        dump.comments().len()
    );

    if metadata.is_empty() {
        println!("No height metadata on 2D or mixed geometry");
    } else {
        println!(
            "Found {} 2D or mixed geometries with height metadata",
            metadata.len()
        );
        for issue in &metadata {
            println!(
                "  [{}] {:?}: {}",
                issue.feature_id,
                issue.dimension,
                issue.keys.join(", ")
            );
        }
    }

    if structure.is_empty() {
        println!("No structure issue");
    } else {
        println!("Found {} structure issues", structure.len());
        for issue in &structure {
            println!("  {:?}", issue);
        }
    }

    if !metadata.is_empty() || !structure.is_empty() {
        warn!(
            metadata = metadata.len(),
            structure = structure.len(),
            "Dump has issues"
        );
    }

    Ok(())
}

fn load_dump(path: &Path) -> Result<Dump> {
    let dump = Dump::from_path(path)
        .context(format!("Failed to read dump: {}", path.display()))?;
    info!(
        path = %path.display(),
        features = dump.features().len(),
        exported_at = dump.eksportdato.as_deref().unwrap_or("unknown"),
        "Dump loaded"
    );
    Ok(dump)
}
