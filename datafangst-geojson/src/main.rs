//! Point d'entrée CLI pour datafangst-geojson

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use datafangst::Filters;

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::{Commands, ExportArgs};

/// Exporter un dump de la base datafangst vers GeoJSON
#[derive(Parser)]
#[command(name = "datafangst-geojson")]
#[command(author, version)]
#[command(about = "Exporter un dump de la base datafangst vers GeoJSON")]
#[command(long_about = "Traduit les features d'un dump datafangst (géométrie, attributs, commentaires) en FeatureCollection GeoJSON.\n\nUtilisez 'check' pour contrôler un dump sans l'exporter.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Export {
            dump,
            output,
            object_types,
            name,
            alias,
            operations,
            isolate_failures,
            standard,
            config,
            report,
        } => {
            info!(dump = %dump.display(), output = %output.display(), "Export vers GeoJSON");
            cli::cmd_export(ExportArgs {
                dump,
                output,
                filters: Filters {
                    object_types,
                    alias,
                    name,
                    operations,
                },
                isolate_failures,
                standard,
                config,
                report,
            })?;
        }
        Commands::Check { dump } => {
            info!(dump = %dump.display(), "Contrôle du dump");
            cli::cmd_check(&dump)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
