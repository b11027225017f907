//! # datafangst
//!
//! Décodage des dumps de la base NVDB datafangst vers GeoJSON.
//!
//! ## Features
//!
//! - Géométries brutes typées (POINT, LINE, POLYGON) avec contrôle strict
//!   du SRID (25833, 5973) et de la référence de hauteur (NN2000)
//! - Coordonnées `[est, nord, hauteur?]`, 2D ou 3D selon la hauteur
//! - Clés d'attributs géométriques converties en lowerCamelCase
//! - Assemblage feature + attributs + commentaires, collections filtrées
//! - Contrôle des métadonnées 3D sur géométries 2D
//!
//! ## Usage
//!
//! ```rust,ignore
//! use datafangst::{CollectionBuilder, Dump, FeatureAssembler, Filters};
//! use std::path::Path;
//!
//! let dump = Dump::from_path(Path::new("dump.json"))?;
//! let assembler = FeatureAssembler::new(&dump, "Eksportert fra datafangst 2024-01-01");
//! let outcome = CollectionBuilder::new(assembler).build(&Filters::default())?;
//! println!("{} features", outcome.collection.features.len());
//! ```

pub mod assembler;
pub mod check;
pub mod collection;
pub mod decoder;
pub mod dump;
pub mod error;
pub mod keys;
pub mod output;
pub mod types;

pub use assembler::FeatureAssembler;
pub use collection::{CollectionBuilder, Diagnostic, FailurePolicy, Filters, Operation};
pub use decoder::{decode, decode_json};
pub use dump::Dump;
pub use error::DatafangstError;
pub use output::{Feature, FeatureCollection, Geometry};
pub use types::RawGeometry;
