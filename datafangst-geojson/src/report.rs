//! Rapport d'export avec graceful degradation
//!
//! Collecte les features exportées, les features écartées (politique
//! `isolate`) et les anomalies relevées par les contrôles du dump.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use datafangst::check::{MetadataIssue, StructureIssue};
use datafangst::collection::BuildOutcome;

/// Statut global de l'export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportStatus {
    /// Export réussi sans erreur
    Success,
    /// Export réussi avec des features écartées
    PartialSuccess,
    /// Aucune feature exportée alors que des erreurs sont survenues
    Failed,
}

/// Feature écartée avec son erreur
#[derive(Debug, Clone, Serialize)]
pub struct FeatureError {
    pub feature_id: String,
    pub message: String,
}

/// Rapport complet d'export
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    /// Dump source
    pub dump: String,
    /// Nom de la collection produite
    pub collection: String,
    pub duration_secs: f64,
    pub status: ExportStatus,

    /// Features retenues par les filtres
    pub candidates: usize,
    /// Features écrites dans la collection
    pub exported: usize,
    /// Features retenues mais absentes de la table feature
    pub skipped: usize,

    /// Nombre de features exportées par type_id
    pub by_type: BTreeMap<i64, usize>,

    pub errors: Vec<FeatureError>,
    /// Anomalies de filtrage (opération inconnue, aucune feature retenue)
    pub diagnostics: Vec<String>,
    pub metadata_issues: Vec<MetadataIssue>,
    pub structure_issues: Vec<StructureIssue>,
}

impl ExportReport {
    /// Crée le rapport à partir du résultat de construction
    pub fn from_outcome(dump: &str, outcome: &BuildOutcome) -> Self {
        let mut by_type = BTreeMap::new();
        for feature in &outcome.collection.features {
            if let Some(type_id) = feature.properties.type_id {
                *by_type.entry(type_id).or_insert(0) += 1;
            }
        }

        let mut report = Self {
            dump: dump.to_string(),
            collection: outcome.collection.name.clone(),
            duration_secs: 0.0,
            status: ExportStatus::Success,
            candidates: outcome.candidates,
            exported: outcome.collection.features.len(),
            skipped: outcome.skipped,
            by_type,
            errors: outcome
                .failures
                .iter()
                .map(|f| FeatureError {
                    feature_id: f.feature_id.clone(),
                    message: f.error.to_string(),
                })
                .collect(),
            diagnostics: outcome.diagnostics.iter().map(ToString::to_string).collect(),
            metadata_issues: Vec::new(),
            structure_issues: Vec::new(),
        };
        report.finalize();
        report
    }

    /// Ajoute les anomalies des contrôles du dump (informatives)
    pub fn with_issues(
        mut self,
        metadata_issues: Vec<MetadataIssue>,
        structure_issues: Vec<StructureIssue>,
    ) -> Self {
        self.metadata_issues = metadata_issues;
        self.structure_issues = structure_issues;
        self
    }

    /// Définit la durée de l'export
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final basé sur les erreurs
    fn finalize(&mut self) {
        self.status = match (self.errors.is_empty(), self.exported > 0) {
            (true, _) => ExportStatus::Success,
            (false, true) => ExportStatus::PartialSuccess,
            (false, false) => ExportStatus::Failed,
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("EXPORT REPORT - {}", self.dump);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Collection: {}", self.collection);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- SUMMARY ---");
        println!(
            "Features: {} matched, {} exported, {} skipped, {} failed",
            self.candidates,
            self.exported,
            self.skipped,
            self.errors.len()
        );

        if !self.by_type.is_empty() {
            println!("\n--- BY TYPE ---");
            for (type_id, count) in &self.by_type {
                println!("  {}: {}", type_id, count);
            }
        }

        if !self.metadata_issues.is_empty() {
            println!(
                "\n--- HEIGHT METADATA ON 2D/MIXED GEOMETRY ({}) ---",
                self.metadata_issues.len()
            );
            for issue in self.metadata_issues.iter().take(10) {
                println!(
                    "  [{}] {:?}: {}",
                    issue.feature_id,
                    issue.dimension,
                    issue.keys.join(", ")
                );
            }
            if self.metadata_issues.len() > 10 {
                println!("  ... and {} more", self.metadata_issues.len() - 10);
            }
        }

        if !self.diagnostics.is_empty() {
            println!("\n--- FILTERS ---");
            for diagnostic in &self.diagnostics {
                println!("  {}", diagnostic);
            }
        }

        if !self.structure_issues.is_empty() {
            println!("\n--- STRUCTURE ({}) ---", self.structure_issues.len());
            for issue in self.structure_issues.iter().take(10) {
                println!("  {:?}", issue);
            }
            if self.structure_issues.len() > 10 {
                println!("  ... and {} more", self.structure_issues.len() - 10);
            }
        }

        if !self.errors.is_empty() {
            println!("\n--- ERRORS ({}) ---", self.errors.len());
            for e in self.errors.iter().take(20) {
                println!("  [{}] {}", e.feature_id, e.message);
            }
            if self.errors.len() > 20 {
                println!("  ... and {} more", self.errors.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .context(format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }
}
