//! Filtrage des features et construction de la FeatureCollection

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assembler::FeatureAssembler;
use crate::dump::FeatureRow;
use crate::error::{DatafangstError, Result};
use crate::output::FeatureCollection;

/// CRS annoncé par défaut dans la collection
pub const DEFAULT_CRS: &str = "EPSG:5973";

/// Opération d'écriture d'une feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Create,
    Correct,
    Update,
    Close,
}

/// Synonymes acceptés en plus des noms canoniques (comparaison sans casse)
const OPERATION_SYNONYMS: &[(&str, Operation)] = &[
    ("REGISTER", Operation::Create),
    ("REGISTRER", Operation::Create),
    ("NY", Operation::Create),
    ("KORRIGER", Operation::Correct),
    ("CORRECTION", Operation::Correct),
    ("OPPDATER", Operation::Update),
    ("UPDATE-PARTIAL", Operation::Update),
    ("DELVIS-OPPDATER", Operation::Update),
    ("DELVISOPPDATER", Operation::Update),
    ("LUKK", Operation::Close),
    ("REMOVE", Operation::Close),
    ("FJERN", Operation::Close),
];

/// Traduit un nom canonique ou un synonyme
///
/// `_` et `-` sont équivalents : `update_partial` == `UPDATE-PARTIAL`.
impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('_', "-");
        match normalized.as_str() {
            "CREATE" => Ok(Operation::Create),
            "CORRECT" => Ok(Operation::Correct),
            "UPDATE" => Ok(Operation::Update),
            "CLOSE" => Ok(Operation::Close),
            other => OPERATION_SYNONYMS
                .iter()
                .find(|(synonym, _)| *synonym == other)
                .map(|(_, op)| *op)
                .ok_or_else(|| {
                    format!(
                        "Invalid operation: {}. Use: CREATE, CORRECT, UPDATE, CLOSE",
                        s
                    )
                }),
        }
    }
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Correct => "CORRECT",
            Self::Update => "UPDATE",
            Self::Close => "CLOSE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comportement quand une feature échoue pendant la construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// La première erreur interrompt toute la collection
    #[default]
    Abort,
    /// La feature fautive est écartée et l'erreur rapportée
    Isolate,
}

/// Anomalie non bloquante relevée pendant la construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Opération inconnue, écartée du filtre
    UnrecognizedOperation(String),
    /// Aucune opération reconnue : filtre désactivé
    OperationFilterDisabled,
    /// Aucune feature ne passe les filtres
    NoFeatureMatched,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedOperation(token) => write!(f, "unrecognized operation {token:?} ignored"),
            Self::OperationFilterDisabled => f.write_str("no recognized operation, operation filter disabled"),
            Self::NoFeatureMatched => f.write_str("no features left after filtering"),
        }
    }
}

/// Filtres optionnels, tous cumulatifs
///
/// Une liste vide (`object_types`, `operations`) ou `None` ne filtre rien.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub object_types: Vec<i64>,
    /// Sous-chaîne de `alias`, sans casse
    pub alias: Option<String>,
    /// Sous-chaîne de `name`, sans casse
    pub name: Option<String>,
    /// Opérations, noms canoniques ou synonymes
    pub operations: Vec<String>,
}

/// Filtres prêts à l'emploi
#[derive(Debug, Clone, Default, PartialEq)]
struct ResolvedFilters {
    object_types: Option<BTreeSet<i64>>,
    alias: Option<String>,
    name: Option<String>,
    operations: Option<BTreeSet<Operation>>,
}

impl Filters {
    fn resolve(&self, diagnostics: &mut Vec<Diagnostic>) -> ResolvedFilters {
        let mut operations = BTreeSet::new();
        for token in &self.operations {
            match token.parse::<Operation>() {
                Ok(op) => {
                    operations.insert(op);
                }
                Err(e) => {
                    warn!(token = %token, "{e}, ignored");
                    diagnostics.push(Diagnostic::UnrecognizedOperation(token.clone()));
                }
            }
        }
        if operations.is_empty() && !self.operations.is_empty() {
            warn!("No recognized operation left, operation filter disabled");
            diagnostics.push(Diagnostic::OperationFilterDisabled);
        }

        ResolvedFilters {
            object_types: (!self.object_types.is_empty())
                .then(|| self.object_types.iter().copied().collect()),
            alias: self.alias.as_ref().map(|s| s.to_lowercase()),
            name: self.name.as_ref().map(|s| s.to_lowercase()),
            operations: (!operations.is_empty()).then_some(operations),
        }
    }
}

impl ResolvedFilters {
    fn accepts(&self, feature: &FeatureRow) -> bool {
        if let Some(types) = &self.object_types {
            if !types.contains(&feature.type_id) {
                return false;
            }
        }
        if let Some(alias) = &self.alias {
            if !contains_lowercase(feature.alias.as_deref(), alias) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !contains_lowercase(feature.name.as_deref(), name) {
                return false;
            }
        }
        if let Some(operations) = &self.operations {
            let op = feature
                .operation
                .as_deref()
                .and_then(|op| op.parse::<Operation>().ok());
            if !op.is_some_and(|op| operations.contains(&op)) {
                return false;
            }
        }
        true
    }

    /// Libellé de la collection : préfixe suivi des filtres appliqués
    fn label(&self, prefix: &str) -> String {
        let mut parts = vec![prefix.to_string()];
        if let Some(types) = &self.object_types {
            let ids: Vec<String> = types.iter().map(|t| t.to_string()).collect();
            parts.push(format!("objectType={}", ids.join(",")));
        }
        if let Some(name) = &self.name {
            parts.push(format!("name={name}"));
        }
        if let Some(alias) = &self.alias {
            parts.push(format!("alias={alias}"));
        }
        if let Some(operations) = &self.operations {
            let ops: Vec<&str> = operations.iter().map(Operation::as_str).collect();
            parts.push(format!("operation={}", ops.join(",")));
        }
        parts.join(" ")
    }
}

fn contains_lowercase(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|f| f.to_lowercase().contains(needle))
}

/// Échec d'une feature isolé pendant la construction
#[derive(Debug)]
pub struct FeatureFailure {
    pub feature_id: String,
    pub error: DatafangstError,
}

/// Résultat d'une construction de collection
#[derive(Debug)]
pub struct BuildOutcome {
    pub collection: FeatureCollection,
    /// Features retenues par les filtres
    pub candidates: usize,
    /// Features retenues mais sans enregistrement
    pub skipped: usize,
    /// Vide sauf avec [`FailurePolicy::Isolate`]
    pub failures: Vec<FeatureFailure>,
    /// Anomalies de filtrage, aussi loggées en warning
    pub diagnostics: Vec<Diagnostic>,
}

/// Construit une FeatureCollection filtrée à partir d'un dump
#[derive(Debug, Clone)]
pub struct CollectionBuilder<'a> {
    assembler: FeatureAssembler<'a>,
    policy: FailurePolicy,
    name_prefix: String,
    crs: String,
}

impl<'a> CollectionBuilder<'a> {
    pub fn new(assembler: FeatureAssembler<'a>) -> Self {
        Self {
            assembler,
            policy: FailurePolicy::default(),
            name_prefix: "datafangst".to_string(),
            crs: DEFAULT_CRS.to_string(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    pub fn with_crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = crs.into();
        self
    }

    /// Filtre les features du dump et assemble celles qui passent
    ///
    /// # Errors
    ///
    /// Avec [`FailurePolicy::Abort`], la première erreur d'assemblage.
    pub fn build(&self, filters: &Filters) -> Result<BuildOutcome> {
        let mut diagnostics = Vec::new();
        let resolved = filters.resolve(&mut diagnostics);
        let mut seen = HashSet::new();
        let mut features = Vec::new();
        let mut failures = Vec::new();
        let mut candidates = 0;
        let mut skipped = 0;

        for row in self.assembler.dump().features() {
            if !resolved.accepts(row) || !seen.insert(row.id.as_str()) {
                continue;
            }
            candidates += 1;

            match self.assembler.assemble(&row.id) {
                Ok(Some(feature)) => features.push(feature),
                Ok(None) => skipped += 1,
                Err(error) => match self.policy {
                    FailurePolicy::Abort => return Err(error),
                    FailurePolicy::Isolate => {
                        warn!(feature_id = %row.id, error = %error, "Feature skipped");
                        failures.push(FeatureFailure {
                            feature_id: row.id.clone(),
                            error,
                        });
                    }
                },
            }
        }

        if candidates == 0 {
            warn!(?filters, "No features left after filtering, check the filters");
            diagnostics.push(Diagnostic::NoFeatureMatched);
        } else {
            info!(
                candidates,
                assembled = features.len(),
                failed = failures.len(),
                "Built feature collection"
            );
        }
        debug!(skipped, "Features without record");

        Ok(BuildOutcome {
            collection: FeatureCollection {
                name: resolved.label(&self.name_prefix),
                crs: self.crs.clone(),
                features,
            },
            candidates,
            skipped,
            failures,
            diagnostics,
        })
    }
}
