//! Non-fatal findings collected during an install.
//!
//! Optional documents (registries, prune lists, manifests) that are missing or broken degrade
//! the run instead of failing it. Each degradation is recorded as a [`Diagnostic`] so callers
//! and tests can see exactly what was skipped.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use tracing::warn;

/// What kind of degradation happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// No registry document in the primary snapshot
    RegistryMissing,
    /// Registry document present but unreadable or without a source list
    RegistryMalformed,
    /// A single registry entry could not be parsed
    RegistryEntrySkipped,
    /// A secondary snapshot had no package tree and was not applied
    SecondarySkipped,
    /// Pruning was turned off for this run
    PruneDisabled,
    /// No prune list was found in any candidate location
    PruneListMissing,
    /// A prune list could not be parsed
    PruneListMalformed,
    /// A prune target does not exist in the installation
    PruneTargetMissing,
    /// A prune target was refused (unsafe id or protected unit)
    PruneRefused,
    /// The kernel manifest could not be parsed
    KernelManifestMalformed,
    /// A dependency listed by the kernel manifest has no directory
    DependencyMissing,
    /// The collections document does not exist
    CollectionsMissing,
    /// A non-string entry in a collection's competency list was ignored
    CollectionEntrySkipped,
    /// A competency marked local is not in the primary source
    LocalCompetencyMissing,
    /// A document that is only consulted opportunistically could not be read
    DocumentIgnored,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::RegistryMissing => "registry_missing",
            Self::RegistryMalformed => "registry_malformed",
            Self::RegistryEntrySkipped => "registry_entry_skipped",
            Self::SecondarySkipped => "secondary_skipped",
            Self::PruneDisabled => "prune_disabled",
            Self::PruneListMissing => "prune_list_missing",
            Self::PruneListMalformed => "prune_list_malformed",
            Self::PruneTargetMissing => "prune_target_missing",
            Self::PruneRefused => "prune_refused",
            Self::KernelManifestMalformed => "kernel_manifest_malformed",
            Self::DependencyMissing => "dependency_missing",
            Self::CollectionsMissing => "collections_missing",
            Self::CollectionEntrySkipped => "collection_entry_skipped",
            Self::LocalCompetencyMissing => "local_competency_missing",
            Self::DocumentIgnored => "document_ignored",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    kind: DiagnosticKind,
    message: String,
    path: Option<PathBuf>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
        }
    }

    #[must_use]
    pub fn at(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} ({})", self.message, path.display()),
            None => f.write_str(&self.message),
        }
    }
}

/// Ordered collection of diagnostics for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!(kind = %diagnostic.kind(), "{diagnostic}");
        self.0.push(diagnostic);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Diagnostics recorded after the first `from` entries
    #[must_use]
    pub fn since(&self, from: usize) -> &[Diagnostic] {
        self.0.get(from..).unwrap_or_default()
    }

    #[must_use]
    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<&Diagnostic> {
        self.0.iter().filter(|d| d.kind == kind).collect()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
