//! On-disk layout of an installation.
//!
//! [`InstallRoot`] is the handle every component receives; nothing else in the crate decides
//! where `skills/`, `competencies/` or `reference/` live.

use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

use thiserror::Error;

/// Folder at the root of every source repository that holds the installable tree
pub const PACKAGE_TREE_DIR: &str = ".olaf";

/// Top-level names of a package tree that are never merged into an installation
pub const EXCLUDED_TOP_LEVEL: &[&str] = &["docs", "tools"];

pub const SKILLS_DIR: &str = "skills";
pub const COMPETENCIES_DIR: &str = "competencies";
pub const REFERENCE_DIR: &str = "reference";
pub const DATA_DIR: &str = "data";

pub const MANIFEST_FILE: &str = "competency-manifest.json";
pub const COLLECTIONS_FILE: &str = "competency-collections.json";
pub const INDEX_FILE: &str = "query-competency-index.md";

/// The user-owned competency of the global installation
pub const KERNEL_COMPETENCY: &str = "my-competencies";

/// The user-owned competency of a local project
pub const TEAM_COMPETENCY: &str = "team-competencies";

/// The two namespaces an installation is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnitKind {
    Skill,
    Competency,
}

impl UnitKind {
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Skill => SKILLS_DIR,
            Self::Competency => COMPETENCIES_DIR,
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skill => f.write_str("skill"),
            Self::Competency => f.write_str("competency"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidUnitId {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier '{0}' is not a single plain path component")]
    NotAPlainName(String),
}

/// Check that `id` names exactly one entry inside a namespace directory.
///
/// # Errors
///
/// Returns [`InvalidUnitId`] for empty ids and for anything that could climb out of the
/// namespace: separators, `.`, `..`, roots or drive prefixes.
pub fn validate_unit_id(id: &str) -> Result<&str, InvalidUnitId> {
    if id.is_empty() {
        return Err(InvalidUnitId::Empty);
    }

    let mut components = Path::new(id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None)
            if name == id && !id.contains(['/', '\\']) =>
        {
            Ok(id)
        }
        _ => Err(InvalidUnitId::NotAPlainName(id.to_string())),
    }
}

/// Handle to an installation root (global target or local project)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRoot {
    path: PathBuf,
}

impl InstallRoot {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn namespace_dir(&self, kind: UnitKind) -> PathBuf {
        self.path.join(kind.dir_name())
    }

    /// Directory of one skill or competency
    ///
    /// # Errors
    ///
    /// Returns [`InvalidUnitId`] when `id` would resolve outside the namespace.
    pub fn unit_dir(&self, kind: UnitKind, id: &str) -> Result<PathBuf, InvalidUnitId> {
        validate_unit_id(id).map(|id| self.namespace_dir(kind).join(id))
    }

    /// Manifest path of a competency
    ///
    /// # Errors
    ///
    /// Returns [`InvalidUnitId`] when `id` would resolve outside the namespace.
    pub fn competency_manifest(&self, id: &str) -> Result<PathBuf, InvalidUnitId> {
        self.unit_dir(UnitKind::Competency, id)
            .map(|dir| dir.join(MANIFEST_FILE))
    }

    #[must_use]
    pub fn kernel_dir(&self) -> PathBuf {
        self.namespace_dir(UnitKind::Competency)
            .join(KERNEL_COMPETENCY)
    }

    #[must_use]
    pub fn kernel_manifest(&self) -> PathBuf {
        self.kernel_dir().join(MANIFEST_FILE)
    }

    #[must_use]
    pub fn reference_dir(&self) -> PathBuf {
        self.path.join(REFERENCE_DIR)
    }

    #[must_use]
    pub fn collections_file(&self) -> PathBuf {
        self.reference_dir().join(COLLECTIONS_FILE)
    }

    #[must_use]
    pub fn index_file(&self) -> PathBuf {
        self.reference_dir().join(INDEX_FILE)
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.path.join(DATA_DIR)
    }
}
