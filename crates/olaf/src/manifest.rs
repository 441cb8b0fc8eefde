//! Competency manifests (`competency-manifest.json`).

use std::path::Path;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::{
    document::{DocumentError, read_json, write_json},
    fs::FileSystem,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompetencyManifest {
    #[serde(default)]
    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub bom: BillOfMaterials,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillOfMaterials {
    #[serde(default)]
    pub skills: Vec<Value>,

    #[serde(default)]
    pub entry_points: Vec<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CompetencyManifest {
    /// Skill ids listed in the bill of materials; blanks and non-strings are ignored
    #[must_use]
    pub fn skill_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .bom
            .skills
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Display name, falling back to the id
    #[must_use]
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.metadata.name.as_deref().unwrap_or(fallback)
    }
}

/// Metadata written into a generated manifest
#[derive(Debug, Clone, Copy)]
pub struct ManifestDefaults {
    pub id: &'static str,
    pub name: &'static str,
    pub short_description: &'static str,
    pub description: &'static str,
    pub objectives: &'static [&'static str],
    pub tags: &'static [&'static str],
    pub author: &'static str,
}

/// The global user-owned competency
pub const KERNEL_DEFAULTS: ManifestDefaults = ManifestDefaults {
    id: crate::layout::KERNEL_COMPETENCY,
    name: "My Competencies",
    short_description: "User-maintained competency that aggregates personal skills.",
    description: "Personal competency package intended to hold user-created skills.",
    objectives: &[
        "Group personal skills",
        "Expose personal skills via the OLAF competency index",
    ],
    tags: &["user", "personal"],
    author: "User",
};

/// The per-project team competency
pub const TEAM_DEFAULTS: ManifestDefaults = ManifestDefaults {
    id: crate::layout::TEAM_COMPETENCY,
    name: "Team Competencies",
    short_description: "Team-maintained local competency",
    description: "Local competency package intended to hold team skills for this repository.",
    objectives: &["Provide a local place to register team skills"],
    tags: &["team", "local"],
    author: "Team",
};

impl ManifestDefaults {
    #[must_use]
    pub fn build(&self, today: NaiveDate) -> CompetencyManifest {
        let today = Value::String(today.to_string());
        let strings = |items: &[&str]| Value::Array(items.iter().map(|s| Value::from(*s)).collect());

        let mut extra = Map::new();
        extra.insert("description".into(), self.description.into());
        extra.insert("version".into(), "1.0.0".into());
        extra.insert("objectives".into(), strings(self.objectives));
        extra.insert("tags".into(), strings(self.tags));
        extra.insert("author".into(), self.author.into());
        extra.insert("status".into(), "experimental".into());
        extra.insert("exposure".into(), "internal".into());
        extra.insert("created".into(), today.clone());
        extra.insert("updated".into(), today);

        CompetencyManifest {
            metadata: ManifestMetadata {
                id: Some(self.id.to_string()),
                name: Some(self.name.to_string()),
                short_description: Some(self.short_description.to_string()),
                extra,
            },
            bom: BillOfMaterials::default(),
            extra: Map::new(),
        }
    }
}

/// Read a manifest
///
/// # Errors
///
/// Returns [`DocumentError`] if the file cannot be read or parsed.
pub fn read_manifest<F>(fs: &F, path: &Path) -> Result<CompetencyManifest, DocumentError>
where
    F: FileSystem + ?Sized,
{
    read_json(fs, path)
}

/// When [`ensure_manifest`] writes a default manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generate {
    /// Only when no manifest file exists
    WhenMissing,
    /// Also when the existing file cannot be parsed
    WhenUnreadable,
}

/// Write a default manifest at `path` unless one is already there.
///
/// Returns `true` when a manifest was generated.
///
/// # Errors
///
/// Returns [`DocumentError`] if the generated manifest cannot be written.
pub fn ensure_manifest<F>(
    fs: &F,
    path: &Path,
    defaults: &ManifestDefaults,
    generate: Generate,
) -> Result<bool, DocumentError>
where
    F: FileSystem + ?Sized,
{
    if fs.is_file(path) {
        let keep = match generate {
            Generate::WhenMissing => true,
            Generate::WhenUnreadable => read_manifest(fs, path).is_ok(),
        };
        if keep {
            return Ok(false);
        }
    }

    let manifest = defaults.build(Utc::now().date_naive());
    write_json(fs, path, &manifest)?;
    info!(path = %path.display(), id = defaults.id, "generated competency manifest");
    Ok(true)
}
