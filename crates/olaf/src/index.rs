//! The human-readable competency index (`reference/query-competency-index.md`).

use std::{fmt::Write as _, path::Path};

use tracing::debug;

use crate::{
    collections::{CollectionsDocument, pick_collection},
    fs::{FileSystem, FileSystemError},
    layout::InstallRoot,
    manifest::{CompetencyManifest, read_manifest},
};

const TITLE: &str = "# OLAF Competency Index";

/// One competency as it appears in the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: String,
    pub name: Option<String>,
    pub short_description: Option<String>,
    pub skills: Vec<String>,
}

impl IndexEntry {
    fn from_manifest(id: &str, manifest: Option<CompetencyManifest>) -> Self {
        match manifest {
            Some(manifest) => Self {
                id: id.to_string(),
                name: manifest.metadata.name.clone(),
                short_description: manifest.metadata.short_description.clone(),
                skills: manifest.skill_ids(),
            },
            None => Self {
                id: id.to_string(),
                name: None,
                short_description: None,
                skills: Vec::new(),
            },
        }
    }
}

/// Gather entries for the selected collection, looking manifests up in `roots` in order.
pub fn collect_entries<F>(
    fs: &F,
    document: &CollectionsDocument,
    roots: &[&InstallRoot],
) -> (Option<String>, Vec<IndexEntry>)
where
    F: FileSystem + ?Sized,
{
    let Some(collection_id) = pick_collection(document) else {
        return (None, Vec::new());
    };

    let ids = document
        .collection(collection_id)
        .and_then(|c| c.competencies.clone())
        .unwrap_or_default();

    let entries = ids
        .iter()
        .map(|id| {
            let manifest = roots
                .iter()
                .filter_map(|root| root.competency_manifest(id).ok())
                .find(|path| fs.is_file(path))
                .and_then(|path| read_manifest(fs, &path).ok());
            IndexEntry::from_manifest(id, manifest)
        })
        .collect();

    (Some(collection_id.to_string()), entries)
}

/// Render the index as Markdown
#[must_use]
pub fn render_index(collection: Option<&str>, entries: &[IndexEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{TITLE}\n");

    let Some(collection) = collection else {
        out.push_str("_No competency collection is available._\n");
        return out;
    };

    let _ = writeln!(out, "Collection: `{collection}`\n");
    if entries.is_empty() {
        out.push_str("_This collection lists no installed competencies._\n");
        return out;
    }

    for entry in entries {
        match &entry.name {
            Some(name) => {
                let _ = writeln!(out, "## {name} (`{}`)\n", entry.id);
            }
            None => {
                let _ = writeln!(out, "## `{}`\n", entry.id);
            }
        }

        if let Some(description) = &entry.short_description {
            let _ = writeln!(out, "{description}\n");
        }

        if entry.skills.is_empty() {
            out.push_str("No skills listed.\n\n");
        } else {
            out.push_str("Skills:\n\n");
            for skill in &entry.skills {
                let _ = writeln!(out, "- `{skill}`");
            }
            out.push('\n');
        }
    }

    out
}

/// Render and write an index for `document` to `output`
///
/// # Errors
///
/// Returns [`FileSystemError`] if the index cannot be written.
pub fn write_index<F>(
    fs: &F,
    output: &Path,
    document: &CollectionsDocument,
    roots: &[&InstallRoot],
) -> Result<(), FileSystemError>
where
    F: FileSystem + ?Sized,
{
    let (collection, entries) = collect_entries(fs, document, roots);
    let text = render_index(collection.as_deref(), &entries);

    fs.write_file(output, text.as_bytes())?;
    debug!(path = %output.display(), ?collection, entries = entries.len(), "wrote index");
    Ok(())
}
