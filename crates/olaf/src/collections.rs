//! The competency collections document (`reference/competency-collections.json`).
//!
//! [`normalize`] is a pure `Document -> Document` function; the file-level wrappers decide
//! whether to persist based on the `changed` flag it returns.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::{
    diagnostic::{Diagnostic, DiagnosticKind, Diagnostics},
    document::{DocumentError, read_json, write_json},
    fs::FileSystem,
    layout::{InstallRoot, UnitKind},
};

/// Legacy competency ids and their current names
pub const RENAMES: [(&str, &str); 3] = [
    ("my-prompts", "team-competencies"),
    ("olaf-olaf-admin", "haal-admin"),
    ("olaf-admin", "haal-admin"),
];

/// Collection used when the active one is missing
pub const FALLBACK_COLLECTION: &str = "core";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionsDocument {
    #[serde(default)]
    pub collections: Vec<Collection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CollectionsMetadata>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCollection")]
pub struct Collection {
    #[serde(default)]
    pub id: String,

    /// `None` when the document does not list competencies for this collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competencies: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Non-string entries dropped from `competencies` while reading
    #[serde(skip)]
    pub skipped_entries: usize,
}

/// A collection as written, before non-string competency entries are dropped
#[derive(Deserialize)]
struct RawCollection {
    #[serde(default)]
    id: String,

    #[serde(default)]
    competencies: Option<Vec<Value>>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawCollection> for Collection {
    fn from(raw: RawCollection) -> Self {
        let mut skipped_entries = 0;
        let competencies = raw.competencies.map(|entries| {
            entries
                .into_iter()
                .filter_map(|entry| match entry {
                    Value::String(id) => Some(id),
                    _ => {
                        skipped_entries += 1;
                        None
                    }
                })
                .collect()
        });

        Self {
            id: raw.id,
            competencies,
            extra: raw.extra,
            skipped_entries,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionsMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_collection: Option<String>,

    #[serde(rename = "lastUpdated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CollectionsDocument {
    #[must_use]
    pub fn active_collection(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.active_collection.as_deref())
    }

    #[must_use]
    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    fn stamp(&mut self) {
        self.metadata.get_or_insert_with(Default::default).last_updated =
            Some(Utc::now().to_rfc3339());
    }
}

/// Result of [`normalize`]
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub document: CollectionsDocument,
    pub changed: bool,
}

/// Current id for a possibly legacy competency id
#[must_use]
pub fn rename(id: &str) -> &str {
    RENAMES
        .iter()
        .find(|(legacy, _)| *legacy == id)
        .map_or(id, |(_, current)| *current)
}

/// Rename legacy ids, drop ids for which `exists` is false, and drop collections left empty.
///
/// Collections without a competency list are kept as they are. A collection that lost
/// non-string entries while being read counts as a change. Does not touch timestamps.
pub fn normalize<E>(document: CollectionsDocument, exists: E) -> Normalized
where
    E: Fn(&str) -> bool,
{
    let mut changed = false;
    let mut document = document;

    let collections = std::mem::take(&mut document.collections);
    document.collections = collections
        .into_iter()
        .filter_map(|mut collection| {
            if std::mem::take(&mut collection.skipped_entries) > 0 {
                changed = true;
            }
            let Some(listed) = collection.competencies.take() else {
                return Some(collection);
            };

            let kept: Vec<String> = listed
                .iter()
                .map(|id| rename(id))
                .filter(|id| exists(id))
                .map(ToString::to_string)
                .collect();

            if kept != listed {
                changed = true;
            }
            if kept.is_empty() {
                debug!(collection = %collection.id, "dropping empty collection");
                changed = true;
                return None;
            }

            collection.competencies = Some(kept);
            Some(collection)
        })
        .collect();

    Normalized { document, changed }
}

/// The collection an index is built for: the active one, else `core`, else the smallest id.
#[must_use]
pub fn pick_collection(document: &CollectionsDocument) -> Option<&str> {
    let has = |id: &str| document.collections.iter().any(|c| c.id == id);

    document
        .active_collection()
        .filter(|id| has(id))
        .or_else(|| has(FALLBACK_COLLECTION).then_some(FALLBACK_COLLECTION))
        .or_else(|| {
            document
                .collections
                .iter()
                .map(|c| c.id.as_str())
                .filter(|id| !id.is_empty())
                .min()
        })
}

/// Read the collections document
///
/// # Errors
///
/// Returns [`DocumentError`] if it cannot be read or parsed.
pub fn read_collections<F>(fs: &F, path: &Path) -> Result<CollectionsDocument, DocumentError>
where
    F: FileSystem + ?Sized,
{
    read_json(fs, path)
}

/// Normalize the installation's collections document in place.
///
/// A competency is present when `competencies/<id>` exists below `root`. Returns whether the
/// document changed; it is only rewritten, with a fresh `lastUpdated`, when it did.
///
/// # Errors
///
/// Returns [`DocumentError`] when the document exists but cannot be parsed or written.
pub fn normalize_installed<F>(
    fs: &F,
    root: &InstallRoot,
    diagnostics: &mut Diagnostics,
) -> Result<bool, DocumentError>
where
    F: FileSystem + ?Sized,
{
    let path = root.collections_file();
    if !fs.is_file(&path) {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticKind::CollectionsMissing,
                "no competency collections document; normalization skipped",
            )
            .at(&path),
        );
        return Ok(false);
    }

    let document = read_collections(fs, &path)?;
    for collection in &document.collections {
        if collection.skipped_entries > 0 {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::CollectionEntrySkipped,
                    format!(
                        "{} non-string competency entr{} in collection '{}' ignored",
                        collection.skipped_entries,
                        if collection.skipped_entries == 1 { "y" } else { "ies" },
                        collection.id
                    ),
                )
                .at(&path),
            );
        }
    }
    let Normalized {
        mut document,
        changed,
    } = normalize(document, |id| {
        root.unit_dir(UnitKind::Competency, id)
            .is_ok_and(|dir| fs.path_exists(&dir))
    });

    if changed {
        document.stamp();
        write_json(fs, &path, &document)?;
        info!(path = %path.display(), "normalized competency collections");
    }

    Ok(changed)
}

/// Adopt the seed's active collection when the installed document has a collection by that id.
///
/// Returns whether the installed document was rewritten.
///
/// # Errors
///
/// Returns [`DocumentError`] when the installed document cannot be read or written. An
/// unreadable seed document is only a diagnostic.
pub fn sync_active_collection<F>(
    fs: &F,
    seed_file: &Path,
    installed_file: &Path,
    diagnostics: &mut Diagnostics,
) -> Result<bool, DocumentError>
where
    F: FileSystem + ?Sized,
{
    if !fs.is_file(seed_file) || !fs.is_file(installed_file) {
        return Ok(false);
    }

    let seed = match read_collections(fs, seed_file) {
        Ok(seed) => seed,
        Err(e) => {
            diagnostics.push(
                Diagnostic::new(DiagnosticKind::DocumentIgnored, e.to_string()).at(seed_file),
            );
            return Ok(false);
        }
    };
    let Some(wanted) = seed
        .active_collection()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    else {
        return Ok(false);
    };

    let mut installed = read_collections(fs, installed_file)?;
    if installed.collection(wanted).is_none() || installed.active_collection() == Some(wanted) {
        return Ok(false);
    }

    installed
        .metadata
        .get_or_insert_with(Default::default)
        .active_collection = Some(wanted.to_string());
    installed.stamp();
    write_json(fs, installed_file, &installed)?;
    info!(active_collection = wanted, "adopted the source's active collection");

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::real::RealFileSystem;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn document(value: Value) -> CollectionsDocument {
        serde_json::from_value(value).unwrap()
    }

    fn ids(document: &CollectionsDocument) -> Vec<(&str, Option<Vec<String>>)> {
        document
            .collections
            .iter()
            .map(|c| (c.id.as_str(), c.competencies.clone()))
            .collect()
    }

    #[test]
    fn test_rename_before_filtering() {
        let doc = document(json!({
            "collections": [
                {"id": "core", "competencies": ["olaf-admin", "my-prompts", "developer"]}
            ]
        }));

        let normalized = normalize(doc, |id| ["haal-admin", "developer"].contains(&id));

        assert!(normalized.changed);
        assert_eq!(
            ids(&normalized.document),
            [(
                "core",
                Some(vec!["haal-admin".to_string(), "developer".to_string()])
            )]
        );
    }

    #[test]
    fn test_empty_collections_are_dropped_and_unlisted_kept() {
        let doc = document(json!({
            "collections": [
                {"id": "gone", "competencies": ["missing"]},
                {"id": "opaque", "description": "no list here"},
                {"id": "core", "competencies": ["developer"]}
            ],
            "metadata": {"active_collection": "core"}
        }));

        let normalized = normalize(doc, |id| id == "developer");

        let kept: Vec<_> = normalized
            .document
            .collections
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(kept, ["opaque", "core"]);
        assert!(normalized.changed);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let doc = document(json!({
            "collections": [
                {"id": "core", "competencies": ["olaf-olaf-admin", "x"]},
                {"id": "empty", "competencies": []}
            ]
        }));
        let exists = |id: &str| id == "haal-admin";

        let once = normalize(doc, exists);
        let twice = normalize(once.document.clone(), exists);

        assert!(once.changed);
        assert!(!twice.changed);
        assert_eq!(once.document, twice.document);
    }

    #[test]
    fn test_unknown_keys_are_preserved() {
        let original = json!({
            "collections": [{"id": "core", "competencies": ["a"], "label": "Core"}],
            "metadata": {"active_collection": "core", "owner": "team"},
            "competency_locations": {"a": "global"}
        });

        let normalized = normalize(document(original.clone()), |_| true);

        assert!(!normalized.changed);
        assert_eq!(serde_json::to_value(&normalized.document).unwrap(), original);
    }

    #[test]
    fn test_pick_collection_order() {
        let active = document(json!({
            "collections": [{"id": "zeta"}, {"id": "core"}],
            "metadata": {"active_collection": "zeta"}
        }));
        let stale = document(json!({
            "collections": [{"id": "zeta"}, {"id": "core"}],
            "metadata": {"active_collection": "removed"}
        }));
        let no_core = document(json!({"collections": [{"id": "zeta"}, {"id": "beta"}]}));

        assert_eq!(pick_collection(&active), Some("zeta"));
        assert_eq!(pick_collection(&stale), Some("core"));
        assert_eq!(pick_collection(&no_core), Some("beta"));
        assert_eq!(pick_collection(&CollectionsDocument::default()), None);
    }

    #[test]
    fn test_normalize_installed_stamps_only_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let root = InstallRoot::new(dir.path());
        std::fs::create_dir_all(root.path().join("competencies/developer")).unwrap();
        let file = root.collections_file();
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(
            &file,
            r#"{"collections": [{"id": "core", "competencies": ["developer", "gone"]}], "metadata": {"lastUpdated": "old"}}"#,
        )
        .unwrap();
        let mut diagnostics = Diagnostics::new();

        assert!(normalize_installed(&RealFileSystem, &root, &mut diagnostics).unwrap());
        let first = std::fs::read_to_string(&file).unwrap();
        assert!(!normalize_installed(&RealFileSystem, &root, &mut diagnostics).unwrap());
        let second = std::fs::read_to_string(&file).unwrap();

        assert_eq!(first, second);
        let doc = read_collections(&RealFileSystem, &file).unwrap();
        assert_ne!(
            doc.metadata.unwrap().last_updated.as_deref(),
            Some("old")
        );
    }

    #[test]
    fn test_non_string_entries_are_dropped_not_fatal() {
        let doc = document(json!({
            "collections": [
                {"id": "core", "competencies": ["developer", 7, null, {"id": "x"}]},
                {"id": "numbers", "competencies": [1, 2]}
            ]
        }));

        assert_eq!(doc.collections[0].skipped_entries, 3);
        let normalized = normalize(doc, |_| true);

        assert!(normalized.changed);
        assert_eq!(
            ids(&normalized.document),
            [("core", Some(vec!["developer".to_string()]))]
        );
        assert_eq!(
            serde_json::to_value(&normalized.document).unwrap()["collections"][0],
            json!({"id": "core", "competencies": ["developer"]})
        );
    }

    #[test]
    fn test_normalize_installed_reports_skipped_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = InstallRoot::new(dir.path());
        std::fs::create_dir_all(root.path().join("competencies/developer")).unwrap();
        let file = root.collections_file();
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(
            &file,
            r#"{"collections": [{"id": "core", "competencies": ["developer", 42]}]}"#,
        )
        .unwrap();
        let mut diagnostics = Diagnostics::new();

        assert!(normalize_installed(&RealFileSystem, &root, &mut diagnostics).unwrap());

        let skipped = diagnostics.of_kind(DiagnosticKind::CollectionEntrySkipped);
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].message().contains("collection 'core'"));
        let rewritten = read_collections(&RealFileSystem, &file).unwrap();
        assert_eq!(
            rewritten.collections[0].competencies,
            Some(vec!["developer".to_string()])
        );
    }

    #[test]
    fn test_normalize_installed_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let root = InstallRoot::new(dir.path());
        let mut diagnostics = Diagnostics::new();

        assert!(!normalize_installed(&RealFileSystem, &root, &mut diagnostics).unwrap());
        assert_eq!(
            diagnostics.of_kind(DiagnosticKind::CollectionsMissing).len(),
            1
        );

        std::fs::create_dir_all(root.reference_dir()).unwrap();
        std::fs::write(root.collections_file(), "{ broken").unwrap();
        assert!(matches!(
            normalize_installed(&RealFileSystem, &root, &mut diagnostics),
            Err(DocumentError::Malformed { .. })
        ));
    }

    #[test]
    fn test_sync_active_collection_seed_wins() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("seed.json");
        let installed = dir.path().join("installed.json");
        std::fs::write(&seed, r#"{"metadata": {"active_collection": " dev "}}"#).unwrap();
        std::fs::write(
            &installed,
            r#"{"collections": [{"id": "core"}, {"id": "dev"}], "metadata": {"active_collection": "core"}}"#,
        )
        .unwrap();
        let mut diagnostics = Diagnostics::new();

        assert!(sync_active_collection(&RealFileSystem, &seed, &installed, &mut diagnostics).unwrap());
        assert!(!sync_active_collection(&RealFileSystem, &seed, &installed, &mut diagnostics).unwrap());

        let doc = read_collections(&RealFileSystem, &installed).unwrap();
        assert_eq!(doc.active_collection(), Some("dev"));
    }

    #[test]
    fn test_sync_ignores_unknown_collection() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("seed.json");
        let installed = dir.path().join("installed.json");
        std::fs::write(&seed, r#"{"metadata": {"active_collection": "nope"}}"#).unwrap();
        std::fs::write(&installed, r#"{"collections": [{"id": "core"}]}"#).unwrap();

        assert!(
            !sync_active_collection(&RealFileSystem, &seed, &installed, &mut Diagnostics::new())
                .unwrap()
        );
        assert_eq!(
            std::fs::read_to_string(&installed).unwrap(),
            r#"{"collections": [{"id": "core"}]}"#
        );
    }
}
