//! Explicit removal of deprecated skills and competencies.
//!
//! Prune lists are collected from every candidate location and unioned. Only
//! `skills/<id>` and `competencies/<id>` below the installation root can ever be deleted.

use std::{
    collections::{BTreeSet, HashSet},
    path::{Path, PathBuf},
};

use serde_json::Value;
use tracing::{debug, info};

use crate::{
    diagnostic::{Diagnostic, DiagnosticKind, Diagnostics},
    document::read_json,
    fs::{FileSystem, FileSystemError, Removal, RemovalPolicy, remove_tree},
    layout::{InstallRoot, KERNEL_COMPETENCY, REFERENCE_DIR, UnitKind},
};

/// Prune list names inside a root's `reference/` folder, in lookup order
pub const PRUNE_FILES: [&str; 2] = ["olaf-prune-list.json", "prune-list.json"];

const SKILL_KEYS: [&str; 2] = ["skills", "packages"];
const COMPETENCY_KEYS: [&str; 2] = ["competencies", "groups"];

/// Identifiers requested for deletion, per namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneRequest {
    skills: BTreeSet<String>,
    competencies: BTreeSet<String>,
}

impl PruneRequest {
    #[must_use]
    pub fn new<S, C>(skills: S, competencies: C) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            skills: skills.into_iter().map(Into::into).collect(),
            competencies: competencies.into_iter().map(Into::into).collect(),
        }
    }

    fn from_document(document: &Value) -> Option<Self> {
        let object = document.as_object()?;
        let collect = |keys: &[&str]| -> BTreeSet<String> {
            keys.iter()
                .filter_map(|key| object.get(*key))
                .filter_map(Value::as_array)
                .flatten()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(ToString::to_string)
                .collect()
        };

        Some(Self {
            skills: collect(&SKILL_KEYS),
            competencies: collect(&COMPETENCY_KEYS),
        })
    }

    /// Set union; nothing is ever removed from a request
    pub fn union(&mut self, other: Self) {
        self.skills.extend(other.skills);
        self.competencies.extend(other.competencies);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.competencies.is_empty()
    }

    #[must_use]
    pub fn skills(&self) -> &BTreeSet<String> {
        &self.skills
    }

    #[must_use]
    pub fn competencies(&self) -> &BTreeSet<String> {
        &self.competencies
    }

    fn targets(&self) -> impl Iterator<Item = (UnitKind, &str)> {
        self.skills
            .iter()
            .map(|id| (UnitKind::Skill, id.as_str()))
            .chain(
                self.competencies
                    .iter()
                    .map(|id| (UnitKind::Competency, id.as_str())),
            )
    }
}

/// Existing prune list files, in candidate order and without case-insensitive duplicates.
///
/// `explicit` is checked first, then `reference/<name>` below each of `roots`.
pub fn find_prune_lists<F>(fs: &F, explicit: Option<&Path>, roots: &[&Path]) -> Vec<PathBuf>
where
    F: FileSystem + ?Sized,
{
    let candidates = explicit.map(Path::to_path_buf).into_iter().chain(
        roots.iter().flat_map(|root| {
            PRUNE_FILES
                .iter()
                .map(move |name| root.join(REFERENCE_DIR).join(name))
        }),
    );

    let mut seen = HashSet::new();
    candidates
        .filter(|path| fs.is_file(path))
        .filter(|path| seen.insert(path.to_string_lossy().to_lowercase()))
        .collect()
}

/// Read and union every prune list in `files`; unreadable files only produce diagnostics.
pub fn collect_requests<F>(fs: &F, files: &[PathBuf], diagnostics: &mut Diagnostics) -> PruneRequest
where
    F: FileSystem + ?Sized,
{
    let mut request = PruneRequest::default();

    for path in files {
        let parsed = read_json::<Value, _>(fs, path)
            .map_err(|e| e.to_string())
            .and_then(|doc| {
                PruneRequest::from_document(&doc)
                    .ok_or_else(|| "prune list is not a JSON object".to_string())
            });

        match parsed {
            Ok(found) => {
                debug!(path = %path.display(), ?found, "read prune list");
                request.union(found);
            }
            Err(message) => diagnostics.push(
                Diagnostic::new(DiagnosticKind::PruneListMalformed, message).at(path),
            ),
        }
    }

    request
}

/// What a prune run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneOutcome {
    pub sources: Vec<PathBuf>,
    pub removed: Vec<String>,
    pub skipped: Vec<String>,
}

/// Delete every requested unit that exists below `root`.
///
/// # Errors
///
/// Returns [`FileSystemError`] only when a path could neither be removed nor moved aside.
pub fn apply<F>(
    fs: &F,
    root: &InstallRoot,
    request: &PruneRequest,
    policy: &RemovalPolicy,
    diagnostics: &mut Diagnostics,
) -> Result<(Vec<String>, Vec<String>), FileSystemError>
where
    F: FileSystem + ?Sized,
{
    let mut removed = Vec::new();
    let mut skipped = Vec::new();

    for (kind, id) in request.targets() {
        let label = format!("{}/{id}", kind.dir_name());

        if kind == UnitKind::Competency && id == KERNEL_COMPETENCY {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::PruneRefused,
                format!("refusing to prune the user-owned competency '{id}'"),
            ));
            skipped.push(label);
            continue;
        }

        let path = match root.unit_dir(kind, id) {
            Ok(path) => path,
            Err(e) => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::PruneRefused,
                    format!("refusing to prune {kind} '{id}': {e}"),
                ));
                skipped.push(label);
                continue;
            }
        };

        if !fs.is_dir(&path) {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::PruneTargetMissing,
                    format!("{kind} '{id}' is not installed"),
                )
                .at(&path),
            );
            skipped.push(label);
            continue;
        }

        match remove_tree(fs, &path, policy)? {
            Removal::Absent => skipped.push(label),
            Removal::Removed | Removal::MovedAside(_) => {
                info!(%kind, id, "pruned");
                removed.push(label);
            }
        }
    }

    Ok((removed, skipped))
}

/// Full prune step: discover lists, union them, delete.
///
/// When `enabled` is false nothing is read or deleted and a diagnostic says so.
///
/// # Errors
///
/// Returns [`FileSystemError`] only when a path could neither be removed nor moved aside.
pub fn prune<F>(
    fs: &F,
    root: &InstallRoot,
    candidates: &[PathBuf],
    enabled: bool,
    policy: &RemovalPolicy,
    diagnostics: &mut Diagnostics,
) -> Result<PruneOutcome, FileSystemError>
where
    F: FileSystem + ?Sized,
{
    if !enabled {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::PruneDisabled,
            "pruning disabled; no units removed",
        ));
        return Ok(PruneOutcome::default());
    }

    if candidates.is_empty() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::PruneListMissing,
            "no prune list found in any source or the local project",
        ));
        return Ok(PruneOutcome::default());
    }

    let request = collect_requests(fs, candidates, diagnostics);
    let (removed, skipped) = apply(fs, root, &request, policy, diagnostics)?;

    Ok(PruneOutcome {
        sources: candidates.to_vec(),
        removed,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::real::RealFileSystem;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_document_keys_and_aliases() {
        let request = PruneRequest::from_document(&json!({
            "skills": [" a ", "", 3],
            "packages": ["b"],
            "groups": ["g"],
            "competencies": "not-a-list"
        }))
        .unwrap();

        assert_eq!(request, PruneRequest::new(["a", "b"], ["g"]));
        assert!(PruneRequest::from_document(&json!(["a"])).is_none());
    }

    #[test]
    fn test_union_is_a_set_union() {
        let mut request = PruneRequest::new(["a"], Vec::<String>::new());
        request.union(PruneRequest::new(["b", "a"], ["c"]));

        assert_eq!(request, PruneRequest::new(["a", "b"], ["c"]));
    }

    #[test]
    fn test_candidates_are_ordered_and_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("primary");
        let local = dir.path().join("local");
        let explicit = local.join("reference/olaf-prune-list.json");
        write(&primary.join("reference/prune-list.json"), "{}");
        write(&primary.join("reference/olaf-prune-list.json"), "{}");
        write(&explicit, "{}");

        let found = find_prune_lists(
            &RealFileSystem,
            Some(&explicit),
            &[primary.as_path(), dir.path().join("missing").as_path(), local.as_path()],
        );

        assert_eq!(
            found,
            vec![
                explicit.clone(),
                primary.join("reference/olaf-prune-list.json"),
                primary.join("reference/prune-list.json"),
            ]
        );
    }

    #[test]
    fn test_prune_unions_sources_and_skips_missing() {
        let dir = tempfile::tempdir().unwrap();
        let root = InstallRoot::new(dir.path().join("target"));
        write(&root.path().join("skills/a/skill.md"), "a");
        write(&root.path().join("skills/b/skill.md"), "b");
        write(&root.path().join("skills/keep/skill.md"), "keep");
        let first = dir.path().join("one.json");
        let second = dir.path().join("two.json");
        write(&first, r#"{"skills": ["a"]}"#);
        write(&second, r#"{"skills": ["b", "ghost"]}"#);
        let mut diagnostics = Diagnostics::new();

        let outcome = prune(
            &RealFileSystem,
            &root,
            &[first, second],
            true,
            &RemovalPolicy::default(),
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(outcome.removed, ["skills/a", "skills/b"]);
        assert_eq!(outcome.skipped, ["skills/ghost"]);
        assert!(root.path().join("skills/keep").is_dir());
        assert_eq!(
            diagnostics.of_kind(DiagnosticKind::PruneTargetMissing).len(),
            1
        );
    }

    #[test]
    fn test_traversal_and_kernel_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let root = InstallRoot::new(dir.path().join("target"));
        write(&root.kernel_manifest(), "{}");
        write(&dir.path().join("outside/file.md"), "precious");
        let list = dir.path().join("list.json");
        write(
            &list,
            r#"{"skills": ["../../outside", ".."], "competencies": ["my-competencies"]}"#,
        );
        let mut diagnostics = Diagnostics::new();

        let outcome = prune(
            &RealFileSystem,
            &root,
            &[list],
            true,
            &RemovalPolicy::default(),
            &mut diagnostics,
        )
        .unwrap();

        assert!(outcome.removed.is_empty());
        assert_eq!(diagnostics.of_kind(DiagnosticKind::PruneRefused).len(), 3);
        assert!(dir.path().join("outside/file.md").is_file());
        assert!(root.kernel_manifest().is_file());
    }

    #[test]
    fn test_disabled_and_missing_lists_are_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let root = InstallRoot::new(dir.path());
        let list = dir.path().join("list.json");
        write(&list, r#"{"skills": ["a"]}"#);
        write(&root.path().join("skills/a/skill.md"), "a");
        let mut diagnostics = Diagnostics::new();

        let disabled = prune(
            &RealFileSystem,
            &root,
            &[list],
            false,
            &RemovalPolicy::default(),
            &mut diagnostics,
        )
        .unwrap();
        let nothing = prune(
            &RealFileSystem,
            &root,
            &[],
            true,
            &RemovalPolicy::default(),
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(disabled, PruneOutcome::default());
        assert_eq!(nothing, PruneOutcome::default());
        assert!(root.path().join("skills/a").is_dir());
        assert_eq!(diagnostics.of_kind(DiagnosticKind::PruneDisabled).len(), 1);
        assert_eq!(diagnostics.of_kind(DiagnosticKind::PruneListMissing).len(), 1);
    }

    #[test]
    fn test_malformed_list_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        write(&good, r#"{"competencies": ["old"]}"#);
        write(&bad, "{ nope");
        let mut diagnostics = Diagnostics::new();

        let request = collect_requests(&RealFileSystem, &[bad, good], &mut diagnostics);

        assert_eq!(request, PruneRequest::new(Vec::<String>::new(), ["old"]));
        assert_eq!(
            diagnostics.of_kind(DiagnosticKind::PruneListMalformed).len(),
            1
        );
    }
}
