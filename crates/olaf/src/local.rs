//! The per-project side of an install: skeleton, team competency, data seed and index.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    collections::{CollectionsDocument, read_collections},
    commands::{CommandError, CommandRunner, Invocation},
    diagnostic::{Diagnostic, DiagnosticKind, Diagnostics},
    document::DocumentError,
    fs::{FileSystem, FileSystemError, RemovalPolicy, remove_tree},
    index::write_index,
    layout::{
        COMPETENCIES_DIR, InstallRoot, MANIFEST_FILE, PACKAGE_TREE_DIR, REFERENCE_DIR, SKILLS_DIR,
        TEAM_COMPETENCY, UnitKind,
    },
    manifest::{Generate, TEAM_DEFAULTS, ensure_manifest},
    overlay::copy_tree,
};

const GIT_DIR: &str = ".git";
const LOCATIONS_KEY: &str = "competency_locations";

/// Patterns the project's git exclude file must contain
pub const EXCLUDE_ENTRIES: [&str; 2] = ["olaf-*", ".olaf/work/"];

#[derive(Error, Debug, Clone)]
pub enum LocalError {
    #[error(
        "'{}' is not a git repository (missing .git); run 'git init' there or pass --init-git",
        path.display()
    )]
    NotAGitRepository { path: PathBuf },

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Handle to the project that receives the local `.olaf` folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalProject {
    root: InstallRoot,
}

impl LocalProject {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            root: InstallRoot::new(path),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// The project seen as an installation root (`competencies/`, `reference/`)
    #[must_use]
    pub fn as_root(&self) -> &InstallRoot {
        &self.root
    }

    #[must_use]
    pub fn olaf_dir(&self) -> PathBuf {
        self.path().join(PACKAGE_TREE_DIR)
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.olaf_dir().join("data")
    }

    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.olaf_dir().join("work").join("staging")
    }

    #[must_use]
    pub fn team_manifest(&self) -> PathBuf {
        self.root
            .namespace_dir(UnitKind::Competency)
            .join(TEAM_COMPETENCY)
            .join(MANIFEST_FILE)
    }

    #[must_use]
    pub fn git_exclude(&self) -> PathBuf {
        self.path().join(GIT_DIR).join("info").join("exclude")
    }
}

/// Make sure the project is a git work tree, running `git init` when `init` is set.
///
/// Returns `true` when a repository was initialized.
///
/// # Errors
///
/// Returns [`LocalError::NotAGitRepository`] when there is no `.git` and `init` is false, and
/// [`LocalError::Command`] when `git init` fails.
pub async fn ensure_git_repo<F, CR>(
    fs: &F,
    runner: &CR,
    git_program: &str,
    project: &LocalProject,
    init: bool,
) -> Result<bool, LocalError>
where
    F: FileSystem + ?Sized,
    CR: CommandRunner + ?Sized,
{
    if fs.path_exists(&project.path().join(GIT_DIR)) {
        return Ok(false);
    }
    if !init {
        return Err(LocalError::NotAGitRepository {
            path: project.path().to_path_buf(),
        });
    }

    fs.create_dir_all(project.path())?;
    let invocation = Invocation::new(git_program)
        .arg("init")
        .current_dir(project.path());
    runner.execute(&invocation).await?.ensure_success(&invocation)?;
    info!(path = %project.path().display(), "initialized git repository");

    Ok(true)
}

/// What the local phase did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalOutcome {
    pub seeded_collections: bool,
    pub seeded_team_competency: bool,
    pub generated_team_manifest: bool,
    pub local_competencies: Vec<String>,
    pub data_files_copied: usize,
    pub exclude_entries_added: Vec<String>,
    pub index: Option<PathBuf>,
}

/// Bring the project in line with the freshly installed global root.
///
/// `primary_root` is the primary snapshot. A missing team competency is seeded from it, and
/// competencies the project marks as local are copied from it.
///
/// # Errors
///
/// Returns [`LocalError`] when a required directory or file cannot be written.
pub fn sync_local_project<F>(
    fs: &F,
    project: &LocalProject,
    global: &InstallRoot,
    primary_root: Option<&Path>,
    policy: &RemovalPolicy,
    diagnostics: &mut Diagnostics,
) -> Result<LocalOutcome, LocalError>
where
    F: FileSystem + ?Sized,
{
    ensure_skeleton(fs, project)?;

    let seeded_collections = seed_collections(fs, project, global)?;
    let document = load_collections(fs, project, global, diagnostics);
    let seeded_team_competency = match primary_root {
        Some(primary_root) => seed_team_competency(fs, &InstallRoot::new(primary_root), project)?,
        None => false,
    };
    let generated_team_manifest = ensure_manifest(
        fs,
        &project.team_manifest(),
        &TEAM_DEFAULTS,
        Generate::WhenUnreadable,
    )?;

    let local_competencies = match (primary_root, &document) {
        (Some(primary_root), Some(document)) => copy_local_competencies(
            fs,
            &InstallRoot::new(primary_root),
            project,
            &local_competency_ids(document),
            policy,
            diagnostics,
        )?,
        _ => Vec::new(),
    };

    let data_files_copied = copy_missing_files(fs, &global.data_dir(), &project.data_dir())?;
    let exclude_entries_added = ensure_git_exclude(fs, project)?;

    let index = match &document {
        Some(document) => {
            let output = project.as_root().index_file();
            write_index(fs, &output, document, &[project.as_root(), global])?;
            Some(output)
        }
        None => {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::CollectionsMissing,
                    "no readable competency collections for the local index",
                )
                .at(project.path()),
            );
            None
        }
    };

    Ok(LocalOutcome {
        seeded_collections,
        seeded_team_competency,
        generated_team_manifest,
        local_competencies,
        data_files_copied,
        exclude_entries_added,
        index,
    })
}

fn ensure_skeleton<F>(fs: &F, project: &LocalProject) -> Result<(), FileSystemError>
where
    F: FileSystem + ?Sized,
{
    for dir in [
        project.data_dir(),
        project.staging_dir(),
        project.path().join(REFERENCE_DIR),
        project.path().join(COMPETENCIES_DIR),
        project.path().join(SKILLS_DIR),
    ] {
        fs.create_dir_all(&dir)?;
    }
    Ok(())
}

/// Copy the installed collections document into the project when it has none
fn seed_collections<F>(
    fs: &F,
    project: &LocalProject,
    global: &InstallRoot,
) -> Result<bool, FileSystemError>
where
    F: FileSystem + ?Sized,
{
    let local_file = project.as_root().collections_file();
    let global_file = global.collections_file();
    if fs.path_exists(&local_file) || !fs.is_file(&global_file) {
        return Ok(false);
    }

    fs.copy_file(&global_file, &local_file)?;
    debug!(path = %local_file.display(), "seeded local competency collections");
    Ok(true)
}

/// Seed the project's team competency from `source` when the project has none.
///
/// A `team-competencies` folder holding a manifest is copied whole. Otherwise a flat
/// `team-competencies-manifest*.json` next to it becomes the team manifest. Returns whether
/// anything was copied.
///
/// # Errors
///
/// Returns [`FileSystemError`] if the source cannot be listed or a copy fails.
pub fn seed_team_competency<F>(
    fs: &F,
    source: &InstallRoot,
    project: &LocalProject,
) -> Result<bool, FileSystemError>
where
    F: FileSystem + ?Sized,
{
    let local_dir = project
        .as_root()
        .namespace_dir(UnitKind::Competency)
        .join(TEAM_COMPETENCY);
    if fs.path_exists(&local_dir) {
        return Ok(false);
    }

    let competencies = source.namespace_dir(UnitKind::Competency);
    let team_dir = competencies.join(TEAM_COMPETENCY);
    if fs.is_dir(&team_dir)
        && fs
            .list_directory(&team_dir)?
            .iter()
            .any(|entry| {
                fs.is_file(entry) && json_stem(entry).is_some_and(|stem| stem.contains("manifest"))
            })
    {
        copy_tree(fs, &team_dir, &local_dir)?;
        info!(from = %team_dir.display(), "seeded team competency");
        return Ok(true);
    }

    if !fs.is_dir(&competencies) {
        return Ok(false);
    }
    let flat = fs
        .list_directory(&competencies)?
        .into_iter()
        .filter(|entry| {
            fs.is_file(entry)
                && json_stem(entry).is_some_and(|stem| stem.starts_with("team-competencies-manifest"))
        })
        .min_by_key(|entry| entry.as_os_str().len());
    let Some(flat) = flat else {
        return Ok(false);
    };

    fs.copy_file(&flat, &local_dir.join(MANIFEST_FILE))?;
    info!(from = %flat.display(), "seeded team competency manifest");
    Ok(true)
}

/// Lowercase file name without `.json`, for JSON files only
fn json_stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    name.strip_suffix(".json").map(str::to_string)
}

/// Copy every file under `from` to the same relative path under `to` unless it already
/// exists there. Returns the number of files copied.
///
/// # Errors
///
/// Returns [`FileSystemError`] if a directory cannot be listed or a copy fails.
pub fn copy_missing_files<F>(fs: &F, from: &Path, to: &Path) -> Result<usize, FileSystemError>
where
    F: FileSystem + ?Sized,
{
    if !fs.is_dir(from) {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in fs.list_directory(from)? {
        let Some(name) = entry.file_name() else {
            continue;
        };
        let destination = to.join(name);

        if fs.is_dir(&entry) {
            copied += copy_missing_files(fs, &entry, &destination)?;
        } else if !fs.path_exists(&destination) {
            if let Some(parent) = destination.parent() {
                fs.create_dir_all(parent)?;
            }
            fs.copy_file(&entry, &destination)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Append missing [`EXCLUDE_ENTRIES`] to `.git/info/exclude`. Returns the entries added.
///
/// Projects whose `.git` is not a directory (worktrees, submodules) are left alone.
///
/// # Errors
///
/// Returns [`FileSystemError`] if the exclude file cannot be read or written.
pub fn ensure_git_exclude<F>(fs: &F, project: &LocalProject) -> Result<Vec<String>, FileSystemError>
where
    F: FileSystem + ?Sized,
{
    if !fs.is_dir(&project.path().join(GIT_DIR)) {
        debug!(path = %project.path().display(), "no .git directory, exclude file untouched");
        return Ok(Vec::new());
    }

    let path = project.git_exclude();
    let existing = if fs.is_file(&path) {
        String::from_utf8_lossy(&fs.read_bytes(&path)?).into_owned()
    } else {
        String::new()
    };

    let present: Vec<&str> = existing.lines().map(str::trim).collect();
    let missing: Vec<String> = EXCLUDE_ENTRIES
        .iter()
        .filter(|entry| {
            let entry: &str = entry;
            !present.contains(&entry) && !present.contains(&entry.trim_end_matches('/'))
        })
        .map(ToString::to_string)
        .collect();

    if missing.is_empty() {
        return Ok(missing);
    }

    let mut updated = existing.clone();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    for entry in &missing {
        updated.push_str(entry);
        updated.push('\n');
    }
    fs.write_file(&path, updated.as_bytes())?;
    info!(path = %path.display(), entries = ?missing, "updated git exclude");

    Ok(missing)
}

/// The project's collections document, falling back to the installed one
fn load_collections<F>(
    fs: &F,
    project: &LocalProject,
    global: &InstallRoot,
    diagnostics: &mut Diagnostics,
) -> Option<CollectionsDocument>
where
    F: FileSystem + ?Sized,
{
    let candidates = [project.as_root().collections_file(), global.collections_file()];
    candidates
        .iter()
        .filter(|path| fs.is_file(path))
        .find_map(|path| match read_collections(fs, path) {
            Ok(document) => Some(document),
            Err(e) => {
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::DocumentIgnored, e.to_string()).at(path),
                );
                None
            }
        })
}

/// Competencies the collections document places in the project (`competency_locations`)
///
/// The team competency is never included; it belongs to the project.
#[must_use]
pub fn local_competency_ids(document: &CollectionsDocument) -> Vec<String> {
    let Some(locations) = document
        .extra
        .get(LOCATIONS_KEY)
        .and_then(Value::as_object)
    else {
        return Vec::new();
    };

    let mut ids: Vec<String> = locations
        .iter()
        .filter(|(id, location)| {
            id.as_str() != "default"
                && id.as_str() != TEAM_COMPETENCY
                && location.as_str() == Some("local")
        })
        .map(|(id, _)| id.clone())
        .collect();
    ids.sort();
    ids
}

/// Replace each listed competency in the project with the copy from `source`.
///
/// # Errors
///
/// Returns [`FileSystemError`] if an existing copy cannot be removed or the copy fails.
pub fn copy_local_competencies<F>(
    fs: &F,
    source: &InstallRoot,
    project: &LocalProject,
    ids: &[String],
    policy: &RemovalPolicy,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<String>, FileSystemError>
where
    F: FileSystem + ?Sized,
{
    let mut copied = Vec::new();

    for id in ids {
        let (Ok(from), Ok(to)) = (
            source.unit_dir(UnitKind::Competency, id),
            project.as_root().unit_dir(UnitKind::Competency, id),
        ) else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::LocalCompetencyMissing,
                format!("local competency '{id}' is not a valid competency id"),
            ));
            continue;
        };

        if !fs.is_dir(&from) {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::LocalCompetencyMissing,
                    format!("local competency '{id}' is not in the primary source"),
                )
                .at(&from),
            );
            continue;
        }

        remove_tree(fs, &to, policy)?;
        copy_tree(fs, &from, &to)?;
        debug!(id, "copied local competency");
        copied.push(id.clone());
    }

    Ok(copied)
}
