//! Preservation of the kernel competency across destructive steps.
//!
//! [`preserve`] copies the kernel competency and every skill its manifest lists into a private
//! temporary directory; [`restore`] puts those exact bytes back, replacing whatever the merges
//! in between wrote. The holding area is deleted when the bundle is dropped.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::{
    diagnostic::{Diagnostic, DiagnosticKind, Diagnostics},
    fs::{FileSystem, FileSystemError, RemovalPolicy, remove_tree},
    layout::{InstallRoot, KERNEL_COMPETENCY, UnitKind},
    manifest::read_manifest,
    overlay::copy_tree,
};

const HOLDING_PREFIX: &str = "olaf_preserve_";

/// A preserved unit, as a path relative to the installation root
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PreservedUnit {
    pub kind: UnitKind,
    pub id: String,
}

impl PreservedUnit {
    fn relative_path(&self) -> PathBuf {
        Path::new(self.kind.dir_name()).join(&self.id)
    }
}

impl std::fmt::Display for PreservedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind.dir_name(), self.id)
    }
}

/// User-owned content held aside for the duration of a destructive step
#[derive(Debug)]
pub struct PreservationBundle {
    holding: TempDir,
    units: Vec<PreservedUnit>,
}

impl PreservationBundle {
    #[must_use]
    pub fn units(&self) -> &[PreservedUnit] {
        &self.units
    }

    #[must_use]
    pub fn holding_dir(&self) -> &Path {
        self.holding.path()
    }
}

/// Copy the kernel competency and its skills out of `root`.
///
/// Returns `None` when the installation has no kernel manifest. Listed skills that are not
/// installed, or whose ids are not plain names, are recorded as diagnostics and skipped.
///
/// # Errors
///
/// Returns [`FileSystemError`] if the holding area cannot be created or a copy fails.
pub fn preserve<F>(
    fs: &F,
    root: &InstallRoot,
    diagnostics: &mut Diagnostics,
) -> Result<Option<PreservationBundle>, FileSystemError>
where
    F: FileSystem + ?Sized,
{
    let manifest_path = root.kernel_manifest();
    if !fs.is_file(&manifest_path) {
        debug!(path = %manifest_path.display(), "no kernel manifest, nothing to preserve");
        return Ok(None);
    }

    let skill_ids = match read_manifest(fs, &manifest_path) {
        Ok(manifest) => manifest.skill_ids(),
        Err(e) => {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::KernelManifestMalformed,
                    format!("{e}; preserving the kernel competency without its skills"),
                )
                .at(&manifest_path),
            );
            Vec::new()
        }
    };

    let holding = tempfile::Builder::new()
        .prefix(HOLDING_PREFIX)
        .tempdir()
        .map_err(|e| FileSystemError::io("create preservation area", &std::env::temp_dir(), e))?;

    let kernel = PreservedUnit {
        kind: UnitKind::Competency,
        id: KERNEL_COMPETENCY.to_string(),
    };
    copy_tree(fs, &root.kernel_dir(), &holding.path().join(kernel.relative_path()))?;
    let mut units = vec![kernel];

    for id in skill_ids {
        let Ok(source) = root.unit_dir(UnitKind::Skill, &id) else {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::DependencyMissing,
                    format!("kernel dependency '{id}' is not a valid skill id"),
                )
                .at(&manifest_path),
            );
            continue;
        };
        if !fs.is_dir(&source) {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::DependencyMissing,
                    format!("kernel dependency '{id}' is not installed; not preserved"),
                )
                .at(&source),
            );
            continue;
        }

        let unit = PreservedUnit {
            kind: UnitKind::Skill,
            id,
        };
        copy_tree(fs, &source, &holding.path().join(unit.relative_path()))?;
        units.push(unit);
    }

    info!(
        units = units.len(),
        holding = %holding.path().display(),
        "preserved kernel competency"
    );
    Ok(Some(PreservationBundle { holding, units }))
}

/// Put preserved units back, replacing whatever is at their paths now.
///
/// Restoring `None` does nothing. Returns the restored units.
///
/// # Errors
///
/// Returns [`FileSystemError`] if a colliding path cannot be removed or a copy fails.
pub fn restore<F>(
    fs: &F,
    root: &InstallRoot,
    bundle: Option<PreservationBundle>,
    policy: &RemovalPolicy,
) -> Result<Vec<PreservedUnit>, FileSystemError>
where
    F: FileSystem + ?Sized,
{
    let Some(bundle) = bundle else {
        return Ok(Vec::new());
    };

    for unit in &bundle.units {
        // Ids were validated when the bundle was built.
        let destination = root.path().join(unit.relative_path());
        remove_tree(fs, &destination, policy)?;
        copy_tree(fs, &bundle.holding.path().join(unit.relative_path()), &destination)?;
        debug!(%unit, "restored");
    }

    info!(units = bundle.units.len(), "restored kernel competency");
    Ok(bundle.units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::real::RealFileSystem;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn installation(skills: &str) -> (tempfile::TempDir, InstallRoot) {
        let dir = tempfile::tempdir().unwrap();
        let root = InstallRoot::new(dir.path());
        write(
            &root.kernel_manifest(),
            &format!(r#"{{"metadata": {{"id": "my-competencies"}}, "bom": {{"skills": {skills}}}}}"#),
        );
        write(&root.kernel_dir().join("notes.md"), "kernel notes");
        (dir, root)
    }

    #[test]
    fn test_fresh_installation_has_nothing_to_preserve() {
        let dir = tempfile::tempdir().unwrap();
        let root = InstallRoot::new(dir.path());
        let mut diagnostics = Diagnostics::new();

        let bundle = preserve(&RealFileSystem, &root, &mut diagnostics).unwrap();

        assert!(bundle.is_none());
        assert!(diagnostics.is_empty());
        assert!(restore(&RealFileSystem, &root, None, &RemovalPolicy::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_preserve_collects_kernel_and_installed_dependencies() {
        let (_dir, root) = installation(r#"["mine", "gone", "../escape"]"#);
        write(&root.path().join("skills/mine/skill.md"), "my skill");
        let mut diagnostics = Diagnostics::new();

        let bundle = preserve(&RealFileSystem, &root, &mut diagnostics)
            .unwrap()
            .unwrap();

        let units: Vec<String> = bundle.units().iter().map(ToString::to_string).collect();
        assert_eq!(units, ["competencies/my-competencies", "skills/mine"]);
        assert_eq!(diagnostics.of_kind(DiagnosticKind::DependencyMissing).len(), 2);
        assert!(bundle.holding_dir().join("skills/mine/skill.md").is_file());
    }

    #[test]
    fn test_restore_discards_intervening_writes() {
        let (_dir, root) = installation(r#"["mine"]"#);
        write(&root.path().join("skills/mine/skill.md"), "my skill");
        let bundle = preserve(&RealFileSystem, &root, &mut Diagnostics::new()).unwrap();

        write(&root.kernel_dir().join("notes.md"), "overwritten by a source");
        write(&root.kernel_dir().join("extra.md"), "added by a source");
        write(&root.path().join("skills/mine/skill.md"), "overwritten");
        fs::remove_file(root.kernel_manifest()).unwrap();

        let restored = restore(&RealFileSystem, &root, bundle, &RemovalPolicy::default()).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(
            fs::read_to_string(root.kernel_dir().join("notes.md")).unwrap(),
            "kernel notes"
        );
        assert!(!root.kernel_dir().join("extra.md").exists());
        assert!(root.kernel_manifest().is_file());
        assert_eq!(
            fs::read_to_string(root.path().join("skills/mine/skill.md")).unwrap(),
            "my skill"
        );
    }

    #[test]
    fn test_round_trip_without_changes_is_byte_identical() {
        let (_dir, root) = installation("[]");
        let binary: Vec<u8> = (0..=255).collect();
        fs::write(root.kernel_dir().join("blob.bin"), &binary).unwrap();
        let before = fs::read(root.kernel_manifest()).unwrap();

        let bundle = preserve(&RealFileSystem, &root, &mut Diagnostics::new()).unwrap();
        restore(&RealFileSystem, &root, bundle, &RemovalPolicy::default()).unwrap();

        assert_eq!(fs::read(root.kernel_dir().join("blob.bin")).unwrap(), binary);
        assert_eq!(fs::read(root.kernel_manifest()).unwrap(), before);
    }

    #[test]
    fn test_malformed_manifest_still_preserves_kernel() {
        let dir = tempfile::tempdir().unwrap();
        let root = InstallRoot::new(dir.path());
        write(&root.kernel_manifest(), "{ not json");
        let mut diagnostics = Diagnostics::new();

        let bundle = preserve(&RealFileSystem, &root, &mut diagnostics)
            .unwrap()
            .unwrap();

        assert_eq!(bundle.units().len(), 1);
        assert_eq!(
            diagnostics
                .of_kind(DiagnosticKind::KernelManifestMalformed)
                .len(),
            1
        );
    }

    #[test]
    fn test_holding_area_is_removed_after_restore() {
        let (_dir, root) = installation("[]");
        let bundle = preserve(&RealFileSystem, &root, &mut Diagnostics::new())
            .unwrap()
            .unwrap();
        let holding = bundle.holding_dir().to_path_buf();
        assert!(holding.file_name().unwrap().to_string_lossy().starts_with("olaf_preserve_"));

        restore(&RealFileSystem, &root, Some(bundle), &RemovalPolicy::default()).unwrap();

        assert!(!holding.exists());
    }
}
