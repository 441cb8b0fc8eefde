//!
//! The install steps, in order. Every fetch finishes before anything under the installation
//! root is touched.
//!

use std::path::Path;

use tempfile::TempDir;
use tracing::{debug, info};

use super::{InstallError, InstallOptions, InstallReport, ProgressTracker, event::EventSender};
use crate::{
    collections::{normalize_installed, read_collections, sync_active_collection},
    commands::CommandRunner,
    config::{AppConfig, seed::load_seed},
    diagnostic::{Diagnostic, DiagnosticKind, Diagnostics},
    fetch::{Snapshot, SourceFetcher},
    fs::{FileSystem, FileSystemError, Removal, RemovalPolicy, remove_tree},
    index::write_index,
    layout::{COLLECTIONS_FILE, EXCLUDED_TOP_LEVEL, InstallRoot, REFERENCE_DIR},
    local::{LocalProject, ensure_git_repo, sync_local_project},
    manifest::{Generate, KERNEL_DEFAULTS, ensure_manifest},
    overlay::{self, MergeError},
    preserve::{preserve, restore},
    prune::{find_prune_lists, prune},
    registry,
    source::{Source, SourceLayers, resolve_primary},
};

const SCRATCH_PREFIX: &str = "olaf_run_";

/// Borrowed collaborators of one run
pub(super) struct Deps<'a, F, SF, CR> {
    pub fs: &'a F,
    pub fetcher: &'a SF,
    pub runner: &'a CR,
    pub config: &'a AppConfig,
    pub removal: &'a RemovalPolicy,
}

/// Diagnostics of the run plus how many were already forwarded as events
#[derive(Default)]
struct Findings {
    diagnostics: Diagnostics,
    reported: usize,
}

impl Findings {
    async fn flush(&mut self, sender: &EventSender) {
        sender
            .send_diagnostics(self.diagnostics.since(self.reported))
            .await;
        self.reported = self.diagnostics.len();
    }
}

pub(super) async fn run<F, SF, CR>(
    deps: Deps<'_, F, SF, CR>,
    options: &InstallOptions,
    sender: &EventSender,
    progress: &mut ProgressTracker,
) -> Result<InstallReport, InstallError>
where
    F: FileSystem,
    SF: SourceFetcher,
    CR: CommandRunner,
{
    let Deps {
        fs,
        fetcher,
        runner,
        config,
        removal,
    } = deps;
    let mut findings = Findings::default();

    // Step 1: resolve paths and the primary source, check prerequisites
    progress.next(sender, "Preparing install").await;
    let target = fs.expand_path(
        options
            .target
            .as_deref()
            .unwrap_or(config.target_directory().as_path()),
    )?;
    let project_path = fs.expand_path(
        options
            .local
            .as_deref()
            .unwrap_or(config.local_root().as_path()),
    )?;
    let root = InstallRoot::new(&target);
    let project = LocalProject::new(&project_path);

    let seed = load_seed(fs, project.path());
    if let Some((path, _)) = &seed {
        sender
            .send_debug(format!("Using project config {}", path.display()))
            .await;
    }
    let seed = seed.map(|(_, seed)| seed);
    let (primary, origin) = resolve_primary(
        SourceLayers {
            command_line: options.repository.as_deref(),
            project_seed: seed.as_ref().and_then(|s| s.registry_repo()),
            user_config: config.repository(),
        },
        SourceLayers {
            command_line: options.branch.as_deref(),
            project_seed: seed.as_ref().and_then(|s| s.branch()),
            user_config: config.branch(),
        },
    )?;
    sender
        .send_info(format!("Primary source {primary} (from {origin})"))
        .await;

    let git_initialized =
        ensure_git_repo(fs, runner, config.git_program(), &project, options.init_git).await?;
    if git_initialized {
        sender
            .send_info(format!("Initialized git repository in {}", project.path().display()))
            .await;
    }
    fetcher.ensure_available().await?;

    let scratch = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir()
        .map_err(|e| FileSystemError::io("create scratch area", &std::env::temp_dir(), e))?;
    debug!(scratch = %scratch.path().display(), "created scratch area");

    // Step 2: the primary must fetch cleanly
    progress.next(sender, format!("Fetching {primary}")).await;
    let primary_snapshot = fetcher
        .fetch(&primary, &scratch.path().join("primary"))
        .await?;

    // Step 3
    progress.next(sender, "Resolving secondary sources").await;
    let declared = registry::resolve(fs, &primary_snapshot, &mut findings.diagnostics);
    sender
        .send_debug(format!("{} secondary source(s) declared", declared.len()))
        .await;
    findings.flush(sender).await;

    // Step 4: strongest secondary last, so fetch in reverse declared order
    progress.next(sender, "Fetching secondary sources").await;
    let (secondaries, mut skipped_secondaries) =
        fetch_secondaries(fetcher, &declared, &primary, &scratch, &mut findings.diagnostics)
            .await?;
    findings.flush(sender).await;

    // Step 5
    progress.next(sender, "Preserving user competencies").await;
    let bundle = if options.preserve_kernel {
        preserve(fs, &root, &mut findings.diagnostics)?
    } else {
        sender
            .send_info("Kernel competency preservation disabled")
            .await;
        None
    };
    findings.flush(sender).await;

    // Steps 6-8 run inside the preservation window; a failure there still restores.
    let applied = apply_sources(
        fs,
        removal,
        options,
        sender,
        progress,
        &root,
        &project,
        &primary_snapshot,
        &secondaries,
        &mut skipped_secondaries,
        &mut findings,
    )
    .await;
    let applied = match applied {
        Ok(applied) => applied,
        Err(error) => {
            if bundle.is_some() {
                match restore(fs, &root, bundle, removal) {
                    Ok(units) => {
                        sender
                            .send_warning(format!(
                                "Install failed; restored {} preserved unit(s)",
                                units.len()
                            ))
                            .await;
                    }
                    Err(restore_error) => {
                        sender
                            .send_warning(format!(
                                "Install failed and preserved competencies could not be restored: {restore_error}"
                            ))
                            .await;
                    }
                }
            }
            return Err(error);
        }
    };

    // Step 9
    progress.next(sender, "Restoring user competencies").await;
    let preserved = restore(fs, &root, bundle, removal)?;

    // Step 10
    progress.next(sender, "Pruning deprecated units").await;
    let explicit = options
        .prune_file
        .as_ref()
        .map(|path| project.path().join(path));
    let mut prune_roots = vec![primary_snapshot.root()];
    prune_roots.extend(applied_roots(&secondaries, &applied));
    prune_roots.push(project.path());
    let candidates = find_prune_lists(fs, explicit.as_deref(), &prune_roots);
    let pruned = prune(
        fs,
        &root,
        &candidates,
        options.prune,
        removal,
        &mut findings.diagnostics,
    )?;
    findings.flush(sender).await;

    // Step 11
    progress.next(sender, "Normalizing competency collections").await;
    let collections_changed = normalize_installed(fs, &root, &mut findings.diagnostics)?;
    let active_collection_synced = sync_active_collection(
        fs,
        &primary_snapshot
            .root()
            .join(REFERENCE_DIR)
            .join(COLLECTIONS_FILE),
        &root.collections_file(),
        &mut findings.diagnostics,
    )?;
    findings.flush(sender).await;

    // Step 12
    progress.next(sender, "Generating competency index").await;
    let kernel_manifest_generated = ensure_manifest(
        fs,
        &root.kernel_manifest(),
        &KERNEL_DEFAULTS,
        Generate::WhenMissing,
    )?;
    let mut indexes = Vec::new();
    if fs.is_file(&root.collections_file()) {
        let document = read_collections(fs, &root.collections_file())?;
        write_index(fs, &root.index_file(), &document, &[&root])?;
        indexes.push(root.index_file());
    }

    // Step 13
    progress.next(sender, "Updating local project").await;
    let local = sync_local_project(
        fs,
        &project,
        &root,
        Some(primary_snapshot.root()),
        removal,
        &mut findings.diagnostics,
    )?;
    indexes.extend(local.index.clone());
    findings.flush(sender).await;

    drop(scratch);

    Ok(InstallReport {
        primary,
        origin,
        target,
        project: project_path,
        git_initialized,
        applied,
        skipped_secondaries,
        preserved,
        prune_sources: pruned.sources,
        pruned: pruned.removed,
        prune_skipped: pruned.skipped,
        collections_changed,
        active_collection_synced,
        kernel_manifest_generated,
        indexes,
        local,
        diagnostics: findings.diagnostics.into_vec(),
    })
}

/// Clean the requested trees, then merge the secondaries and the primary, strongest last
#[allow(clippy::too_many_arguments)]
async fn apply_sources<F>(
    fs: &F,
    removal: &RemovalPolicy,
    options: &InstallOptions,
    sender: &EventSender,
    progress: &mut ProgressTracker,
    root: &InstallRoot,
    project: &LocalProject,
    primary_snapshot: &Snapshot,
    secondaries: &[Snapshot],
    skipped_secondaries: &mut Vec<Source>,
    findings: &mut Findings,
) -> Result<Vec<Source>, InstallError>
where
    F: FileSystem,
{
    let primary = primary_snapshot.source();

    // Step 6
    progress.next(sender, "Cleaning requested trees").await;
    if options.clean_global {
        report_removal(sender, root.path(), remove_tree(fs, root.path(), removal)?).await;
    }
    if options.clean_local {
        let olaf_dir = project.olaf_dir();
        report_removal(sender, &olaf_dir, remove_tree(fs, &olaf_dir, removal)?).await;
    }
    fs.create_dir_all(root.path())?;

    // Step 7
    progress.next(sender, "Applying secondary sources").await;
    let mut applied = Vec::new();
    for snapshot in secondaries {
        match overlay::merge(fs, &snapshot.package_tree(), root.path(), EXCLUDED_TOP_LEVEL) {
            Ok(stats) => {
                info!(source = %snapshot.source(), files = stats.files_written, "applied");
                applied.push(snapshot.source().clone());
            }
            Err(MergeError::MissingSourceTree { path }) => {
                findings.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::SecondarySkipped,
                        format!("{} has no package tree; not applied", snapshot.source()),
                    )
                    .at(path),
                );
                skipped_secondaries.push(snapshot.source().clone());
            }
            Err(e) => return Err(e.into()),
        }
    }
    findings.flush(sender).await;

    // Step 8: primary wins every conflict
    progress.next(sender, format!("Applying {primary}")).await;
    let stats = overlay::merge(
        fs,
        &primary_snapshot.package_tree(),
        root.path(),
        EXCLUDED_TOP_LEVEL,
    )?;
    sender
        .send_debug(format!("{} file(s) written from {primary}", stats.files_written))
        .await;
    applied.push(primary.clone());

    Ok(applied)
}

/// Fetch `declared` in reverse order; a snapshot without a package tree is skipped.
async fn fetch_secondaries<SF>(
    fetcher: &SF,
    declared: &[Source],
    primary: &Source,
    scratch: &TempDir,
    diagnostics: &mut Diagnostics,
) -> Result<(Vec<Snapshot>, Vec<Source>), InstallError>
where
    SF: SourceFetcher + ?Sized,
{
    let mut snapshots = Vec::new();
    let mut skipped = Vec::new();

    for (n, source) in declared.iter().rev().enumerate() {
        if source == primary {
            debug!(%source, "secondary is the primary source, ignoring");
            continue;
        }

        let destination = scratch.path().join(format!("secondary-{n}"));
        match fetcher.fetch(source, &destination).await {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) if e.is_missing_package_tree() => {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::SecondarySkipped,
                        format!("{e}; secondary not applied"),
                    )
                    .at(&destination),
                );
                skipped.push(source.clone());
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok((snapshots, skipped))
}

/// Roots of the secondaries that were actually merged, in application order
fn applied_roots<'a>(secondaries: &'a [Snapshot], applied: &[Source]) -> Vec<&'a Path> {
    secondaries
        .iter()
        .filter(|snapshot| applied.contains(snapshot.source()))
        .map(Snapshot::root)
        .collect()
}

async fn report_removal(sender: &EventSender, path: &Path, removal: Removal) {
    match removal {
        Removal::Absent => {
            sender
                .send_debug(format!("{} does not exist, nothing to clean", path.display()))
                .await;
        }
        Removal::Removed => {
            sender.send_info(format!("Removed {}", path.display())).await;
        }
        Removal::MovedAside(aside) => {
            sender
                .send_warning(format!(
                    "Could not remove {}; moved it to {}",
                    path.display(),
                    aside.display()
                ))
                .await;
        }
    }
}
