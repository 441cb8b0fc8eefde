//! Integration tests for the install service
//!
//! These run the whole pipeline against fixture sources served from a temporary directory,
//! with a real file system. They verify:
//!
//! 1. **Precedence**: secondaries are fetched and applied in reverse declared order, the
//!    primary last
//! 2. **Preservation**: the kernel competency survives merges and clean installs
//! 3. **Pruning**: prune lists from every source and the project are unioned
//! 4. **Normalization**: the collections document and the derived indexes
//! 5. **Failure handling**: fatal errors end the stream with a failure and leave the
//!    installation untouched

use std::fs;

use pretty_assertions::assert_eq;
use serde_json::json;
use test_common::{
    FailingCopyFileSystem, FixtureFetcher, InstallOptions, KERNEL_MANIFEST_JSON,
    TEST_PRIMARY_REPO, TEST_REVISION, Workspace, assert_failed_operation,
    assert_successful_operation, collect_events, create_test_service,
    create_test_service_with_config, events::get_diagnostics, get_install_report,
    get_operation_result, read_file, read_json, test_config,
};

use olaf::{
    commands::ProcessCommandRunner,
    config::AppConfigBuilder,
    diagnostic::DiagnosticKind,
    fetch::FetchError,
    install::{
        INSTALL_STEPS, InstallError, InstallService, InstallServiceImpl,
        event::{InstallEvent, OperationResult},
    },
    fs::real::RealFileSystem,
    local::LocalError,
    overlay::MergeError,
    source::SourceOrigin,
};

fn primary_options() -> InstallOptions {
    InstallOptions {
        repository: Some(TEST_PRIMARY_REPO.to_string()),
        ..InstallOptions::default()
    }
}

#[tokio::test]
async fn test_secondaries_apply_in_reverse_declared_order_with_primary_last() {
    // Arrange
    let workspace = Workspace::new();
    workspace
        .source(TEST_PRIMARY_REPO)
        .registry(&["org/x@v1", "org/y@v1"])
        .package_file("skills/shared/README.md", "primary")
        .package_file("docs/guide.md", "never installed");
    let _ = workspace
        .source_at("org/x", "v1")
        .package_file("skills/shared/README.md", "x")
        .package_file("skills/xy/README.md", "x");
    let _ = workspace
        .source_at("org/y", "v1")
        .package_file("skills/shared/README.md", "y")
        .package_file("skills/xy/README.md", "y")
        .package_file("skills/only-y/README.md", "y");
    let (service, fetcher) = create_test_service(&workspace);

    // Act
    let events = collect_events(service.install(primary_options()).await).await;

    // Assert
    assert_successful_operation(&events);
    let report = get_install_report(&events);

    assert_eq!(
        fetcher.fetched(),
        vec!["org/primary@main", "org/y@v1", "org/x@v1"]
    );
    let applied: Vec<String> = report.applied.iter().map(ToString::to_string).collect();
    assert_eq!(applied, vec!["org/y@v1", "org/x@v1", "org/primary@main"]);

    let skills = workspace.target().join("skills");
    assert_eq!(read_file(&skills.join("shared/README.md")), "primary");
    assert_eq!(read_file(&skills.join("xy/README.md")), "x");
    assert_eq!(read_file(&skills.join("only-y/README.md")), "y");
    assert!(!workspace.target().join("docs").exists());
}

#[tokio::test]
async fn test_progress_covers_every_step() {
    // Arrange
    let workspace = Workspace::new();
    let _ = workspace.source(TEST_PRIMARY_REPO).skill("review", "r");
    let (service, _) = create_test_service(&workspace);

    // Act
    let events = collect_events(service.install(primary_options()).await).await;

    // Assert
    assert_successful_operation(&events);
    let steps: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            InstallEvent::Progress { step, .. } => Some(*step),
            _ => None,
        })
        .collect();
    assert_eq!(steps, (1..=INSTALL_STEPS).collect::<Vec<_>>());
    assert!(matches!(events.last(), Some(InstallEvent::Completed { .. })));
}

#[tokio::test]
async fn test_kernel_competency_survives_conflicting_merge() {
    // Arrange
    let workspace = Workspace::new();
    let kernel = workspace.installed_file(
        "competencies/my-competencies/competency-manifest.json",
        KERNEL_MANIFEST_JSON,
    );
    let skill = workspace.installed_file("skills/my-skill/README.md", "mine");
    let _ = workspace
        .source(TEST_PRIMARY_REPO)
        .package_file("competencies/my-competencies/competency-manifest.json", "{}")
        .package_file("skills/my-skill/README.md", "upstream");
    let (service, _) = create_test_service(&workspace);

    // Act
    let events = collect_events(service.install(primary_options()).await).await;

    // Assert
    let report = get_install_report(&events);
    assert_eq!(read_file(&kernel), KERNEL_MANIFEST_JSON);
    assert_eq!(read_file(&skill), "mine");

    let preserved: Vec<String> = report.preserved.iter().map(ToString::to_string).collect();
    assert_eq!(
        preserved,
        vec!["competencies/my-competencies", "skills/my-skill"]
    );
    assert!(!report.kernel_manifest_generated);
}

#[tokio::test]
async fn test_disabling_preservation_lets_sources_win() {
    // Arrange
    let workspace = Workspace::new();
    workspace.installed_file(
        "competencies/my-competencies/competency-manifest.json",
        KERNEL_MANIFEST_JSON,
    );
    let skill = workspace.installed_file("skills/my-skill/README.md", "mine");
    let _ = workspace
        .source(TEST_PRIMARY_REPO)
        .package_file("skills/my-skill/README.md", "upstream");
    let (service, _) = create_test_service(&workspace);

    // Act
    let options = InstallOptions {
        preserve_kernel: false,
        ..primary_options()
    };
    let events = collect_events(service.install(options).await).await;

    // Assert
    let report = get_install_report(&events);
    assert!(report.preserved.is_empty());
    assert_eq!(read_file(&skill), "upstream");
}

#[tokio::test]
async fn test_clean_global_removes_stale_units_but_keeps_the_kernel() {
    // Arrange
    let workspace = Workspace::new();
    let kernel = workspace.installed_file(
        "competencies/my-competencies/competency-manifest.json",
        KERNEL_MANIFEST_JSON,
    );
    workspace.installed_file("skills/my-skill/README.md", "mine");
    let stale = workspace.installed_file("skills/stale/README.md", "old");
    let _ = workspace.source(TEST_PRIMARY_REPO).skill("fresh", "new");
    let (service, _) = create_test_service(&workspace);

    // Act
    let options = InstallOptions {
        clean_global: true,
        ..primary_options()
    };
    let events = collect_events(service.install(options).await).await;

    // Assert
    assert_successful_operation(&events);
    assert!(!stale.exists());
    assert_eq!(read_file(&kernel), KERNEL_MANIFEST_JSON);
    assert!(workspace.target().join("skills/fresh/README.md").is_file());
    assert!(workspace.target().join("skills/my-skill/README.md").is_file());
}

#[tokio::test]
async fn test_failed_merge_after_clean_restores_the_kernel() {
    // Arrange
    let workspace = Workspace::new();
    let kernel = workspace.installed_file(
        "competencies/my-competencies/competency-manifest.json",
        KERNEL_MANIFEST_JSON,
    );
    let skill = workspace.installed_file("skills/my-skill/README.md", "mine");
    let _ = workspace
        .source(TEST_PRIMARY_REPO)
        .skill("fresh", "new")
        .package_file("skills/broken/unreadable.md", "x");
    let config = test_config();
    let service = InstallServiceImpl::new(
        FailingCopyFileSystem::new("unreadable.md"),
        FixtureFetcher::new(workspace.sources()),
        ProcessCommandRunner::new(config.command_timeout()),
        config,
    );
    let options = InstallOptions {
        target: Some(workspace.target()),
        local: Some(workspace.project()),
        clean_global: true,
        ..primary_options()
    };

    // Act
    let events = collect_events(service.install(options).await).await;

    // Assert
    assert_failed_operation(&events);
    assert!(matches!(
        get_operation_result(&events),
        Some(OperationResult::Failure(InstallError::Merge(
            MergeError::FileSystem(_)
        )))
    ));
    assert_eq!(read_file(&kernel), KERNEL_MANIFEST_JSON);
    assert_eq!(read_file(&skill), "mine");
    assert!(events.iter().any(|event| matches!(
        event,
        InstallEvent::Warning { message, .. } if message.contains("restored 2 preserved unit(s)")
    )));
}

#[tokio::test]
async fn test_prune_lists_from_sources_and_project_are_unioned() {
    // Arrange
    let workspace = Workspace::new();
    for id in ["a", "b", "c"] {
        workspace.installed_file(&format!("skills/{id}/README.md"), id);
    }
    let _ = workspace
        .source(TEST_PRIMARY_REPO)
        .skill("fresh", "new")
        .prune_list(&["a", "zzz"], &[]);
    workspace.project_file(
        "reference/olaf-prune-list.json",
        &json!({ "skills": ["b"] }).to_string(),
    );
    let (service, _) = create_test_service(&workspace);

    // Act
    let events = collect_events(service.install(primary_options()).await).await;

    // Assert
    let report = get_install_report(&events);
    let skills = workspace.target().join("skills");
    assert!(!skills.join("a").exists());
    assert!(!skills.join("b").exists());
    assert!(skills.join("c").is_dir());

    assert_eq!(report.pruned, vec!["skills/a", "skills/b"]);
    assert_eq!(report.prune_skipped, vec!["skills/zzz"]);
    assert_eq!(report.prune_sources.len(), 2);
    assert_eq!(
        get_diagnostics(&events, DiagnosticKind::PruneTargetMissing).len(),
        1
    );
}

#[tokio::test]
async fn test_explicit_prune_file_resolves_against_the_project() {
    // Arrange
    let workspace = Workspace::new();
    workspace.installed_file("competencies/legacy/competency-manifest.json", "{}");
    workspace.project_file(
        "lists/extra.json",
        &json!({ "competencies": ["legacy"] }).to_string(),
    );
    let _ = workspace.source(TEST_PRIMARY_REPO).skill("fresh", "new");
    let (service, _) = create_test_service(&workspace);

    // Act
    let options = InstallOptions {
        prune_file: Some("lists/extra.json".into()),
        ..primary_options()
    };
    let events = collect_events(service.install(options).await).await;

    // Assert
    let report = get_install_report(&events);
    assert_eq!(report.pruned, vec!["competencies/legacy"]);
    assert!(!workspace.target().join("competencies/legacy").exists());
}

#[tokio::test]
async fn test_no_prune_keeps_everything() {
    // Arrange
    let workspace = Workspace::new();
    let doomed = workspace.installed_file("skills/a/README.md", "a");
    let _ = workspace
        .source(TEST_PRIMARY_REPO)
        .skill("fresh", "new")
        .prune_list(&["a"], &[]);
    let (service, _) = create_test_service(&workspace);

    // Act
    let options = InstallOptions {
        prune: false,
        ..primary_options()
    };
    let events = collect_events(service.install(options).await).await;

    // Assert
    let report = get_install_report(&events);
    assert!(doomed.is_file());
    assert!(report.pruned.is_empty());
    assert_eq!(
        get_diagnostics(&events, DiagnosticKind::PruneDisabled).len(),
        1
    );
}

#[tokio::test]
async fn test_collections_are_normalized_and_indexed() {
    // Arrange
    let workspace = Workspace::new();
    let _ = workspace
        .source(TEST_PRIMARY_REPO)
        .competency("developer", "Developer", &["review"])
        .competency("haal-admin", "Admin", &[])
        .skill("review", "r")
        .collections(&json!({
            "collections": [
                { "id": "core", "competencies": ["developer", "olaf-admin", "ghost"] },
                { "id": "empty", "competencies": ["ghost"] }
            ],
            "metadata": { "active_collection": "core" }
        }));
    let (service, _) = create_test_service(&workspace);

    // Act
    let events = collect_events(service.install(primary_options()).await).await;

    // Assert
    let report = get_install_report(&events);
    assert!(report.collections_changed);

    let document = read_json(
        &workspace
            .target()
            .join("reference/competency-collections.json"),
    );
    assert_eq!(
        document["collections"],
        json!([{ "id": "core", "competencies": ["developer", "haal-admin"] }])
    );
    assert!(document["metadata"]["lastUpdated"].is_string());

    let index = read_file(&workspace.target().join("reference/query-competency-index.md"));
    assert!(index.contains("Collection: `core`"));
    assert!(index.contains("## Developer (`developer`)"));
    assert!(index.contains("- `review`"));
    assert!(report.kernel_manifest_generated);
    assert!(
        workspace
            .target()
            .join("competencies/my-competencies/competency-manifest.json")
            .is_file()
    );
}

#[tokio::test]
async fn test_active_collection_follows_the_primary_seed() {
    // Arrange
    let workspace = Workspace::new();
    workspace.installed_file(
        "reference/competency-collections.json",
        &json!({
            "collections": [
                { "id": "core", "competencies": ["developer"] },
                { "id": "extended", "competencies": ["developer"] }
            ],
            "metadata": { "active_collection": "core" }
        })
        .to_string(),
    );
    let _ = workspace
        .source(TEST_PRIMARY_REPO)
        .competency("developer", "Developer", &[])
        .root_file(
            "reference/competency-collections.json",
            &json!({ "collections": [], "metadata": { "active_collection": "extended" } })
                .to_string(),
        );
    let (service, _) = create_test_service(&workspace);

    // Act
    let events = collect_events(service.install(primary_options()).await).await;

    // Assert
    let report = get_install_report(&events);
    assert!(report.active_collection_synced);
    let document = read_json(
        &workspace
            .target()
            .join("reference/competency-collections.json"),
    );
    assert_eq!(document["metadata"]["active_collection"], "extended");
}

#[tokio::test]
async fn test_local_project_is_synced() {
    // Arrange
    let workspace = Workspace::new();
    workspace.project_file(
        "reference/competency-collections.json",
        &json!({
            "collections": [{ "id": "core", "competencies": ["developer", "team-x"] }],
            "metadata": { "active_collection": "core" },
            "competency_locations": { "team-x": "local", "developer": "global" }
        })
        .to_string(),
    );
    let _ = workspace
        .source(TEST_PRIMARY_REPO)
        .competency("developer", "Developer", &[])
        .package_file("data/defaults.json", "{}")
        .root_file(
            "competencies/team-x/competency-manifest.json",
            &json!({ "metadata": { "id": "team-x", "name": "Team X" } }).to_string(),
        );
    let (service, _) = create_test_service(&workspace);

    // Act
    let events = collect_events(service.install(primary_options()).await).await;

    // Assert
    let report = get_install_report(&events);
    let project = workspace.project();

    assert_eq!(report.local.local_competencies, vec!["team-x"]);
    assert!(report.local.generated_team_manifest);
    assert_eq!(report.local.data_files_copied, 1);
    assert!(project.join(".olaf/data/defaults.json").is_file());
    assert!(project.join(".olaf/work/staging").is_dir());

    let exclude = read_file(&project.join(".git/info/exclude"));
    assert!(exclude.lines().any(|l| l == "olaf-*"));
    assert!(exclude.lines().any(|l| l == ".olaf/work/"));

    let index = read_file(&project.join("reference/query-competency-index.md"));
    assert!(index.contains("## Team X (`team-x`)"));
    assert!(index.contains("## Developer (`developer`)"));
    assert_eq!(report.indexes.len(), 1);
}

#[tokio::test]
async fn test_team_competency_is_seeded_from_the_primary() {
    // Arrange
    let workspace = Workspace::new();
    let _ = workspace
        .source(TEST_PRIMARY_REPO)
        .skill("review", "r")
        .root_file(
            "competencies/team-competencies/competency-manifest.json",
            &json!({ "metadata": { "id": "team-competencies", "name": "Pack Team" } })
                .to_string(),
        )
        .root_file("competencies/team-competencies/onboarding.md", "welcome");
    let (service, _) = create_test_service(&workspace);

    // Act
    let events = collect_events(service.install(primary_options()).await).await;

    // Assert
    let report = get_install_report(&events);
    assert!(report.local.seeded_team_competency);
    assert!(!report.local.generated_team_manifest);
    let team = workspace.project().join("competencies/team-competencies");
    assert_eq!(
        read_json(&team.join("competency-manifest.json"))["metadata"]["name"],
        "Pack Team"
    );
    assert_eq!(read_file(&team.join("onboarding.md")), "welcome");

    // A second install keeps the project's copy
    fs::write(team.join("onboarding.md"), "edited").unwrap();
    let events = collect_events(service.install(primary_options()).await).await;
    assert!(!get_install_report(&events).local.seeded_team_competency);
    assert_eq!(read_file(&team.join("onboarding.md")), "edited");
}

#[tokio::test]
async fn test_project_seed_selects_the_primary() {
    // Arrange
    let workspace = Workspace::new();
    workspace.project_file(
        "_olaf-config.json",
        &json!({ "registry-repo": "team/seeded", "branch": "stable" }).to_string(),
    );
    let _ = workspace
        .source_at("team/seeded", "stable")
        .skill("seeded", "s");
    let (service, fetcher) = create_test_service(&workspace);

    // Act
    let events = collect_events(service.install(InstallOptions::default()).await).await;

    // Assert
    let report = get_install_report(&events);
    assert_eq!(report.primary.to_string(), "team/seeded@stable");
    assert_eq!(report.origin, SourceOrigin::ProjectSeed);
    assert_eq!(fetcher.fetched(), vec!["team/seeded@stable"]);
}

#[tokio::test]
async fn test_secondary_without_package_tree_is_skipped() {
    // Arrange
    let workspace = Workspace::new();
    let _ = workspace
        .source(TEST_PRIMARY_REPO)
        .registry(&["org/broken@v1", "org/ok@v1"])
        .skill("primary", "p");
    let _ = workspace.source_at("org/broken", "v1").without_package_tree();
    let _ = workspace.source_at("org/ok", "v1").skill("ok", "ok");
    let (service, _) = create_test_service(&workspace);

    // Act
    let events = collect_events(service.install(primary_options()).await).await;

    // Assert
    let report = get_install_report(&events);
    let skipped: Vec<String> = report
        .skipped_secondaries
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(skipped, vec!["org/broken@v1"]);
    assert_eq!(report.applied.len(), 2);
    assert!(workspace.target().join("skills/ok/README.md").is_file());
    assert_eq!(
        get_diagnostics(&events, DiagnosticKind::SecondarySkipped).len(),
        1
    );
}

#[tokio::test]
async fn test_broken_registry_degrades_to_no_secondaries() {
    // Arrange
    let workspace = Workspace::new();
    let _ = workspace
        .source(TEST_PRIMARY_REPO)
        .root_file("olaf-registry.json", "{ not json")
        .skill("primary", "p");
    let (service, fetcher) = create_test_service(&workspace);

    // Act
    let events = collect_events(service.install(primary_options()).await).await;

    // Assert
    assert_successful_operation(&events);
    assert_eq!(fetcher.fetched(), vec!["org/primary@main"]);
    assert_eq!(
        get_diagnostics(&events, DiagnosticKind::RegistryMalformed).len(),
        1
    );
}

#[tokio::test]
async fn test_unreachable_secondary_fails_before_any_change() {
    // Arrange
    let workspace = Workspace::new();
    let existing = workspace.installed_file("skills/existing/README.md", "keep");
    let _ = workspace
        .source(TEST_PRIMARY_REPO)
        .registry(&["org/missing@v1"])
        .skill("primary", "p");
    let (service, _) = create_test_service(&workspace);

    // Act
    let events = collect_events(service.install(primary_options()).await).await;

    // Assert
    assert_failed_operation(&events);
    assert!(matches!(
        get_operation_result(&events),
        Some(OperationResult::Failure(InstallError::Fetch(
            FetchError::CloneFailed { .. }
        )))
    ));
    assert_eq!(read_file(&existing), "keep");
    assert!(!workspace.target().join("skills/primary").exists());
}

#[tokio::test]
async fn test_primary_without_package_tree_is_fatal() {
    // Arrange
    let workspace = Workspace::new();
    let _ = workspace.source(TEST_PRIMARY_REPO).without_package_tree();
    let (service, _) = create_test_service(&workspace);

    // Act
    let events = collect_events(service.install(primary_options()).await).await;

    // Assert
    assert_failed_operation(&events);
    assert!(matches!(
        get_operation_result(&events),
        Some(OperationResult::Failure(InstallError::Fetch(
            FetchError::MissingPackageTree { .. }
        )))
    ));
    assert!(!workspace.target().exists());
}

#[tokio::test]
async fn test_project_must_be_a_git_repository() {
    // Arrange
    let workspace = Workspace::without_git();
    let _ = workspace.source(TEST_PRIMARY_REPO).skill("primary", "p");
    let (service, fetcher) = create_test_service(&workspace);

    // Act
    let events = collect_events(service.install(primary_options()).await).await;

    // Assert
    assert_failed_operation(&events);
    assert!(matches!(
        get_operation_result(&events),
        Some(OperationResult::Failure(InstallError::Local(
            LocalError::NotAGitRepository { .. }
        )))
    ));
    assert!(fetcher.fetched().is_empty());
    assert!(!workspace.target().exists());
}

#[tokio::test]
async fn test_second_install_reaches_the_same_state() {
    // Arrange
    let workspace = Workspace::new();
    let _ = workspace
        .source(TEST_PRIMARY_REPO)
        .competency("developer", "Developer", &["review"])
        .skill("review", "r")
        .collections(&json!({
            "collections": [{ "id": "core", "competencies": ["developer"] }],
            "metadata": { "active_collection": "core" }
        }));
    let (service, _) = create_test_service(&workspace);
    let collections = workspace
        .target()
        .join("reference/competency-collections.json");

    // Act
    let first = collect_events(service.install(primary_options()).await).await;
    let after_first = fs::read_to_string(&collections).unwrap();
    let second = collect_events(service.install(primary_options()).await).await;

    // Assert
    assert!(!get_install_report(&first).collections_changed);
    assert!(!get_install_report(&second).collections_changed);
    assert_eq!(fs::read_to_string(&collections).unwrap(), after_first);
    assert!(!get_install_report(&second).kernel_manifest_generated);
}

#[tokio::test]
async fn test_user_config_supplies_source_and_paths() {
    // Arrange
    let workspace = Workspace::new();
    let _ = workspace.source(TEST_PRIMARY_REPO).skill("review", "r");
    let config = AppConfigBuilder::default()
        .target_directory(workspace.target())
        .local_root(workspace.project())
        .repository(TEST_PRIMARY_REPO)
        .branch(TEST_REVISION)
        .use_colors(false)
        .build();
    let (service, fetcher) = create_test_service_with_config(&workspace, config);

    // Act
    let events = collect_events(service.install(InstallOptions::default()).await).await;

    // Assert
    assert_successful_operation(&events);
    let report = get_install_report(&events);
    assert_eq!(report.origin, SourceOrigin::UserConfig);
    assert_eq!(report.target, workspace.target());
    assert_eq!(report.project, workspace.project());
    assert_eq!(
        fetcher.fetched(),
        vec![format!("{TEST_PRIMARY_REPO}@{TEST_REVISION}")]
    );
    assert!(workspace.target().join("skills/review/README.md").is_file());
}

#[tokio::test]
async fn test_missing_fetch_tool_fails_before_any_change() {
    // Arrange
    let workspace = Workspace::new();
    let _ = workspace.source(TEST_PRIMARY_REPO).skill("review", "r");
    let fetcher = FixtureFetcher::unavailable(workspace.sources());
    let config = test_config();
    let service = InstallServiceImpl::new(
        RealFileSystem,
        fetcher.clone(),
        ProcessCommandRunner::new(config.command_timeout()),
        config,
    );
    let options = InstallOptions {
        target: Some(workspace.target()),
        local: Some(workspace.project()),
        ..primary_options()
    };

    // Act
    let events = collect_events(service.install(options).await).await;

    // Assert
    assert_failed_operation(&events);
    assert!(matches!(
        get_operation_result(&events),
        Some(OperationResult::Failure(InstallError::Fetch(
            FetchError::ToolUnavailable { .. }
        )))
    ));
    assert!(fetcher.fetched().is_empty());
    assert!(!workspace.target().exists());
}
