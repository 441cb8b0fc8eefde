//! OLAF - an overlay installer for competency packs
//!
//! The `olaf` library installs and updates a tree of skills and competencies by fetching a
//! primary source and the secondary sources it declares, merging them into an installation
//! root, and keeping user-owned state intact across the destructive steps.
//!
//! # Architecture
//!
//! The library follows the Hexagonal Architecture pattern (Ports and Adapters). File system
//! access, process execution and source retrieval are ports ([`fs::FileSystem`],
//! [`commands::CommandRunner`], [`fetch::SourceFetcher`]) so the pipeline can be exercised
//! against temporary directories and fixture sources.
//!
//! # Main Components
//!
//! - [`install`] - The install service, its pipeline and event stream
//! - [`fetch`] - Source retrieval into disposable snapshots
//! - [`registry`] - Secondary source declarations
//! - [`overlay`] - Additive, overwrite-on-conflict tree merges
//! - [`preserve`] - Kernel competency preservation around destructive steps
//! - [`prune`] - Prune list discovery and removal of deprecated units
//! - [`collections`] and [`index`] - Collections normalization and the derived index
//! - [`local`] - The project-level `.olaf` folder
//! - [`config`] - Application configuration management
//!
//! # Examples
//!
//! ```no_run
//! use futures::StreamExt;
//! use olaf::{
//!     commands::ProcessCommandRunner,
//!     config::AppConfig,
//!     fetch::GitFetcher,
//!     fs::real::RealFileSystem,
//!     install::{InstallOptions, InstallService, InstallServiceImpl},
//! };
//!
//! # async fn run() {
//! let config = AppConfig::default();
//! let runner = ProcessCommandRunner::new(config.command_timeout());
//! let fetcher = GitFetcher::new(RealFileSystem, runner.clone(), &config);
//! let service = InstallServiceImpl::new(RealFileSystem, fetcher, runner, config);
//!
//! let mut events = service.install(InstallOptions::default()).await;
//! while let Some(event) = events.next().await {
//!     println!("{event:?}");
//! }
//! # }
//! ```

pub mod collections;
pub mod commands;
pub mod config;
pub mod diagnostic;
pub mod document;
pub mod fetch;
pub mod fs;
pub mod index;
pub mod install;
pub mod layout;
pub mod local;
pub mod manifest;
pub mod overlay;
pub mod preserve;
pub mod prune;
pub mod registry;
pub mod source;
pub mod validation;
