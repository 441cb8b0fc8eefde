//! Secondary source declarations read from a snapshot's registry document.

use std::path::PathBuf;

use serde_json::Value;
use tracing::debug;

use crate::{
    diagnostic::{Diagnostic, DiagnosticKind, Diagnostics},
    document::read_json,
    fetch::Snapshot,
    fs::FileSystem,
    source::Source,
};

/// Registry document names at a snapshot root, in lookup order
pub const REGISTRY_FILES: [&str; 2] = ["_olaf-registry.json", "olaf-registry.json"];

const LIST_KEYS: [&str; 2] = ["secondary-sources", "secondary-repos"];

/// Locate the registry document of a snapshot
pub fn registry_path<F>(fs: &F, snapshot: &Snapshot) -> Option<PathBuf>
where
    F: FileSystem + ?Sized,
{
    REGISTRY_FILES
        .iter()
        .map(|name| snapshot.root().join(name))
        .find(|path| fs.is_file(path))
}

/// Read the secondary sources a snapshot declares, in declaration order.
///
/// Never fails: a missing or unreadable registry yields no sources and a diagnostic, and an
/// entry that is not a valid `owner/repo@revision` token is skipped on its own.
pub fn resolve<F>(fs: &F, snapshot: &Snapshot, diagnostics: &mut Diagnostics) -> Vec<Source>
where
    F: FileSystem + ?Sized,
{
    let Some(path) = registry_path(fs, snapshot) else {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::RegistryMissing,
            format!("{} declares no registry; no secondary sources", snapshot.source()),
        ));
        return Vec::new();
    };

    let document: Value = match read_json(fs, &path) {
        Ok(document) => document,
        Err(e) => {
            diagnostics.push(
                Diagnostic::new(DiagnosticKind::RegistryMalformed, e.to_string()).at(&path),
            );
            return Vec::new();
        }
    };

    let Some(entries) = LIST_KEYS
        .iter()
        .find_map(|key| document.get(key))
        .and_then(Value::as_array)
    else {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticKind::RegistryMalformed,
                "registry has no 'secondary-sources' list",
            )
            .at(&path),
        );
        return Vec::new();
    };

    let mut sources = Vec::with_capacity(entries.len());
    for entry in entries {
        let parsed = entry
            .as_str()
            .ok_or_else(|| format!("registry entry {entry} is not a string"))
            .and_then(|token| {
                token
                    .parse::<Source>()
                    .map_err(|e| format!("registry entry '{token}' skipped: {e}"))
            });

        match parsed {
            Ok(source) => {
                debug!(%source, "declared secondary source");
                sources.push(source);
            }
            Err(message) => diagnostics.push(
                Diagnostic::new(DiagnosticKind::RegistryEntrySkipped, message).at(&path),
            ),
        }
    }

    sources
}
