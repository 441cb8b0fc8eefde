//! Temporary workspaces with fixture sources, an installation root and a project.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::{Value, json};
use tempfile::TempDir;

use crate::constants::TEST_REVISION;

/// Write `content` to `path`, creating parent directories.
pub fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Read a file written by an install, panicking with the path when it is missing.
#[must_use]
pub fn read_file(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

/// Read a JSON document written by an install.
#[must_use]
pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&read_file(path)).unwrap()
}

/// A temporary directory holding:
///
/// - `sources/<owner>/<repo>/<revision>/`: fixture source repositories
/// - `target/`: the installation root
/// - `project/`: a project with a `.git` directory
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    #[must_use]
    pub fn new() -> Self {
        let workspace = Self {
            dir: TempDir::new().unwrap(),
        };
        fs::create_dir_all(workspace.sources()).unwrap();
        fs::create_dir_all(workspace.project().join(".git").join("info")).unwrap();
        workspace
    }

    /// A workspace whose project is not a git repository
    #[must_use]
    pub fn without_git() -> Self {
        let workspace = Self::new();
        fs::remove_dir_all(workspace.project().join(".git")).unwrap();
        workspace
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    #[must_use]
    pub fn sources(&self) -> PathBuf {
        self.dir.path().join("sources")
    }

    #[must_use]
    pub fn target(&self) -> PathBuf {
        self.dir.path().join("target")
    }

    #[must_use]
    pub fn project(&self) -> PathBuf {
        self.dir.path().join("project")
    }

    /// Fixture source `repository` at [`TEST_REVISION`]
    #[must_use]
    pub fn source(&self, repository: &str) -> SourceFixture {
        self.source_at(repository, TEST_REVISION)
    }

    #[must_use]
    pub fn source_at(&self, repository: &str, revision: &str) -> SourceFixture {
        let root = self.sources().join(repository).join(revision);
        fs::create_dir_all(&root).unwrap();
        SourceFixture { root }
    }

    /// Write a file below the installation root
    pub fn installed_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.target().join(relative);
        write_file(&path, content);
        path
    }

    /// Write a file below the project root
    pub fn project_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.project().join(relative);
        write_file(&path, content);
        path
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for the content of one fixture source repository
#[derive(Debug, Clone)]
pub struct SourceFixture {
    root: PathBuf,
}

impl SourceFixture {
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File inside the package tree (`.olaf/<relative>`)
    #[must_use]
    pub fn package_file(self, relative: &str, content: &str) -> Self {
        write_file(&self.root.join(".olaf").join(relative), content);
        self
    }

    /// File at the repository root, outside the package tree
    #[must_use]
    pub fn root_file(self, relative: &str, content: &str) -> Self {
        write_file(&self.root.join(relative), content);
        self
    }

    /// A skill directory with a single readme
    #[must_use]
    pub fn skill(self, id: &str, content: &str) -> Self {
        self.package_file(&format!("skills/{id}/README.md"), content)
    }

    /// A competency with a manifest listing `skills`
    #[must_use]
    pub fn competency(self, id: &str, name: &str, skills: &[&str]) -> Self {
        let manifest = json!({
            "metadata": { "id": id, "name": name, "shortDescription": format!("{name} work") },
            "bom": {
                "skills": skills,
                "entry_points": []
            }
        });
        self.package_file(
            &format!("competencies/{id}/competency-manifest.json"),
            &manifest.to_string(),
        )
    }

    /// Registry document declaring `secondaries`
    #[must_use]
    pub fn registry(self, secondaries: &[&str]) -> Self {
        self.root_file(
            "olaf-registry.json",
            &json!({ "secondary-sources": secondaries }).to_string(),
        )
    }

    /// Prune list at the repository root
    #[must_use]
    pub fn prune_list(self, skills: &[&str], competencies: &[&str]) -> Self {
        self.root_file(
            "reference/olaf-prune-list.json",
            &json!({ "skills": skills, "competencies": competencies }).to_string(),
        )
    }

    /// Collections document shipped in the package tree
    #[must_use]
    pub fn collections(self, document: &Value) -> Self {
        self.package_file("reference/competency-collections.json", &document.to_string())
    }

    /// Make the fixture exist without a package tree
    #[must_use]
    pub fn without_package_tree(self) -> Self {
        self.root_file("README.md", "not a package source")
    }
}
