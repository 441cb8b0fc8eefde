//! Source identities (`owner/repo@revision`) and primary source resolution.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use thiserror::Error;
use url::Url;

/// Revision used when a token does not name one
pub const DEFAULT_REVISION: &str = "main";

/// Source installed when nothing else is configured
pub const DEFAULT_REPOSITORY: &str = "haal-ai/haal-ide";

static REPOSITORY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+(/[A-Za-z0-9_.-]+)+$").expect("repository pattern is valid")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceParseError {
    #[error("source token is empty")]
    Empty,

    #[error("'{0}' is not an owner/repo identifier")]
    InvalidRepository(String),

    #[error("'{0}' is not a usable revision")]
    InvalidRevision(String),
}

/// A remote origin plus the revision to fetch from it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source {
    repository: String,
    revision: String,
}

impl Source {
    /// Build a source from separately supplied parts; a blank revision means
    /// [`DEFAULT_REVISION`].
    ///
    /// # Errors
    ///
    /// Returns [`SourceParseError`] when either part is unusable.
    pub fn new(repository: &str, revision: &str) -> Result<Self, SourceParseError> {
        let repository = normalize_repository(repository)?;
        let revision = match revision.trim() {
            "" => DEFAULT_REVISION.to_string(),
            rev if rev.starts_with('-') || rev.contains(char::is_whitespace) => {
                return Err(SourceParseError::InvalidRevision(rev.to_string()));
            }
            rev => rev.to_string(),
        };

        Ok(Self {
            repository,
            revision,
        })
    }

    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    #[must_use]
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Clone URL below `base_url` (e.g. `https://github.com`)
    #[must_use]
    pub fn clone_url(&self, base_url: &str) -> String {
        format!("{}/{}.git", base_url.trim_end_matches('/'), self.repository)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.repository, self.revision)
    }
}

impl FromStr for Source {
    type Err = SourceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.is_empty() {
            return Err(SourceParseError::Empty);
        }

        let (repository, revision) = split_revision(token);
        Self::new(repository, revision)
    }
}

/// Split `token` at the `@` that starts its revision. Revisions may contain `/`; in a URL
/// only an `@` inside the path counts, since the authority may carry user info.
fn split_revision(token: &str) -> (&str, &str) {
    let path_start = token
        .find("://")
        .map(|scheme_end| {
            let authority = scheme_end + 3;
            token[authority..]
                .find('/')
                .map_or(token.len(), |slash| authority + slash)
        })
        .unwrap_or(0);

    match token[path_start..].find('@') {
        Some(at) => {
            let at = path_start + at;
            (&token[..at], &token[at + 1..])
        }
        None => (token, ""),
    }
}

/// Reduce `owner/repo`, `owner/repo.git` or a GitHub URL to `owner/repo`.
///
/// # Errors
///
/// Returns [`SourceParseError`] for anything that is not a repository path.
pub fn normalize_repository(value: &str) -> Result<String, SourceParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SourceParseError::Empty);
    }

    let path = if value.contains("://") {
        let url =
            Url::parse(value).map_err(|_| SourceParseError::InvalidRepository(value.to_string()))?;
        if url.host_str() != Some("github.com") {
            return Err(SourceParseError::InvalidRepository(value.to_string()));
        }
        url.path().to_string()
    } else {
        value.to_string()
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    if REPOSITORY_PATTERN.is_match(path) && !path.split('/').any(|part| part == "." || part == "..") {
        Ok(path.to_string())
    } else {
        Err(SourceParseError::InvalidRepository(value.to_string()))
    }
}

/// Where the effective primary source came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    CommandLine,
    ProjectSeed,
    UserConfig,
    Default,
    /// Repository and revision came from different layers
    Mixed,
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandLine => f.write_str("command line"),
            Self::ProjectSeed => f.write_str("project config"),
            Self::UserConfig => f.write_str("user config"),
            Self::Default => f.write_str("defaults"),
            Self::Mixed => f.write_str("mixed"),
        }
    }
}

/// Candidate values for one field, highest precedence first
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceLayers<'a> {
    pub command_line: Option<&'a str>,
    pub project_seed: Option<&'a str>,
    pub user_config: Option<&'a str>,
}

impl<'a> SourceLayers<'a> {
    fn pick(&self, default: &'a str) -> (&'a str, SourceOrigin) {
        [
            (self.command_line, SourceOrigin::CommandLine),
            (self.project_seed, SourceOrigin::ProjectSeed),
            (self.user_config, SourceOrigin::UserConfig),
        ]
        .into_iter()
        .find_map(|(value, origin)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (v, origin))
        })
        .unwrap_or((default, SourceOrigin::Default))
    }
}

/// Resolve repository and revision independently across the configuration layers.
///
/// # Errors
///
/// Returns [`SourceParseError`] when the winning values do not form a valid source.
pub fn resolve_primary(
    repository: SourceLayers<'_>,
    revision: SourceLayers<'_>,
) -> Result<(Source, SourceOrigin), SourceParseError> {
    let (repo, repo_origin) = repository.pick(DEFAULT_REPOSITORY);
    let (rev, rev_origin) = revision.pick(DEFAULT_REVISION);

    let origin = if repo_origin == rev_origin {
        repo_origin
    } else {
        SourceOrigin::Mixed
    };

    Ok((Source::new(repo, rev)?, origin))
}
