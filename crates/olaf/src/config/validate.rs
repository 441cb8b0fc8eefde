use std::path::Path;

use url::Url;

use crate::{
    source::{Source, normalize_repository},
    validation::{ValidationErrorCategory, ValidationIssue, ValidationIssues},
};

use super::AppConfig;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    /// List of validation issues found
    ///
    pub(crate) issues: ValidationIssues,
}

impl ValidationResult {
    #[must_use]
    pub fn issues(&self) -> &ValidationIssues {
        &self.issues
    }
}

impl AppConfig {
    /// Full validation for the `AppConfig`
    ///
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let mut issues = Vec::new();

        issues.extend(validate_target_directory(&self.target_directory));

        if let Some(issue) = validate_source_base_url(&self.source_base_url) {
            issues.push(issue);
        }

        if let Some(issue) = validate_repository(self.repository.as_deref()) {
            issues.push(issue);
        }

        if let Some(issue) = validate_branch(self.branch.as_deref()) {
            issues.push(issue);
        }

        if self.git_program.trim().is_empty() {
            issues.push(ValidationIssue::error(
                ValidationErrorCategory::RequiredField,
                "git_program",
                "The `git_program` field exists, but has no value",
                Some("Remove the field to use `git` from PATH"),
            ));
        }

        ValidationResult {
            issues: issues.into(),
        }
    }
}

fn validate_target_directory(target_directory: &Path) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if target_directory.as_os_str().is_empty() {
        issues.push(ValidationIssue::error(
            ValidationErrorCategory::RequiredField,
            "target_directory",
            "The `target_directory` field exists, but has no value",
            Some("Set a value for `target_directory`. Ex. `target_directory: ~/.olaf`"),
        ));
        return issues;
    }

    let target = target_directory.to_string_lossy();
    let expanded_path = shellexpand::tilde(&target);
    let expanded_path = Path::new(expanded_path.as_ref());

    if !expanded_path.is_absolute() {
        issues.push(ValidationIssue::error(
            ValidationErrorCategory::PathFormat,
            "target_directory",
            "The path at `target_directory` is relative and would depend on the working directory",
            Some("Provide an absolute path or one starting with `~`"),
        ));
    }

    issues
}

fn validate_source_base_url(url: &str) -> Option<ValidationIssue> {
    match Url::parse(url) {
        Ok(parsed) if parsed.cannot_be_a_base() => Some(ValidationIssue::error(
            ValidationErrorCategory::UrlFormat,
            "source_base_url",
            "The `source_base_url` cannot have repository paths appended to it",
            Some("Use a base such as `https://github.com`"),
        )),
        Ok(_) => None,
        Err(_) => Some(ValidationIssue::error(
            ValidationErrorCategory::UrlFormat,
            "source_base_url",
            "The `source_base_url` is not a valid URL",
            Some("Use a base such as `https://github.com`"),
        )),
    }
}

fn validate_repository(repository: Option<&str>) -> Option<ValidationIssue> {
    let repository = repository?;

    normalize_repository(repository).err().map(|_| {
        ValidationIssue::error(
            ValidationErrorCategory::InvalidValue,
            "repository",
            "The `repository` field is not an owner/repo identifier",
            Some("Ex. `repository: haal-ai/haal-ide`"),
        )
    })
}

fn validate_branch(branch: Option<&str>) -> Option<ValidationIssue> {
    let branch = branch?;

    if branch.trim().is_empty() {
        return Some(ValidationIssue::warning(
            ValidationErrorCategory::InvalidValue,
            "branch",
            "The `branch` field is empty and will be ignored",
            Some("Remove the field or name a branch"),
        ));
    }

    Source::new("placeholder/repo", branch).err().map(|_| {
        ValidationIssue::error(
            ValidationErrorCategory::InvalidValue,
            "branch",
            "The `branch` field is not a usable revision",
            Some("Branch names may not start with `-` or contain whitespace"),
        )
    })
}
