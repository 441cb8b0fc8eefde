//! Common test constants used across multiple test files.

/// Primary repository used by most scenarios
pub const TEST_PRIMARY_REPO: &str = "org/primary";

/// Revision every fixture source is published under unless a test says otherwise
pub const TEST_REVISION: &str = "main";

/// Default timeout for test commands (in seconds)
pub const TEST_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Kernel manifest listing one skill
pub const KERNEL_MANIFEST_JSON: &str = r#"{
  "metadata": { "id": "my-competencies", "name": "My Competencies" },
  "bom": { "skills": [ "my-skill" ], "entry_points": [] }
}"#;
