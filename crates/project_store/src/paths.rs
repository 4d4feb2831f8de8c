use std::path::{Path, PathBuf};

pub const STORAGE_DIR: [&str; 2] = [".cockpit", "storage"];

/// Storage key holding the JSON-serialized project list.
pub const PROJECTS_KEY: &str = "cockpit_projects";

#[must_use]
pub fn storage_root(base: &Path) -> PathBuf {
    base.join(STORAGE_DIR[0]).join(STORAGE_DIR[1])
}

#[must_use]
pub fn key_file_name(key: &str) -> String {
    let sanitized: String = key
        .chars()
        .map(|c| match c {
            ':' | '/' | '\\' | ' ' => '-',
            _ => c,
        })
        .collect();
    format!("{sanitized}.json")
}
