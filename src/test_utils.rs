//! Test utilities for hcchat
//!
//! This module provides common test utilities including temporary directory
//! management, test file creation, and assertion helpers.

use crate::config::Config;
use crate::storage::SqliteStorage;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// The directory is removed when the returned value is dropped.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Write a small valid PNG into `dir`
pub fn create_test_png(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    image::RgbImage::new(2, 3)
        .save(&path)
        .expect("Failed to write test image");
    path
}

/// Open session storage backed by a database inside `dir`
pub fn temp_storage(dir: &TempDir) -> SqliteStorage {
    SqliteStorage::new_with_path(dir.path().join("sessions.db"))
        .expect("Failed to create test storage")
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T: std::fmt::Debug>(result: crate::error::Result<T>, expected: &str) {
    match result {
        Ok(value) => panic!("Expected error containing '{}' but got Ok({:?})", expected, value),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
generation:
  host: http://localhost:11434
  model: test-model
  timeout_seconds: 30
storage:
  key: hc_sessions_test
speech:
  language: en-GB
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "content");
    }

    #[test]
    fn test_create_test_png_is_an_image() {
        let dir = temp_dir();
        let path = create_test_png(&dir, "x.png");
        assert!(image::open(path).is_ok());
    }

    #[test]
    fn test_assert_error_contains() {
        let result: crate::error::Result<()> =
            Err(crate::error::HcChatError::Config("invalid".to_string()).into());
        assert_error_contains(result, "invalid");
    }

    #[test]
    #[should_panic(expected = "Expected error")]
    fn test_assert_error_contains_panics_on_ok() {
        assert_error_contains(Ok(()), "anything");
    }

    #[test]
    fn test_config_yaml_parses_and_validates() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert_eq!(config.generation.model, "test-model");
        assert_eq!(config.storage.key, "hc_sessions_test");
        assert!(config.validate().is_ok());
    }
}
