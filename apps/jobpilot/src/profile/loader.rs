use std::fs;
use std::path::Path;

use tracing::debug;

use crate::models::Profile;
use crate::profile::ProfileError;

pub fn load_from_file(path: &Path) -> Result<Profile, ProfileError> {
    let raw = fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let profile = serde_json::from_str(&raw).map_err(|source| ProfileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded profile from {}", path.display());
    Ok(profile)
}

/// Writes pretty JSON, creating parent directories as needed.
pub fn save_to_file(path: &Path, profile: &Profile) -> Result<(), ProfileError> {
    let io_err = |source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(profile).map_err(|source| ProfileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/profile.json");

        let mut profile = Profile::default();
        profile.personal.name = "Lin".into();
        profile.preferences.keywords = vec!["rust".into()];
        save_to_file(&path, &profile).unwrap();

        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded.personal.name, "Lin");
        assert_eq!(loaded.preferences.keywords, vec!["rust"]);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_from_file(&path), Err(ProfileError::Parse { .. })));
    }
}
