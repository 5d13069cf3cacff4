use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const PERSISTENT_STORAGE_PATH: &str = "~/.config/acctform/storage.json";
const SESSION_STORAGE_FILE: &str = "acctform-session.json";

/// Lifetime of the storage a store is backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Lives in the temp directory, gone once the OS cleans it up.
    Session,
    Persistent,
}

pub fn storage_path(scope: Scope, persistent_override: Option<&str>) -> Result<PathBuf> {
    match scope {
        Scope::Session => Ok(std::env::temp_dir().join(SESSION_STORAGE_FILE)),
        Scope::Persistent => expand(persistent_override.unwrap_or(PERSISTENT_STORAGE_PATH)),
    }
}

fn expand(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .with_context(|| format!("Storage file path {} is invalid", path))?;
    Ok(Path::new(expanded.as_ref()).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_scope_uses_temp_dir() {
        let path = storage_path(Scope::Session, Some("/ignored.json")).unwrap();
        assert_eq!(path, std::env::temp_dir().join(SESSION_STORAGE_FILE));
    }

    #[test]
    fn persistent_scope_honours_override() {
        let path = storage_path(Scope::Persistent, Some("/var/lib/acctform.json")).unwrap();
        assert_eq!(path, PathBuf::from("/var/lib/acctform.json"));
    }

    #[test]
    fn persistent_default_is_expanded() {
        let path = storage_path(Scope::Persistent, None).unwrap();
        assert!(path.ends_with(".config/acctform/storage.json"));
    }

    #[test]
    fn undefined_variable_is_an_error() {
        assert!(storage_path(Scope::Persistent, Some("$ACCTFORM_SURELY_UNSET_VAR/x.json")).is_err());
    }
}
