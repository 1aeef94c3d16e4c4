use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use illustra_core::{ComparisonSession, ComparisonSnapshot, Toggles, SLOT_COUNT};
use illustra_store::JsonFileStore;

use crate::config::AppConfig;

const WORKING_NAME: &str = "working";

/// Resolved config plus where the working session lives.
pub struct Workspace {
    pub config: AppConfig,
    pub session_path: PathBuf,
}

impl Workspace {
    pub fn new(config: AppConfig, session_path: Option<PathBuf>) -> Self {
        let session_path = session_path.unwrap_or_else(|| config.session_path());
        Self {
            config,
            session_path,
        }
    }

    pub fn session(&self) -> Result<ComparisonSession> {
        load_session(&self.session_path, self.config.toggles)
    }

    /// Writes the session back; only called once a command fully succeeded.
    pub fn commit(&self, session: &ComparisonSession) -> Result<()> {
        save_session(&self.session_path, session)
    }

    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::in_dir(self.config.store_dir())
    }
}

/// Slots are numbered from 1 on the command line.
pub fn slot_index(slot: usize) -> Result<usize> {
    if slot == 0 || slot > SLOT_COUNT {
        bail!("slot must be between 1 and {SLOT_COUNT}, got {slot}");
    }
    Ok(slot - 1)
}

/// Loads the working session; a missing file starts a fresh one with the
/// configured toggles.
pub fn load_session(path: &Path, toggles: Toggles) -> Result<ComparisonSession> {
    if !path.exists() {
        let mut session = ComparisonSession::new();
        session.set_toggles(toggles);
        return Ok(session);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read session {}", path.display()))?;
    let snapshot: ComparisonSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("invalid session file {}", path.display()))?;
    Ok(ComparisonSession::from_snapshot(snapshot))
}

pub fn save_session(path: &Path, session: &ComparisonSession) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let body = serde_json::to_vec_pretty(&session.snapshot(WORKING_NAME))?;
    fs::write(path, body).with_context(|| format!("failed to write session {}", path.display()))?;
    tracing::debug!(path = %path.display(), "session saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use illustra_core::RowField;

    #[test]
    fn slots_are_one_based() {
        assert_eq!(slot_index(1).unwrap(), 0);
        assert_eq!(slot_index(3).unwrap(), 2);
        assert!(slot_index(0).is_err());
        assert!(slot_index(4).is_err());
    }

    #[test]
    fn fresh_session_uses_configured_toggles() {
        let dir = tempfile::tempdir().unwrap();
        let toggles = Toggles {
            irr: true,
            ..Toggles::default()
        };
        let session = load_session(&dir.path().join("none.json"), toggles).unwrap();
        assert_eq!(session.toggles(), toggles);
        assert_eq!(session.loaded().count(), 0);
    }

    #[test]
    fn session_survives_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("work").join("session.json");
        let mut session = ComparisonSession::new();
        session
            .import_csv("A\nyr,age,p\n1,45,100\n".as_bytes(), "a.csv")
            .unwrap();
        session.set_override(0, 1, RowField::CashValue, 7.0).unwrap();
        save_session(&path, &session).unwrap();

        let loaded = load_session(&path, Toggles::default()).unwrap();
        assert_eq!(loaded.overrides(), session.overrides());
        assert_eq!(loaded.option(0).unwrap(), session.option(0).unwrap());
    }
}
