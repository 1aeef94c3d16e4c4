use anyhow::Result;

use illustra_core::ComparisonSession;
use illustra_store::{ComparisonStore, StoredComparison};

use crate::logging;
use crate::workspace::Workspace;

pub fn save(workspace: &Workspace, name: String, id: Option<String>) -> Result<()> {
    let session = workspace.session()?;
    let mut record = StoredComparison::new(session.snapshot(name.trim()));
    if let Some(id) = id {
        record = record.with_id(id);
    }
    let id = workspace.store().save(record)?;
    logging::status(format!("saved {name} as {id}"));
    Ok(())
}

pub fn list(workspace: &Workspace) -> Result<()> {
    let metas = workspace.store().list()?;
    if metas.is_empty() {
        logging::status("no saved comparisons");
        return Ok(());
    }
    for meta in metas {
        let updated = meta
            .updated_at
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!("{}\t{}\t{}", meta.id, updated, meta.name);
    }
    Ok(())
}

/// Replaces the working session with a saved comparison.
pub fn load(workspace: &Workspace, id: String) -> Result<()> {
    let record = workspace.store().load(&id)?;
    let name = record.snapshot.name.clone();
    let session = ComparisonSession::from_snapshot(record.snapshot);
    workspace.commit(&session)?;
    logging::status(format!(
        "loaded {name} ({} options)",
        session.loaded().count()
    ));
    Ok(())
}

pub fn delete(workspace: &Workspace, id: String) -> Result<()> {
    if workspace.store().delete(&id)? {
        logging::status(format!("deleted {id}"));
    } else {
        logging::status(format!("no saved comparison with id {id}"));
    }
    Ok(())
}
