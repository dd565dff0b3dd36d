//! Store file reading and crash-safe replacement

use crate::error::{PrecacheError, PrecacheResult};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Raw store document: every key in the file, any namespace
pub type Document = Map<String, Value>;

/// Read the store document, or an empty one if the file does not exist
///
/// Anything that exists but cannot be read as a JSON object is reported as
/// corruption; the file is left untouched.
pub async fn read_document(path: &Path) -> PrecacheResult<Document> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Store file {} not found, starting empty", path.display());
            return Ok(Document::new());
        }
        Err(e) => {
            return Err(PrecacheError::StoreCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(Document::new());
    }

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(PrecacheError::StoreCorrupt {
            path: path.to_path_buf(),
            reason: format!("expected a JSON object at top level, found {}", kind(&other)),
        }),
        Err(e) => Err(PrecacheError::StoreCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

/// Replace the store file with `document`
///
/// Writes a sibling temp file, syncs it, then renames it over the target,
/// so a crash leaves either the old or the new file in place.
pub async fn write_document(path: &Path, document: &Document) -> PrecacheResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| PrecacheError::io(format!("creating store directory {}", parent.display()), e))?;
    }

    let mut content = serde_json::to_string_pretty(document)?;
    content.push('\n');

    let tmp = temp_path(path);
    let written = match write_synced(&tmp, content.as_bytes()).await {
        Ok(()) => fs::rename(&tmp, path).await.map_err(|e| {
            PrecacheError::io(format!("replacing store file {}", path.display()), e)
        }),
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }

    debug!("Wrote {} entries to {}", document.len(), path.display());
    Ok(())
}

async fn write_synced(tmp: &Path, bytes: &[u8]) -> PrecacheResult<()> {
    let mut file = fs::File::create(tmp)
        .await
        .map_err(|e| PrecacheError::io(format!("creating {}", tmp.display()), e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| PrecacheError::io(format!("writing {}", tmp.display()), e))?;
    file.sync_all()
        .await
        .map_err(|e| PrecacheError::io(format!("syncing {}", tmp.display()), e))
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store.json".to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
