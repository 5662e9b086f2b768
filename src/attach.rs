use crate::entities::OpError;
use crate::store::ListStore;
use serde_json::json;
use std::path::Path;

/// One ceiling for every upload path; the per-view limits of the old UI
/// were inconsistent.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Profile photos and expense bills: image extensions only.
    Image,
    /// Assignment files: any type.
    Document,
}

pub fn validate_upload(path: &Path, kind: UploadKind) -> Result<(), OpError> {
    let meta = std::fs::metadata(path)
        .map_err(|e| OpError::new("io_failed", format!("cannot read {}: {}", path.display(), e)))?;
    if !meta.is_file() {
        return Err(OpError::bad_params(format!(
            "not a file: {}",
            path.display()
        )));
    }
    if meta.len() > MAX_UPLOAD_BYTES {
        return Err(OpError::bad_params(format!(
            "file exceeds {} byte limit",
            MAX_UPLOAD_BYTES
        ))
        .with_details(json!({ "size": meta.len() })));
    }
    if kind == UploadKind::Image {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return Err(OpError::bad_params(format!(
                "expected an image file, got {:?}",
                ext
            )));
        }
    }
    Ok(())
}

/// Replaces an item's attachments with the file at `path` and returns the
/// absolute URL of the new attachment. The new file is uploaded first and
/// the previous attachments deleted after, so a failed upload never leaves
/// the item with nothing.
pub fn replace_attachment(
    store: &ListStore,
    list_id: &str,
    item_id: i64,
    path: &Path,
    kind: UploadKind,
) -> Result<String, OpError> {
    validate_upload(path, kind)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| OpError::bad_params(format!("bad file name: {}", path.display())))?
        .to_string();
    let bytes = std::fs::read(path)
        .map_err(|e| OpError::new("io_failed", format!("cannot read {}: {}", path.display(), e)))?;

    let previous = store
        .attachments(list_id, item_id)
        .map_err(|e| OpError::db("db_query_failed", e))?;
    let server_path = store
        .attachment_add(list_id, item_id, &file_name, &bytes)
        .map_err(|e| OpError::db("db_insert_failed", e))?;
    for old in previous {
        if old.file_name != file_name {
            store
                .attachment_delete(list_id, item_id, &old.file_name)
                .map_err(|e| OpError::db("db_delete_failed", e))?;
        }
    }
    Ok(format!("{}{}", store.origin(), server_path))
}

/// Absolute URL of the item's first attachment, if it has any.
pub fn first_attachment_url(
    store: &ListStore,
    list_id: &str,
    item_id: i64,
) -> Result<Option<String>, OpError> {
    let atts = store
        .attachments(list_id, item_id)
        .map_err(|e| OpError::db("db_query_failed", e))?;
    Ok(atts
        .into_iter()
        .next()
        .map(|a| format!("{}{}", store.origin(), a.server_path)))
}

/// Deterministic placeholder for people without a photo.
pub fn avatar_url(name: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=random",
        name.trim().replace(' ', "+")
    )
}

#[cfg(test)]
mod tests {
    use super::avatar_url;

    #[test]
    fn avatar_url_is_deterministic_per_name() {
        assert_eq!(
            avatar_url("Jane Smith"),
            "https://ui-avatars.com/api/?name=Jane+Smith&background=random"
        );
        assert_eq!(avatar_url("Jane Smith"), avatar_url(" Jane Smith "));
    }
}
