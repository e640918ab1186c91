use tracing::{error, warn};

use crate::error::AppError;
use crate::supabase::{NoteRepository, ObjectStorage};

/// Path segment that precedes the object key in every public note URL.
const NOTES_SEGMENT: &str = "/notes/";

/// Recovers the storage key from a public object URL.
pub fn storage_key_from_url(url: &str) -> Option<String> {
    let start = url.find(NOTES_SEGMENT)? + NOTES_SEGMENT.len();
    let encoded = &url[start..];
    if encoded.is_empty() {
        return None;
    }
    urlencoding::decode(encoded).ok().map(|key| key.into_owned())
}

/// Removes a note's stored file (best effort) and then its row.
pub async fn delete_note(
    notes: &dyn NoteRepository,
    storage: &dyn ObjectStorage,
    id: &str,
) -> Result<(), AppError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::BadRequest("Missing note id".to_string()));
    }

    let file_url = match notes.find_note_file_url(id).await {
        Ok(Some(url)) => url,
        Ok(None) => return Err(not_found()),
        Err(e) => {
            error!("looking up note {} failed: {}", id, e);
            return Err(not_found());
        }
    };

    match storage_key_from_url(&file_url) {
        Some(key) => {
            if let Err(e) = storage.remove(&[key.clone()]).await {
                warn!("could not remove stored file {} for note {}: {}", key, id, e);
            }
        }
        None => warn!("note {} has an unrecognised file url: {}", id, file_url),
    }

    notes.delete_note(id).await.map_err(|e| {
        error!("deleting note {} failed: {}", id, e);
        AppError::InternalServerError("Delete failed, please try again later".to_string())
    })?;

    tracing::info!("deleted note {}", id);
    Ok(())
}

fn not_found() -> AppError {
    AppError::NotFound("Note does not exist or has already been deleted".to_string())
}
