use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::trace;
use uuid::Uuid;

type Entries = Mutex<HashMap<Uuid, PreviewEntry>>;

struct PreviewEntry {
    bytes: Bytes,
    mime_type: String,
}

/// In-memory store behind preview urls, the equivalent of a page's object urls.
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    entries: Arc<Entries>,
}

/// Handle to one displayable image. Not `Clone`: whoever holds it owns the
/// image, and dropping it releases the bytes.
pub struct PreviewUrl {
    id: Uuid,
    entries: Weak<Entries>,
}

impl PreviewRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, bytes: Bytes, mime_type: impl Into<String>) -> PreviewUrl {
        let id = Uuid::new_v4();
        self.lock().insert(
            id,
            PreviewEntry {
                bytes,
                mime_type: mime_type.into(),
            },
        );
        trace!(%id, "Preview created");
        PreviewUrl {
            id,
            entries: Arc::downgrade(&self.entries),
        }
    }

    /// Bytes and mime type behind a preview, if it is still live.
    #[must_use]
    pub fn resolve(&self, url: &PreviewUrl) -> Option<(Bytes, String)> {
        self.lock()
            .get(&url.id)
            .map(|e| (e.bytes.clone(), e.mime_type.clone()))
    }

    /// Self-contained `data:` url for embedding the preview in a document.
    #[must_use]
    pub fn data_url(&self, url: &PreviewUrl) -> Option<String> {
        self.resolve(url).map(|(bytes, mime_type)| {
            let b64 = general_purpose::STANDARD.encode(&bytes);
            format!("data:{mime_type};base64,{b64}")
        })
    }

    /// Number of previews that have not been released yet.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, PreviewEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreviewUrl {
    #[must_use]
    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PreviewUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:inspector/{}", self.id)
    }
}

impl fmt::Debug for PreviewUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreviewUrl").field(&self.id).finish()
    }
}

impl Drop for PreviewUrl {
    fn drop(&mut self) {
        if let Some(entries) = self.entries.upgrade() {
            entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.id);
            trace!(id = %self.id, "Preview released");
        }
    }
}
