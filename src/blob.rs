//! Locally addressable object URLs for binary results.
//!
//! A [`BlobRegistry`] maps `blob:khayal/<uuid>` URLs to in-memory payloads.
//! Each URL is owned by an [`ObjectUrl`] handle; dropping the handle revokes
//! the URL and frees the payload, so replacing a result never leaks the old
//! one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

const URL_PREFIX: &str = "blob:khayal/";

/// Bytes and MIME type stored behind an object URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// Raw payload.
    pub data: Arc<[u8]>,
    /// MIME type of the payload.
    pub mime_type: String,
}

/// Shared table of live object URLs.
///
/// Cloning is cheap; clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct BlobRegistry {
    entries: Arc<Mutex<HashMap<Uuid, Blob>>>,
}

impl BlobRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` and returns the handle that owns its URL.
    pub fn create_object_url(&self, data: Vec<u8>, mime_type: impl Into<String>) -> ObjectUrl {
        let id = Uuid::new_v4();
        let blob = Blob {
            data: data.into(),
            mime_type: mime_type.into(),
        };
        let size = blob.data.len();
        self.lock().insert(id, blob);
        tracing::debug!(%id, size, "object URL created");

        ObjectUrl {
            id,
            url: format!("{URL_PREFIX}{id}"),
            registry: self.clone(),
        }
    }

    /// Looks up the blob behind a live URL.
    pub fn resolve(&self, url: &str) -> Option<Blob> {
        let id = parse_url(url)?;
        self.lock().get(&id).cloned()
    }

    /// Revokes a URL. Returns false if it was not live.
    pub fn revoke(&self, url: &str) -> bool {
        parse_url(url).is_some_and(|id| self.remove(id))
    }

    /// Number of live URLs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no URL is live.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn remove(&self, id: Uuid) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            tracing::debug!(%id, "object URL revoked");
        }
        removed
    }

    // A panic while holding the lock cannot leave the map half-updated.
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Blob>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn parse_url(url: &str) -> Option<Uuid> {
    url.strip_prefix(URL_PREFIX)?.parse().ok()
}

/// Owning handle for one object URL. Revokes the URL on drop.
#[derive(Debug)]
#[must_use = "dropping the handle revokes the URL immediately"]
pub struct ObjectUrl {
    id: Uuid,
    url: String,
    registry: BlobRegistry,
}

impl ObjectUrl {
    /// The `blob:khayal/<uuid>` URL.
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// The payload behind this URL.
    pub fn blob(&self) -> Option<Blob> {
        self.registry.lock().get(&self.id).cloned()
    }
}

impl std::fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
