//! Out-of-band document access.
//!
//! [`BypassAccessLayer`] exposes the full [`DocumentAccessLayer`] operation
//! set constructed directly from a shared driver handle rather than a request
//! context. Used by index-rebuild scripts and administrative tooling that run
//! outside the request lifecycle.

use std::ops::Deref;
use std::sync::Arc;

use mercata_store::DocumentDriver;

use crate::document::DocumentAccessLayer;

/// A document access layer bound directly to a shared driver handle.
#[derive(Clone)]
pub struct BypassAccessLayer {
    inner: DocumentAccessLayer,
}

impl BypassAccessLayer {
    /// Bind directly to a shared driver handle, skipping the request context.
    pub fn new(driver: Arc<dyn DocumentDriver>) -> Self {
        Self { inner: DocumentAccessLayer::new(driver) }
    }
}

impl Deref for BypassAccessLayer {
    type Target = DocumentAccessLayer;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
