use std::sync::Arc;

use super::domain::{Attachment, AttachmentId, AttachmentParent, AttachmentUpload};
use super::error::WorkflowError;
use super::store::MarketplaceStore;

/// Associates uploaded byte blobs with their parent entity. Pure append;
/// callers decide whether to purge existing attachments first (listing
/// update does, the append-only entities never do).
pub struct AttachmentLinker<S> {
    store: Arc<S>,
}

impl<S> Clone for AttachmentLinker<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: MarketplaceStore> AttachmentLinker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Binds each upload to `parent` and persists the batch.
    pub fn attach(
        &self,
        parent: AttachmentParent,
        files: Vec<AttachmentUpload>,
    ) -> Result<(), WorkflowError> {
        if files.is_empty() {
            return Ok(());
        }
        self.store.insert_attachments(bind(parent, files))?;
        Ok(())
    }

    /// Delete-then-attach. Used only by listing update; an empty batch
    /// leaves the parent with no attachments at all.
    pub fn replace(
        &self,
        parent: AttachmentParent,
        files: Vec<AttachmentUpload>,
    ) -> Result<(), WorkflowError> {
        self.store.delete_attachments(parent)?;
        if !files.is_empty() {
            self.store.insert_attachments(bind(parent, files))?;
        }
        Ok(())
    }

    pub fn for_parent(&self, parent: AttachmentParent) -> Result<Vec<Attachment>, WorkflowError> {
        Ok(self.store.attachments_for(parent)?)
    }

    /// Backs the download-by-id pass-through: bytes are served with the
    /// recorded mime type and filename.
    pub fn fetch(&self, id: AttachmentId) -> Result<Attachment, WorkflowError> {
        self.store
            .attachment(id)?
            .ok_or(WorkflowError::NotFound("attachment"))
    }
}

/// Builds the stored rows for a batch, recording each upload's size.
pub(crate) fn bind(parent: AttachmentParent, files: Vec<AttachmentUpload>) -> Vec<Attachment> {
    files
        .into_iter()
        .map(|file| Attachment {
            id: AttachmentId::new(),
            size: file.bytes.len() as u64,
            name: file.name,
            mime_type: file.mime_type,
            bytes: file.bytes,
            parent,
        })
        .collect()
}
