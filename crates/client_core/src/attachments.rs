//! Project attachment uploads.
//!
//! A file goes up as a multipart form: the binary `file` part plus `name`,
//! `description` and `order` text fields. New attachments are always appended.

use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use shared::{domain::ProjectId, protocol::OrderableItem};
use tracing::info;

use crate::{ClientError, DashboardClient, OrderedCollection, OrderedCollectionSync, Result};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub description: Option<String>,
    pub bytes: Vec<u8>,
}

impl DashboardClient {
    pub async fn upload_attachment(
        &self,
        project_id: ProjectId,
        upload: AttachmentUpload,
        order: u32,
    ) -> Result<OrderableItem> {
        let collection = OrderedCollection::ProjectAttachments(project_id);
        let size_bytes = upload.bytes.len();
        let part = Part::bytes(upload.bytes)
            .file_name(upload.filename.clone())
            .mime_str(upload.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE))?;
        let mut form = Form::new()
            .part("file", part)
            .text("name", upload.filename.clone())
            .text("order", order.to_string());
        if let Some(description) = upload.description {
            form = form.text("description", description);
        }

        let stored: OrderableItem = self.post_multipart(&collection.path(), form).await?;
        info!(
            project_id = project_id.0,
            item_id = stored.id.0,
            filename = %upload.filename,
            size_bytes,
            order,
            "attachments: uploaded"
        );
        Ok(stored)
    }
}

impl OrderedCollectionSync<DashboardClient> {
    /// Uploads a file at the end of this attachment collection.
    pub async fn upload_attachment(&self, upload: AttachmentUpload) -> Result<OrderableItem> {
        let OrderedCollection::ProjectAttachments(project_id) = self.collection() else {
            return Err(ClientError::UnsupportedCollection(self.collection().path()));
        };
        let client = Arc::clone(self.backend());
        self.append_with(move |order| async move {
            client.upload_attachment(project_id, upload, order).await
        })
        .await
    }
}
