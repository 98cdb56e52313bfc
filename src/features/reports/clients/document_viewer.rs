use async_trait::async_trait;
use reqwest::StatusCode;

use super::report_backend::ensure_success;
use crate::features::reports::errors::BackendError;
use crate::features::reports::models::ViewerReference;

/// Opens a generation URL, which makes the backend render and store the report
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), BackendError>;
}

/// Read-only display of stored report documents.
///
/// Every reference handed to `show` must eventually be handed to `release`.
pub trait DocumentViewer: Send + Sync {
    fn show(&self, reference: &ViewerReference);
    fn release(&self, reference: &ViewerReference);
}

/// Retriever that issues the generation request itself and discards the document
pub struct HttpDocumentRetriever {
    http_client: reqwest::Client,
}

impl HttpDocumentRetriever {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl DocumentRetriever for HttpDocumentRetriever {
    async fn open(&self, url: &str) -> Result<(), BackendError> {
        tracing::debug!("Requesting report generation: {}", url);

        let response = self.http_client.get(url).send().await.map_err(|e| {
            tracing::error!("Report generation request failed: {}", e);
            BackendError::from(e)
        })?;

        let size = read_document(response).await.inspect_err(|e| {
            if matches!(e, BackendError::EmptyDocument) {
                tracing::warn!("Report backend produced no document for {}", url);
            }
        })?;

        tracing::info!("Report generated ({} bytes)", size);
        Ok(())
    }
}

/// Drain a generation response, returning the document size.
///
/// The backend answers 204 when the range holds no records; nothing is stored then.
async fn read_document(response: reqwest::Response) -> Result<usize, BackendError> {
    if response.status() == StatusCode::NO_CONTENT {
        return Err(BackendError::EmptyDocument);
    }

    let document = ensure_success(response).await?.bytes().await?;
    if document.is_empty() {
        return Err(BackendError::EmptyDocument);
    }
    Ok(document.len())
}

/// Viewer for HTTP callers: the reference URL travels back in the response and
/// the caller's browser renders it. Nothing is held server-side, so release
/// only records that the view was closed.
pub struct LinkViewer;

impl DocumentViewer for LinkViewer {
    fn show(&self, reference: &ViewerReference) {
        tracing::info!(
            "Viewing {} report {} via {}",
            reference.category,
            reference.report_id,
            reference.url
        );
    }

    fn release(&self, reference: &ViewerReference) {
        tracing::debug!(
            "Released viewer for {} report {}",
            reference.category,
            reference.report_id
        );
    }
}
