//! Builds view requests from user input.

use std::path::Path;

use anyhow::{bail, Context};
use client_core::ViewRequest;
use shared::domain::{DocumentQuery, TextQuery, VerificationQuery};

const FALLBACK_FILE_NAME: &str = "upload.bin";

/// The client sends whatever it is given, so blank queries are stopped here.
pub fn text_request(text: &str) -> anyhow::Result<ViewRequest> {
    if text.trim().is_empty() {
        bail!("query must not be empty");
    }
    Ok(ViewRequest::Check(VerificationQuery::Text(TextQuery::new(
        text,
    ))))
}

pub async fn load_document(path: &Path) -> anyhow::Result<DocumentQuery> {
    let file_bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(FALLBACK_FILE_NAME)
        .to_string();
    let mime_type = mime_guess::from_path(path).first_raw().map(str::to_string);

    Ok(DocumentQuery {
        file_bytes,
        file_name,
        mime_type,
    })
}

pub async fn document_request(path: &Path) -> anyhow::Result<ViewRequest> {
    let document = load_document(path).await?;
    Ok(ViewRequest::Check(VerificationQuery::Document(document)))
}
