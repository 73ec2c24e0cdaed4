use std::sync::Arc;

use super::{ProgressStream, ReportWriter};
use crate::pdf;

pub const MISSING_UPLOAD: &str = "⚠️ Please upload a PDF file.";
pub const READING: &str = "📖 Reading PDF...";
pub const WRITING: &str = "📝 Writing report from PDF...";
pub const COMPLETE: &str = "✅ Report complete!";

/// An uploaded document
#[derive(Debug, Clone)]
pub struct PdfUpload {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

impl PdfUpload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            filename: None,
            bytes,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Write a report for `query` from the text of an uploaded PDF instead of web searches
pub fn pdf_report(
    writer: Arc<ReportWriter>,
    query: String,
    upload: Option<PdfUpload>,
) -> ProgressStream {
    Box::pin(async_stream::try_stream! {
        let upload = match upload {
            Some(upload) => upload,
            None => {
                yield MISSING_UPLOAD.to_string();
                return;
            }
        };

        tracing::info!(filename = ?upload.filename, bytes = upload.bytes.len(), "PDF research started");
        yield READING.to_string();
        let text = tokio::task::spawn_blocking(move || pdf::extract_text(&upload.bytes, " ")).await??;

        yield WRITING.to_string();
        let input = format!("Original query: {}\nSummarized PDF content: {}", query, text);
        let report = writer.write(&input).await?;

        yield COMPLETE.to_string();
        yield report.markdown_report;
    })
}
