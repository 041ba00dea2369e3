//! Text extraction for uploaded article files.
//!
//! [`FileExtractor`] handles the text formats directly: plain text,
//! Markdown, JSON and HTML (reduced with [`html_to_text`]). Binary document
//! formats such as PDF and DOCX are rejected with
//! [`SearchError::UnsupportedFileType`].

use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use crate::error::SearchError;
use crate::fetcher::html_to_text;

const OCTET_STREAM: &str = "application/octet-stream";

/// A file handed in for ingestion.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Builds an upload whose MIME type is guessed from the file extension.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        Self {
            mime_type: guess_mime_type(&file_name).to_owned(),
            file_name,
            bytes,
        }
    }

    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// MIME type for a file name's extension, `application/octet-stream` when
/// unknown.
#[must_use]
pub fn guess_mime_type(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("txt") => "text/plain",
        Some("md" | "markdown") => "text/markdown",
        Some("html" | "htm") => "text/html",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => OCTET_STREAM,
    }
}

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Return the readable text of `file`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] when the file type is unsupported or the file
    /// holds no readable text.
    async fn extract(&self, file: &FileUpload) -> Result<String, SearchError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FileExtractor;

#[async_trait]
impl ContentExtractor for FileExtractor {
    async fn extract(&self, file: &FileUpload) -> Result<String, SearchError> {
        let mime = file.mime_type.to_ascii_lowercase();
        // Drop parameters such as `; charset=utf-8`.
        let mime = mime.split(';').next().unwrap_or_default().trim();
        let is_markdown = Path::new(&file.file_name)
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("md"));

        let text = if mime == "text/html" || mime == "application/xhtml+xml" {
            html_to_text(&decode(file)?)
        } else if mime.starts_with("text/") || mime == "application/json" || is_markdown {
            decode(file)?
        } else {
            return Err(SearchError::UnsupportedFileType {
                file_name: file.file_name.clone(),
                mime_type: file.mime_type.clone(),
            });
        };

        if text.trim().is_empty() {
            return Err(SearchError::EmptyFile(file.file_name.clone()));
        }
        tracing::debug!(
            file_name = %file.file_name,
            mime_type = %mime,
            chars = text.chars().count(),
            "extracted file content"
        );
        Ok(text)
    }
}

fn decode(file: &FileUpload) -> Result<String, SearchError> {
    String::from_utf8(file.bytes.clone())
        .map_err(|_| SearchError::InvalidEncoding(file.file_name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, body: &str) -> FileUpload {
        FileUpload::new(name, body.as_bytes().to_vec())
    }

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(guess_mime_type("notes.MD"), "text/markdown");
        assert_eq!(guess_mime_type("page.htm"), "text/html");
        assert_eq!(guess_mime_type("report.pdf"), "application/pdf");
        assert_eq!(guess_mime_type("no-extension"), OCTET_STREAM);
    }

    #[tokio::test]
    async fn markdown_is_returned_verbatim() {
        let text = FileExtractor
            .extract(&upload("launch.md", "# Cursor 2.0\n\nships agents"))
            .await
            .unwrap();
        assert_eq!(text, "# Cursor 2.0\n\nships agents");
    }

    #[tokio::test]
    async fn markdown_extension_wins_over_generic_mime() {
        let file = upload("launch.md", "body").with_mime_type(OCTET_STREAM);
        assert_eq!(FileExtractor.extract(&file).await.unwrap(), "body");
    }

    #[tokio::test]
    async fn html_is_reduced_to_text() {
        let file = upload("post.html", "<html><body><h1>Devin</h1><p>raises</p></body></html>")
            .with_mime_type("text/html; charset=utf-8");
        assert_eq!(FileExtractor.extract(&file).await.unwrap(), "Devin raises");
    }

    #[tokio::test]
    async fn binary_documents_are_unsupported() {
        let err = FileExtractor
            .extract(&upload("deck.pdf", "%PDF-1.7"))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::UnsupportedFileType { ref mime_type, .. }
            if mime_type == "application/pdf"));
    }

    #[tokio::test]
    async fn blank_and_non_utf8_files_are_rejected() {
        assert!(matches!(
            FileExtractor.extract(&upload("empty.txt", "  \n")).await,
            Err(SearchError::EmptyFile(_))
        ));
        let binary = FileUpload::new("bad.txt", vec![0xff, 0xfe, 0x00]);
        assert!(matches!(
            FileExtractor.extract(&binary).await,
            Err(SearchError::InvalidEncoding(_))
        ));
    }
}
