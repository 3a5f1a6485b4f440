//! Exports a rendered web page, e.g. the transaction list, as a PDF document.
//!
//! Rendering is delegated to a [PdfRenderer]. The default renderer runs a
//! headless Chromium binary.

use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    extract::{FromRef, Query, State, rejection::QueryRejection},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use time::OffsetDateTime;
use tokio::process::Command;
use url::Url;
use uuid::Uuid;

use crate::{AppState, Error};

/// The default time allowed for rendering a page.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Renders the page at a URL to a PDF document.
#[async_trait]
pub trait PdfRenderer: Debug + Send + Sync {
    /// Render the page at `url` and return the bytes of the PDF document.
    ///
    /// # Errors
    /// Returns [Error::PdfExportFailed] if the page cannot be rendered.
    async fn render(&self, url: &Url) -> Result<Vec<u8>, Error>;
}

/// A [PdfRenderer] that prints pages with a headless Chromium browser.
#[derive(Debug, Clone)]
pub struct ChromiumPdfRenderer {
    binary: PathBuf,
    timeout: Duration,
}

impl ChromiumPdfRenderer {
    /// Create a renderer that runs the Chromium executable at `binary`, which
    /// may also be a program name on the `PATH`, e.g. "chromium".
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    /// Set the time allowed for rendering a page, after which the browser is killed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run_browser(&self, url: &Url, output_path: &Path) -> Result<Vec<u8>, Error> {
        let mut command = Command::new(&self.binary);
        command
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-pdf-header-footer")
            // Give scripts on the page time to finish before printing.
            .arg("--virtual-time-budget=1000")
            .arg(format!("--print-to-pdf={}", output_path.display()))
            .arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|error| {
            Error::PdfExportFailed(format!(
                "could not start {}: {error}",
                self.binary.display()
            ))
        })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                Error::PdfExportFailed(format!(
                    "rendering timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|error| Error::PdfExportFailed(error.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::PdfExportFailed(format!(
                "browser exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        tokio::fs::read(output_path)
            .await
            .map_err(|error| Error::PdfExportFailed(format!("could not read PDF: {error}")))
    }
}

#[async_trait]
impl PdfRenderer for ChromiumPdfRenderer {
    async fn render(&self, url: &Url) -> Result<Vec<u8>, Error> {
        let output_path = std::env::temp_dir().join(format!("bextpense-{}.pdf", Uuid::new_v4()));

        tracing::info!("Generating PDF from URL: {url}");
        let result = self.run_browser(url, &output_path).await;

        match tokio::fs::remove_file(&output_path).await {
            Err(error) if error.kind() != std::io::ErrorKind::NotFound => {
                tracing::warn!("could not remove {}: {error}", output_path.display());
            }
            _ => {}
        }

        if let Ok(bytes) = &result {
            tracing::info!("PDF generated successfully, size: {} bytes", bytes.len());
        }

        result
    }
}

/// The state needed to export a PDF.
#[derive(Debug, Clone)]
pub struct PdfExportState {
    /// The renderer that prints pages.
    pub pdf_renderer: Arc<dyn PdfRenderer>,
}

impl FromRef<AppState> for PdfExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            pdf_renderer: state.pdf_renderer.clone(),
        }
    }
}

/// The query parameters for a PDF export.
#[derive(Debug, Deserialize)]
pub struct ExportPdfParams {
    /// The absolute http(s) URL of the page to render.
    pub page: Option<String>,
}

/// A route handler that renders a page to PDF and sends it as an attachment.
pub async fn export_pdf_endpoint(
    State(state): State<PdfExportState>,
    params: Result<Query<ExportPdfParams>, QueryRejection>,
) -> Result<Response, Error> {
    let Query(params) = params.map_err(|rejection| Error::Validation(rejection.body_text()))?;
    tracing::info!("Received PDF export request for page: {:?}", params.page);

    let page = parse_page_url(params.page.as_deref())?;

    let pdf = state
        .pdf_renderer
        .render(&page)
        .await
        .inspect_err(|error| tracing::error!("Failed to export PDF: {error}"))?;

    let filename = format!(
        "transactions-export-{}.pdf",
        OffsetDateTime::now_utc().date()
    );

    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}

fn parse_page_url(page: Option<&str>) -> Result<Url, Error> {
    let page = page
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .ok_or_else(|| Error::Validation("Page URL is required".to_owned()))?;

    let url = Url::parse(page)
        .map_err(|error| Error::Validation(format!("Page URL is invalid: {error}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::Validation(format!(
            "Page URL must use http or https, got {scheme}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use async_trait::async_trait;
    use axum::{
        extract::{Query, State},
        http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    };
    use time::OffsetDateTime;
    use url::Url;

    use crate::Error;

    use super::{
        ChromiumPdfRenderer, ExportPdfParams, PdfExportState, PdfRenderer, export_pdf_endpoint,
        parse_page_url,
    };

    const FAKE_PDF: &[u8] = b"%PDF-1.7\n\xe2\xe3\xcf\xd3 fake";

    #[derive(Debug)]
    struct FakeRenderer;

    #[async_trait]
    impl PdfRenderer for FakeRenderer {
        async fn render(&self, _url: &Url) -> Result<Vec<u8>, Error> {
            Ok(FAKE_PDF.to_vec())
        }
    }

    #[derive(Debug)]
    struct FailingRenderer;

    #[async_trait]
    impl PdfRenderer for FailingRenderer {
        async fn render(&self, _url: &Url) -> Result<Vec<u8>, Error> {
            Err(Error::PdfExportFailed("browser crashed".to_owned()))
        }
    }

    fn params(page: Option<&str>) -> ExportPdfParams {
        ExportPdfParams {
            page: page.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn responds_with_pdf_attachment() {
        let state = PdfExportState {
            pdf_renderer: Arc::new(FakeRenderer),
        };

        let response = export_pdf_endpoint(
            State(state),
            Ok(Query(params(Some("http://localhost:3000/transactions")))),
        )
        .await
        .unwrap();

        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/pdf");
        let want_disposition = format!(
            "attachment; filename=\"transactions-export-{}.pdf\"",
            OffsetDateTime::now_utc().date()
        );
        assert_eq!(
            response.headers().get(CONTENT_DISPOSITION).unwrap(),
            want_disposition.as_str()
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.as_ref(), FAKE_PDF);
    }

    #[tokio::test]
    async fn renderer_failure_is_reported() {
        let state = PdfExportState {
            pdf_renderer: Arc::new(FailingRenderer),
        };

        let result = export_pdf_endpoint(
            State(state),
            Ok(Query(params(Some("https://example.com")))),
        )
        .await;

        assert_eq!(
            result.err(),
            Some(Error::PdfExportFailed("browser crashed".to_owned()))
        );
    }

    #[test]
    fn page_is_required() {
        assert_eq!(
            parse_page_url(None),
            Err(Error::Validation("Page URL is required".to_owned()))
        );
        assert_eq!(
            parse_page_url(Some("  ")),
            Err(Error::Validation("Page URL is required".to_owned()))
        );
    }

    #[test]
    fn page_must_be_http_url() {
        assert!(matches!(
            parse_page_url(Some("not a url")),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            parse_page_url(Some("file:///etc/passwd")),
            Err(Error::Validation(_))
        ));
        assert!(parse_page_url(Some("https://example.com/transactions?pageSize=50")).is_ok());
    }

    #[tokio::test]
    async fn missing_browser_is_reported() {
        let renderer = ChromiumPdfRenderer::new("/nonexistent/chromium-binary")
            .with_timeout(Duration::from_secs(5));
        let url = Url::parse("https://example.com").unwrap();

        let result = renderer.render(&url).await;

        assert!(matches!(result, Err(Error::PdfExportFailed(_))));
    }
}
