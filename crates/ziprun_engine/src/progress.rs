use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{ready, stream, Stream, StreamExt};
use reqwest::header::ACCEPT;
use ziprun_logging::{ziprun_debug, ziprun_info};

use crate::sse::SseDecoder;
use crate::{ClassifiedLine, EngineSettings, LineKind, StreamError, StreamFailureKind};

/// Raw log payloads in delivery order, before classification.
pub type RawLogStream = Pin<Box<dyn Stream<Item = Result<String, StreamError>> + Send>>;

/// Substrings that end a run when they appear in a log line.
///
/// The service words these per locale, so they are configuration rather than constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub completion: String,
    pub failure: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            completion: "Processing finished".to_string(),
            failure: "Error".to_string(),
        }
    }
}

impl Markers {
    /// Completion wins over failure when a line carries both.
    pub fn classify(&self, raw: &str) -> LineKind {
        if contains_marker(raw, &self.completion) {
            LineKind::Completed
        } else if contains_marker(raw, &self.failure) {
            LineKind::Failed
        } else {
            LineKind::Informational
        }
    }
}

fn contains_marker(raw: &str, marker: &str) -> bool {
    !marker.is_empty() && raw.contains(marker)
}

#[async_trait::async_trait]
pub trait LogSource: Send + Sync {
    /// Opens a fresh connection. Each call yields an independent stream.
    async fn open(&self) -> Result<RawLogStream, StreamError>;
}

/// `GET /logs` as server-sent events.
#[derive(Debug, Clone)]
pub struct SseLogSource {
    settings: EngineSettings,
}

impl SseLogSource {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl LogSource for SseLogSource {
    async fn open(&self) -> Result<RawLogStream, StreamError> {
        let url = self
            .settings
            .logs_url()
            .map_err(|err| StreamError::new(StreamFailureKind::InvalidUrl, err.to_string()))?;
        // No overall timeout: the stream stays open for the whole run.
        let client = reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .build()
            .map_err(|err| StreamError::new(StreamFailureKind::Connect, err.to_string()))?;

        ziprun_info!("Opening log stream {}", url);
        let response = client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|err| StreamError::new(StreamFailureKind::Connect, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::new(
                StreamFailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let mut decoder = SseDecoder::new();
        let lines = response
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(chunk) => decoder.feed(&chunk).into_iter().map(Ok).collect::<Vec<_>>(),
                Err(err) => vec![Err(StreamError::new(
                    StreamFailureKind::Disconnected,
                    err.to_string(),
                ))],
            })
            .flat_map(stream::iter);
        Ok(Box::pin(lines))
    }
}

/// Classified progress lines for one run.
///
/// Yields at most one terminal item: a completion or failure line, or a transport
/// error. The underlying connection is dropped as soon as that item is produced,
/// so nothing the server sends afterwards is delivered.
pub struct ProgressStream {
    inner: Option<RawLogStream>,
    markers: Markers,
}

impl ProgressStream {
    pub fn new(inner: RawLogStream, markers: Markers) -> Self {
        Self {
            inner: Some(inner),
            markers,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Drops the connection; later polls yield nothing.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            ziprun_debug!("Log stream closed by client");
        }
    }
}

impl Stream for ProgressStream {
    type Item = Result<ClassifiedLine, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        let item = match ready!(inner.as_mut().poll_next(cx)) {
            Some(Ok(raw)) => {
                let kind = this.markers.classify(&raw);
                Ok(ClassifiedLine { raw, kind })
            }
            Some(Err(err)) => Err(err),
            None => Err(StreamError::new(
                StreamFailureKind::Closed,
                "log stream ended before processing finished",
            )),
        };

        let terminal = match &item {
            Ok(line) => line.kind.is_terminal(),
            Err(_) => true,
        };
        if terminal {
            this.inner = None;
        }
        Poll::Ready(Some(item))
    }
}

/// Opens `source` and wraps it for classification.
pub async fn open_progress(
    source: &dyn LogSource,
    markers: Markers,
) -> Result<ProgressStream, StreamError> {
    let raw = source.open().await?;
    Ok(ProgressStream::new(raw, markers))
}
