use std::path::PathBuf;

use ziprun_logging::{ziprun_info, ziprun_warn};

use crate::filename::local_result_filename;
use crate::persist::AtomicFileWriter;
use crate::{EngineSettings, RetrieveError, RetrieveFailureKind};

#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Fetches the named result and returns where it was stored.
    async fn retrieve(&self, filename: &str) -> Result<PathBuf, RetrieveError>;
}

/// `GET /download/{filename}` saved into the configured output directory.
#[derive(Debug, Clone)]
pub struct ReqwestRetriever {
    settings: EngineSettings,
    writer: AtomicFileWriter,
}

impl ReqwestRetriever {
    pub fn new(settings: EngineSettings) -> Self {
        let writer = AtomicFileWriter::new(settings.output_dir.clone());
        Self { settings, writer }
    }
}

#[async_trait::async_trait]
impl Retriever for ReqwestRetriever {
    async fn retrieve(&self, filename: &str) -> Result<PathBuf, RetrieveError> {
        let url = self
            .settings
            .download_url(filename)
            .map_err(|err| RetrieveError::new(RetrieveFailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(map_reqwest_error)?;

        ziprun_info!("Downloading result {}", url);
        let response = client.get(url).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            ziprun_warn!("Download of {} failed with {}", filename, status);
            return Err(RetrieveError::new(
                RetrieveFailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        let local_name = local_result_filename(filename);
        let path = self
            .writer
            .write(&local_name, &body)
            .map_err(|err| RetrieveError::new(RetrieveFailureKind::Persist, err.to_string()))?;
        ziprun_info!("Saved {} bytes to {:?}", body.len(), path);
        Ok(path)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> RetrieveError {
    if err.is_timeout() {
        return RetrieveError::new(RetrieveFailureKind::Timeout, err.to_string());
    }
    RetrieveError::new(RetrieveFailureKind::Network, err.to_string())
}
