use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use ziprun_logging::{ziprun_info, ziprun_warn};

use crate::{Accepted, CandidateUpload, EngineSettings, SubmitError, SubmitFailureKind};

/// Multipart field carrying the archive.
pub const UPLOAD_FIELD: &str = "zip_file";

const SUCCESS_STATUS: &str = "success";

#[derive(Debug, Deserialize)]
struct ProcessResponse {
    status: String,
    result_filename: Option<String>,
    message: Option<String>,
}

#[async_trait::async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, upload: &CandidateUpload) -> Result<Accepted, SubmitError>;
}

/// `POST /process` with the archive as multipart form content.
#[derive(Debug, Clone)]
pub struct ReqwestSubmitter {
    settings: EngineSettings,
}

impl ReqwestSubmitter {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, SubmitError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| SubmitError::new(SubmitFailureKind::Network, err.to_string()))
    }
}

#[async_trait::async_trait]
impl Submitter for ReqwestSubmitter {
    async fn submit(&self, upload: &CandidateUpload) -> Result<Accepted, SubmitError> {
        let url = self
            .settings
            .process_url()
            .map_err(|err| SubmitError::new(SubmitFailureKind::InvalidUrl, err.to_string()))?;
        let client = self.build_client()?;

        let part = Part::stream_with_length(upload.content.clone(), upload.content.len() as u64)
            .file_name(upload.name.clone())
            .mime_str("application/zip")
            .map_err(|err| SubmitError::new(SubmitFailureKind::Network, err.to_string()))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        ziprun_info!(
            "Submitting {} ({} bytes) to {}",
            upload.name,
            upload.content.len(),
            url
        );
        let response = client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        // The service reports rejections in the body, whatever the status code.
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let result = parse_process_response(&body, status.as_u16());
        if let Err(err) = &result {
            ziprun_warn!("Submission of {} failed: {}", upload.name, err);
        }
        result
    }
}

fn parse_process_response(body: &[u8], http_status: u16) -> Result<Accepted, SubmitError> {
    let parsed: ProcessResponse = serde_json::from_slice(body).map_err(|err| {
        SubmitError::new(
            SubmitFailureKind::MalformedResponse,
            format!("http status {http_status}: {err}"),
        )
    })?;

    if parsed.status != SUCCESS_STATUS {
        let message = parsed
            .message
            .unwrap_or_else(|| format!("processing status '{}'", parsed.status));
        return Err(SubmitError::new(SubmitFailureKind::Rejected, message));
    }

    match parsed.result_filename {
        Some(result_filename) if !result_filename.is_empty() => Ok(Accepted { result_filename }),
        _ => Err(SubmitError::new(
            SubmitFailureKind::MalformedResponse,
            "success response without result_filename",
        )),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> SubmitError {
    if err.is_timeout() {
        return SubmitError::new(SubmitFailureKind::Timeout, err.to_string());
    }
    SubmitError::new(SubmitFailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_yields_result_filename() {
        let accepted =
            parse_process_response(br#"{"status":"success","result_filename":"out.zip"}"#, 200)
                .unwrap();
        assert_eq!(accepted.result_filename, "out.zip");
    }

    #[test]
    fn other_status_is_rejection_with_message() {
        let err = parse_process_response(br#"{"status":"error","message":"bad zip"}"#, 400)
            .unwrap_err();
        assert_eq!(err.kind, SubmitFailureKind::Rejected);
        assert_eq!(err.message, "bad zip");
    }

    #[test]
    fn rejection_without_message_names_status() {
        let err = parse_process_response(br#"{"status":"busy"}"#, 200).unwrap_err();
        assert_eq!(err.kind, SubmitFailureKind::Rejected);
        assert_eq!(err.message, "processing status 'busy'");
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = parse_process_response(b"<html>502 Bad Gateway</html>", 502).unwrap_err();
        assert_eq!(err.kind, SubmitFailureKind::MalformedResponse);
        assert!(err.message.starts_with("http status 502"));
    }

    #[test]
    fn success_without_filename_is_malformed() {
        let err = parse_process_response(br#"{"status":"success"}"#, 200).unwrap_err();
        assert_eq!(err.kind, SubmitFailureKind::MalformedResponse);
    }
}
