use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::Markers;

/// Default processing service address.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Service root; endpoints are resolved relative to it.
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to uploads and downloads. The progress stream has no overall timeout.
    pub request_timeout: Duration,
    pub output_dir: PathBuf,
    pub markers: Markers,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            // Large archives take a while to upload.
            request_timeout: Duration::from_secs(300),
            output_dir: PathBuf::from("output"),
            markers: Markers::default(),
        }
    }
}

impl EngineSettings {
    pub fn process_url(&self) -> Result<Url, url::ParseError> {
        self.endpoint("process")
    }

    pub fn logs_url(&self) -> Result<Url, url::ParseError> {
        self.endpoint("logs")
    }

    /// `/download/{filename}` with the filename percent-encoded as one path segment.
    pub fn download_url(&self, filename: &str) -> Result<Url, url::ParseError> {
        self.endpoint(&format!("download/{}", urlencoding::encode(filename)))
    }

    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = format!("{}/", self.base_url.trim_end_matches('/'));
        Url::parse(&base)?.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base_url: &str) -> EngineSettings {
        EngineSettings {
            base_url: base_url.to_string(),
            ..EngineSettings::default()
        }
    }

    #[test]
    fn endpoints_resolve_against_base() {
        let s = settings("http://localhost:8000");
        assert_eq!(
            s.process_url().unwrap().as_str(),
            "http://localhost:8000/process"
        );
        assert_eq!(s.logs_url().unwrap().as_str(), "http://localhost:8000/logs");
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let s = settings("http://localhost:8000/ocr/");
        assert_eq!(
            s.process_url().unwrap().as_str(),
            "http://localhost:8000/ocr/process"
        );
    }

    #[test]
    fn download_filename_is_percent_encoded() {
        let s = settings("http://localhost:8000");
        assert_eq!(
            s.download_url("result 1.zip").unwrap().as_str(),
            "http://localhost:8000/download/result%201.zip"
        );
        assert_eq!(
            s.download_url("a/b?c#d.zip").unwrap().as_str(),
            "http://localhost:8000/download/a%2Fb%3Fc%23d.zip"
        );
    }

    #[test]
    fn invalid_base_is_reported() {
        assert!(settings("not a url").process_url().is_err());
    }
}
