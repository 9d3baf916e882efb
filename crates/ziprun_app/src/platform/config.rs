use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use ziprun_engine::{EngineSettings, Markers};
use ziprun_logging::ziprun_info;

/// Client settings read from a RON file. Missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub output_dir: PathBuf,
    pub completion_marker: String,
    pub failure_marker: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let engine = EngineSettings::default();
        Self {
            server_url: engine.base_url,
            output_dir: engine.output_dir,
            completion_marker: engine.markers.completion,
            failure_marker: engine.markers.failure,
            connect_timeout_secs: engine.connect_timeout.as_secs(),
            request_timeout_secs: engine.request_timeout.as_secs(),
        }
    }
}

impl ClientConfig {
    /// Reads `path`; a file that does not exist yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                ziprun_info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()))
            }
        };
        let config = ron::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        ziprun_info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Command-line values win over the file.
    pub fn with_overrides(mut self, server_url: Option<String>, output_dir: Option<PathBuf>) -> Self {
        if let Some(server_url) = server_url {
            self.server_url = server_url;
        }
        if let Some(output_dir) = output_dir {
            self.output_dir = output_dir;
        }
        self
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            base_url: self.server_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            output_dir: self.output_dir.clone(),
            markers: Markers {
                completion: self.completion_marker.clone(),
                failure: self.failure_marker.clone(),
            },
        }
    }
}
