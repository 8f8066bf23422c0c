use common_types::UploadConfigResponse;

use crate::drop_surface::DropLimits;

/// Default backend address, matching the server's default port
pub const DEFAULT_API_URL: &str = "http://localhost:8001";

/// Where the uploader talks to and what it admits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploaderConfig {
    /// Base URL of the upload backend
    pub api_url: String,
    /// Batch admission limits
    pub limits: DropLimits,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            limits: DropLimits::default(),
        }
    }
}

impl UploaderConfig {
    /// Config for the backend at `api_url`, with default limits
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Adopts the limits advertised by the backend
    #[must_use]
    pub fn with_server_limits(mut self, config: &UploadConfigResponse) -> Self {
        self.limits = DropLimits::from(config);
        self
    }
}

impl From<&UploadConfigResponse> for DropLimits {
    fn from(config: &UploadConfigResponse) -> Self {
        Self {
            max_files: config.max_files,
            max_file_size_mb: config.max_file_size_mb,
        }
    }
}
