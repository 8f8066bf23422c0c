//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use tracing::Level;

/// Default presigned URL lifetime: 6 minutes
const DEFAULT_PRESIGNED_URL_EXPIRY_SECS: u64 = 6 * 60;

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development {
        /// Optional override for presigned URL expiry in seconds
        presign_expiry_override: Option<u64>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Errors
    ///
    /// Returns an error if `APP_ENV` contains an unknown stage
    pub fn from_env() -> anyhow::Result<Self> {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => {
                let presign_expiry_override = env::var("PRESIGNED_URL_EXPIRY_SECS")
                    .ok()
                    .and_then(|val| val.parse::<u64>().ok());

                Ok(Self::Development {
                    presign_expiry_override,
                })
            }
            _ => anyhow::bail!("Invalid environment: {env}"),
        }
    }

    /// Stage name as accepted in `APP_ENV`
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development { .. } => "development",
        }
    }

    /// Returns the S3 bucket name for the environment
    ///
    /// # Errors
    ///
    /// Returns an error outside development if `S3_BUCKET_NAME` is not set
    pub fn s3_bucket(&self) -> anyhow::Result<String> {
        match self {
            Self::Production | Self::Staging => env::var("S3_BUCKET_NAME")
                .map_err(|_| anyhow::anyhow!("S3_BUCKET_NAME environment variable is not set")),
            Self::Development { .. } => {
                Ok(env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "uploads".to_string()))
            }
        }
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development { .. } | Self::Staging)
    }

    /// Returns the endpoint URL to use for S3
    ///
    /// `AWS_ENDPOINT_URL_S3` wins everywhere; development falls back to `LocalStack`.
    #[must_use]
    pub fn override_s3_endpoint_url(&self) -> Option<String> {
        env::var("AWS_ENDPOINT_URL_S3")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| match self {
                Self::Production | Self::Staging => None,
                Self::Development { .. } => Some("http://localhost:4566".to_string()),
            })
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config)
            .build()
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        if let Some(endpoint_url) = self.override_s3_endpoint_url() {
            builder.set_endpoint_url(Some(endpoint_url));
        }

        // Override "force path style" to true for compatibility with LocalStack
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if matches!(self, Self::Development { .. }) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// Presigned URL expiry time in seconds
    #[must_use]
    pub fn presigned_url_expiry_secs(&self) -> u64 {
        match self {
            Self::Production | Self::Staging => DEFAULT_PRESIGNED_URL_EXPIRY_SECS,
            Self::Development {
                presign_expiry_override,
            } => presign_expiry_override.unwrap_or(DEFAULT_PRESIGNED_URL_EXPIRY_SECS),
        }
    }

    /// Default log level when `RUST_LOG` does not say otherwise
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development { .. } => Level::DEBUG,
            })
    }

    /// Port the HTTP server binds to
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is set but is not a valid port number
    pub fn port() -> anyhow::Result<u16> {
        env::var("PORT").map_or(Ok(8001), |p| p.parse().map_err(anyhow::Error::from))
    }
}
