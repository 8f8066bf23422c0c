use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;

use backend::{
    media_storage::{MediaStorage, ObjectStorage},
    server,
    types::Environment,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env()?;

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(environment.tracing_level()).into())
        .from_env_lossy();

    // JSON logs for staging/production, human-readable for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt().json().with_env_filter(filter).init();
        }
        Environment::Development { .. } => {
            fmt().with_env_filter(filter).init();
        }
    }

    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let media_storage: Arc<dyn ObjectStorage> = Arc::new(MediaStorage::new(
        s3_client,
        environment.s3_bucket()?,
        environment.presigned_url_expiry_secs(),
    ));

    server::start(environment, media_storage).await
}
