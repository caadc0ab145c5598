#[cfg(feature = "lambda")]
use aws_config::BehaviorVersion;
#[cfg(feature = "lambda")]
use aws_sdk_s3::config::Region;
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use site_cms::app::lambda_handler::{handle_event, HttpEvent, HttpResponse};
#[cfg(feature = "lambda")]
use site_cms::config::lambda::{LambdaConfig, S3Storage};
#[cfg(feature = "lambda")]
use site_cms::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use site_cms::{AuthConfig, ContentService};

#[cfg(feature = "lambda")]
type HostedService = ContentService<S3Storage, AuthConfig>;

#[cfg(feature = "lambda")]
async fn function_handler(
    service: &HostedService,
    event: LambdaEvent<HttpEvent>,
) -> Result<HttpResponse, Error> {
    Ok(handle_event(service, &event.payload).await)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    // 建立 Lambda 配置
    let lambda_config = LambdaConfig::from_env()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
    lambda_config
        .validate()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;

    // 建立 AWS 配置和 S3 客戶端
    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let region = Region::new(lambda_config.s3_region.clone());
    let config = aws_sdk_s3::config::Builder::from(&config)
        .region(region)
        .build();
    let s3_client = S3Client::from_conf(config);

    let storage = S3Storage::new(
        s3_client,
        lambda_config.s3_bucket.clone(),
        lambda_config.s3_prefix.clone(),
    );
    let service = ContentService::new(storage, lambda_config.auth.clone());

    tracing::info!(
        "Content API ready (bucket {}, prefix {})",
        lambda_config.s3_bucket,
        lambda_config.s3_prefix
    );

    let service = &service;
    run(service_fn(move |event: LambdaEvent<HttpEvent>| async move {
        function_handler(service, event).await
    }))
    .await
}
