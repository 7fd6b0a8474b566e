use crate::is_service_fault;
use asset_relay_core::{ObjectStore, StoreError};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use bytes::Bytes;
use tracing::debug;

/// S3-compatible backend (AWS, R2, MinIO). A relay container is a bucket.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard AWS environment/profile chain.
    pub async fn from_env(
        endpoint_url: Option<&str>,
        region: Option<&str>,
        force_path_style: bool,
    ) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared).force_path_style(force_path_style);
        if let Some(endpoint_url) = endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }
        Self::new(Client::from_conf(builder.build()))
    }
}

/// Anything other than a service error never reached the bucket. Service
/// errors split on status the same way the Azure backend does.
fn classify<E>(op: &str, container: &str, path: &str, err: SdkError<E, HttpResponse>) -> StoreError
where
    E: std::error::Error + 'static,
{
    let message = format!("{op} {container}/{path}: {}", DisplayErrorContext(&err));
    match &err {
        SdkError::ServiceError(service) if !is_service_fault(service.raw().status().as_u16()) => {
            StoreError::failed(message)
        }
        _ => StoreError::unavailable(message),
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn exists(&self, container: &str, path: &str) -> Result<bool, StoreError> {
        let result = self
            .client
            .head_object()
            .bucket(container)
            .key(path)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service)) if service.err().is_not_found() => {
                debug!(container, path, "HeadObject: not found");
                Ok(false)
            }
            // Auth and bucket-level failures are store faults for an existence check.
            Err(err) => Err(StoreError::unavailable(format!(
                "HeadObject {container}/{path}: {}",
                DisplayErrorContext(&err)
            ))),
        }
    }

    async fn fetch(&self, container: &str, path: &str) -> Result<Bytes, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(container)
            .key(path)
            .send()
            .await
            .map_err(|err| classify("GetObject", container, path, err))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::failed(format!("reading {container}/{path}: {e}")))?;
        Ok(data.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server;
    use asset_relay_core::StoreErrorKind;
    use aws_sdk_s3::config::retry::RetryConfig;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials};
    use axum::Router;
    use axum::extract::Path;
    use axum::http::{StatusCode, header};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;

    fn store_at(endpoint: &str) -> S3Store {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "static"))
            .endpoint_url(endpoint)
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .build();
        S3Store::new(Client::from_conf(config))
    }

    fn s3_error(status: StatusCode, code: &str) -> Response {
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <Error><Code>{code}</Code><Message>{code}</Message><RequestId>1</RequestId></Error>"
        );
        (status, [(header::CONTENT_TYPE, "application/xml")], body).into_response()
    }

    async fn bucket(Path(key): Path<String>) -> Response {
        match key.as_str() {
            "app.wasm" => (StatusCode::OK, "s3-bytes").into_response(),
            "forbidden.wasm" => s3_error(StatusCode::FORBIDDEN, "AccessDenied"),
            "busy.data" => s3_error(StatusCode::SERVICE_UNAVAILABLE, "SlowDown"),
            _ => s3_error(StatusCode::NOT_FOUND, "NoSuchKey"),
        }
    }

    async fn local_store() -> S3Store {
        let app = Router::new().route("/demo/{*key}", get(bucket));
        store_at(&test_server::spawn(app).await)
    }

    #[tokio::test]
    async fn test_head_object_status_mapping() {
        let store = local_store().await;

        assert!(store.exists("demo", "app.wasm").await.unwrap());
        assert!(!store.exists("demo", "missing.wasm").await.unwrap());

        let err = store.exists("demo", "forbidden.wasm").await.unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn test_get_object_status_mapping() {
        let store = local_store().await;

        assert_eq!(
            store.fetch("demo", "app.wasm").await.unwrap(),
            Bytes::from_static(b"s3-bytes")
        );

        let err = store.fetch("demo", "missing.wasm").await.unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Failed);
        assert!(err.to_string().contains("NoSuchKey"));

        let err = store.fetch("demo", "busy.data").await.unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Unavailable);

        let err = store.fetch("demo", "forbidden.wasm").await.unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let store = store_at("http://127.0.0.1:9");
        let err = store.exists("demo", "app.wasm").await.unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Unavailable);

        let err = store.fetch("demo", "app.wasm").await.unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Unavailable);
    }
}
