// Azure Blob Storage backend over the REST API

pub mod auth;
pub mod connection;

use crate::is_service_fault;
use anyhow::Context;
use asset_relay_core::{ObjectStore, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use tracing::debug;

pub use connection::{ConnectionString, Credentials};

/// Blob service client for one storage account. Containers map 1:1 to
/// relay containers.
pub struct AzureBlobStore {
    client: reqwest::Client,
    connection: ConnectionString,
}

impl AzureBlobStore {
    pub fn new(connection: ConnectionString) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("asset-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, connection })
    }

    /// Read the connection string from the environment variable `var`.
    pub fn from_env(var: &str) -> anyhow::Result<Self> {
        let raw = std::env::var(var)
            .with_context(|| format!("Environment variable {} is not set", var))?;
        let connection = ConnectionString::parse(&raw)
            .with_context(|| format!("Invalid Azure Storage connection string in {}", var))?;
        Self::new(connection)
    }

    fn blob_url(&self, container: &str, path: &str) -> Result<Url, StoreError> {
        let mut url = self.connection.blob_endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::unavailable("blob endpoint cannot carry a path"))?
            .pop_if_empty()
            .push(container)
            .extend(path.split('/'));
        if let Credentials::Sas(sas) = &self.connection.credentials {
            url.set_query(Some(sas));
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, StoreError> {
        let builder = self
            .client
            .request(method.clone(), url.clone())
            .header("x-ms-version", auth::API_VERSION);

        match &self.connection.credentials {
            Credentials::SharedKey { account, key } => {
                let date = auth::ms_date(Utc::now());
                let string_to_sign = auth::string_to_sign(
                    method.as_str(),
                    account,
                    &url,
                    &[("x-ms-date", date.as_str()), ("x-ms-version", auth::API_VERSION)],
                );
                let authorization = auth::authorization(account, key, &string_to_sign)
                    .map_err(|e| StoreError::unavailable(format!("cannot sign request: {e}")))?;
                Ok(builder
                    .header("x-ms-date", date)
                    .header(AUTHORIZATION, authorization))
            }
            Credentials::Sas(_) | Credentials::Anonymous => Ok(builder),
        }
    }
}

fn send_error(verb: &str, container: &str, path: &str, err: reqwest::Error) -> StoreError {
    StoreError::unavailable(format!("{verb} {container}/{path}: {err}"))
}

#[async_trait]
impl ObjectStore for AzureBlobStore {
    fn name(&self) -> &'static str {
        "azure"
    }

    async fn exists(&self, container: &str, path: &str) -> Result<bool, StoreError> {
        let url = self.blob_url(container, path)?;
        let resp = self
            .request(Method::HEAD, url)?
            .send()
            .await
            .map_err(|e| send_error("HEAD", container, path, e))?;

        let status = resp.status();
        debug!(container, path, %status, "azure HEAD");
        match status {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(StoreError::unavailable(format!(
                "HEAD {container}/{path} failed with status {s}"
            ))),
        }
    }

    async fn fetch(&self, container: &str, path: &str) -> Result<Bytes, StoreError> {
        let url = self.blob_url(container, path)?;
        let resp = self
            .request(Method::GET, url)?
            .send()
            .await
            .map_err(|e| send_error("GET", container, path, e))?;

        let status = resp.status();
        debug!(container, path, %status, "azure GET");
        if is_service_fault(status.as_u16()) {
            return Err(StoreError::unavailable(format!(
                "GET {container}/{path} failed with status {status}"
            )));
        }
        if !status.is_success() {
            return Err(StoreError::failed(format!(
                "GET {container}/{path} failed with status {status}"
            )));
        }

        resp.bytes()
            .await
            .map_err(|e| StoreError::failed(format!("reading {container}/{path}: {e}")))
    }
}
