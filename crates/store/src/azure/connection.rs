use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Url;
use thiserror::Error;

const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

#[derive(Debug, Error)]
pub enum ConnectionStringError {
    #[error("Malformed connection string segment '{0}', expected Key=Value")]
    MalformedSegment(String),
    #[error("Connection string is missing {0}")]
    Missing(&'static str),
    #[error("Invalid AccountKey: {0}")]
    InvalidKey(#[from] base64::DecodeError),
    #[error("Invalid blob endpoint '{0}'")]
    InvalidEndpoint(String),
}

/// How requests to the blob service are authorized.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    SharedKey { account: String, key: Vec<u8> },
    /// SAS query string, without the leading `?`.
    Sas(String),
    Anonymous,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::SharedKey { account, .. } => f
                .debug_struct("SharedKey")
                .field("account", account)
                .field("key", &"<redacted>")
                .finish(),
            Credentials::Sas(_) => f.write_str("Sas(<redacted>)"),
            Credentials::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// A parsed Azure Storage connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub blob_endpoint: Url,
    pub credentials: Credentials,
}

impl ConnectionString {
    /// Parse `Key=Value;Key=Value` pairs.
    ///
    /// Recognized keys: `DefaultEndpointsProtocol`, `AccountName`,
    /// `AccountKey`, `EndpointSuffix`, `BlobEndpoint`,
    /// `SharedAccessSignature`, `UseDevelopmentStorage`.
    /// A SAS takes precedence over an account key.
    pub fn parse(raw: &str) -> Result<Self, ConnectionStringError> {
        let mut protocol = "https";
        let mut account_name = None;
        let mut account_key = None;
        let mut endpoint_suffix = "core.windows.net";
        let mut blob_endpoint = None;
        let mut sas = None;
        let mut development = false;

        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConnectionStringError::MalformedSegment(segment.to_string()))?;
            match key {
                "DefaultEndpointsProtocol" => protocol = value,
                "AccountName" => account_name = Some(value),
                "AccountKey" => account_key = Some(value),
                "EndpointSuffix" => endpoint_suffix = value,
                "BlobEndpoint" => blob_endpoint = Some(value),
                "SharedAccessSignature" => sas = Some(value),
                "UseDevelopmentStorage" => development = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        if development {
            account_name = account_name.or(Some(DEV_ACCOUNT_NAME));
            account_key = account_key.or(Some(DEV_ACCOUNT_KEY));
            blob_endpoint = blob_endpoint.or(Some(DEV_BLOB_ENDPOINT));
        }

        let endpoint = match (blob_endpoint, account_name) {
            (Some(endpoint), _) => endpoint.to_string(),
            (None, Some(account)) => format!("{protocol}://{account}.blob.{endpoint_suffix}"),
            (None, None) => return Err(ConnectionStringError::Missing("AccountName or BlobEndpoint")),
        };
        let blob_endpoint = Url::parse(&endpoint)
            .map_err(|_| ConnectionStringError::InvalidEndpoint(endpoint.clone()))?;

        let credentials = match (sas, account_name, account_key) {
            (Some(sas), _, _) => Credentials::Sas(sas.trim_start_matches('?').to_string()),
            (None, Some(account), Some(key)) => Credentials::SharedKey {
                account: account.to_string(),
                key: STANDARD.decode(key)?,
            },
            (None, None, Some(_)) => return Err(ConnectionStringError::Missing("AccountName")),
            (None, _, None) => Credentials::Anonymous,
        };

        Ok(Self {
            blob_endpoint,
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_key() {
        let cs = ConnectionString::parse(
            "DefaultEndpointsProtocol=https;AccountName=games;AccountKey=c2VjcmV0;EndpointSuffix=core.windows.net",
        )
        .unwrap();
        assert_eq!(cs.blob_endpoint.as_str(), "https://games.blob.core.windows.net/");
        assert_eq!(
            cs.credentials,
            Credentials::SharedKey {
                account: "games".to_string(),
                key: b"secret".to_vec()
            }
        );
    }

    #[test]
    fn test_parse_sas_with_blob_endpoint() {
        let cs = ConnectionString::parse(
            "BlobEndpoint=https://games.blob.core.windows.net/;SharedAccessSignature=?sv=2021-08-06&sig=abc%3D",
        )
        .unwrap();
        assert_eq!(cs.blob_endpoint.host_str(), Some("games.blob.core.windows.net"));
        assert_eq!(
            cs.credentials,
            Credentials::Sas("sv=2021-08-06&sig=abc%3D".to_string())
        );
    }

    #[test]
    fn test_parse_development_storage() {
        let cs = ConnectionString::parse("UseDevelopmentStorage=true").unwrap();
        assert_eq!(
            cs.blob_endpoint.as_str(),
            "http://127.0.0.1:10000/devstoreaccount1"
        );
        assert!(matches!(
            cs.credentials,
            Credentials::SharedKey { ref account, .. } if account == "devstoreaccount1"
        ));
    }

    #[test]
    fn test_parse_anonymous() {
        let cs = ConnectionString::parse("AccountName=public").unwrap();
        assert_eq!(cs.credentials, Credentials::Anonymous);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ConnectionString::parse("AccountKey=c2VjcmV0"),
            Err(ConnectionStringError::Missing(_))
        ));
        assert!(matches!(
            ConnectionString::parse("AccountName=games;garbage"),
            Err(ConnectionStringError::MalformedSegment(_))
        ));
        assert!(matches!(
            ConnectionString::parse("AccountName=games;AccountKey=not base64!"),
            Err(ConnectionStringError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let cs = ConnectionString::parse("AccountName=games;AccountKey=c2VjcmV0").unwrap();
        let debug = format!("{cs:?}");
        assert!(!debug.contains("115"));
        assert!(debug.contains("<redacted>"));
    }
}
