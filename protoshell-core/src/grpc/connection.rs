use crate::tls::ChannelCredentials;
use std::future::Future;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

/// How long a dial may take before it is abandoned.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Invalid URI '{0}': {1}")]
    InvalidUri(String, #[source] tonic::transport::Error),
    #[error("Failed to connect to '{0}': {1}")]
    DialFailed(String, #[source] tonic::transport::Error),
    #[error("Timed out after {timeout:?} connecting to '{address}'")]
    DialTimeout { address: String, timeout: Duration },
}

/// Opens connections to a `host:port` address.
pub trait Connector {
    type Service;

    fn connect(&self, address: &str) -> impl Future<Output = Result<Self::Service, ConnectError>>;
}

/// Connects over HTTP/2 with `tonic`'s `Channel`, in plaintext or TLS.
#[derive(Debug, Clone)]
pub struct ChannelConnector {
    credentials: ChannelCredentials,
    dial_timeout: Duration,
}

impl ChannelConnector {
    pub fn new(credentials: ChannelCredentials) -> Self {
        Self {
            credentials,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
        }
    }

    fn url(&self, address: &str) -> String {
        if address.contains("://") {
            address.to_string()
        } else {
            format!("{}://{}", self.credentials.scheme(), address)
        }
    }
}

impl Connector for ChannelConnector {
    type Service = Channel;

    async fn connect(&self, address: &str) -> Result<Channel, ConnectError> {
        let url = self.url(address);

        let mut endpoint = Endpoint::new(url.clone())
            .map_err(|e| ConnectError::InvalidUri(url.clone(), e))?
            .connect_timeout(self.dial_timeout);

        if let ChannelCredentials::Tls(config) = &self.credentials {
            endpoint = endpoint
                .tls_config(config.clone())
                .map_err(|e| ConnectError::InvalidUri(url.clone(), e))?;
        }

        debug!(%url, "dialing");

        let channel = tokio::time::timeout(self.dial_timeout, endpoint.connect())
            .await
            .map_err(|_| ConnectError::DialTimeout {
                address: url.clone(),
                timeout: self.dial_timeout,
            })?
            .map_err(|e| ConnectError::DialFailed(url.clone(), e))?;

        info!(%url, tls = self.credentials.is_tls(), "connected");

        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_addresses_use_http() {
        let connector = ChannelConnector::new(ChannelCredentials::Insecure);
        assert_eq!(connector.url("localhost:50051"), "http://localhost:50051");
    }

    #[test]
    fn explicit_schemes_are_kept() {
        let connector = ChannelConnector::new(ChannelCredentials::Insecure);
        assert_eq!(connector.url("https://example.com:443"), "https://example.com:443");
    }

    #[tokio::test]
    async fn malformed_addresses_are_rejected_before_dialing() {
        let connector = ChannelConnector::new(ChannelCredentials::Insecure);

        assert!(matches!(
            connector.connect("bad host:port").await,
            Err(ConnectError::InvalidUri(..))
        ));
    }
}
