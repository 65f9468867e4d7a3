//! # Secure Channel Builder
//!
//! Builds the transport credentials of a connection from the TLS options the shell was
//! started with.
//!
//! * With TLS disabled nothing is read from disk and the channel is plaintext.
//! * A CA bundle replaces the platform root store for verifying the server.
//! * A client certificate and key pair enable mutual TLS. It can be combined with a CA bundle.
//! * A server name override changes the name the server certificate is verified against.
//!
//! PEM files are parsed up front so that a bad bundle is reported when the shell starts,
//! not on the first call.
use rustls::pki_types::ServerName;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tonic::transport::{Certificate, ClientTlsConfig, Identity};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("failed to read certificate file '{path}': '{source}'")]
    CertLoad {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to append CA certificates from '{0}' to the cert pool")]
    CertPoolAppend(PathBuf),
    #[error("failed to load key pair ('{cert}', '{key}'): {reason}")]
    KeyPairLoad {
        cert: PathBuf,
        key: PathBuf,
        reason: String,
    },
    #[error("failed to override server name '{0}'")]
    ServerNameOverride(String),
}

/// Transport security options, usually straight from the command line.
#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    pub enabled: bool,
    pub ca_cert: Option<PathBuf>,
    pub cert: Option<PathBuf>,
    pub cert_key: Option<PathBuf>,
    pub server_name: Option<String>,
}

/// Ready-to-use transport credentials.
#[derive(Debug, Clone, Default)]
pub enum ChannelCredentials {
    #[default]
    Insecure,
    Tls(ClientTlsConfig),
}

impl ChannelCredentials {
    /// Loads the certificate material named by `options`.
    pub fn build(options: &TlsOptions) -> Result<Self, CredentialsError> {
        if !options.enabled {
            return Ok(Self::Insecure);
        }

        let mut config = ClientTlsConfig::new();

        match non_empty(&options.ca_cert) {
            Some(path) => {
                config = config.ca_certificate(load_ca_bundle(path)?);
                debug!(path = %path.display(), "loaded CA bundle");
            }
            None => config = config.with_native_roots(),
        }

        if let (Some(cert), Some(key)) = (non_empty(&options.cert), non_empty(&options.cert_key)) {
            config = config.identity(load_key_pair(cert, key)?);
            debug!(cert = %cert.display(), "loaded client certificate");
        }

        if let Some(name) = options.server_name.as_deref().filter(|name| !name.is_empty()) {
            ServerName::try_from(name.to_string())
                .map_err(|_| CredentialsError::ServerNameOverride(name.to_string()))?;
            config = config.domain_name(name);
        }

        Ok(Self::Tls(config))
    }

    pub fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    /// The URI scheme a channel with these credentials must use.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Insecure => "http",
            Self::Tls(_) => "https",
        }
    }
}

fn non_empty(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|path| !path.as_os_str().is_empty())
}

fn read(path: &Path) -> Result<Vec<u8>, CredentialsError> {
    std::fs::read(path).map_err(|source| CredentialsError::CertLoad {
        path: path.to_path_buf(),
        source,
    })
}

fn load_ca_bundle(path: &Path) -> Result<Certificate, CredentialsError> {
    let pem = read(path)?;

    let certs = rustls_pemfile::certs(&mut BufReader::new(pem.as_slice()))
        .filter_map(Result::ok)
        .count();

    if certs == 0 {
        return Err(CredentialsError::CertPoolAppend(path.to_path_buf()));
    }

    Ok(Certificate::from_pem(pem))
}

fn load_key_pair(cert: &Path, key: &Path) -> Result<Identity, CredentialsError> {
    let key_pair_error = |reason: String| CredentialsError::KeyPairLoad {
        cert: cert.to_path_buf(),
        key: key.to_path_buf(),
        reason,
    };

    let cert_pem = std::fs::read(cert).map_err(|e| key_pair_error(e.to_string()))?;
    let key_pem = std::fs::read(key).map_err(|e| key_pair_error(e.to_string()))?;

    let certs = rustls_pemfile::certs(&mut BufReader::new(cert_pem.as_slice()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| key_pair_error(e.to_string()))?;
    if certs.is_empty() {
        return Err(key_pair_error("no certificate found in PEM".to_string()));
    }

    rustls_pemfile::private_key(&mut BufReader::new(key_pem.as_slice()))
        .map_err(|e| key_pair_error(e.to_string()))?
        .ok_or_else(|| key_pair_error("no private key found in PEM".to_string()))?;

    Ok(Identity::from_pem(cert_pem, key_pem))
}
