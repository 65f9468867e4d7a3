//! # Generic gRPC Client
//!
//! This module wraps a standard `tonic` client to perform unary calls with
//! [`DynamicPayload`]s. It knows nothing about the messages it exchanges beyond the
//! descriptors carried by the [`Rpc`] being called.
//!
//! ## Features
//!
//! * **Dynamic Pathing**: Builds the HTTP/2 path (e.g., `/package.Service/Method`) at runtime
//!   from the fully qualified method name.
//! * **Metadata Handling**: Converts the session headers into Tonic's `MetadataMap`.
use super::Headers;
use super::codec::DynamicCodec;
use super::connection::ConnectError;
use crate::BoxError;
use crate::dynamic::DynamicPayload;
use crate::index::Rpc;
use crate::resolver::{InvalidFullyQualifiedName, MethodName};
use http_body::Body as HttpBody;
use std::str::FromStr;
use tonic::{
    client::GrpcService,
    metadata::{
        MetadataKey, MetadataValue,
        errors::{InvalidMetadataKey, InvalidMetadataValue},
    },
    transport::Channel,
};
use tracing::debug;

#[derive(thiserror::Error, Debug)]
pub enum InvokeError {
    #[error(transparent)]
    Dial(#[from] ConnectError),
    #[error("Invalid method name: '{0}'")]
    MethodName(#[from] InvalidFullyQualifiedName),
    #[error("Invalid gRPC path '{path}': '{source}'")]
    InvalidPath {
        path: String,
        source: http::uri::InvalidUri,
    },
    #[error("Method '{0}' is streaming, only unary calls are supported")]
    StreamingUnsupported(String),
    #[error("Internal error, the client was not ready: '{0}'")]
    ClientNotReady(#[source] BoxError),
    #[error("Invalid metadata (header) key '{key}': '{source}'")]
    InvalidMetadataKey {
        key: String,
        source: InvalidMetadataKey,
    },
    #[error("Invalid metadata (header) value for key '{key}': '{source}'")]
    InvalidMetadataValue {
        key: String,
        source: InvalidMetadataValue,
    },
    #[error("gRPC call failed: code={:?} message={:?}", .0.code(), .0.message())]
    Transport(tonic::Status),
}

/// A dynamic client performing unary calls over any `GrpcService`.
pub struct GrpcClient<S = Channel> {
    client: tonic::client::Grpc<S>,
}

impl<S> GrpcClient<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub fn new(service: S) -> Self {
        let client = tonic::client::Grpc::new(service);
        Self { client }
    }

    /// Waits until the underlying service can accept a request.
    pub async fn ready(&mut self) -> Result<(), InvokeError> {
        self.client
            .ready()
            .await
            .map_err(|e| InvokeError::ClientNotReady(e.into()))
    }

    /// Performs a Unary gRPC call (Single Request -> Single Response).
    ///
    /// # Returns
    /// * `Ok(DynamicPayload)` - The response, decoded with the method's output descriptor.
    /// * `Err(InvokeError::Transport)` - The server answered with an error status.
    /// * `Err(InvokeError)` - The request could not be built or sent.
    pub async fn unary(
        &mut self,
        rpc: &Rpc,
        payload: DynamicPayload,
        headers: &Headers,
    ) -> Result<DynamicPayload, InvokeError> {
        if rpc.is_streaming() {
            return Err(InvokeError::StreamingUnsupported(rpc.full_name.clone()));
        }

        let path = http_path(&rpc.full_name)?;
        let request = build_request(payload, headers)?;
        let codec = DynamicCodec::new(rpc.response.descriptor().clone());

        self.ready().await?;

        self.client
            .unary(request, path, codec)
            .await
            .map(tonic::Response::into_inner)
            .map_err(InvokeError::Transport)
    }
}

fn http_path(full_name: &str) -> Result<http::uri::PathAndQuery, InvokeError> {
    let name = MethodName::parse(full_name)?;
    debug!(
        package = name.package(),
        service = name.service(),
        method = name.method(),
        "resolved method"
    );

    let path = name.wire_path();
    http::uri::PathAndQuery::from_str(&path)
        .map_err(|source| InvokeError::InvalidPath { path, source })
}

fn build_request<T>(payload: T, headers: &Headers) -> Result<tonic::Request<T>, InvokeError> {
    let mut request = tonic::Request::new(payload);
    for (k, v) in headers {
        let key = MetadataKey::from_str(k).map_err(|source| InvokeError::InvalidMetadataKey {
            key: k.clone(),
            source,
        })?;
        let val = MetadataValue::from_str(v).map_err(|source| {
            InvokeError::InvalidMetadataValue {
                key: k.clone(),
                source,
            }
        })?;
        request.metadata_mut().insert(key, val);
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_uses_the_wire_format() {
        let path = http_path("demo.Greeter.SayHello").unwrap();
        assert_eq!(path.as_str(), "/demo.Greeter/SayHello");
    }

    #[test]
    fn path_requires_a_package() {
        assert!(matches!(
            http_path("SayHello"),
            Err(InvokeError::MethodName(_))
        ));
    }

    #[test]
    fn headers_become_metadata() {
        let headers = Headers::from([
            ("authorization".to_string(), "Bearer token".to_string()),
            ("x-trace".to_string(), "abc".to_string()),
        ]);

        let request = build_request((), &headers).unwrap();

        assert_eq!(
            request.metadata().get("authorization").unwrap(),
            "Bearer token"
        );
        assert_eq!(request.metadata().get("x-trace").unwrap(), "abc");
    }

    #[test]
    fn invalid_header_names_are_rejected() {
        let headers = Headers::from([("bad header".to_string(), "value".to_string())]);

        assert!(matches!(
            build_request((), &headers),
            Err(InvokeError::InvalidMetadataKey { key, .. }) if key == "bad header"
        ));
    }
}
