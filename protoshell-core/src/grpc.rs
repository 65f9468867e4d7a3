//! # Invocation Engine
//!
//! Sends a dynamic request to a remote method and returns the dynamic response.
//!
//! * [`connection`]: opens transports through a [`Connector`].
//! * [`client`]: the generic client performing the unary call.
//! * [`codec`]: moves [`DynamicPayload`]s on and off the wire.
//!
//! A fresh connection is opened for every call. When the new connection refuses the
//! request, it is replaced once before giving up, so a server that restarted between two
//! calls does not fail the next one.
pub mod client;
pub mod codec;
pub mod connection;

use crate::BoxError;
use crate::dynamic::DynamicPayload;
use crate::index::Rpc;
use client::{GrpcClient, InvokeError};
use connection::Connector;
use http_body::Body as HttpBody;
use std::collections::BTreeMap;
use tonic::client::GrpcService;
use tracing::{debug, warn};

/// Request metadata. Keys are unique, later values replace earlier ones.
pub type Headers = BTreeMap<String, String>;

/// Performs unary calls through the connections opened by `C`.
#[derive(Debug, Clone)]
pub struct Invoker<C> {
    connector: C,
}

impl<C> Invoker<C>
where
    C: Connector,
    C::Service: GrpcService<tonic::body::Body>,
    <C::Service as GrpcService<tonic::body::Body>>::Error: Into<BoxError>,
    <C::Service as GrpcService<tonic::body::Body>>::ResponseBody:
        HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <<C::Service as GrpcService<tonic::body::Body>>::ResponseBody as HttpBody>::Error:
        Into<BoxError> + Send,
{
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Calls `rpc` on the server at `address`.
    ///
    /// Streaming methods are rejected before any connection is opened.
    pub async fn invoke(
        &self,
        address: &str,
        rpc: &Rpc,
        headers: &Headers,
        request: DynamicPayload,
    ) -> Result<DynamicPayload, InvokeError> {
        if rpc.is_streaming() {
            return Err(InvokeError::StreamingUnsupported(rpc.full_name.clone()));
        }

        debug!(address, method = %rpc.full_name, headers = headers.len(), "invoking");

        let mut client = GrpcClient::new(self.connector.connect(address).await?);

        if let Err(error) = client.ready().await {
            warn!(address, %error, "connection not ready, reconnecting");
            client = GrpcClient::new(self.connector.connect(address).await?);
        }

        client.unary(rpc, request, headers).await
    }
}
