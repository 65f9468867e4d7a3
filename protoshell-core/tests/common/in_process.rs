use super::greeter_service_impl::{FarewellImpl, GreeterImpl};
use demo_service::{FarewellServer, GreeterServer};
use protoshell_core::grpc::connection::{ConnectError, Connector};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use tonic::body::Body;
use tonic::server::NamedService;
use tower::Service;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Serves the demo services without a socket.
///
/// Connections are counted, and the first `unready` of them refuse every request.
#[derive(Default)]
pub struct InProcessConnector {
    connects: AtomicUsize,
    unready: usize,
}

impl InProcessConnector {
    pub fn failing_first(unready: usize) -> Self {
        Self {
            connects: AtomicUsize::new(0),
            unready,
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Connector for InProcessConnector {
    type Service = DemoServices;

    async fn connect(&self, _address: &str) -> Result<DemoServices, ConnectError> {
        let attempt = self.connects.fetch_add(1, Ordering::SeqCst);

        Ok(DemoServices {
            ready: attempt >= self.unready,
            greeter: GreeterServer::new(GreeterImpl),
            farewell: FarewellServer::new(FarewellImpl),
        })
    }
}

/// Routes requests to the demo service they are addressed to.
#[derive(Clone)]
pub struct DemoServices {
    ready: bool,
    greeter: GreeterServer<GreeterImpl>,
    farewell: FarewellServer<FarewellImpl>,
}

impl Service<http::Request<Body>> for DemoServices {
    type Response = http::Response<Body>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        if self.ready {
            Poll::Ready(Ok(()))
        } else {
            Poll::Ready(Err("connection is in transient failure".into()))
        }
    }

    fn call(&mut self, request: http::Request<Body>) -> Self::Future {
        let farewell_prefix = format!("/{}/", FarewellServer::<FarewellImpl>::NAME);

        if request.uri().path().starts_with(&farewell_prefix) {
            let call = self.farewell.call(request);
            Box::pin(async move { call.await.map_err(Into::into) })
        } else {
            let call = self.greeter.call(request);
            Box::pin(async move { call.await.map_err(Into::into) })
        }
    }
}
