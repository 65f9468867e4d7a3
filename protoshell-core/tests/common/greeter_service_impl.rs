use demo_service::pb::demo::{GoodbyeReply, GoodbyeRequest, HelloReply, HelloRequest};
use demo_service::pb::demo::types::Mood;
use demo_service::{Farewell, Greeter};
use std::collections::HashMap;
use tokio_stream::wrappers::ReceiverStream;
use tonic::metadata::KeyAndValueRef;
use tonic::{Request, Response, Status};

pub struct GreeterImpl;

#[tonic::async_trait]
impl Greeter for GreeterImpl {
    type SayHelloStreamStream = ReceiverStream<Result<HelloReply, Status>>;

    async fn say_hello(
        &self,
        request: Request<HelloRequest>,
    ) -> Result<Response<HelloReply>, Status> {
        // Echo back the custom headers so tests can see what was sent.
        let metadata: HashMap<String, String> = request
            .metadata()
            .iter()
            .filter_map(|entry| match entry {
                KeyAndValueRef::Ascii(key, value) if key.as_str().starts_with("x-") => Some((
                    key.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )),
                _ => None,
            })
            .collect();

        let req = request.into_inner();
        if req.name.is_empty() {
            return Err(Status::invalid_argument("name is required"));
        }

        let greeting = format!("Hello, {}!", req.name);
        let message = vec![greeting; req.times.max(1) as usize].join(" ");

        Ok(Response::new(HelloReply { message, metadata }))
    }

    async fn say_hello_stream(
        &self,
        _request: Request<HelloRequest>,
    ) -> Result<Response<Self::SayHelloStreamStream>, Status> {
        Err(Status::unimplemented("streaming is not served by this fixture"))
    }
}

pub struct FarewellImpl;

#[tonic::async_trait]
impl Farewell for FarewellImpl {
    async fn say_goodbye(
        &self,
        request: Request<GoodbyeRequest>,
    ) -> Result<Response<GoodbyeReply>, Status> {
        let req = request.into_inner();
        let name = req.person.map(|p| p.name).unwrap_or_default();

        let message = match Mood::try_from(req.mood) {
            Ok(Mood::Grumpy) => format!("Good riddance, {name}."),
            _ => format!("Goodbye, {name}!"),
        };

        Ok(Response::new(GoodbyeReply { message }))
    }
}
