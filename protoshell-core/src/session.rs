//! # Interactive Session
//!
//! The command language of the shell. A [`Session`] owns the addressing context
//! (current package, current service, headers and server address) and turns each input
//! line into a [`Reply`] for the front-end to render.
//!
//! ```text
//! info
//! package [name]
//! service [name]
//! set host <value>
//! set port <value>
//! set header <name> <value...>
//! call <method> <json...>
//! ```
//!
//! Any other line is ignored. Failures are returned inside the [`Reply`] so that a
//! single bad command never ends the session.
use crate::BoxError;
use crate::dynamic::{DynamicPayload, PayloadError};
use crate::grpc::client::InvokeError;
use crate::grpc::connection::Connector;
use crate::grpc::{Headers, Invoker};
use crate::index::{LookupError, SchemaIndex};
use http_body::Body as HttpBody;
use tonic::client::GrpcService;
use tracing::debug;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: &str = "50051";

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown package name \"{0}\"")]
    UnknownPackage(String),
    #[error("unknown service name \"{0}\"")]
    UnknownService(String),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("failed to get RPC: {0}")]
    Resolve(#[source] LookupError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error("failed to request RPC service: {0}")]
    Invoke(#[from] InvokeError),
}

/// The addressing context steering name resolution and calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub package: Option<String>,
    pub service: Option<String>,
    pub headers: Headers,
    pub host: String,
    pub port: String,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            package: None,
            service: None,
            headers: Headers::new(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT.to_string(),
        }
    }
}

impl SessionContext {
    /// `host:port`, or just the host when no port is set.
    pub fn address(&self) -> String {
        if self.port.is_empty() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    fn package_name(&self) -> &str {
        self.package.as_deref().unwrap_or_default()
    }

    fn service_name(&self) -> &str {
        self.service.as_deref().unwrap_or_default()
    }
}

/// A parsed input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Info,
    Package(Option<&'a str>),
    Service(Option<&'a str>),
    Set(Setting<'a>),
    Call { method: &'a str, body: &'a str },
    Noop,
}

/// The target of a `set` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting<'a> {
    Host(&'a str),
    Port(&'a str),
    Header { name: &'a str, value: &'a str },
    /// A `set` that changes nothing but still reports the context.
    Unchanged,
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let (keyword, rest) = next_token(line);

        match keyword {
            "info" => Command::Info,
            "package" => Command::Package(first_token(rest)),
            "service" => Command::Service(first_token(rest)),
            "set" => parse_set(rest),
            "call" => match next_token(rest) {
                (method, body) if !method.is_empty() && !body.is_empty() => {
                    Command::Call { method, body }
                }
                _ => Command::Noop,
            },
            _ => Command::Noop,
        }
    }
}

fn parse_set(args: &str) -> Command<'_> {
    let (target, rest) = next_token(args);
    let (value, tail) = next_token(rest);

    if value.is_empty() {
        return Command::Noop;
    }

    let setting = match target {
        "host" => Setting::Host(value),
        "port" => Setting::Port(value),
        "header" if !tail.is_empty() => Setting::Header { name: value, value: tail },
        _ => Setting::Unchanged,
    };

    Command::Set(setting)
}

/// Splits off the first whitespace-delimited token. The remainder keeps its inner spacing.
fn next_token(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim_start()),
        None => (input, ""),
    }
}

fn first_token(input: &str) -> Option<&str> {
    Some(next_token(input).0).filter(|token| !token.is_empty())
}

/// What a command produced, for the front-end to render.
#[derive(Debug)]
pub enum Reply {
    /// The line was not a command, or lacked the arguments it needs.
    Nothing,
    Info {
        address: String,
        headers: Headers,
    },
    /// The current package, when asked for.
    Package(Option<String>),
    /// A new package was selected. Completion data and prompt should be refreshed.
    PackageSelected(String),
    /// The current service, when asked for.
    Service(Option<String>),
    /// A new service was selected. Completion data and prompt should be refreshed.
    ServiceSelected(String),
    /// The request was decoded and sent, `response` holds the outcome.
    Call {
        request: DynamicPayload,
        response: Result<DynamicPayload, CommandError>,
    },
    Error(CommandError),
}

pub struct Session<C> {
    index: SchemaIndex,
    invoker: Invoker<C>,
    context: SessionContext,
}

impl<C> Session<C>
where
    C: Connector,
    C::Service: GrpcService<tonic::body::Body>,
    <C::Service as GrpcService<tonic::body::Body>>::Error: Into<BoxError>,
    <C::Service as GrpcService<tonic::body::Body>>::ResponseBody:
        HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <<C::Service as GrpcService<tonic::body::Body>>::ResponseBody as HttpBody>::Error:
        Into<BoxError> + Send,
{
    pub fn new(index: SchemaIndex, invoker: Invoker<C>, context: SessionContext) -> Self {
        Self {
            index,
            invoker,
            context,
        }
    }

    pub fn index(&self) -> &SchemaIndex {
        &self.index
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn invoker(&self) -> &Invoker<C> {
        &self.invoker
    }

    /// Runs one input line against the session.
    pub async fn execute(&mut self, line: &str) -> Reply {
        match Command::parse(line) {
            Command::Info => self.info(),
            Command::Package(None) => Reply::Package(self.context.package.clone()),
            Command::Package(Some(name)) => self.select_package(name),
            Command::Service(None) => Reply::Service(self.context.service.clone()),
            Command::Service(Some(name)) => self.select_service(name),
            Command::Set(setting) => self.set(setting),
            Command::Call { method, body } => self.call(method, body).await,
            Command::Noop => Reply::Nothing,
        }
    }

    fn info(&self) -> Reply {
        Reply::Info {
            address: self.context.address(),
            headers: self.context.headers.clone(),
        }
    }

    fn select_package(&mut self, name: &str) -> Reply {
        if !self.index.package_names().iter().any(|package| package == name) {
            return Reply::Error(CommandError::UnknownPackage(name.to_string()));
        }

        self.context.package = Some(name.to_string());
        Reply::PackageSelected(name.to_string())
    }

    fn select_service(&mut self, name: &str) -> Reply {
        let services = match self.index.service_names(self.context.package_name()) {
            Ok(services) => services,
            Err(e) => return Reply::Error(e.into()),
        };

        if !services.iter().any(|service| service == name) {
            return Reply::Error(CommandError::UnknownService(name.to_string()));
        }

        self.context.service = Some(name.to_string());
        Reply::ServiceSelected(name.to_string())
    }

    fn set(&mut self, setting: Setting<'_>) -> Reply {
        match setting {
            Setting::Host(host) => self.context.host = host.to_string(),
            Setting::Port(port) => self.context.port = port.to_string(),
            Setting::Header { name, value } => {
                // Metadata keys are case-insensitive on the wire.
                self.context
                    .headers
                    .insert(name.to_ascii_lowercase(), value.to_string());
            }
            Setting::Unchanged => {}
        }

        self.info()
    }

    async fn call(&self, method: &str, body: &str) -> Reply {
        let rpc = match self.index.method(
            self.context.package_name(),
            self.context.service_name(),
            method,
        ) {
            Ok(rpc) => rpc,
            Err(e) => return Reply::Error(CommandError::Resolve(e)),
        };

        let mut request = rpc.request.new_instance();
        if let Err(e) = request.decode_from(body) {
            return Reply::Error(e.into());
        }

        debug!(method = %rpc.full_name, "dispatching call");

        let response = self
            .invoker
            .invoke(
                &self.context.address(),
                &rpc,
                &self.context.headers,
                request.clone(),
            )
            .await
            .map_err(CommandError::from);

        Reply::Call { request, response }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_without_arguments() {
        assert_eq!(Command::parse("info"), Command::Info);
        assert_eq!(Command::parse("package"), Command::Package(None));
        assert_eq!(Command::parse("  service  "), Command::Service(None));
    }

    #[test]
    fn selections_take_the_first_argument() {
        assert_eq!(Command::parse("package demo"), Command::Package(Some("demo")));
        assert_eq!(
            Command::parse("service Greeter extra"),
            Command::Service(Some("Greeter"))
        );
    }

    #[test]
    fn unknown_and_empty_lines_are_ignored() {
        assert_eq!(Command::parse(""), Command::Noop);
        assert_eq!(Command::parse("   "), Command::Noop);
        assert_eq!(Command::parse("exit"), Command::Noop);
        assert_eq!(Command::parse("Info"), Command::Noop);
    }

    #[test]
    fn set_needs_a_value() {
        assert_eq!(Command::parse("set"), Command::Noop);
        assert_eq!(Command::parse("set host"), Command::Noop);
        assert_eq!(
            Command::parse("set host example.com"),
            Command::Set(Setting::Host("example.com"))
        );
        assert_eq!(
            Command::parse("set port 8080"),
            Command::Set(Setting::Port("8080"))
        );
    }

    #[test]
    fn set_header_joins_the_value() {
        assert_eq!(
            Command::parse("set header authorization Bearer abc"),
            Command::Set(Setting::Header {
                name: "authorization",
                value: "Bearer abc"
            })
        );
    }

    #[test]
    fn incomplete_or_unknown_settings_change_nothing() {
        assert_eq!(
            Command::parse("set header authorization"),
            Command::Set(Setting::Unchanged)
        );
        assert_eq!(
            Command::parse("set timeout 10"),
            Command::Set(Setting::Unchanged)
        );
    }

    #[test]
    fn call_keeps_the_body_verbatim() {
        assert_eq!(
            Command::parse(r#"call SayHello {"name": "Ann  Lee"}"#),
            Command::Call {
                method: "SayHello",
                body: r#"{"name": "Ann  Lee"}"#
            }
        );
    }

    #[test]
    fn call_needs_a_body() {
        assert_eq!(Command::parse("call"), Command::Noop);
        assert_eq!(Command::parse("call SayHello"), Command::Noop);
    }

    #[test]
    fn address_joins_host_and_port() {
        let context = SessionContext::default();
        assert_eq!(context.address(), "localhost:50051");

        let context = SessionContext {
            port: String::new(),
            ..context
        };
        assert_eq!(context.address(), "localhost");
    }
}
