//! # Protoshell Core
//!
//! `protoshell-core` is the foundational library powering the Protoshell REPL. It loads
//! `.proto` sources at runtime and talks to any gRPC server without compile-time knowledge
//! of its schema.
//!
//! ## Key Components
//!
//! * **[`index::SchemaIndex`]:** Packages, services, methods and messages of the loaded
//!   `.proto` files, answering the name lookups the session relies on.
//! * **[`dynamic::DynamicPayload`]:** A schema-driven message value. Requests are decoded
//!   into it from JSON and responses are decoded into it from the wire.
//! * **[`resolver::MethodName`]:** Conversion between fully qualified method names and
//!   gRPC wire paths (`/package.Service/Method`).
//! * **[`tls::ChannelCredentials`]:** Transport security setup from certificate files.
//! * **[`grpc::Invoker`]:** Opens a connection per call and performs a unary request.
//! * **[`session::Session`]:** The command language of the interactive shell and the
//!   addressing context it mutates.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost-reflect` and `tonic` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod dynamic;
pub mod grpc;
pub mod index;
pub mod resolver;
pub mod session;
pub mod tls;

// Re-exports
pub use prost_reflect;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
