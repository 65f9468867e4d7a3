//! # Demo Service
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide gRPC server implementations
//! and the `.proto` sources they were generated from, for integration testing `protoshell`.
//! It is not intended for production use.

pub mod pb {
    pub mod demo {
        include!(concat!(env!("OUT_DIR"), "/demo.rs"));

        pub mod types {
            include!(concat!(env!("OUT_DIR"), "/demo.types.rs"));
        }
    }
}

pub use pb::demo::farewell_server::{Farewell, FarewellServer};
pub use pb::demo::greeter_server::{Greeter, GreeterServer};

/// Directory holding the `.proto` sources of the demo services.
pub const PROTO_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/proto");

/// Absolute path to `demo.proto`, which declares the `demo` package services.
pub const DEMO_PROTO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/proto/demo.proto");

/// Absolute path to `types.proto`, a service-less package imported by `demo.proto`.
pub const TYPES_PROTO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/proto/types.proto");
