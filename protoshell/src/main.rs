//! # Protoshell CLI Entry Point
//!
//! The main executable for the Protoshell tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs logging.
//! 2. **Schema**: Loads the `.proto` files (or a descriptor set) into a `SchemaIndex`.
//! 3. **Execution**: Describes the schema, performs a one-shot call, or starts the REPL.
//! 4. **Presentation**: Formats and prints the resulting data or error to standard output/error.

mod cli;
mod describe;
mod formatter;
mod repl;

use clap::Parser;
use cli::Cli;
use formatter::{FormattedString, GenericError};
use protoshell_core::grpc::Invoker;
use protoshell_core::grpc::connection::ChannelConnector;
use protoshell_core::index::SchemaIndex;
use protoshell_core::session::{Reply, Session};
use protoshell_core::tls::ChannelCredentials;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Cli::parse();

    init_tracing();

    let index = load_index_or_exit(&args);

    if let Some(mode) = args.desc {
        describe_or_exit(&index, mode, &args);
        return;
    }

    let credentials = match ChannelCredentials::build(&args.tls_options()) {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("{}", FormattedString::from(e));
            process::exit(1);
        }
    };

    let session = Session::new(
        index,
        Invoker::new(ChannelConnector::new(credentials)),
        args.session_context(),
    );

    match args.json {
        Some(body) => {
            let method = args.method.unwrap_or_default();
            run_call(session, &method, &body).await;
        }
        None => {
            if let Err(e) = repl::run(session).await {
                eprintln!("{}", FormattedString::from(GenericError("REPL Failed", e)));
                process::exit(1);
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn load_index_or_exit(args: &Cli) -> SchemaIndex {
    let index = match &args.file_descriptor_set {
        Some(path) => match std::fs::read(path) {
            Ok(bytes) => SchemaIndex::from_descriptor_set(&bytes),
            Err(e) => {
                eprintln!("{}", FormattedString::from(e));
                process::exit(1);
            }
        },
        None => SchemaIndex::from_proto_files(&args.file, &args.import_paths()),
    };

    match index {
        Ok(index) => index,
        Err(e) => {
            eprintln!("{}", FormattedString::from(e));
            process::exit(1);
        }
    }
}

fn describe_or_exit(index: &SchemaIndex, mode: cli::Describe, args: &Cli) {
    let package = args.package.as_deref().unwrap_or_default();
    let service = args.service.as_deref().unwrap_or_default();
    let method = args.method.as_deref().unwrap_or_default();

    match describe::describe(index, mode, package, service, method) {
        Ok(descriptions) => {
            for description in descriptions {
                println!("{description}");
            }
        }
        Err(e) => {
            eprintln!("{}", FormattedString::from(e));
            process::exit(1);
        }
    }
}

async fn run_call(mut session: Session<ChannelConnector>, method: &str, body: &str) {
    let reply = session.execute(&format!("call {method} {body}")).await;

    let failed = match &reply {
        Reply::Call { response, .. } => response.is_err(),
        Reply::Error(_) => true,
        _ => false,
    };

    for output in repl::render(reply) {
        print!("{output}");
    }

    if failed {
        process::exit(1);
    }
}
