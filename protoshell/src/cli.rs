//! # CLI
//!
//! This module defines the command-line interface of `protoshell` using `clap`.
//!
//! The flags select the schema to load, the default addressing context of the session and
//! the transport security settings. `--desc` and `--json` turn the shell into a one-shot
//! command.
use clap::{ArgGroup, Parser, ValueEnum};
use protoshell_core::session::{DEFAULT_HOST, DEFAULT_PORT, SessionContext};
use protoshell_core::tls::TlsOptions;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "protoshell", version, about = "Interactive gRPC shell")]
#[command(group(ArgGroup::new("schema").required(true).args(["file", "file_descriptor_set"])))]
pub struct Cli {
    /// Proto files to load (repeatable or comma separated)
    #[arg(long, value_delimiter = ',')]
    pub file: Vec<PathBuf>,

    /// Directories searched for the proto files and their imports.
    /// Defaults to the directories of the files themselves
    #[arg(long, value_delimiter = ',')]
    pub path: Vec<PathBuf>,

    /// Load a compiled descriptor set (.bin) instead of proto files
    #[arg(long)]
    pub file_descriptor_set: Option<PathBuf>,

    /// Default package
    #[arg(long)]
    pub package: Option<String>,

    /// Default service
    #[arg(long)]
    pub service: Option<String>,

    /// Default method, used by `--desc rpc` and `--json`
    #[arg(long)]
    pub method: Option<String>,

    /// gRPC server host
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// gRPC server port
    #[arg(long, default_value = DEFAULT_PORT)]
    pub port: String,

    /// Use a secure TLS connection
    #[arg(long)]
    pub tls: bool,

    /// The CA certificate file for verifying the server
    #[arg(long)]
    pub cacert: Option<PathBuf>,

    /// The certificate file for mutual TLS auth. It must be provided with --certkey
    #[arg(long, requires = "certkey")]
    pub cert: Option<PathBuf>,

    /// The private key file for mutual TLS auth. It must be provided with --cert
    #[arg(long, requires = "cert")]
    pub certkey: Option<PathBuf>,

    /// Override the server name used to verify the hostname (ignored if --tls is disabled)
    #[arg(long)]
    pub servername: Option<String>,

    /// Describe the default package, service or method and exit
    #[arg(long, value_enum)]
    pub desc: Option<Describe>,

    /// Call the default method with this JSON body and exit
    #[arg(long, conflicts_with = "desc", requires = "method")]
    pub json: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Describe {
    /// List the loaded packages
    Pkg,
    /// List the services of the default package
    Svc,
    /// Show the default method and its messages
    Rpc,
}

impl Cli {
    pub fn tls_options(&self) -> TlsOptions {
        TlsOptions {
            enabled: self.tls,
            ca_cert: self.cacert.clone(),
            cert: self.cert.clone(),
            cert_key: self.certkey.clone(),
            server_name: self.servername.clone(),
        }
    }

    pub fn import_paths(&self) -> Vec<PathBuf> {
        if !self.path.is_empty() {
            return self.path.clone();
        }

        let mut paths: Vec<PathBuf> = Vec::new();
        for file in &self.file {
            let dir = match file.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
                _ => PathBuf::from("."),
            };
            if !paths.contains(&dir) {
                paths.push(dir);
            }
        }
        paths
    }

    pub fn session_context(&self) -> SessionContext {
        SessionContext {
            package: non_empty(&self.package),
            service: non_empty(&self.service),
            host: self.host.clone(),
            port: self.port.clone(),
            ..Default::default()
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["protoshell", "--file", "a.proto"]).unwrap();

        assert_eq!(cli.file, vec![PathBuf::from("a.proto")]);
        assert_eq!(cli.import_paths(), vec![PathBuf::from(".")]);
        assert_eq!(cli.host, "localhost");
        assert_eq!(cli.port, "50051");
        assert!(!cli.tls);
        assert_eq!(cli.desc, None);

        let context = cli.session_context();
        assert_eq!(context.address(), "localhost:50051");
        assert_eq!(context.package, None);
    }

    #[test]
    fn lists_accept_commas_and_repetition() {
        let cli = Cli::try_parse_from([
            "protoshell",
            "--file",
            "a.proto,b.proto",
            "--file",
            "c.proto",
            "--path",
            "protos,vendor",
        ])
        .unwrap();

        assert_eq!(cli.file.len(), 3);
        assert_eq!(
            cli.path,
            vec![PathBuf::from("protos"), PathBuf::from("vendor")]
        );
    }

    #[test]
    fn a_schema_source_is_required() {
        assert!(Cli::try_parse_from(["protoshell"]).is_err());
        assert!(
            Cli::try_parse_from([
                "protoshell",
                "--file",
                "a.proto",
                "--file-descriptor-set",
                "set.bin"
            ])
            .is_err()
        );
    }

    #[test]
    fn import_paths_default_to_file_directories() {
        let cli = Cli::try_parse_from([
            "protoshell",
            "--file",
            "protos/a.proto,protos/b.proto,other/c.proto",
        ])
        .unwrap();

        assert_eq!(
            cli.import_paths(),
            vec![PathBuf::from("protos"), PathBuf::from("other")]
        );
    }

    #[test]
    fn json_needs_a_method() {
        assert!(Cli::try_parse_from(["protoshell", "--file", "a.proto", "--json", "{}"]).is_err());
        assert!(
            Cli::try_parse_from([
                "protoshell",
                "--file",
                "a.proto",
                "--method",
                "SayHello",
                "--json",
                "{}"
            ])
            .is_ok()
        );
    }

    #[test]
    fn describe_modes() {
        let cli = Cli::try_parse_from(["protoshell", "--file", "a.proto", "--desc", "rpc"]).unwrap();
        assert_eq!(cli.desc, Some(Describe::Rpc));

        assert!(Cli::try_parse_from(["protoshell", "--file", "a.proto", "--desc", "msg"]).is_err());
    }

    #[test]
    fn client_certificate_needs_a_key() {
        assert!(
            Cli::try_parse_from(["protoshell", "--file", "a.proto", "--tls", "--cert", "c.pem"])
                .is_err()
        );
    }

    #[test]
    fn tls_options_follow_flags() {
        let cli = Cli::try_parse_from([
            "protoshell",
            "--file",
            "a.proto",
            "--tls",
            "--cacert",
            "ca.pem",
            "--servername",
            "api.internal",
        ])
        .unwrap();

        let options = cli.tls_options();
        assert!(options.enabled);
        assert_eq!(options.ca_cert, Some(PathBuf::from("ca.pem")));
        assert_eq!(options.server_name.as_deref(), Some("api.internal"));
        assert_eq!(options.cert, None);
    }
}
