//! # Schema Index
//!
//! This module turns a set of `.proto` files into a queryable model of the packages,
//! services, methods and message types they declare.
//!
//! Files are compiled with `protox`, a pure Rust implementation of the Protobuf compiler,
//! into a `prost_reflect::DescriptorPool`. Imports are resolved against the given include
//! paths and become part of the pool, but only the explicitly requested files are indexed.
//!
//! ## Lookups
//!
//! Lookups always validate from the outside in: the package is checked before the
//! service, and the service before the method, so the caller gets the most specific
//! [`LookupError`] that applies.
use crate::dynamic::TypeRef;
use prost_reflect::{DescriptorPool, MessageDescriptor, MethodDescriptor, ServiceDescriptor};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::debug;

/// Errors that can occur while building the index.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to parse proto files: '{0}'")]
    Parse(#[from] protox::Error),
    #[error("failed to decode file descriptor set: '{0}'")]
    Decode(#[from] prost_reflect::DescriptorError),
    #[error("no proto files were provided")]
    Empty,
    #[error("file '{0}' is missing from the descriptor pool")]
    MissingFile(String),
}

/// Errors that can occur when looking up a name in the index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("package is an empty string")]
    PackageEmpty,
    #[error("unknown package name \"{0}\"")]
    PackageUnknown(String),
    #[error("service is an empty string")]
    ServiceEmpty,
    #[error("unknown service name \"{0}\"")]
    ServiceUnknown(String),
    #[error("unknown RPC name \"{0}\"")]
    RpcUnknown(String),
}

/// Public view of a method declared in the schema.
#[derive(Debug, Clone)]
pub struct Rpc {
    pub name: String,
    pub full_name: String,
    pub request: TypeRef,
    pub response: TypeRef,
    pub server_streaming: bool,
    pub client_streaming: bool,
}

impl Rpc {
    pub fn is_streaming(&self) -> bool {
        self.server_streaming || self.client_streaming
    }
}

impl From<&MethodDescriptor> for Rpc {
    fn from(method: &MethodDescriptor) -> Self {
        Self {
            name: method.name().to_string(),
            full_name: method.full_name().to_string(),
            request: TypeRef::new(method.input()),
            response: TypeRef::new(method.output()),
            server_streaming: method.is_server_streaming(),
            client_streaming: method.is_client_streaming(),
        }
    }
}

/// The in-memory model of the loaded schema.
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    pool: DescriptorPool,
    packages: BTreeSet<String>,
    // key: package name, val: services declared in the package.
    services: HashMap<String, Vec<ServiceDescriptor>>,
    // key: fully qualified service name, val: methods declared in the service.
    methods: HashMap<String, Vec<MethodDescriptor>>,
    // key: fully qualified message name, val: the message descriptor.
    messages: HashMap<String, MessageDescriptor>,
}

impl SchemaIndex {
    /// Compiles `.proto` files and indexes them.
    ///
    /// # Arguments
    ///
    /// * `files` - The files to load. Relative paths are resolved against `import_paths`.
    /// * `import_paths` - Directories searched for the files and their imports.
    pub fn from_proto_files<F, I>(files: &[F], import_paths: &[I]) -> Result<Self, SchemaError>
    where
        F: AsRef<Path>,
        I: AsRef<Path>,
    {
        if files.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut compiler = protox::Compiler::new(import_paths)?;
        compiler.include_imports(false);
        compiler.open_files(files)?;

        let requested: Vec<String> = compiler
            .file_descriptor_set()
            .file
            .iter()
            .map(|file| file.name().to_string())
            .collect();

        Self::build(compiler.descriptor_pool(), &requested)
    }

    /// Indexes every file of an encoded `FileDescriptorSet`.
    pub fn from_descriptor_set(bytes: &[u8]) -> Result<Self, SchemaError> {
        let pool = DescriptorPool::decode(bytes)?;

        let files: Vec<String> = pool.files().map(|file| file.name().to_string()).collect();

        Self::build(pool, &files)
    }

    /// Indexes the given files of a descriptor pool.
    pub fn build(pool: DescriptorPool, files: &[String]) -> Result<Self, SchemaError> {
        if files.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut packages = BTreeSet::new();
        let mut services: HashMap<String, Vec<ServiceDescriptor>> = HashMap::new();
        let mut methods: HashMap<String, Vec<MethodDescriptor>> = HashMap::new();
        let mut messages = HashMap::new();

        for name in files {
            let file = pool
                .get_file_by_name(name)
                .ok_or_else(|| SchemaError::MissingFile(name.clone()))?;

            let package = file.package_name().to_string();
            packages.insert(package.clone());

            let package_services = services.entry(package).or_default();
            for service in file.services() {
                methods
                    .entry(service.full_name().to_string())
                    .or_default()
                    .extend(service.methods());
                package_services.push(service);
            }

            for message in file.messages() {
                messages.insert(message.full_name().to_string(), message);
            }
        }

        debug!(
            files = files.len(),
            packages = packages.len(),
            services = methods.len(),
            messages = messages.len(),
            "schema index built"
        );

        Ok(Self {
            pool,
            packages,
            services,
            methods,
            messages,
        })
    }

    /// The descriptor pool backing the index, including resolved imports.
    pub fn descriptor_pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// Names of every indexed package, sorted.
    pub fn package_names(&self) -> Vec<String> {
        self.packages.iter().cloned().collect()
    }

    /// Short names of the services declared in `package`, in declaration order.
    pub fn service_names(&self, package: &str) -> Result<Vec<String>, LookupError> {
        Ok(self
            .services_of(package)?
            .iter()
            .map(|service| service.name().to_string())
            .collect())
    }

    /// Methods of `package.service`, in declaration order.
    pub fn methods(&self, package: &str, service: &str) -> Result<Vec<Rpc>, LookupError> {
        Ok(self
            .methods_of(package, service)?
            .iter()
            .map(Rpc::from)
            .collect())
    }

    /// The method called `name` in `package.service`. Names are matched exactly.
    pub fn method(&self, package: &str, service: &str, name: &str) -> Result<Rpc, LookupError> {
        self.methods_of(package, service)?
            .iter()
            .find(|method| method.name() == name)
            .map(Rpc::from)
            .ok_or_else(|| LookupError::RpcUnknown(name.to_string()))
    }

    /// A top-level message declared in one of the indexed files.
    pub fn message(&self, full_name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(full_name)
    }

    fn services_of(&self, package: &str) -> Result<&[ServiceDescriptor], LookupError> {
        if package.is_empty() {
            return Err(LookupError::PackageEmpty);
        }

        self.services
            .get(package)
            .map(Vec::as_slice)
            .ok_or_else(|| LookupError::PackageUnknown(package.to_string()))
    }

    fn methods_of(&self, package: &str, service: &str) -> Result<&[MethodDescriptor], LookupError> {
        // Check whether the package is valid before looking at the service.
        self.services_of(package)?;

        if service.is_empty() {
            return Err(LookupError::ServiceEmpty);
        }

        self.methods
            .get(&format!("{package}.{service}"))
            .map(Vec::as_slice)
            .ok_or_else(|| LookupError::ServiceUnknown(service.to_string()))
    }
}
