//! # Method Resolver
//!
//! Converts between the textual, fully qualified name of a method
//! (`my.package.Service.Method`) and the HTTP/2 path a gRPC call is dispatched on
//! (`/my.package.Service/Method`).
//!
//! The last dot-separated segment is always the method. Everything before it,
//! joined back with dots, is the fully qualified service name. A name needs at
//! least three segments (package, service, method) to be addressable.
use std::fmt;
use std::str::FromStr;

const NAME_DELIMITER: char = '.';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid fully qualified method name '{0}', expected 'package.Service.Method'")]
pub struct InvalidFullyQualifiedName(pub String);

/// A fully qualified method name split into its addressable parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodName {
    service_full_name: String,
    method: String,
}

impl MethodName {
    /// Parses `package.Service.Method`.
    pub fn parse(full_name: &str) -> Result<Self, InvalidFullyQualifiedName> {
        let segments: Vec<&str> = full_name.split(NAME_DELIMITER).collect();

        if segments.len() < 3 {
            return Err(InvalidFullyQualifiedName(full_name.to_string()));
        }

        let (method, service) = segments
            .split_last()
            .ok_or_else(|| InvalidFullyQualifiedName(full_name.to_string()))?;

        Ok(Self {
            service_full_name: service.join("."),
            method: method.to_string(),
        })
    }

    /// The fully qualified service name (e.g. `my.package.Service`).
    pub fn service_full_name(&self) -> &str {
        &self.service_full_name
    }

    /// The package part of the name (e.g. `my.package`).
    pub fn package(&self) -> &str {
        self.service_full_name
            .rsplit_once(NAME_DELIMITER)
            .map(|(package, _)| package)
            .unwrap_or_default()
    }

    /// The short service name (e.g. `Service`).
    pub fn service(&self) -> &str {
        self.service_full_name
            .rsplit_once(NAME_DELIMITER)
            .map(|(_, service)| service)
            .unwrap_or(&self.service_full_name)
    }

    /// The method name (e.g. `Method`).
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The literal path the transport dispatches on: `/<service full name>/<Method>`.
    pub fn wire_path(&self) -> String {
        format!("/{}/{}", self.service_full_name, self.method)
    }
}

impl FromStr for MethodName {
    type Err = InvalidFullyQualifiedName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.service_full_name, self.method)
    }
}

/// Converts a fully qualified method name into its wire path.
pub fn to_wire_method(full_name: &str) -> Result<String, InvalidFullyQualifiedName> {
    MethodName::parse(full_name).map(|name| name.wire_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_path_splits_on_last_segment() {
        assert_eq!(to_wire_method("a.b.C.Method").unwrap(), "/a.b.C/Method");
        assert_eq!(
            to_wire_method("demo.Greeter.SayHello").unwrap(),
            "/demo.Greeter/SayHello"
        );
    }

    #[test]
    fn names_without_package_are_rejected() {
        assert_eq!(
            to_wire_method("Method"),
            Err(InvalidFullyQualifiedName("Method".to_string()))
        );
        assert!(to_wire_method("Greeter.SayHello").is_err());
    }

    #[test]
    fn parts_map_back_to_package_service_and_method() {
        let name: MethodName = "my.package.Service.Method".parse().unwrap();

        assert_eq!(name.package(), "my.package");
        assert_eq!(name.service(), "Service");
        assert_eq!(name.method(), "Method");
        assert_eq!(name.service_full_name(), "my.package.Service");
        assert_eq!(name.to_string(), "my.package.Service.Method");
    }
}
