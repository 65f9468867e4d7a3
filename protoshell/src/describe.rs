//! # Describe Mode
//!
//! One-shot descriptions of the loaded schema, selected with `--desc`.
use crate::cli::Describe;
use crate::formatter::{FormattedString, PackageList, ServiceList};
use protoshell_core::dynamic::TypeRef;
use protoshell_core::index::{LookupError, SchemaIndex};
use protoshell_core::prost_reflect::{EnumDescriptor, Kind, MessageDescriptor};
use std::collections::HashSet;

/// A type reachable from a method, in the order it was first met.
enum Definition {
    Message(MessageDescriptor),
    Enum(EnumDescriptor),
}

pub fn describe(
    index: &SchemaIndex,
    mode: Describe,
    package: &str,
    service: &str,
    method: &str,
) -> Result<Vec<FormattedString>, LookupError> {
    match mode {
        Describe::Pkg => Ok(vec![PackageList(index.package_names()).into()]),
        Describe::Svc => Ok(vec![ServiceList(index.service_names(package)?).into()]),
        Describe::Rpc => {
            let rpc = index.method(package, service, method)?;

            let mut out = vec![FormattedString::from(&rpc)];
            let roots = [root(index, &rpc.request), root(index, &rpc.response)];

            out.extend(
                collect_definitions(&roots)
                    .iter()
                    .map(|definition| match definition {
                        Definition::Message(m) => FormattedString::from(m),
                        Definition::Enum(e) => FormattedString::from(e),
                    }),
            );

            Ok(out)
        }
    }
}

/// Types declared in the loaded files come from the message index, imported ones from the
/// method descriptor itself.
fn root(index: &SchemaIndex, type_ref: &TypeRef) -> MessageDescriptor {
    index
        .message(type_ref.full_name())
        .cloned()
        .unwrap_or_else(|| type_ref.descriptor().clone())
}

fn collect_definitions(roots: &[MessageDescriptor]) -> Vec<Definition> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for message in roots {
        collect_message(message, &mut seen, &mut out);
    }

    out
}

fn collect_message(
    message: &MessageDescriptor,
    seen: &mut HashSet<String>,
    out: &mut Vec<Definition>,
) {
    // Map entries are synthetic, only their value types are worth showing.
    if !message.is_map_entry() {
        if !seen.insert(message.full_name().to_string()) {
            return;
        }
        out.push(Definition::Message(message.clone()));
    }

    for field in message.fields() {
        match field.kind() {
            Kind::Message(m) => collect_message(&m, seen, out),
            Kind::Enum(e) => {
                if seen.insert(e.full_name().to_string()) {
                    out.push(Definition::Enum(e));
                }
            }
            _ => {}
        }
    }
}
