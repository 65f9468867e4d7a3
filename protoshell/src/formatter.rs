use colored::*;
use protoshell_core::{
    dynamic::{DynamicPayload, PayloadError},
    grpc::Headers,
    index::{LookupError, Rpc, SchemaError},
    prost_reflect::{EnumDescriptor, Kind, MessageDescriptor},
    session::CommandError,
    tls::CredentialsError,
};
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct PackageList(pub Vec<String>);

pub struct ServiceList(pub Vec<String>);

/// Informational output of the shell, printed in green.
pub struct Notice<T: Display>(pub T);

pub struct SessionInfo<'a> {
    pub address: &'a str,
    pub headers: &'a Headers,
}

pub struct GenericError<T: Display>(pub &'static str, pub T);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.0)
    }
}

impl From<&DynamicPayload> for FormattedString {
    fn from(payload: &DynamicPayload) -> Self {
        match payload.encode_to() {
            Ok(json) => FormattedString(json),
            Err(err) => FormattedString::from(err),
        }
    }
}

impl<T: Display> From<Notice<T>> for FormattedString {
    fn from(Notice(value): Notice<T>) -> Self {
        FormattedString(value.to_string().green().to_string())
    }
}

impl From<SessionInfo<'_>> for FormattedString {
    fn from(info: SessionInfo<'_>) -> Self {
        let mut out = format!("Address: {}\nHeaders:", info.address);

        if info.headers.is_empty() {
            out.push_str(" none");
        }
        for (name, value) in info.headers {
            out.push_str(&format!("\n  {name}: {value}"));
        }

        FormattedString(out.green().to_string())
    }
}

impl From<CommandError> for FormattedString {
    fn from(err: CommandError) -> Self {
        FormattedString(err.to_string().red().to_string())
    }
}

impl From<PayloadError> for FormattedString {
    fn from(err: PayloadError) -> Self {
        FormattedString(err.to_string().red().to_string())
    }
}

impl From<SchemaError> for FormattedString {
    fn from(err: SchemaError) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Failed to load schema:".red().bold(),
            err
        ))
    }
}

impl From<LookupError> for FormattedString {
    fn from(err: LookupError) -> Self {
        FormattedString(format!("{}\n\n'{}'", "Lookup Failed:".red().bold(), err))
    }
}

impl From<CredentialsError> for FormattedString {
    fn from(err: CredentialsError) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Invalid TLS configuration:".red().bold(),
            err
        ))
    }
}

impl From<std::io::Error> for FormattedString {
    fn from(err: std::io::Error) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Failed to read file:".red().bold(),
            err
        ))
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}:\n\n'{}'", msg.red().bold(), err))
    }
}

impl From<PackageList> for FormattedString {
    fn from(PackageList(packages): PackageList) -> Self {
        name_list("Packages:", "No packages found.", packages)
    }
}

impl From<ServiceList> for FormattedString {
    fn from(ServiceList(services): ServiceList) -> Self {
        name_list("Services:", "No services found.", services)
    }
}

fn name_list(title: &str, empty: &str, names: Vec<String>) -> FormattedString {
    if names.is_empty() {
        return FormattedString(empty.yellow().to_string());
    }

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    for name in names {
        out.push_str(&format!("  - {}\n", name.green()));
    }
    FormattedString(out.trim_end().to_string())
}

impl From<&Rpc> for FormattedString {
    fn from(rpc: &Rpc) -> Self {
        let stream = |streaming: bool| {
            if streaming {
                format!("{} ", "stream".cyan())
            } else {
                "".to_string()
            }
        };

        FormattedString(format!(
            "{} {}({}{}) {} ({}{});",
            "rpc".cyan(),
            rpc.name.green(),
            stream(rpc.client_streaming),
            rpc.request.full_name().yellow(),
            "returns".cyan(),
            stream(rpc.server_streaming),
            rpc.response.full_name().yellow()
        ))
    }
}

impl From<&MessageDescriptor> for FormattedString {
    fn from(message: &MessageDescriptor) -> Self {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {} {{\n",
            "message".cyan(),
            message.name().green()
        ));

        for field in message.fields() {
            let label = if field.is_list() {
                format!("{} ", "repeated".cyan())
            } else {
                "".to_string()
            };

            let type_name = if field.is_map() {
                match field.kind() {
                    Kind::Message(entry) => format!(
                        "map<{}, {}>",
                        kind_name(&entry.map_entry_key_field().kind()),
                        kind_name(&entry.map_entry_value_field().kind())
                    ),
                    other => kind_name(&other),
                }
            } else {
                kind_name(&field.kind())
            };

            out.push_str(&format!(
                "  {}{} {} = {};\n",
                label,
                type_name.yellow(),
                field.name(),
                field.number()
            ));
        }
        out.push('}');
        FormattedString(out)
    }
}

impl From<&EnumDescriptor> for FormattedString {
    fn from(enum_desc: &EnumDescriptor) -> Self {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {} {{\n",
            "enum".cyan(),
            enum_desc.name().green()
        ));

        for val in enum_desc.values() {
            out.push_str(&format!(
                "  {} = {};\n",
                val.name(),
                val.number().to_string().purple()
            ));
        }
        out.push('}');

        FormattedString(out)
    }
}

fn kind_name(kind: &Kind) -> String {
    match kind {
        Kind::Double => "double".to_string(),
        Kind::Float => "float".to_string(),
        Kind::Int32 => "int32".to_string(),
        Kind::Int64 => "int64".to_string(),
        Kind::Uint32 => "uint32".to_string(),
        Kind::Uint64 => "uint64".to_string(),
        Kind::Sint32 => "sint32".to_string(),
        Kind::Sint64 => "sint64".to_string(),
        Kind::Fixed32 => "fixed32".to_string(),
        Kind::Fixed64 => "fixed64".to_string(),
        Kind::Sfixed32 => "sfixed32".to_string(),
        Kind::Sfixed64 => "sfixed64".to_string(),
        Kind::Bool => "bool".to_string(),
        Kind::String => "string".to_string(),
        Kind::Bytes => "bytes".to_string(),
        Kind::Message(m) => m.full_name().to_string(),
        Kind::Enum(e) => e.full_name().to_string(),
    }
}
