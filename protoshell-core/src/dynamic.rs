//! # Dynamic Payloads
//!
//! There is no generated Rust struct for any message handled by protoshell. Instead, every
//! request and response is a [`DynamicPayload`]: a `prost_reflect::DynamicMessage` bound to
//! the `MessageDescriptor` it was created from, holding its fields by number.
//!
//! * **JSON -> payload**: [`DynamicPayload::decode_from`] validates JSON text against the
//!   message schema using the canonical proto3 JSON mapping.
//! * **payload -> JSON**: [`DynamicPayload::encode_to`] renders the message for display.
//! * **payload <-> wire**: handled by [`crate::grpc::codec::DynamicCodec`].
use prost_reflect::{DynamicMessage, MessageDescriptor, ReflectMessage};

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("failed to unmarshal data '{data}' to {message}: '{source}'")]
    Decode {
        data: String,
        message: String,
        source: serde_json::Error,
    },
    #[error("failed to marshal {message} to JSON: '{source}'")]
    Encode {
        message: String,
        source: serde_json::Error,
    },
}

/// A reference to a message type declared in the schema.
///
/// It is the factory for payloads of that type: each call to [`TypeRef::new_instance`]
/// returns a fresh, independent value.
#[derive(Debug, Clone)]
pub struct TypeRef {
    descriptor: MessageDescriptor,
}

impl TypeRef {
    pub fn new(descriptor: MessageDescriptor) -> Self {
        Self { descriptor }
    }

    /// Short name of the message (e.g. `HelloRequest`).
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Fully qualified name of the message (e.g. `demo.HelloRequest`).
    pub fn full_name(&self) -> &str {
        self.descriptor.full_name()
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    /// Creates an empty payload of this type.
    pub fn new_instance(&self) -> DynamicPayload {
        DynamicPayload::new(self.descriptor.clone())
    }
}

/// A message value whose shape is entirely driven by its descriptor.
#[derive(Debug, Clone)]
pub struct DynamicPayload {
    message: DynamicMessage,
}

impl DynamicPayload {
    /// Creates a payload with every field unset.
    pub fn new(descriptor: MessageDescriptor) -> Self {
        Self {
            message: DynamicMessage::new(descriptor),
        }
    }

    pub fn descriptor(&self) -> MessageDescriptor {
        self.message.descriptor()
    }

    /// Replaces the content of the payload with the JSON object in `data`.
    ///
    /// Unknown fields, mistyped values and trailing input are rejected.
    pub fn decode_from(&mut self, data: &str) -> Result<(), PayloadError> {
        let decode_error = |source| PayloadError::Decode {
            data: data.to_string(),
            message: self.message.descriptor().full_name().to_string(),
            source,
        };

        let mut deserializer = serde_json::Deserializer::from_str(data);
        let message = DynamicMessage::deserialize(self.message.descriptor(), &mut deserializer)
            .map_err(decode_error)?;
        deserializer.end().map_err(decode_error)?;

        self.message = message;
        Ok(())
    }

    /// Renders the payload as indented JSON.
    pub fn encode_to(&self) -> Result<String, PayloadError> {
        serde_json::to_string_pretty(&self.message).map_err(|source| PayloadError::Encode {
            message: self.message.descriptor().full_name().to_string(),
            source,
        })
    }

    /// Converts the payload into a structured JSON value.
    pub fn to_json(&self) -> Result<serde_json::Value, PayloadError> {
        serde_json::to_value(&self.message).map_err(|source| PayloadError::Encode {
            message: self.message.descriptor().full_name().to_string(),
            source,
        })
    }

    pub fn as_message(&self) -> &DynamicMessage {
        &self.message
    }

    pub fn into_message(self) -> DynamicMessage {
        self.message
    }
}

impl From<DynamicMessage> for DynamicPayload {
    fn from(message: DynamicMessage) -> Self {
        Self { message }
    }
}
