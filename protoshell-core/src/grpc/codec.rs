//! # Dynamic Protobuf Codec
//!
//! This module implements `tonic::codec::Codec` for [`DynamicPayload`], so `tonic` can move
//! schema-driven messages on and off the wire without generated Rust structs.
//!
//! 1. **Encoder**: writes the fields of the request payload as Protobuf bytes.
//! 2. **Decoder**: merges the bytes read from the wire into an empty payload built from the
//!    response `MessageDescriptor`.
use crate::dynamic::DynamicPayload;
use prost::Message;
use prost_reflect::MessageDescriptor;
use tonic::{
    Status,
    codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder},
};

/// A Codec for messages only known through their descriptors.
///
/// Requests already carry their descriptor, so only the response schema is held here.
pub struct DynamicCodec {
    /// Schema for the output message.
    res_desc: MessageDescriptor,
}

impl DynamicCodec {
    pub fn new(res_desc: MessageDescriptor) -> Self {
        Self { res_desc }
    }
}

impl Codec for DynamicCodec {
    type Encode = DynamicPayload;
    type Decode = DynamicPayload;

    type Encoder = DynamicEncoder;
    type Decoder = DynamicDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        DynamicEncoder
    }

    fn decoder(&mut self) -> Self::Decoder {
        DynamicDecoder(self.res_desc.clone())
    }
}

/// Responsible for encoding a payload into Protobuf bytes.
pub struct DynamicEncoder;

impl Encoder for DynamicEncoder {
    type Item = DynamicPayload;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        item.as_message().encode_raw(dst);
        Ok(())
    }
}

/// Responsible for decoding Protobuf bytes into a payload.
pub struct DynamicDecoder(MessageDescriptor);

impl Decoder for DynamicDecoder {
    type Item = DynamicPayload;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let mut message = DynamicPayload::new(self.0.clone()).into_message();
        message
            .merge(src)
            .map_err(|e| Status::internal(format!("Failed to decode Protobuf bytes: {}", e)))?;

        Ok(Some(message.into()))
    }
}
