// src/protocol/mod.rs

//! Client-side implementation of the RESP (REdis Serialization Protocol)
//! wire format: frame decoding, reply conversion, and command encoding.

// Declare the private sub-modules of the `protocol` module.
mod decoder;
mod encode;
mod frame;
mod reply;

// Publicly re-export the primary types from the sub-modules.
pub use decoder::ReplyDecoder;
pub use encode::encode_command;
pub use frame::{RespFrame, RespFrameDecoder};
pub use reply::Reply;
