//! Wire protocol for the cargohold file server: frame codec and packet
//! serializer.
//!
//! # Architecture
//!
//! - [`packet::Packet`] is the decoded message value.
//! - [`frame`] adds the 4-byte length prefix that delimits one packet on the
//!   byte stream.
//! - [`commands::CommandCode`] is the fixed table of request/response codes.
//! - [`payloads`] holds the JSON bodies carried by each command.
//!
//! This crate has no knowledge of sockets, sessions, or catalogs - it only
//! knows how to turn bytes into a [`packet::Packet`] and back.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
pub mod error;
pub mod frame;
pub mod packet;
pub mod payloads;

pub use commands::CommandCode;
pub use error::ProtocolError;
pub use frame::{decode_frame_body, encode_frame, validate_frame_length};
pub use packet::{MAX_FRAME_BYTES, Packet};
