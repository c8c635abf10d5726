//! The messaging boundary: frame compression, the two-frame wire format,
//! session handshake messages and the retrying messaging client.

mod client;
mod compression;
mod frames;
mod messages;

pub use client::{MessageTransport, MessagingClient};
pub use compression::{BypassCompressor, Compressor, Lz4Compressor};
pub use frames::{MessageFrames, MessageType};
pub use messages::{
    Connect, Connected, DataRequest, DataResponse, Disconnect, Disconnected, Request,
    RequestSerializer, Response, ResponseSerializer,
};
