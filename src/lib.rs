#![doc = include_str!("../README.md")]

mod bytes;
mod error;

pub mod block;
pub mod config;
pub mod flags;
pub mod header;
pub mod reader;

pub use block::{decode_block, Block, Channel, RawHeader};
pub use bytes::Cursor;
pub use config::{Config, FlagFilter, SpeedUnit};
pub use error::{Error, Result};
pub use flags::{decode_flags, Flags};
pub use header::{read_header, Format, Header, HeaderError};
pub use reader::{decode_slice, read_blocks, Blocks, Event, Events, Reader, Sink, Stats};
