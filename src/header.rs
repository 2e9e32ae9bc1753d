use std::fmt::Display;

use crate::bytes::Cursor;
use crate::error::{Error, Result};

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum HeaderError {
    #[error("unknown file format marker {0}")]
    UnknownFormat(u16),
    #[error("need {needed} header bytes, got {available}")]
    Truncated { needed: usize, available: usize },
}

/// Log container format marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Format {
    Slg,
    Sl2,
    Sl3,
}

impl Format {
    fn decode(val: u16) -> std::result::Result<Self, HeaderError> {
        match val {
            1 => Ok(Format::Slg),
            2 => Ok(Format::Sl2),
            3 => Ok(Format::Sl3),
            _ => Err(HeaderError::UnknownFormat(val)),
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Format::Slg => "slg",
            Format::Sl2 => "sl2",
            Format::Sl3 => "sl3",
        };
        write!(f, "{name}")
    }
}

/// Fixed-size file header preceding the first block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    pub format: Format,
    /// Layout version written by the device.
    pub version: u16,
    /// Nominal block size hint. Individual blocks declare their own size.
    pub block_size: u16,
}

impl Header {
    /// Header length in bytes
    pub const LEN: usize = 10;
}

/// Read a [Header] from the start of `cur`, advancing it past the header.
///
/// # Errors
/// [HeaderError::Truncated] if there are fewer than [Header::LEN] bytes, or
/// [HeaderError::UnknownFormat] for an unrecognized format marker.
pub fn read_header(cur: &mut Cursor) -> Result<Header> {
    if cur.left() < Header::LEN {
        return Err(HeaderError::Truncated {
            needed: Header::LEN,
            available: cur.left(),
        }
        .into());
    }
    let mut hdr = cur.slice(Header::LEN)?;
    let format = Format::decode(hdr.read_u16()?).map_err(Error::Header)?;
    let version = hdr.read_u16()?;
    let block_size = hdr.read_u16()?;

    Ok(Header {
        format,
        version,
        block_size,
    })
}
