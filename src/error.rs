use crate::header::HeaderError;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A read needed more bytes than remain in the cursor's region.
    #[error("truncated read at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedRead {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A cursor was positioned past the end of its region, which indicates a corrupt
    /// or misframed block.
    #[error("position {position} is out of range for a region of {len} bytes")]
    OutOfRange { position: usize, len: usize },

    /// The file header could not be parsed. Fatal to the whole stream.
    #[error("invalid file header: {0}")]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
