use std::io::{ErrorKind, Read};

use tracing::{debug, trace, warn};

use crate::block::{decode_block, Block};
use crate::bytes::Cursor;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::header::{read_header, Header, HeaderError};

/// Events produced by a [Reader].
///
/// A reader yields exactly one `Header` event once the file header has been parsed,
/// followed by a `Block` event for each decoded block that passes the flag filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Header(Header),
    Block(Block),
}

/// Counters describing the work a [Reader] has done.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    /// Number of chunks pushed.
    pub chunks: usize,
    /// Number of bytes pushed.
    pub bytes: usize,
    /// Blocks decoded, including filtered ones.
    pub decoded: usize,
    /// Blocks provided to the caller.
    pub emitted: usize,
    /// Blocks suppressed by the flag filter.
    pub filtered: usize,
    /// Trailing bytes dropped at end of input because they could not form a block.
    pub discarded: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingHeader,
    DecodingBody,
    /// End of input was reached and all bytes have been used.
    Done,
    /// A fatal error was returned; nothing more is produced.
    Failed,
}

/// Receives events pushed by [Reader::feed] and [Reader::close].
pub trait Sink {
    /// Called once, when the file header has been parsed.
    fn header(&mut self, _header: &Header) {}
    fn block(&mut self, block: Block);
}

impl Sink for Vec<Block> {
    fn block(&mut self, block: Block) {
        self.push(block);
    }
}

/// Reader assembles arbitrarily sized chunks of a log into [Block]s.
///
/// Push chunks as they arrive with [Reader::push] and pull events with
/// [Reader::next_event] (or the [Reader::events] iterator). Blocks are only decoded
/// when an event is requested, so a slow consumer simply stops pulling and later
/// resumes at the next block boundary. Bytes belonging to a block that has not been
/// fully received are kept until the next chunk arrives.
///
/// Call [Reader::finish] once the input is exhausted; remaining bytes are then
/// decoded as a final, possibly truncated, block.
///
/// # Example
/// ```
/// use sl2::{Config, Event, Reader};
///
/// let mut reader = Reader::new(Config::default());
/// // sl2 header with no blocks
/// reader.push(&[2, 0, 0, 0, 0xb2, 0x07, 0, 0, 0, 0]);
/// reader.finish();
///
/// let events: Vec<Event> = reader.events().collect::<Result<_, _>>().unwrap();
/// assert_eq!(events.len(), 1);
/// assert!(reader.is_finished());
/// ```
#[derive(Debug)]
pub struct Reader {
    config: Config,
    state: State,
    // Bytes not yet decoded live in buf[pos..]
    buf: Vec<u8>,
    pos: usize,
    // Absolute stream offset of buf[0]
    base: usize,
    eof: bool,
    header: Option<Header>,
    stats: Stats,
}

impl Reader {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Reader {
            config,
            state: State::AwaitingHeader,
            buf: Vec::new(),
            pos: 0,
            base: 0,
            eof: false,
            header: None,
            stats: Stats::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The file header, once it has been parsed.
    #[must_use]
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    #[must_use]
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Number of received bytes not yet decoded.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True once all input has been decoded, or decoding failed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Done | State::Failed)
    }

    /// Append a chunk of input.
    ///
    /// Chunks pushed after [Reader::finish] or after a decoding error are ignored.
    pub fn push(&mut self, chunk: &[u8]) {
        if self.eof {
            warn!(len = chunk.len(), "ignoring chunk pushed after end of input");
            return;
        }
        if self.state == State::Failed {
            trace!(len = chunk.len(), "ignoring chunk pushed after failure");
            return;
        }
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.base += self.pos;
            self.pos = 0;
        }
        self.buf.extend_from_slice(chunk);
        self.stats.chunks += 1;
        self.stats.bytes += chunk.len();
        trace!(chunk = self.stats.chunks, len = chunk.len(), buffered = self.buffered(), "chunk");
    }

    /// Mark the end of input.
    pub fn finish(&mut self) {
        if !self.eof {
            debug!(buffered = self.buffered(), "end of input");
        }
        self.eof = true;
    }

    /// Decode the next event.
    ///
    /// Returns `None` when more input is needed, or, after [Reader::finish], when all
    /// input has been decoded. After an error is returned the reader is finished and
    /// will only return `None`.
    pub fn next_event(&mut self) -> Option<Result<Event>> {
        match self.state {
            State::AwaitingHeader => self.next_header(),
            State::DecodingBody => self.next_block(),
            State::Done | State::Failed => None,
        }
    }

    /// Iterate over the events that can be decoded from the input received so far.
    pub fn events(&mut self) -> Events<'_> {
        Events { reader: self }
    }

    /// Push a chunk and deliver every event it completes to `sink`.
    ///
    /// # Errors
    /// Any fatal decoding error. The reader is finished afterwards.
    pub fn feed(&mut self, chunk: &[u8], sink: &mut impl Sink) -> Result<()> {
        self.push(chunk);
        self.drain_into(sink)
    }

    /// Mark the end of input and deliver the remaining events to `sink`.
    ///
    /// # Errors
    /// Any fatal decoding error.
    pub fn close(&mut self, sink: &mut impl Sink) -> Result<()> {
        self.finish();
        self.drain_into(sink)
    }

    fn drain_into(&mut self, sink: &mut impl Sink) -> Result<()> {
        while let Some(event) = self.next_event() {
            match event? {
                Event::Header(header) => sink.header(&header),
                Event::Block(block) => sink.block(block),
            }
        }
        Ok(())
    }

    fn fail(&mut self, err: Error) -> Option<Result<Event>> {
        debug!(error = %err, "decoding failed");
        self.state = State::Failed;
        self.base += self.buf.len();
        self.buf = Vec::new();
        self.pos = 0;
        Some(Err(err))
    }

    fn next_header(&mut self) -> Option<Result<Event>> {
        let available = self.buffered();
        if available < Header::LEN {
            if self.eof {
                return self.fail(
                    HeaderError::Truncated {
                        needed: Header::LEN,
                        available,
                    }
                    .into(),
                );
            }
            return None;
        }

        let mut cur = Cursor::with_offset(&self.buf[self.pos..], self.base + self.pos);
        match read_header(&mut cur) {
            Ok(header) => {
                self.pos += cur.tell();
                self.header = Some(header);
                self.state = State::DecodingBody;
                debug!(
                    format = %header.format,
                    version = header.version,
                    block_size = header.block_size,
                    "header parsed"
                );
                Some(Ok(Event::Header(header)))
            }
            Err(err) => self.fail(err),
        }
    }

    fn next_block(&mut self) -> Option<Result<Event>> {
        loop {
            if self.eof && self.buffered() < 2 {
                self.complete();
                return None;
            }

            let mut cur = Cursor::with_offset(&self.buf[self.pos..], self.base + self.pos);
            let block = match decode_block(&mut cur, self.eof, &self.config) {
                Ok(Some(block)) => {
                    self.pos += cur.tell();
                    block
                }
                Ok(None) => {
                    if self.eof {
                        // Nothing further can be decoded from what remains.
                        let left = self.buffered();
                        warn!(bytes = left, "discarding trailing bytes");
                        self.stats.discarded += left;
                        self.pos = self.buf.len();
                        self.complete();
                    }
                    return None;
                }
                Err(err) => return self.fail(err),
            };

            self.stats.decoded += 1;
            if !self.config.accepts(&block.flags) {
                trace!(frame_index = block.frame_index, "block excluded by flag filter");
                self.stats.filtered += 1;
                continue;
            }
            trace!(
                frame_index = block.frame_index,
                channel = %block.channel,
                size = block.block_size,
                "block"
            );
            self.stats.emitted += 1;
            return Some(Ok(Event::Block(block)));
        }
    }

    fn complete(&mut self) {
        if self.state != State::Done {
            debug!(
                decoded = self.stats.decoded,
                emitted = self.stats.emitted,
                "flushed"
            );
        }
        self.state = State::Done;
        self.buf.clear();
        self.base += self.pos;
        self.pos = 0;
    }
}

/// Iterator over the events currently available from a [Reader].
///
/// See [Reader::events].
pub struct Events<'a> {
    reader: &'a mut Reader,
}

impl Iterator for Events<'_> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_event()
    }
}

/// Iterator providing [Block]s decoded from a reader. See [read_blocks].
pub struct Blocks<R>
where
    R: Read,
{
    reader: R,
    decoder: Reader,
    chunk: Vec<u8>,
}

impl<R> Blocks<R>
where
    R: Read,
{
    /// Size of the chunks read from the underlying reader.
    pub const CHUNK_SIZE: usize = 64 * 1024;

    /// The file header, once the first block has been requested.
    #[must_use]
    pub fn header(&self) -> Option<&Header> {
        self.decoder.header()
    }

    #[must_use]
    pub fn stats(&self) -> Stats {
        self.decoder.stats()
    }
}

impl<R> Iterator for Blocks<R>
where
    R: Read,
{
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.decoder.next_event() {
                Some(Ok(Event::Block(block))) => return Some(Ok(block)),
                Some(Ok(Event::Header(_))) => continue,
                Some(Err(err)) => return Some(Err(err)),
                None if self.decoder.is_finished() => return None,
                None => {}
            }

            match self.reader.read(&mut self.chunk) {
                Ok(0) => self.decoder.finish(),
                Ok(n) => self.decoder.push(&self.chunk[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => {
                    // Reading can't continue, so the decoder is done too.
                    self.decoder.state = State::Failed;
                    return Some(Err(Error::Io(err)));
                }
            }
        }
    }
}

/// Return an [Iterator] providing [Block]s read lazily from `reader`.
///
/// Input is read in [Blocks::CHUNK_SIZE] chunks, so the whole log never needs to be
/// in memory.
///
/// # Examples
/// ```
/// use sl2::{read_blocks, Config};
///
/// // sl2 header with no blocks
/// let dat: &[u8] = &[2, 0, 0, 0, 0xb2, 0x07, 0, 0, 0, 0];
///
/// let mut blocks = read_blocks(std::io::BufReader::new(dat), Config::default());
/// assert!(blocks.next().is_none());
/// assert_eq!(blocks.header().unwrap().block_size, 1970);
/// ```
pub fn read_blocks<R>(reader: R, config: Config) -> Blocks<R>
where
    R: Read,
{
    Blocks {
        reader,
        decoder: Reader::new(config),
        chunk: vec![0u8; Blocks::<R>::CHUNK_SIZE],
    }
}

/// Decode a complete in-memory log.
///
/// # Errors
/// Any fatal decoding error.
pub fn decode_slice(dat: &[u8], config: Config) -> Result<(Header, Vec<Block>)> {
    let mut reader = Reader::new(config);
    let mut blocks = Vec::new();
    reader.feed(dat, &mut blocks)?;
    reader.close(&mut blocks)?;

    match reader.header() {
        Some(header) => Ok((*header, blocks)),
        // close fails before getting here without a header
        None => Err(HeaderError::Truncated {
            needed: Header::LEN,
            available: dat.len(),
        }
        .into()),
    }
}
