use std::io::{stdout, BufWriter, ErrorKind, Read, Write};

use anyhow::{Context, Result};
use sl2::{read_blocks, Config};
use tracing::{debug, info};

/// Write each decoded block to stdout as a line of JSON.
pub fn blocks<R: Read>(input: R, config: Config, limit: Option<usize>) -> Result<()> {
    let mut iter = read_blocks(input, config);
    let mut out = BufWriter::new(stdout().lock());

    let mut count = 0;
    for zult in iter.by_ref().take(limit.unwrap_or(usize::MAX)) {
        let block = zult.context("decoding blocks")?;
        serde_json::to_writer(&mut out, &block).context("serializing block")?;
        if let Err(err) = writeln!(out) {
            // Output closed early, e.g. piped to head.
            if err.kind() == ErrorKind::BrokenPipe {
                debug!("output closed");
                return Ok(());
            }
            return Err(err).context("writing to stdout");
        }
        count += 1;
    }
    out.flush().context("flushing stdout")?;

    let stats = iter.stats();
    info!(
        "wrote {count} blocks ({} decoded, {} filtered, {} bytes discarded)",
        stats.decoded, stats.filtered, stats.discarded
    );
    Ok(())
}
