use std::{
    collections::BTreeMap,
    io::{stdout, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use serde::Serialize;
use sl2::{read_blocks, Block, Config, Header, Stats};
use tracing::debug;

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum Format {
    Json,
    Text,
}

/// Inclusive range of observed values.
#[derive(Debug, Clone, Copy, Serialize)]
struct Range<T> {
    first: T,
    last: T,
}

impl<T: Copy + PartialOrd> Range<T> {
    fn extend(range: Option<Self>, val: T) -> Option<Self> {
        Some(match range {
            None => Range {
                first: val,
                last: val,
            },
            Some(r) => Range {
                first: if val < r.first { val } else { r.first },
                last: if val > r.last { val } else { r.last },
            },
        })
    }
}

#[derive(Default, Debug, Clone, Serialize)]
struct Summary {
    total_blocks: usize,
    frame_index: Option<Range<u32>>,
    time1: Option<Range<i32>>,
}

impl Summary {
    fn add(&mut self, block: &Block) {
        self.total_blocks += 1;
        self.frame_index = Range::extend(self.frame_index, block.frame_index);
        self.time1 = Range::extend(self.time1, block.time1);
    }
}

#[derive(Debug, Clone, Serialize)]
struct Info {
    filename: String,
    header: Option<Header>,
    summary: Summary,
    channels: BTreeMap<String, Summary>,
    stats: Stats,
}

fn summarize<R: Read>(fpath: &Path, input: R) -> Result<Info> {
    let mut blocks = read_blocks(input, Config::default());
    let mut summary = Summary::default();
    let mut channels: BTreeMap<String, Summary> = BTreeMap::default();

    for zult in blocks.by_ref() {
        let block = zult.context("decoding blocks")?;
        summary.add(&block);
        channels
            .entry(block.channel.to_string())
            .or_default()
            .add(&block);
    }
    debug!("{:?}", blocks.stats());

    Ok(Info {
        filename: fpath.to_string_lossy().to_string(),
        header: blocks.header().copied(),
        summary,
        channels,
        stats: blocks.stats(),
    })
}

pub fn info<R: Read>(fpath: &Path, input: R, format: &Format) -> Result<()> {
    let info = summarize(fpath, input)?;

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &info).context("serializing to json")
        }
        Format::Text => {
            let data = render_text(&info)?;
            stdout()
                .write_all(data.as_bytes())
                .context("writing to stdout")
        }
    }
}

fn render_text(info: &Info) -> Result<String> {
    handlebars::handlebars_helper!(left_pad: |num: u64, v: Json| {
        let v = if let serde_json::Value::String(s) = v {
            s.to_owned()
        } else {
            v.to_string()
        };
        let num = usize::try_from(num).unwrap_or(0);
        format!("{v:>num$}")
    });
    let mut hb = handlebars::Handlebars::new();
    hb.register_helper("lpad", Box::new(left_pad));
    hb.register_template_string("info", TEXT_TEMPLATE)
        .context("registering template")?;

    hb.render("info", &info).context("rendering text")
}

const TEXT_TEMPLATE: &str = r"{{ filename }}
===========================================================================================
Format:     {{ header.format }} v{{ header.version }} (block size {{ header.block_size }})
Blocks:     {{ summary.total_blocks }}
Frames:     {{ summary.frame_index.first }} - {{ summary.frame_index.last }}
Time1:      {{ summary.time1.first }} - {{ summary.time1.last }}
Bytes:      {{ stats.bytes }} in {{ stats.chunks }} chunks, {{ stats.discarded }} discarded
-------------------------------------------------------------------------------------------
Channel        Count      First Frame     Last Frame      First Time1      Last Time1
-------------------------------------------------------------------------------------------
{{ #each channels }}{{ lpad 11 @key }}  {{ lpad 9 total_blocks }}  {{ lpad 13 frame_index.first }}  {{ lpad 13 frame_index.last }}  {{ lpad 15 time1.first }}  {{ lpad 14 time1.last }}
{{/each }}
";
