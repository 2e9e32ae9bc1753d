mod common;

use common::{log, mixed_log, BlockSpec};
use sl2::*;
use test_case::test_case;

fn decode_chunked(dat: &[u8], chunk_size: usize, config: Config) -> (Vec<Block>, Stats) {
    let mut reader = Reader::new(config);
    let mut blocks = Vec::new();
    for chunk in dat.chunks(chunk_size) {
        reader.feed(chunk, &mut blocks).unwrap();
    }
    reader.close(&mut blocks).unwrap();
    (blocks, reader.stats())
}

#[test_case(1; "single bytes")]
#[test_case(7; "smaller than header")]
#[test_case(27; "minimum block length")]
#[test_case(143; "inside block header")]
#[test_case(1000; "inside payload")]
#[test_case(4096; "page")]
#[test_case(1 << 20; "whole file")]
fn chunking_does_not_change_result(chunk_size: usize) {
    let dat = mixed_log(12);
    let (expected_header, expected) = decode_slice(&dat, Config::default()).unwrap();

    let (blocks, stats) = decode_chunked(&dat, chunk_size, Config::default());

    assert_eq!(blocks, expected);
    assert_eq!(blocks.len(), 12);
    assert_eq!(stats.bytes, dat.len());
    assert_eq!(stats.discarded, 0);
    assert_eq!(expected_header.format, Format::Sl2);
}

#[test]
fn blocks_decode_fields() {
    let dat = mixed_log(3);
    let (header, blocks) = decode_slice(&dat, Config::default()).unwrap();

    assert_eq!(header.version, 1);
    assert_eq!(header.block_size, 3216);

    let channels: Vec<Channel> = blocks.iter().map(|b| b.channel).collect();
    assert_eq!(
        channels,
        vec![Channel::Primary, Channel::Dsi, Channel::Composite]
    );
    let sizes: Vec<u16> = blocks.iter().map(|b| b.block_size).collect();
    assert_eq!(sizes, vec![3216, 1970, 200]);
    assert_eq!(blocks[2].time1, 200);
    assert!(blocks[0].flags.position_valid);
    assert!(!blocks[1].flags.position_valid);
    assert!(blocks[0].raw_header.is_none());
}

#[test]
fn truncated_final_block_uses_available_bytes() {
    let mut dat = log(&[BlockSpec::frame(1), BlockSpec::frame(2)]);
    dat.truncate(dat.len() - 1000);

    let (blocks, stats) = decode_chunked(&dat, 512, Config::default());

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].frame_index, 2);
    assert_eq!(blocks[1].block_size, 3216 - 1000);
    assert_eq!(stats.discarded, 0);
}

#[test]
fn short_tail_is_discarded() {
    let mut dat = log(&[BlockSpec::frame(1)]);
    dat.extend([0xffu8; 26]);

    let (blocks, stats) = decode_chunked(&dat, 100, Config::default());

    assert_eq!(blocks.len(), 1);
    assert_eq!(stats.discarded, 26);
}

#[test]
fn filter_on_position_valid() {
    let dat = mixed_log(10);
    let config = Config::builder()
        .flag_filter(FlagFilter::from([("positionValid".to_string(), true)]))
        .build();

    let (blocks, stats) = decode_chunked(&dat, 333, config);

    assert_eq!(blocks.len(), 5);
    assert!(blocks.iter().all(|b| b.flags.position_valid));
    assert_eq!(stats.decoded, 10);
    assert_eq!(stats.filtered, 5);
}

#[test]
fn speed_unit_conversion() {
    let dat = log(&[BlockSpec::frame(1)]);
    let config = Config::builder().speed_unit(SpeedUnit::Kmh).build();

    let (_, blocks) = decode_slice(&dat, config).unwrap();

    let block = &blocks[0];
    assert!((block.gps_speed - 2.0 * 1.852).abs() < 1e-9, "{}", block.gps_speed);
    assert!((block.water_speed - 2.0 * 1.852).abs() < 1e-9);
    // converting back gives the stored knots
    assert!((block.gps_speed / SpeedUnit::Kmh.factor() - 2.0).abs() < 1e-9);
}

#[test]
fn unit_and_projection_conversions() {
    let dat = log(&[BlockSpec::frame(1)]);
    let config = Config::builder()
        .feet_to_meters(true)
        .convert_projection(true)
        .build();

    let (_, blocks) = decode_slice(&dat, config).unwrap();

    let block = &blocks[0];
    assert!((block.water_depth - 3.048).abs() < 1e-6);
    assert!((block.longitude - 12.4695).abs() < 1e-3, "{}", block.longitude);
    assert!((block.latitude - 58.974).abs() < 1e-3, "{}", block.latitude);
}

#[test]
fn raw_header_offsets() {
    let dat = log(&[BlockSpec::frame(1), BlockSpec::frame(2)]);
    let config = Config::builder().raw_header(true).build();

    let (blocks, _) = decode_chunked(&dat, 1000, config);

    let raw = blocks[1].raw_header.as_ref().unwrap();
    assert_eq!(raw.offset, 10 + 3216);
    assert_eq!(raw.payload_offset, 10 + 3216 + 144);
    assert_eq!(raw.data.len(), 144 * 2);
    assert_eq!(&raw.data[52..56], "900c", "declared size 3216 little-endian");
}

#[test]
fn header_split_across_chunks() {
    let dat = log(&[BlockSpec::frame(1)]);
    let mut reader = Reader::new(Config::default());

    reader.push(&dat[..3]);
    assert!(reader.next_event().is_none());
    reader.push(&dat[3..9]);
    assert!(reader.next_event().is_none());
    assert!(reader.header().is_none());

    reader.push(&dat[9..]);
    match reader.next_event() {
        Some(Ok(Event::Header(header))) => assert_eq!(header.format, Format::Sl2),
        other => panic!("expected header event, got {other:?}"),
    }
    assert!(matches!(reader.next_event(), Some(Ok(Event::Block(_)))));
}

#[test]
fn bad_header_is_fatal() {
    let mut dat = mixed_log(2);
    dat[0..2].copy_from_slice(&0x1234u16.to_le_bytes());

    let zult = decode_slice(&dat, Config::default());
    assert!(
        matches!(zult, Err(Error::Header(HeaderError::UnknownFormat(0x1234)))),
        "{zult:?}"
    );
}

#[test]
fn error_terminates_stream() {
    let bad = BlockSpec {
        size: 60,
        ..BlockSpec::frame(2)
    };
    let dat = log(&[BlockSpec::frame(1), bad, BlockSpec::frame(3)]);
    let mut reader = Reader::new(Config::default());
    reader.push(&dat);
    reader.finish();

    let events: Vec<_> = reader.events().collect();

    assert_eq!(events.len(), 3);
    assert!(events[2].is_err());
    assert!(reader.is_finished());
    assert!(reader.next_event().is_none());
}

#[test]
fn pausing_resumes_at_next_block() {
    let dat = mixed_log(6);
    let mut reader = Reader::new(Config::default());
    reader.push(&dat);
    reader.finish();

    let first: Vec<u32> = reader
        .events()
        .filter_map(|e| match e.unwrap() {
            Event::Block(b) => Some(b.frame_index),
            Event::Header(_) => None,
        })
        .take(2)
        .collect();
    assert_eq!(first, vec![0, 1]);

    // consumer resumes later
    let rest: Vec<u32> = reader
        .events()
        .map(|e| match e.unwrap() {
            Event::Block(b) => b.frame_index,
            Event::Header(h) => panic!("header repeated: {h:?}"),
        })
        .collect();
    assert_eq!(rest, vec![2, 3, 4, 5]);
}

#[test]
fn read_blocks_matches_decode_slice() {
    let dat = mixed_log(40);
    let (_, expected) = decode_slice(&dat, Config::default()).unwrap();

    let mut iter = read_blocks(std::io::Cursor::new(&dat), Config::default());
    let blocks: Vec<Block> = iter.by_ref().map(|b| b.unwrap()).collect();

    assert_eq!(blocks, expected);
    assert_eq!(iter.header().unwrap().format, Format::Sl2);
    assert!(iter.stats().chunks > 1, "input spans more than one chunk");
}

#[cfg(feature = "serde")]
#[test]
fn block_serializes_to_json() {
    let dat = log(&[BlockSpec {
        channel: 2,
        flags: 0x1000,
        ..BlockSpec::frame(7)
    }]);
    let (_, blocks) = decode_slice(&dat, Config::default()).unwrap();

    let value = serde_json::to_value(&blocks[0]).unwrap();
    assert_eq!(value["channel"], "DSI");
    assert_eq!(value["frame_index"], 7);
    assert_eq!(value["flags"]["position_valid"], true);
    assert!(value.get("raw_header").is_none());

    let back: Block = serde_json::from_value(value).unwrap();
    assert_eq!(back, blocks[0]);
}
