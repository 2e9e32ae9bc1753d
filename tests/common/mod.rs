//! Synthesized log fixtures.
#![allow(dead_code)]

/// Builds the bytes of one block with a 144 byte header.
#[derive(Debug, Clone)]
pub struct BlockSpec {
    pub size: u16,
    pub channel: i16,
    pub frame_index: u32,
    pub water_depth: f32,
    pub gps_speed: f32,
    pub water_speed: f32,
    pub longitude: i32,
    pub latitude: i32,
    pub flags: u16,
    pub time1: i32,
}

impl Default for BlockSpec {
    fn default() -> Self {
        BlockSpec {
            size: 3216,
            channel: 0,
            frame_index: 0,
            water_depth: 10.0,
            gps_speed: 2.0,
            water_speed: 2.0,
            longitude: 1_383_446,
            latitude: 8_147_370,
            flags: 0,
            time1: 0,
        }
    }
}

impl BlockSpec {
    pub fn frame(frame_index: u32) -> Self {
        BlockSpec {
            frame_index,
            time1: i32::try_from(frame_index).unwrap() * 100,
            ..Default::default()
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut dat = vec![0u8; usize::from(self.size).max(144)];
        let mut put = |offset: usize, bytes: &[u8]| {
            dat[offset..offset + bytes.len()].copy_from_slice(bytes);
        };
        put(26, &self.size.to_le_bytes());
        put(30, &self.channel.to_le_bytes());
        put(34, &self.frame_index.to_le_bytes());
        put(62, &self.water_depth.to_le_bytes());
        put(98, &self.gps_speed.to_le_bytes());
        put(106, &self.longitude.to_le_bytes());
        put(110, &self.latitude.to_le_bytes());
        put(114, &self.water_speed.to_le_bytes());
        put(130, &self.flags.to_le_bytes());
        put(140, &self.time1.to_le_bytes());
        // sonar payload
        for (i, b) in dat.iter_mut().enumerate().skip(144) {
            *b = (i % 251) as u8;
        }
        dat.truncate(usize::from(self.size));
        dat
    }
}

/// sl2 file header, version 1, nominal block size 3216.
pub fn header() -> Vec<u8> {
    let mut dat = vec![0u8; 10];
    dat[0..2].copy_from_slice(&2u16.to_le_bytes());
    dat[2..4].copy_from_slice(&1u16.to_le_bytes());
    dat[4..6].copy_from_slice(&3216u16.to_le_bytes());
    dat
}

/// A complete log containing `blocks`.
pub fn log(blocks: &[BlockSpec]) -> Vec<u8> {
    let mut dat = header();
    for block in blocks {
        dat.extend(block.bytes());
    }
    dat
}

/// A log with `count` blocks of varying sizes and channels.
pub fn mixed_log(count: u32) -> Vec<u8> {
    let blocks: Vec<BlockSpec> = (0..count)
        .map(|i| BlockSpec {
            size: [3216, 1970, 200][i as usize % 3],
            channel: [0, 2, 5][i as usize % 3],
            flags: if i % 2 == 0 { 0x1000 } else { 0 },
            ..BlockSpec::frame(i)
        })
        .collect();
    log(&blocks)
}
