use std::fmt::Display;
use std::str::FromStr;

use tracing::trace;

use crate::bytes::Cursor;
use crate::config::{Config, SpeedUnit};
use crate::error::Result;
use crate::flags::{decode_flags, Flags};

/// Polar radius used by the log's spherical projection, in meters.
pub const EARTH_RADIUS: f64 = 6_356_752.3142;
pub const RADIANS_TO_DEGREES: f64 = 180.0 / std::f64::consts::PI;
pub const FEET_TO_METERS: f64 = 0.3048;

/// Convert a projected longitude to degrees.
#[must_use]
pub fn longitude(raw: f64) -> f64 {
    raw / EARTH_RADIUS * RADIANS_TO_DEGREES
}

/// Convert a projected latitude to degrees.
#[must_use]
pub fn latitude(raw: f64) -> f64 {
    let t = (raw / EARTH_RADIUS).exp();
    (2.0 * t.atan() - std::f64::consts::FRAC_PI_2) * RADIANS_TO_DEGREES
}

/// Sonar channel a block was recorded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "String", try_from = "String")
)]
pub enum Channel {
    Primary,
    Secondary,
    Dsi,
    Left,
    Right,
    Composite,
    /// Channel id outside the known set.
    Invalid(i16),
}

impl From<i16> for Channel {
    fn from(id: i16) -> Self {
        match id {
            0 => Channel::Primary,
            1 => Channel::Secondary,
            2 => Channel::Dsi,
            3 => Channel::Left,
            4 => Channel::Right,
            5 => Channel::Composite,
            _ => Channel::Invalid(id),
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Primary => write!(f, "Primary"),
            Channel::Secondary => write!(f, "Secondary"),
            Channel::Dsi => write!(f, "DSI"),
            Channel::Left => write!(f, "Left"),
            Channel::Right => write!(f, "Right"),
            Channel::Composite => write!(f, "Composite"),
            Channel::Invalid(id) => write!(f, "Invalid{id}"),
        }
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Primary" => Ok(Channel::Primary),
            "Secondary" => Ok(Channel::Secondary),
            "DSI" => Ok(Channel::Dsi),
            "Left" => Ok(Channel::Left),
            "Right" => Ok(Channel::Right),
            "Composite" => Ok(Channel::Composite),
            _ => s
                .strip_prefix("Invalid")
                .and_then(|id| id.parse::<i16>().ok())
                .map(Channel::Invalid)
                .ok_or_else(|| format!("invalid channel name {s:?}")),
        }
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.to_string()
    }
}

impl TryFrom<String> for Channel {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// Hex dump of the start of a block, for diagnosing layout problems.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawHeader {
    /// Lowercase hex of up to the first [Block::HEADER_LEN] bytes.
    pub data: String,
    /// Absolute stream offset of the block's first byte.
    pub offset: usize,
    /// Absolute stream offset of the sonar payload following the block header.
    pub payload_offset: usize,
}

/// A single decoded telemetry record.
///
/// Depth, limit and altitude values are feet, speeds knots, course radians and
/// coordinates raw projected integers unless [Config] asks for a conversion.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    pub frame_index: u32,
    /// Declared size of this block, or the bytes actually available for a truncated
    /// final block.
    pub block_size: u16,
    pub last_block_size: u16,
    pub packet_size: u16,
    pub channel: Channel,
    /// Elapsed time counter, in source units.
    pub time1: i32,
    pub water_depth: f64,
    pub temperature: f64,
    pub frequency: u8,
    pub keel_depth: f64,
    pub upper_limit: f64,
    pub lower_limit: f64,
    pub altitude: f64,
    pub heading: f64,
    pub course_over_ground: f64,
    pub water_speed: f64,
    pub gps_speed: f64,
    pub longitude: f64,
    pub latitude: f64,
    pub flags: Flags,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub raw_header: Option<RawHeader>,
}

impl Block {
    /// Minimum bytes needed to locate the declared block size.
    pub const MIN_LEN: usize = 27;
    /// Offset of the declared block size.
    pub const SIZE_OFFSET: usize = 26;
    /// Length of the fixed block header preceding the sonar payload.
    pub const HEADER_LEN: usize = 144;

    fn apply(&mut self, config: &Config) {
        if config.feet_to_meters {
            self.upper_limit *= FEET_TO_METERS;
            self.lower_limit *= FEET_TO_METERS;
            self.water_depth *= FEET_TO_METERS;
            self.keel_depth *= FEET_TO_METERS;
            self.altitude *= FEET_TO_METERS;
        }
        if config.rad_to_deg {
            self.course_over_ground *= RADIANS_TO_DEGREES;
        }
        if config.convert_projection {
            self.longitude = longitude(self.longitude);
            self.latitude = latitude(self.latitude);
        }
        if config.speed_unit != SpeedUnit::Knots {
            let factor = config.speed_unit.factor();
            self.water_speed *= factor;
            self.gps_speed *= factor;
        }
    }
}

/// Decode a single block starting at the current position of `cur`.
///
/// Returns `Ok(None)` when there are not yet enough bytes for a block: fewer than
/// [Block::MIN_LEN] bytes, or fewer than the declared block size unless `force` is
/// set. With `force`, a block declaring more bytes than remain is clamped to the
/// remaining bytes and decoded best-effort. This should only be used at the end of
/// input.
///
/// On success `cur` is advanced past the block. On `Ok(None)` it is not moved.
///
/// # Errors
/// [Error::OutOfRange](crate::Error::OutOfRange) or
/// [Error::TruncatedRead](crate::Error::TruncatedRead) if the block is too short for
/// its fixed field layout, which indicates a corrupt or misframed stream.
pub fn decode_block(cur: &mut Cursor, force: bool, config: &Config) -> Result<Option<Block>> {
    let left = cur.left();
    if left < Block::MIN_LEN {
        trace!(left, "not enough bytes to check block size");
        return Ok(None);
    }

    // The size field straddles the minimum, so a 27 byte tail still has to wait.
    let Ok(declared) = cur.peek_u16_at(Block::SIZE_OFFSET) else {
        trace!(left, "size field incomplete");
        return Ok(None);
    };
    let mut block_size = usize::from(declared);
    if block_size > left {
        if !force {
            trace!(block_size, left, "waiting for more bytes");
            return Ok(None);
        }
        trace!(block_size, left, "short ending block");
        block_size = left;
    }

    let mut br = cur.slice(block_size)?;

    let raw_header = if config.raw_header {
        let offset = br.absolute();
        Some(RawHeader {
            data: hex::encode(br.bytes(Block::HEADER_LEN)),
            offset,
            payload_offset: offset + Block::HEADER_LEN,
        })
    } else {
        None
    };

    br.seek(28)?;
    let last_block_size = br.read_u16()?;
    let channel = Channel::from(br.read_i16()?);
    let packet_size = br.read_u16()?;
    let frame_index = br.read_u32()?;
    let upper_limit = br.read_f32()?;
    let lower_limit = br.read_f32()?;

    br.seek(51)?;
    let frequency = br.read_u8()?;

    br.seek(62)?;
    let water_depth = br.read_f32()?;
    let keel_depth = br.read_f32()?;

    br.seek(98)?;
    let gps_speed = br.read_f32()?;
    let temperature = br.read_f32()?;
    let longitude = br.read_i32()?;
    let latitude = br.read_i32()?;
    let water_speed = br.read_f32()?;
    let course_over_ground = br.read_f32()?;
    let altitude = br.read_f32()?;
    let heading = br.read_f32()?;
    let flags = decode_flags(br.read_u16()?);

    br.seek(140)?;
    let time1 = br.read_i32()?;

    let mut block = Block {
        frame_index,
        // clamped value is never larger than the declared u16
        block_size: u16::try_from(block_size).unwrap_or(u16::MAX),
        last_block_size,
        packet_size,
        channel,
        time1,
        water_depth: f64::from(water_depth),
        temperature: f64::from(temperature),
        frequency,
        keel_depth: f64::from(keel_depth),
        upper_limit: f64::from(upper_limit),
        lower_limit: f64::from(lower_limit),
        altitude: f64::from(altitude),
        heading: f64::from(heading),
        course_over_ground: f64::from(course_over_ground),
        water_speed: f64::from(water_speed),
        gps_speed: f64::from(gps_speed),
        longitude: f64::from(longitude),
        latitude: f64::from(latitude),
        flags,
        raw_header,
    };
    block.apply(config);

    Ok(Some(block))
}
