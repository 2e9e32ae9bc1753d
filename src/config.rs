use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use typed_builder::TypedBuilder;

use crate::flags::Flags;

/// Knots to kilometers per hour
pub const KNOTS_TO_KMH: f64 = 1.852;
/// Knots to miles per hour
pub const KNOTS_TO_MPH: f64 = 1.150_779_45;
/// Knots to meters per second
pub const KNOTS_TO_MS: f64 = 0.514_444_444;

/// Unit water and GPS speeds are reported in. Logs store knots.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SpeedUnit {
    #[default]
    Knots,
    Kmh,
    Mph,
    Ms,
}

impl SpeedUnit {
    /// Multiplier converting knots to this unit.
    #[must_use]
    pub fn factor(&self) -> f64 {
        match self {
            SpeedUnit::Knots => 1.0,
            SpeedUnit::Kmh => KNOTS_TO_KMH,
            SpeedUnit::Mph => KNOTS_TO_MPH,
            SpeedUnit::Ms => KNOTS_TO_MS,
        }
    }
}

impl Display for SpeedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SpeedUnit::Knots => "kts",
            SpeedUnit::Kmh => "kmh",
            SpeedUnit::Mph => "mph",
            SpeedUnit::Ms => "ms",
        };
        write!(f, "{name}")
    }
}

impl FromStr for SpeedUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kts" | "kn" | "knots" => Ok(SpeedUnit::Knots),
            "kmh" | "km/h" => Ok(SpeedUnit::Kmh),
            "mph" => Ok(SpeedUnit::Mph),
            "ms" | "m/s" => Ok(SpeedUnit::Ms),
            _ => Err(format!("unknown speed unit {s:?}; expected one of kts, kmh, mph, ms")),
        }
    }
}

/// Required flag values, keyed by flag name. See [Flags::get] for accepted names.
pub type FlagFilter = BTreeMap<String, bool>;

/// Block decoding options.
///
/// Every option defaults to "leave the value as stored": no unit conversions, speeds
/// in knots, no raw header dump and no filtering.
///
/// # Example
/// ```
/// use sl2::{Config, SpeedUnit};
///
/// let config = Config::builder()
///     .feet_to_meters(true)
///     .speed_unit(SpeedUnit::Kmh)
///     .build();
/// assert!(!config.convert_projection);
/// ```
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Convert depths, limits and altitude from feet to meters.
    #[builder(default)]
    pub feet_to_meters: bool,
    /// Convert course over ground from radians to degrees.
    #[builder(default)]
    pub rad_to_deg: bool,
    /// Unit for water and GPS speed.
    #[builder(default)]
    pub speed_unit: SpeedUnit,
    /// Convert projected longitude/latitude to degrees.
    #[builder(default)]
    pub convert_projection: bool,
    /// Attach a hex dump of each block's first 144 bytes.
    #[builder(default)]
    pub raw_header: bool,
    /// Suppress blocks whose flags do not match every recognized entry.
    #[builder(default, setter(strip_option))]
    pub flag_filter: Option<FlagFilter>,
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

impl Config {
    /// True if a block with `flags` passes the configured flag filter.
    ///
    /// Filter entries naming unrecognized flags are ignored.
    #[must_use]
    pub fn accepts(&self, flags: &Flags) -> bool {
        let Some(filter) = &self.flag_filter else {
            return true;
        };
        filter
            .iter()
            .all(|(name, want)| flags.get(name).map_or(true, |got| got == *want))
    }
}
