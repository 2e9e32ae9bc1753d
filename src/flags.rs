/// Validity flags carried in each block's 16-bit flag mask.
///
/// Bits not listed in [Flags::NAMES] are reserved and dropped when decoding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Flags {
    pub track_valid: bool,
    pub water_speed_valid: bool,
    pub position_valid: bool,
    pub water_temp_valid: bool,
    pub gps_speed_valid: bool,
    pub altitude_valid: bool,
    pub heading_valid: bool,
}

impl Flags {
    pub const TRACK_VALID: u16 = 0x8000;
    pub const WATER_SPEED_VALID: u16 = 0x4000;
    pub const POSITION_VALID: u16 = 0x1000;
    pub const WATER_TEMP_VALID: u16 = 0x0400;
    pub const GPS_SPEED_VALID: u16 = 0x0200;
    pub const ALTITUDE_VALID: u16 = 0x0002;
    pub const HEADING_VALID: u16 = 0x0001;

    /// Recognized flag names, as used by flag filters.
    pub const NAMES: [&str; 7] = [
        "trackValid",
        "waterSpeedValid",
        "positionValid",
        "waterTempValid",
        "gpsSpeedValid",
        "altitudeValid",
        "headingValid",
    ];

    /// Re-encode the recognized flags into a bit mask.
    #[must_use]
    pub fn bits(&self) -> u16 {
        [
            (self.track_valid, Self::TRACK_VALID),
            (self.water_speed_valid, Self::WATER_SPEED_VALID),
            (self.position_valid, Self::POSITION_VALID),
            (self.water_temp_valid, Self::WATER_TEMP_VALID),
            (self.gps_speed_valid, Self::GPS_SPEED_VALID),
            (self.altitude_valid, Self::ALTITUDE_VALID),
            (self.heading_valid, Self::HEADING_VALID),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .fold(0, |acc, (_, bit)| acc | bit)
    }

    /// Look a flag up by its camelCase (`positionValid`) or snake_case
    /// (`position_valid`) name. Returns `None` for unrecognized names.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<bool> {
        match name {
            "trackValid" | "track_valid" => Some(self.track_valid),
            "waterSpeedValid" | "water_speed_valid" => Some(self.water_speed_valid),
            "positionValid" | "position_valid" => Some(self.position_valid),
            "waterTempValid" | "water_temp_valid" => Some(self.water_temp_valid),
            "gpsSpeedValid" | "gps_speed_valid" => Some(self.gps_speed_valid),
            "altitudeValid" | "altitude_valid" => Some(self.altitude_valid),
            "headingValid" | "heading_valid" => Some(self.heading_valid),
            _ => None,
        }
    }
}

impl From<u16> for Flags {
    fn from(bits: u16) -> Self {
        decode_flags(bits)
    }
}

/// Map a block's flag mask to named booleans.
#[must_use]
pub fn decode_flags(bits: u16) -> Flags {
    Flags {
        track_valid: bits & Flags::TRACK_VALID != 0,
        water_speed_valid: bits & Flags::WATER_SPEED_VALID != 0,
        position_valid: bits & Flags::POSITION_VALID != 0,
        water_temp_valid: bits & Flags::WATER_TEMP_VALID != 0,
        gps_speed_valid: bits & Flags::GPS_SPEED_VALID != 0,
        altitude_valid: bits & Flags::ALTITUDE_VALID != 0,
        heading_valid: bits & Flags::HEADING_VALID != 0,
    }
}
