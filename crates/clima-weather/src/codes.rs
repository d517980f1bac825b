//! WMO weather code lookup.
//!
//! The backend reports conditions as WMO codes (0-99). Only the codes the
//! forecast model actually emits are listed; everything else maps to
//! [`UNKNOWN_ICON`].

/// Icon shown for codes missing from the table.
pub const UNKNOWN_ICON: &str = "unknown";

/// Description shown for codes missing from the table.
pub const UNKNOWN_DESCRIPTION: &str = "Unknown";

/// One row of the weather code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherCode {
    pub code: i32,
    pub icon: &'static str,
    pub description: &'static str,
}

const fn row(code: i32, icon: &'static str, description: &'static str) -> WeatherCode {
    WeatherCode {
        code,
        icon,
        description,
    }
}

pub static WEATHER_CODES: &[WeatherCode] = &[
    row(0, "sun", "Clear sky"),
    row(1, "sun", "Mainly clear"),
    row(2, "cloud_sun", "Partly cloudy"),
    row(3, "cloud", "Overcast"),
    row(45, "cloud_fog", "Fog"),
    row(48, "cloud_fog", "Depositing rime fog"),
    row(51, "cloud_drizzle", "Light drizzle"),
    row(53, "cloud_rain", "Moderate drizzle"),
    row(55, "cloud_rain", "Dense drizzle"),
    row(56, "cloud_rain", "Light freezing drizzle"),
    row(57, "cloud_rain", "Dense freezing drizzle"),
    row(61, "cloud_rain", "Slight rain"),
    row(63, "cloud_rain", "Moderate rain"),
    row(65, "cloud_showers_heavy", "Heavy rain"),
    row(66, "cloud_rain", "Light freezing rain"),
    row(67, "cloud_rain", "Heavy freezing rain"),
    row(71, "snowflake", "Slight snowfall"),
    row(73, "snowflake", "Moderate snowfall"),
    row(75, "snowflake", "Heavy snowfall"),
    row(77, "cloud_hail", "Snow grains"),
    row(80, "cloud_rain", "Slight rain showers"),
    row(81, "cloud_rain", "Moderate rain showers"),
    row(82, "cloud_showers_heavy", "Violent rain showers"),
    row(85, "snowflake", "Slight snow showers"),
    row(86, "snowflake", "Heavy snow showers"),
    row(95, "cloud_lightning", "Thunderstorm"),
    row(96, "cloud_lightning", "Thunderstorm with slight hail"),
    row(99, "cloud_lightning", "Thunderstorm with heavy hail"),
];

pub fn lookup(code: i32) -> Option<&'static WeatherCode> {
    WEATHER_CODES.iter().find(|entry| entry.code == code)
}

/// Icon identifier for a WMO code; never fails.
pub fn icon_for_code(code: i32) -> &'static str {
    lookup(code).map_or(UNKNOWN_ICON, |entry| entry.icon)
}

pub fn describe_code(code: i32) -> &'static str {
    lookup(code).map_or(UNKNOWN_DESCRIPTION, |entry| entry.description)
}
