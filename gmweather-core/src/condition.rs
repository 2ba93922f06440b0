//! Upstream weather-condition codes and the fixed target vocabulary.

use serde::{Deserialize, Serialize};

/// Fixed condition vocabulary consumed by presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetCondition {
    #[serde(rename = "sunny")]
    Sunny,
    #[serde(rename = "clear-night")]
    ClearNight,
    #[serde(rename = "partlycloudy")]
    PartlyCloudy,
    #[serde(rename = "cloudy")]
    Cloudy,
    #[serde(rename = "fog")]
    Fog,
    #[serde(rename = "rainy")]
    Rainy,
    #[serde(rename = "pouring")]
    Pouring,
    #[serde(rename = "snowy")]
    Snowy,
    #[serde(rename = "snowy-rainy")]
    SnowyRainy,
    #[serde(rename = "hail")]
    Hail,
    #[serde(rename = "lightning")]
    Lightning,
    #[serde(rename = "lightning-rainy")]
    LightningRainy,
    #[serde(rename = "windy")]
    Windy,
    #[serde(rename = "windy-variant")]
    WindyVariant,
    #[serde(rename = "exceptional")]
    Exceptional,
}

impl TargetCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetCondition::Sunny => "sunny",
            TargetCondition::ClearNight => "clear-night",
            TargetCondition::PartlyCloudy => "partlycloudy",
            TargetCondition::Cloudy => "cloudy",
            TargetCondition::Fog => "fog",
            TargetCondition::Rainy => "rainy",
            TargetCondition::Pouring => "pouring",
            TargetCondition::Snowy => "snowy",
            TargetCondition::SnowyRainy => "snowy-rainy",
            TargetCondition::Hail => "hail",
            TargetCondition::Lightning => "lightning",
            TargetCondition::LightningRainy => "lightning-rainy",
            TargetCondition::Windy => "windy",
            TargetCondition::WindyVariant => "windy-variant",
            TargetCondition::Exceptional => "exceptional",
        }
    }

    pub const fn all() -> &'static [TargetCondition] {
        &[
            TargetCondition::Sunny,
            TargetCondition::ClearNight,
            TargetCondition::PartlyCloudy,
            TargetCondition::Cloudy,
            TargetCondition::Fog,
            TargetCondition::Rainy,
            TargetCondition::Pouring,
            TargetCondition::Snowy,
            TargetCondition::SnowyRainy,
            TargetCondition::Hail,
            TargetCondition::Lightning,
            TargetCondition::LightningRainy,
            TargetCondition::Windy,
            TargetCondition::WindyVariant,
            TargetCondition::Exceptional,
        ]
    }
}

impl std::fmt::Display for TargetCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code used when a record carries no condition at all.
pub const DEFAULT_CONDITION_CODE: &str = "CLEAR";

/// Result for codes missing from [`CONDITION_TABLE`].
pub const UNKNOWN_CONDITION: TargetCondition = TargetCondition::Sunny;

/// Upstream condition codes and their target condition.
///
/// Covers the current upstream type list plus the legacy codes some
/// responses still carry. `TYPE_UNSPECIFIED` is the only explicit
/// `exceptional`; anything not listed falls back to [`UNKNOWN_CONDITION`].
pub const CONDITION_TABLE: &[(&str, TargetCondition)] = &[
    ("TYPE_UNSPECIFIED", TargetCondition::Exceptional),
    ("CLEAR", TargetCondition::Sunny),
    ("MOSTLY_CLEAR", TargetCondition::Sunny),
    ("PARTLY_CLOUDY", TargetCondition::PartlyCloudy),
    ("MOSTLY_CLOUDY", TargetCondition::Cloudy),
    ("CLOUDY", TargetCondition::Cloudy),
    ("OVERCAST", TargetCondition::Cloudy),
    ("WINDY", TargetCondition::Windy),
    ("WIND_AND_RAIN", TargetCondition::WindyVariant),
    ("FOG", TargetCondition::Fog),
    ("LIGHT_FOG", TargetCondition::Fog),
    ("MIST", TargetCondition::Fog),
    ("DRIZZLE", TargetCondition::Rainy),
    ("LIGHT_RAIN_SHOWERS", TargetCondition::Rainy),
    ("CHANCE_OF_SHOWERS", TargetCondition::Rainy),
    ("SCATTERED_SHOWERS", TargetCondition::Rainy),
    ("RAIN_SHOWERS", TargetCondition::Rainy),
    ("HEAVY_RAIN_SHOWERS", TargetCondition::Pouring),
    ("LIGHT_TO_MODERATE_RAIN", TargetCondition::Rainy),
    ("MODERATE_TO_HEAVY_RAIN", TargetCondition::Pouring),
    ("LIGHT_RAIN", TargetCondition::Rainy),
    ("RAIN", TargetCondition::Rainy),
    ("MODERATE_RAIN", TargetCondition::Rainy),
    ("HEAVY_RAIN", TargetCondition::Pouring),
    ("RAIN_PERIODICALLY_HEAVY", TargetCondition::Pouring),
    ("FREEZING_DRIZZLE", TargetCondition::SnowyRainy),
    ("FREEZING_RAIN", TargetCondition::SnowyRainy),
    ("RAIN_AND_SNOW", TargetCondition::SnowyRainy),
    ("LIGHT_SNOW_SHOWERS", TargetCondition::Snowy),
    ("CHANCE_OF_SNOW_SHOWERS", TargetCondition::Snowy),
    ("SCATTERED_SNOW_SHOWERS", TargetCondition::Snowy),
    ("SNOW_SHOWERS", TargetCondition::Snowy),
    ("HEAVY_SNOW_SHOWERS", TargetCondition::Snowy),
    ("LIGHT_TO_MODERATE_SNOW", TargetCondition::Snowy),
    ("MODERATE_TO_HEAVY_SNOW", TargetCondition::Snowy),
    ("LIGHT_SNOW", TargetCondition::Snowy),
    ("SNOW", TargetCondition::Snowy),
    ("MODERATE_SNOW", TargetCondition::Snowy),
    ("HEAVY_SNOW", TargetCondition::Snowy),
    ("SNOWSTORM", TargetCondition::Snowy),
    ("SNOW_PERIODICALLY_HEAVY", TargetCondition::Snowy),
    ("HEAVY_SNOW_STORM", TargetCondition::Snowy),
    ("BLOWING_SNOW", TargetCondition::Snowy),
    ("BLIZZARD", TargetCondition::Snowy),
    ("ICE_PELLETS", TargetCondition::Hail),
    ("HAIL", TargetCondition::Hail),
    ("HAIL_SHOWERS", TargetCondition::Hail),
    ("THUNDERSTORM", TargetCondition::Lightning),
    ("LIGHT_THUNDERSTORM", TargetCondition::LightningRainy),
    ("THUNDERSHOWER", TargetCondition::LightningRainy),
    ("LIGHT_THUNDERSTORM_RAIN", TargetCondition::LightningRainy),
    ("SCATTERED_THUNDERSTORMS", TargetCondition::LightningRainy),
    ("HEAVY_THUNDERSTORM", TargetCondition::LightningRainy),
];

/// Map an upstream condition code to the target vocabulary. Total: unknown
/// codes yield [`UNKNOWN_CONDITION`].
pub fn map_condition(code: &str) -> TargetCondition {
    CONDITION_TABLE
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, target)| *target)
        .unwrap_or(UNKNOWN_CONDITION)
}

/// Like [`map_condition`], but a `sunny` result at night becomes `clear-night`.
pub fn map_condition_with_daytime(code: &str, is_daytime: bool) -> TargetCondition {
    match map_condition(code) {
        TargetCondition::Sunny if !is_daytime => TargetCondition::ClearNight,
        other => other,
    }
}
