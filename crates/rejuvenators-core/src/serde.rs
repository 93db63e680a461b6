use serde::{Deserialize, Deserializer};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

/// Console filter selects send `""` (or `"all"`) when no value is chosen.
pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_parsed(deserializer)
}

/// Parses a query value with `FromStr`; blank and `"all"` mean absent.
pub fn deserialize_optional_parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    deserialize_optional_filter(deserializer)?
        .map(|s| s.parse().map_err(serde::de::Error::custom))
        .transpose()
}

/// Same as [`deserialize_optional_uuid`] for free-text and enum-like filters.
pub fn deserialize_optional_filter<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "all"))
}

/// For patch fields that can be cleared: absent stays `None` (with
/// `#[serde(default)]`), `null` becomes `Some(None)`.
pub fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::deserialize(deserializer).map(Some)
}
