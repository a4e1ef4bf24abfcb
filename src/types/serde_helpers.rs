//! Custom serde deserializers for flexible type handling
//!
//! Provides custom deserializers for the loosely typed flags servers and
//! mock servers send in responses.

use serde::{Deserialize, Deserializer, de};

/// Deserialize a flag that can be:
/// - JSON boolean: `true`, `false`
/// - Integer: `0` (false), any positive integer (true, negative integers treated as false)
/// - String: `"0"`, `"1"`, `"false"`, `"true"` (case-insensitive)
/// - `null` (false)
///
/// Moderation flags such as `warn` and `banned` arrive as 0/1 from some
/// servers and as booleans from others.
pub fn deserialize_flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlexibleBool {
        Bool(bool),
        Int(i64),
        String(String),
    }

    let value: Option<FlexibleBool> = Option::deserialize(deserializer)?;

    match value {
        None => Ok(false),
        Some(FlexibleBool::Bool(b)) => Ok(b),
        Some(FlexibleBool::Int(i)) => Ok(i > 0),
        Some(FlexibleBool::String(s)) => {
            let s_lower = s.trim().to_lowercase();
            match s_lower.as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(de::Error::custom(format!("invalid boolean string: {}", s))),
            }
        }
    }
}
