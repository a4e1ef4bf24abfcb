//! Response type definitions
//!
//! A [`Response`] maps each operation name to its typed payload. Payloads
//! are decoded once at the client boundary; session logic only reads these
//! structs. Every payload field is optional on the wire, so missing values
//! decode to their defaults instead of failing the whole response.

use crate::types::serde_helpers::deserialize_flexible_bool;
use serde::{Deserialize, Serialize};

/// Result of one round-trip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Payloads keyed by operation name
    #[serde(default)]
    pub responses: Responses,
}

/// Per-operation payloads of a [`Response`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Responses {
    #[serde(rename = "GET_PLAYER", skip_serializing_if = "Option::is_none")]
    pub get_player: Option<GetPlayerResponse>,

    #[serde(rename = "GET_INVENTORY", skip_serializing_if = "Option::is_none")]
    pub get_inventory: Option<GetInventoryResponse>,

    #[serde(
        rename = "DOWNLOAD_REMOTE_CONFIG_VERSION",
        skip_serializing_if = "Option::is_none"
    )]
    pub download_remote_config_version: Option<RemoteConfigVersionResponse>,

    #[serde(rename = "DOWNLOAD_SETTINGS", skip_serializing_if = "Option::is_none")]
    pub download_settings: Option<DownloadSettingsResponse>,

    #[serde(rename = "GET_ASSET_DIGEST", skip_serializing_if = "Option::is_none")]
    pub get_asset_digest: Option<PageResponse>,

    #[serde(
        rename = "DOWNLOAD_ITEM_TEMPLATES",
        skip_serializing_if = "Option::is_none"
    )]
    pub download_item_templates: Option<PageResponse>,

    #[serde(rename = "CHECK_CHALLENGE", skip_serializing_if = "Option::is_none")]
    pub check_challenge: Option<CheckChallengeResponse>,

    #[serde(rename = "FORT_SEARCH", skip_serializing_if = "Option::is_none")]
    pub fort_search: Option<FortSearchResponse>,

    /// Encounter details are handed to the caller untouched
    #[serde(rename = "ENCOUNTER", skip_serializing_if = "Option::is_none")]
    pub encounter: Option<serde_json::Value>,
}

/// GET_PLAYER payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetPlayerResponse {
    pub player_data: Option<PlayerData>,
    #[serde(deserialize_with = "deserialize_flexible_bool")]
    pub warn: bool,
    #[serde(deserialize_with = "deserialize_flexible_bool")]
    pub banned: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerData {
    pub username: Option<String>,
    pub tutorial_state: Vec<u32>,
}

/// GET_INVENTORY payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetInventoryResponse {
    pub inventory_delta: InventoryDelta,
}

/// Inventory changes since the requested timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryDelta {
    pub new_timestamp_ms: Option<i64>,
    pub inventory_items: Vec<InventoryItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryItem {
    pub inventory_item_data: InventoryItemData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryItemData {
    pub player_stats: Option<PlayerStats>,
    pub pokemon_data: Option<PokemonData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub level: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PokemonData {
    /// Creature instance id
    pub id: Option<u64>,
    pub pokemon_id: Option<u32>,
}

/// DOWNLOAD_REMOTE_CONFIG_VERSION payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfigVersionResponse {
    pub asset_digest_timestamp_ms: Option<i64>,
    pub item_templates_timestamp_ms: Option<i64>,
}

/// DOWNLOAD_SETTINGS payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettingsResponse {
    pub hash: Option<String>,
}

/// One page of GET_ASSET_DIGEST or DOWNLOAD_ITEM_TEMPLATES
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageResponse {
    pub result: i32,
    pub page_offset: i64,
    pub timestamp_ms: i64,
}

/// CHECK_CHALLENGE payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckChallengeResponse {
    #[serde(deserialize_with = "deserialize_flexible_bool")]
    pub show_challenge: bool,
    pub challenge_url: String,
}

impl CheckChallengeResponse {
    /// Captcha URL, if the server is actually asking for one.
    ///
    /// The server pads "no challenge" with whitespace, so blank URLs are
    /// treated as absent.
    pub fn challenge(&self) -> Option<&str> {
        let url = self.challenge_url.trim();
        (!url.is_empty()).then_some(url)
    }
}

/// FORT_SEARCH payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FortSearchResponse {
    pub result: i32,
}

impl Response {
    /// Inventory delta of this response, if it carried one
    pub fn inventory_delta(&self) -> Option<&InventoryDelta> {
        self.responses
            .get_inventory
            .as_ref()
            .map(|inventory| &inventory.inventory_delta)
    }

    /// Captcha URL requested by this response, if any
    pub fn challenge_url(&self) -> Option<&str> {
        self.responses
            .check_challenge
            .as_ref()
            .and_then(CheckChallengeResponse::challenge)
    }
}
