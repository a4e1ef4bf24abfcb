//! Account state extraction from responses
//!
//! These functions are the only writers of account fields during a session.
//! Level and the inventory timestamp only move forward, and the moderation
//! flags only ever switch on, so applying the same response twice or
//! applying responses out of order leaves the account in the same state.

use crate::types::response::InventoryDelta;
use crate::types::{Account, RemoteConfig, Response, TutorialState};
use crate::{Error, Result};
use tracing::debug;

/// Merge the inventory delta of `response` into `account`
pub fn merge_inventory(account: &mut Account, response: &Response) {
    let Some(delta) = response.inventory_delta() else {
        return;
    };

    if let Some(timestamp) = delta.new_timestamp_ms
        && timestamp > account.last_timestamp_ms
    {
        account.last_timestamp_ms = timestamp;
    }

    if let Some(level) = player_level(delta)
        && level > account.level
    {
        debug!(
            "Account {} reached level {} (was {})",
            account.username, level, account.level
        );
        account.level = level;
    }
}

/// Merge the GET_PLAYER payload of `response` into `account`
pub fn merge_player(account: &mut Account, response: &Response) {
    let Some(player) = &response.responses.get_player else {
        return;
    };

    if let Some(data) = &player.player_data {
        account.tutorial_state = data.tutorial_state.iter().copied().collect::<TutorialState>();
    }
    if player.warn {
        account.warned = true;
    }
    if player.banned {
        account.banned = true;
    }
}

/// Merge everything a response can tell about the account
pub fn merge_response(account: &mut Account, response: &Response) {
    merge_inventory(account, response);
    merge_player(account, response);
}

/// Level from the first player stats entry of the delta.
///
/// A stats entry without a level counts as level 1.
pub fn player_level(delta: &InventoryDelta) -> Option<u32> {
    delta
        .inventory_items
        .iter()
        .find_map(|item| item.inventory_item_data.player_stats.as_ref())
        .map(|stats| stats.level.unwrap_or(1))
}

/// Parse the remote config fingerprint carried by `response`.
///
/// Returns `Ok(None)` when the response has no remote config version. A
/// version without a settings hash is a protocol error.
pub fn parse_remote_config(response: &Response) -> Result<Option<RemoteConfig>> {
    let Some(version) = &response.responses.download_remote_config_version else {
        return Ok(None);
    };

    let hash = response
        .responses
        .download_settings
        .as_ref()
        .and_then(|settings| settings.hash.clone())
        .ok_or_else(|| Error::protocol("DOWNLOAD_SETTINGS hash missing from remote config response"))?;

    Ok(Some(RemoteConfig {
        hash,
        asset_time: version.asset_digest_timestamp_ms.unwrap_or(0) as f64 / 1_000_000.0,
        template_time: version.item_templates_timestamp_ms.unwrap_or(0) as f64 / 1_000.0,
    }))
}

/// Instance id of the last creature in the response's inventory
pub fn starter_creature_id(response: &Response) -> Option<u64> {
    response.inventory_delta().and_then(|delta| {
        delta
            .inventory_items
            .iter()
            .filter_map(|item| item.inventory_item_data.pokemon_data.as_ref())
            .filter_map(|pokemon| pokemon.id)
            .filter(|&id| id != 0)
            .last()
    })
}
