//! Request type definitions
//!
//! A [`RequestEnvelope`] is an ordered list of [`Operation`]s that the API
//! client sends as one round-trip. Nearly every envelope carries the same
//! handful of auxiliary "side-channel" operations the real game client
//! always bundles; the `with_*` helpers add them in the client's order.

use serde::{Deserialize, Serialize};

/// Platform id sent with config requests
pub const PLATFORM: u32 = 1;

/// Assets fetched while completing the tutorial
pub const TUTORIAL_ASSET_IDS: [&str; 3] = [
    "1a3c2816-65fa-4b97-90eb-0b301c064b7a/1477084786906000",
    "aa8f7687-a022-4773-b900-3a8c170e9aea/1477084794890000",
    "e89109b0-9a54-40fe-8431-12f7826c8194/1477084802881000",
];

/// Locale reported with player requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLocale {
    pub country: String,
    pub language: String,
    pub timezone: String,
}

impl Default for PlayerLocale {
    fn default() -> Self {
        Self {
            country: "US".to_string(),
            language: "en".to_string(),
            timezone: "America/Denver".to_string(),
        }
    }
}

/// Player avatar appearance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAvatar {
    pub hair: u8,
    pub shirt: u8,
    pub pants: u8,
    pub shoes: u8,
    pub avatar: u8,
    pub eyes: u8,
    pub backpack: u8,
}

/// A single named operation inside a request envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    GetPlayer {
        player_locale: PlayerLocale,
    },
    GetPlayerProfile,
    DownloadRemoteConfigVersion {
        platform: u32,
        app_version: u32,
    },
    GetAssetDigest {
        platform: u32,
        app_version: u32,
        paginate: bool,
        page_offset: i64,
        page_timestamp: i64,
    },
    DownloadItemTemplates {
        paginate: bool,
        page_offset: i64,
        page_timestamp: i64,
    },
    CheckChallenge,
    GetHatchedEggs,
    GetInventory {
        last_timestamp_ms: i64,
    },
    CheckAwardedBadges,
    DownloadSettings {
        hash: Option<String>,
    },
    GetBuddyWalked,
    GetInbox {
        is_history: bool,
        is_reverse: bool,
        not_before_ms: i64,
    },
    LevelUpRewards {
        level: u32,
    },
    MarkTutorialComplete {
        tutorials_completed: u32,
    },
    SetAvatar {
        player_avatar: PlayerAvatar,
    },
    GetDownloadUrls {
        asset_id: Vec<String>,
    },
    EncounterTutorialComplete {
        pokemon_id: u32,
    },
    ClaimCodename {
        codename: String,
    },
    SetBuddyPokemon {
        pokemon_id: u64,
    },
    FortSearch {
        fort_id: String,
        fort_latitude: f64,
        fort_longitude: f64,
        player_latitude: f64,
        player_longitude: f64,
    },
    Encounter {
        encounter_id: u64,
        spawn_point_id: String,
        player_latitude: f64,
        player_longitude: f64,
    },
}

impl Operation {
    /// Response key the server uses for this operation
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetPlayer { .. } => "GET_PLAYER",
            Self::GetPlayerProfile => "GET_PLAYER_PROFILE",
            Self::DownloadRemoteConfigVersion { .. } => "DOWNLOAD_REMOTE_CONFIG_VERSION",
            Self::GetAssetDigest { .. } => "GET_ASSET_DIGEST",
            Self::DownloadItemTemplates { .. } => "DOWNLOAD_ITEM_TEMPLATES",
            Self::CheckChallenge => "CHECK_CHALLENGE",
            Self::GetHatchedEggs => "GET_HATCHED_EGGS",
            Self::GetInventory { .. } => "GET_INVENTORY",
            Self::CheckAwardedBadges => "CHECK_AWARDED_BADGES",
            Self::DownloadSettings { .. } => "DOWNLOAD_SETTINGS",
            Self::GetBuddyWalked => "GET_BUDDY_WALKED",
            Self::GetInbox { .. } => "GET_INBOX",
            Self::LevelUpRewards { .. } => "LEVEL_UP_REWARDS",
            Self::MarkTutorialComplete { .. } => "MARK_TUTORIAL_COMPLETE",
            Self::SetAvatar { .. } => "SET_AVATAR",
            Self::GetDownloadUrls { .. } => "GET_DOWNLOAD_URLS",
            Self::EncounterTutorialComplete { .. } => "ENCOUNTER_TUTORIAL_COMPLETE",
            Self::ClaimCodename { .. } => "CLAIM_CODENAME",
            Self::SetBuddyPokemon { .. } => "SET_BUDDY_POKEMON",
            Self::FortSearch { .. } => "FORT_SEARCH",
            Self::Encounter { .. } => "ENCOUNTER",
        }
    }

    pub fn get_player() -> Self {
        Self::GetPlayer {
            player_locale: PlayerLocale::default(),
        }
    }

    pub fn mark_tutorial_complete(step: u32) -> Self {
        Self::MarkTutorialComplete {
            tutorials_completed: step,
        }
    }
}

/// Operations sent together in one round-trip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub operations: Vec<Operation>,
}

impl RequestEnvelope {
    /// Create an empty envelope; sending it is a bare keep-alive round-trip
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation
    pub fn with(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Challenge check, hatched eggs, inventory delta and awarded badges
    pub fn with_common_calls(self, last_timestamp_ms: i64) -> Self {
        self.with(Operation::CheckChallenge)
            .with(Operation::GetHatchedEggs)
            .with(Operation::GetInventory { last_timestamp_ms })
            .with(Operation::CheckAwardedBadges)
    }

    /// Common calls followed by a settings download keyed by `hash`
    pub fn with_config_calls(self, last_timestamp_ms: i64, hash: Option<&str>) -> Self {
        self.with_common_calls(last_timestamp_ms)
            .with(Operation::DownloadSettings {
                hash: hash.map(String::from),
            })
    }

    pub fn with_buddy_walked(self) -> Self {
        self.with(Operation::GetBuddyWalked)
    }

    pub fn with_inbox(self) -> Self {
        self.with(Operation::GetInbox {
            is_history: true,
            is_reverse: false,
            not_before_ms: 0,
        })
    }

    /// Side channels bundled with every gameplay action
    pub fn with_gameplay_calls(self, last_timestamp_ms: i64) -> Self {
        self.with_common_calls(last_timestamp_ms)
            .with_buddy_walked()
            .with_inbox()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Names of the bundled operations, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.operations.iter().map(Operation::name).collect()
    }

    /// Whether an operation with the given response key is bundled
    pub fn contains(&self, name: &str) -> bool {
        self.operations.iter().any(|op| op.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_gameplay_bundle_order() {
        let request = RequestEnvelope::new()
            .with(Operation::GetPlayerProfile)
            .with_gameplay_calls(42);

        assert_eq!(
            request.names(),
            vec![
                "GET_PLAYER_PROFILE",
                "CHECK_CHALLENGE",
                "GET_HATCHED_EGGS",
                "GET_INVENTORY",
                "CHECK_AWARDED_BADGES",
                "GET_BUDDY_WALKED",
                "GET_INBOX",
            ]
        );
        assert!(request.operations.contains(&Operation::GetInventory {
            last_timestamp_ms: 42
        }));
    }

    #[test]
    fn test_config_bundle_carries_hash() {
        let request = RequestEnvelope::new().with_config_calls(7, Some("abc"));
        assert_eq!(
            request.operations.last(),
            Some(&Operation::DownloadSettings {
                hash: Some("abc".to_string())
            })
        );
        assert!(!request.contains("GET_BUDDY_WALKED"));
    }

    #[test]
    fn test_operation_serialization() {
        let op = Operation::GetAssetDigest {
            platform: PLATFORM,
            app_version: 5702,
            paginate: true,
            page_offset: 3,
            page_timestamp: 99,
        };

        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["type"], "GET_ASSET_DIGEST");
        assert_eq!(json["page_offset"], 3);
        assert_eq!(json["paginate"], true);
        assert_eq!(op.name(), "GET_ASSET_DIGEST");
    }

    #[test]
    fn test_unit_operation_serialization() {
        let json = serde_json::to_value(Operation::GetPlayerProfile).unwrap();
        assert_eq!(json, serde_json::json!({"type": "GET_PLAYER_PROFILE"}));
    }

    #[test]
    fn test_empty_envelope() {
        let request = RequestEnvelope::new();
        assert!(request.is_empty());
        assert!(request.names().is_empty());
    }
}
