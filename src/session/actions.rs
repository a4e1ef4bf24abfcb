//! Gameplay requests available once a session is ready

use crate::session::client::ApiClient;
use crate::session::merge;
use crate::session::pacing::{self, Pacer};
use crate::types::{Account, Fort, FortKind, Location, Operation, RequestEnvelope, Response};
use crate::utils::geo;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{debug, error};

/// Furthest a player may stand from a point of interest to spin it, in degrees
pub const SPIN_RADIUS: f64 = 0.04;

/// What happened when spinning a point of interest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpinOutcome {
    Success,
    /// Too far away; `server_confirmed` is false when the spin was never sent
    OutOfRange { server_confirmed: bool },
    AlreadySpunRecently,
    InventoryFull,
    DailyLimitReached,
    Unknown(i32),
    /// Automated play must stop until the captcha is solved
    ChallengeRequired { url: String },
    /// The request itself failed; the caller may try again later
    RequestFailed(String),
}

impl SpinOutcome {
    /// Map a FORT_SEARCH result code
    pub fn from_result_code(code: i32) -> Self {
        match code {
            1 => Self::Success,
            2 => Self::OutOfRange {
                server_confirmed: true,
            },
            3 => Self::AlreadySpunRecently,
            4 => Self::InventoryFull,
            5 => Self::DailyLimitReached,
            other => Self::Unknown(other),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Builds and sends gameplay requests for a logged-in account
#[derive(Debug)]
pub struct GameplayActions<C: ApiClient + ?Sized> {
    client: Arc<C>,
    pacer: Pacer,
}

impl<C: ApiClient + ?Sized> GameplayActions<C> {
    pub fn new(client: Arc<C>, pacer: Pacer) -> Self {
        Self { client, pacer }
    }

    /// Spin `fort` from `player`.
    ///
    /// Never fails: request errors are reported as
    /// [`SpinOutcome::RequestFailed`] so scanning can go on.
    pub async fn spin_point_of_interest(
        &self,
        account: &mut Account,
        fort: &Fort,
        player: Location,
    ) -> SpinOutcome {
        if !geo::in_radius(fort.location(), player, SPIN_RADIUS) {
            debug!("Pokestop {} is out of spinning range.", fort.id);
            return SpinOutcome::OutOfRange {
                server_confirmed: false,
            };
        }

        debug!("Attempt to spin Pokestop (ID {})", fort.id);
        let response = match self.spin_request(account, fort, player).await {
            Ok(response) => response,
            Err(e) => {
                error!("Exception while spinning Pokestop: {}.", e);
                return SpinOutcome::RequestFailed(e.to_string());
            }
        };
        let outcome = Self::spin_outcome(account, &response);

        // The server already answered; a cancelled pause must not hide that
        if let Err(e) = self.pacer.pause(pacing::AFTER_SPIN).await {
            debug!("Skipped the pause after spinning Pokestop {}: {}.", fort.id, e);
        }
        outcome
    }

    fn spin_outcome(account: &Account, response: &Response) -> SpinOutcome {
        if let Some(url) = response.challenge_url() {
            debug!("Account {} encountered a reCaptcha.", account.username);
            return SpinOutcome::ChallengeRequired {
                url: url.to_string(),
            };
        }

        let code = response
            .responses
            .fort_search
            .as_ref()
            .map_or(0, |search| search.result);
        let outcome = SpinOutcome::from_result_code(code);
        match &outcome {
            SpinOutcome::Success => debug!("Successful Pokestop spin."),
            SpinOutcome::OutOfRange { .. } => debug!("Pokestop was not in range to spin."),
            SpinOutcome::AlreadySpunRecently => {
                debug!("Failed to spin Pokestop. Has recently been spun.")
            }
            SpinOutcome::InventoryFull => debug!("Failed to spin Pokestop. Inventory is full."),
            SpinOutcome::DailyLimitReached => {
                debug!("Maximum number of Pokestops spun for this day.")
            }
            other => debug!("Failed to spin a Pokestop. Unknown result {:?}.", other),
        }
        outcome
    }

    async fn spin_request(&self, account: &mut Account, fort: &Fort, player: Location) -> Result<Response> {
        self.pacer.pause(pacing::BEFORE_SPIN).await?;

        let request = RequestEnvelope::new()
            .with(Operation::FortSearch {
                fort_id: fort.id.clone(),
                fort_latitude: fort.latitude,
                fort_longitude: fort.longitude,
                player_latitude: player.latitude,
                player_longitude: player.longitude,
            })
            .with_gameplay_calls(account.last_timestamp_ms);
        let response = self.pacer.run(self.client.call(request)).await?;
        merge::merge_inventory(account, &response);
        Ok(response)
    }

    /// Encounter a creature at `spawn_point_id`.
    ///
    /// Proximity is the caller's responsibility.
    pub async fn encounter_creature(
        &self,
        account: &mut Account,
        encounter_id: u64,
        spawn_point_id: &str,
        location: Location,
    ) -> Result<Response> {
        let request = RequestEnvelope::new()
            .with(Operation::Encounter {
                encounter_id,
                spawn_point_id: spawn_point_id.to_string(),
                player_latitude: location.latitude,
                player_longitude: location.longitude,
            })
            .with_gameplay_calls(account.last_timestamp_ms);

        match self.pacer.run(self.client.call(request)).await {
            Ok(response) => {
                merge::merge_inventory(account, &response);
                Ok(response)
            }
            Err(e) => {
                error!("Exception while encountering Pokémon: {}.", e);
                Err(Error::request(e.to_string()))
            }
        }
    }

    /// Spin pokestops until one succeeds, which levels a fresh account up.
    ///
    /// Accounts above level 1 are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChallengeRequired`] as soon as a spin is answered
    /// with a captcha; no further pokestops are tried.
    pub async fn level_up_spin(
        &self,
        account: &mut Account,
        forts: &[Fort],
        player: Location,
    ) -> Result<bool> {
        if account.level > 1 {
            debug!(
                "No need to spin a Pokestop. Account {} is already level {}.",
                account.username, account.level
            );
            return Ok(false);
        }

        debug!("Spinning Pokestop for account {}.", account.username);
        for fort in forts.iter().filter(|fort| fort.kind == FortKind::Pokestop) {
            match self.spin_point_of_interest(account, fort, player).await {
                SpinOutcome::Success => {
                    debug!(
                        "Account {} successfully spun a Pokestop after completed tutorial.",
                        account.username
                    );
                    return Ok(true);
                }
                SpinOutcome::ChallengeRequired { url } => {
                    return Err(Error::ChallengeRequired { url });
                }
                _ => {}
            }
        }
        Ok(false)
    }
}
