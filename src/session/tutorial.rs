//! Tutorial completion for fresh accounts
//!
//! Accounts cannot scan until the server records tutorial steps 0, 1, 3, 4
//! and 7. [`TutorialSequencer`] plays the missing steps in the order and at
//! the pace of a human player.

use crate::session::client::ApiClient;
use crate::session::merge;
use crate::session::pacing::{self, Pacer};
use crate::types::request::TUTORIAL_ASSET_IDS;
use crate::types::{Account, Operation, PlayerAvatar, RequestEnvelope, Response, TutorialState};
use crate::{Error, Result};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::sync::Arc;
use tracing::debug;

/// Species offered as the tutorial starter
pub const STARTER_SPECIES: [u32; 3] = [1, 4, 7];

/// Pick a random avatar the way a new player would
pub fn random_avatar<R: Rng + ?Sized>(rng: &mut R) -> PlayerAvatar {
    PlayerAvatar {
        hair: rng.random_range(1..=5),
        shirt: rng.random_range(1..=3),
        pants: rng.random_range(1..=2),
        shoes: rng.random_range(1..=6),
        avatar: rng.random_range(0..=1),
        eyes: rng.random_range(1..=4),
        backpack: rng.random_range(1..=5),
    }
}

/// Pick one of the three starter species
pub fn random_starter<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    STARTER_SPECIES.choose(rng).copied().unwrap_or(STARTER_SPECIES[0])
}

/// Drives an account through the missing tutorial steps
#[derive(Debug)]
pub struct TutorialSequencer<C: ApiClient + ?Sized> {
    client: Arc<C>,
    pacer: Pacer,
}

impl<C: ApiClient + ?Sized> TutorialSequencer<C> {
    pub fn new(client: Arc<C>, pacer: Pacer) -> Self {
        Self { client, pacer }
    }

    /// Complete every step missing from `tutorial_state`.
    ///
    /// Steps already recorded are skipped. Every response is merged into
    /// `account`. Returns `true` once the sequence finished.
    pub async fn complete_tutorial(
        &self,
        account: &mut Account,
        tutorial_state: &TutorialState,
    ) -> Result<bool> {
        if !tutorial_state.contains(0) {
            self.pacer.pause(pacing::TUTORIAL_STEP_0).await?;
            debug!("Sending 0 tutorials_completed for {}.", account.username);
            self.send(account, 0, Operation::mark_tutorial_complete(0))
                .await?;
        }

        if !tutorial_state.contains(1) {
            self.pacer.pause(pacing::TUTORIAL_AVATAR).await?;
            let avatar = random_avatar(&mut rand::rng());
            debug!("Sending set random player character request for {}.", account.username);
            self.send(account, 1, Operation::SetAvatar { player_avatar: avatar })
                .await?;

            self.pacer.pause(pacing::TUTORIAL_AFTER_AVATAR).await?;
            debug!("Sending 1 tutorials_completed for {}.", account.username);
            self.send(account, 1, Operation::mark_tutorial_complete(1))
                .await?;
        }

        self.pacer.pause(pacing::TUTORIAL_PROFILE).await?;
        debug!("Fetching player profile for {}...", account.username);
        self.send(account, 2, Operation::GetPlayerProfile).await?;

        let mut starter_id = None;
        if !tutorial_state.contains(3) {
            self.pacer.pause(pacing::TUTORIAL_ASSETS).await?;
            debug!("Grabbing some game assets.");
            let assets = Operation::GetDownloadUrls {
                asset_id: TUTORIAL_ASSET_IDS.iter().map(|id| id.to_string()).collect(),
            };
            self.send(account, 3, assets).await?;

            self.pacer.pause(pacing::TUTORIAL_EMPTY_REQUEST).await?;
            self.call(account, 3, RequestEnvelope::new()).await?;

            self.pacer.pause(pacing::TUTORIAL_STARTER).await?;
            let starter = random_starter(&mut rand::rng());
            debug!("Catching the starter for {}.", account.username);
            self.send(account, 3, Operation::EncounterTutorialComplete { pokemon_id: starter })
                .await?;

            self.pacer.pause(pacing::TUTORIAL_AFTER_STARTER).await?;
            let response = self.send(account, 3, Operation::get_player()).await?;
            starter_id = merge::starter_creature_id(&response);
        }

        if !tutorial_state.contains(4) {
            self.pacer.pause(pacing::TUTORIAL_CODENAME).await?;
            debug!("Claiming codename for {}.", account.username);
            let codename = Operation::ClaimCodename {
                codename: account.username.clone(),
            };
            self.send(account, 4, codename).await?;

            self.pacer.pause(pacing::TUTORIAL_AFTER_CODENAME).await?;
            debug!("Sending 4 tutorials_completed for {}.", account.username);
            self.send(account, 4, Operation::mark_tutorial_complete(4))
                .await?;

            self.pacer.pause(pacing::TUTORIAL_REFRESH_PLAYER).await?;
            self.send(account, 4, Operation::get_player()).await?;
        }

        if !tutorial_state.contains(7) {
            self.pacer.pause(pacing::TUTORIAL_STEP_7).await?;
            debug!("Sending 7 tutorials_completed for {}.", account.username);
            self.send(account, 7, Operation::mark_tutorial_complete(7))
                .await?;
        }

        if let Some(pokemon_id) = starter_id {
            self.pacer.pause(pacing::TUTORIAL_BUDDY).await?;
            debug!("Setting buddy pokemon for {}.", account.username);
            self.send(account, 7, Operation::SetBuddyPokemon { pokemon_id })
                .await?;
            self.pacer.pause(pacing::TUTORIAL_AFTER_BUDDY).await?;
        }

        debug!(
            "And {} is done. Wait for a second, to avoid throttle.",
            account.username
        );
        self.pacer.pause(pacing::TUTORIAL_DONE).await?;
        Ok(true)
    }

    async fn send(&self, account: &mut Account, step: u32, operation: Operation) -> Result<Response> {
        self.call(account, step, RequestEnvelope::new().with(operation))
            .await
    }

    async fn call(&self, account: &mut Account, step: u32, request: RequestEnvelope) -> Result<Response> {
        let response = self
            .pacer
            .run(self.client.call(request))
            .await
            .map_err(|e| Error::sequence(format!("tutorial step {}", step), e))?;
        merge::merge_response(account, &response);
        Ok(response)
    }
}
