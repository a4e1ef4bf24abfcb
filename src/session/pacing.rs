//! Human-like pacing between protocol steps
//!
//! Every step of a session waits a randomized interval before or after it
//! talks to the server. [`PacingPolicy`] turns a [`DelayRange`] into a
//! concrete duration; [`Pacer`] sleeps for it while honouring the session's
//! cancellation token.

use crate::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Inclusive range of seconds to wait
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DelayRange {
    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// A range that always yields the same delay
    pub const fn fixed(secs: f64) -> Self {
        Self::new(secs, secs)
    }
}

// Login sequence
pub const LOGIN_SETTLE: DelayRange = DelayRange::new(2.0, 4.0);
pub const AFTER_EMPTY_REQUEST: DelayRange = DelayRange::new(0.43, 0.97);
pub const AFTER_GET_PLAYER: DelayRange = DelayRange::new(0.53, 1.1);
pub const AFTER_REMOTE_CONFIG: DelayRange = DelayRange::new(0.53, 1.1);
pub const BEFORE_ASSET_DIGEST: DelayRange = DelayRange::new(0.7, 1.2);
pub const AFTER_PLAYER_PROFILE: DelayRange = DelayRange::new(0.2, 0.3);
pub const AFTER_LEVEL_UP_REWARDS: DelayRange = DelayRange::new(0.45, 0.7);
pub const AFTER_LOGIN: DelayRange = DelayRange::new(10.0, 20.0);

// Paginated downloads
pub const PAGE_REST: DelayRange = DelayRange::new(1.4, 1.6);
pub const PAGE_SHORT: DelayRange = DelayRange::new(0.3, 0.5);
pub const PAGE_READ: DelayRange = DelayRange::new(0.53, 1.1);

// Tutorial
pub const TUTORIAL_STEP_0: DelayRange = DelayRange::new(1.0, 5.0);
pub const TUTORIAL_AVATAR: DelayRange = DelayRange::new(5.0, 12.0);
pub const TUTORIAL_AFTER_AVATAR: DelayRange = DelayRange::new(0.3, 0.5);
pub const TUTORIAL_PROFILE: DelayRange = DelayRange::new(0.5, 0.6);
pub const TUTORIAL_ASSETS: DelayRange = DelayRange::new(1.0, 1.5);
pub const TUTORIAL_EMPTY_REQUEST: DelayRange = DelayRange::new(1.0, 1.6);
pub const TUTORIAL_STARTER: DelayRange = DelayRange::new(6.0, 13.0);
pub const TUTORIAL_AFTER_STARTER: DelayRange = DelayRange::new(0.5, 0.6);
pub const TUTORIAL_CODENAME: DelayRange = DelayRange::new(5.0, 12.0);
pub const TUTORIAL_AFTER_CODENAME: DelayRange = DelayRange::new(1.0, 1.3);
pub const TUTORIAL_REFRESH_PLAYER: DelayRange = DelayRange::fixed(0.1);
pub const TUTORIAL_STEP_7: DelayRange = DelayRange::new(4.0, 10.0);
pub const TUTORIAL_BUDDY: DelayRange = DelayRange::new(3.0, 5.0);
pub const TUTORIAL_AFTER_BUDDY: DelayRange = DelayRange::new(0.8, 1.8);
pub const TUTORIAL_DONE: DelayRange = DelayRange::new(2.0, 4.0);

// Gameplay
pub const BEFORE_SPIN: DelayRange = DelayRange::new(0.8, 1.8);
pub const AFTER_SPIN: DelayRange = DelayRange::new(2.0, 4.0);

/// Longest single pause; larger samples are clamped to it
pub const MAX_DELAY: Duration = Duration::from_secs(3600);

/// Samples delays from ranges, scaled by a configurable factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingPolicy {
    scale: f64,
}

impl PacingPolicy {
    pub fn new(scale: f64) -> Self {
        Self {
            scale: scale.max(0.0),
        }
    }

    /// A policy that never waits; used by tests and dry runs
    pub fn disabled() -> Self {
        Self::new(0.0)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Sample a delay from `range` using the thread-local generator
    pub fn delay(&self, range: DelayRange) -> Duration {
        self.delay_with(range, &mut rand::rng())
    }

    /// Sample a delay from `range` using `rng`
    pub fn delay_with<R: Rng + ?Sized>(&self, range: DelayRange, rng: &mut R) -> Duration {
        if self.scale == 0.0 {
            return Duration::ZERO;
        }
        let secs = if range.max_secs > range.min_secs {
            rng.random_range(range.min_secs..=range.max_secs)
        } else {
            range.min_secs
        };
        // NaN collapses to zero, overflow and infinity to MAX_DELAY
        Duration::try_from_secs_f64((secs * self.scale).max(0.0))
            .map_or(MAX_DELAY, |delay| delay.min(MAX_DELAY))
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Burst/rest rhythm of paginated downloads.
///
/// Three short pauses are followed by one longer rest. The rhythm starts at
/// a random phase so consecutive downloads do not line up.
#[derive(Debug, Clone)]
pub struct BurstPacer {
    position: u8,
}

impl BurstPacer {
    pub fn new() -> Self {
        Self::starting_at(rand::rng().random_range(0..=3))
    }

    pub fn starting_at(position: u8) -> Self {
        Self { position }
    }

    /// Pauses to take after the next page
    pub fn next_pauses(&mut self) -> &'static [DelayRange] {
        if self.position > 2 {
            self.position = 0;
            &[PAGE_REST]
        } else {
            self.position += 1;
            &[PAGE_SHORT, PAGE_READ]
        }
    }
}

impl Default for BurstPacer {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellable suspension points of one session
#[derive(Debug, Clone)]
pub struct Pacer {
    policy: PacingPolicy,
    cancel: CancellationToken,
}

impl Pacer {
    pub fn new(policy: PacingPolicy, cancel: CancellationToken) -> Self {
        Self { policy, cancel }
    }

    pub fn policy(&self) -> PacingPolicy {
        self.policy
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait a random interval from `range`, or fail with [`Error::Cancelled`]
    pub async fn pause(&self, range: DelayRange) -> Result<()> {
        let delay = self.policy.delay(range);
        if delay.is_zero() {
            return self.check();
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    /// Wait for each range in turn
    pub async fn pause_all(&self, ranges: &[DelayRange]) -> Result<()> {
        for range in ranges {
            self.pause(*range).await?;
        }
        Ok(())
    }

    /// Drive `operation` to completion unless the session is cancelled first
    pub async fn run<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = operation => result,
        }
    }

    fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
