//! Remote configuration synchronization
//!
//! After login the game client checks the remote config version and, when
//! the asset digest or the item templates moved forward, downloads them page
//! by page. The new config fingerprint is staged while that happens and only
//! committed to the account once every download finished, so a failed sync
//! leaves the previous fingerprint in place and the next login starts over.

use crate::session::client::ApiClient;
use crate::session::merge;
use crate::session::pacing::{self, BurstPacer, Pacer};
use crate::types::request::PLATFORM;
use crate::types::{Account, Operation, PageResponse, RequestEnvelope, Response};
use crate::{Error, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one page of a continuation download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageResult {
    /// The server has more pages
    MorePages,
    /// This was the last page
    Done,
    /// A code this client does not understand; ends the download
    Unknown(i32),
}

impl PageResult {
    pub fn from_code(code: i32) -> Self {
        match code {
            2 => Self::MorePages,
            1 => Self::Done,
            other => Self::Unknown(other),
        }
    }
}

/// Which paginated download to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    AssetDigest,
    ItemTemplates,
}

impl PageKind {
    /// Response key of the page operation
    pub fn name(&self) -> &'static str {
        match self {
            Self::AssetDigest => "GET_ASSET_DIGEST",
            Self::ItemTemplates => "DOWNLOAD_ITEM_TEMPLATES",
        }
    }

    fn stage(&self) -> &'static str {
        match self {
            Self::AssetDigest => "asset digest download",
            Self::ItemTemplates => "item templates download",
        }
    }

    fn operation(&self, app_version: u32, cursor: &PaginationCursor) -> Operation {
        match self {
            Self::AssetDigest => Operation::GetAssetDigest {
                platform: PLATFORM,
                app_version,
                paginate: true,
                page_offset: cursor.offset,
                page_timestamp: cursor.timestamp_ms,
            },
            Self::ItemTemplates => Operation::DownloadItemTemplates {
                paginate: true,
                page_offset: cursor.offset,
                page_timestamp: cursor.timestamp_ms,
            },
        }
    }

    fn page<'a>(&self, response: &'a Response) -> Option<&'a PageResponse> {
        match self {
            Self::AssetDigest => response.responses.get_asset_digest.as_ref(),
            Self::ItemTemplates => response.responses.download_item_templates.as_ref(),
        }
    }
}

/// Position within a continuation download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    pub offset: i64,
    pub timestamp_ms: i64,
    pub result: PageResult,
    /// Pages requested so far
    pub request_count: u32,
}

impl PaginationCursor {
    pub fn new() -> Self {
        Self {
            offset: 0,
            timestamp_ms: 0,
            result: PageResult::MorePages,
            request_count: 0,
        }
    }

    /// Move to the position named by `page`
    pub fn advance(&mut self, page: &PageResponse) {
        self.result = PageResult::from_code(page.result);
        self.offset = page.page_offset;
        self.timestamp_ms = page.timestamp_ms;
    }

    pub fn has_more(&self) -> bool {
        self.result == PageResult::MorePages
    }
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Pages downloaded by one sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub asset_pages: u32,
    pub template_pages: u32,
}

/// Brings an account's remote config fingerprint up to date
#[derive(Debug)]
pub struct ConfigSyncEngine<C: ApiClient + ?Sized> {
    client: Arc<C>,
    pacer: Pacer,
    app_version: u32,
    max_pages: u32,
}

impl<C: ApiClient + ?Sized> ConfigSyncEngine<C> {
    pub fn new(client: Arc<C>, pacer: Pacer, app_version: u32, max_pages: u32) -> Self {
        Self {
            client,
            pacer,
            app_version,
            max_pages,
        }
    }

    /// Check the remote config version and download whatever changed.
    ///
    /// `account.remote_config` is replaced only when every download
    /// succeeded.
    pub async fn sync_remote_config(&self, account: &mut Account) -> Result<SyncReport> {
        let request = RequestEnvelope::new()
            .with(Operation::DownloadRemoteConfigVersion {
                platform: PLATFORM,
                app_version: self.app_version,
            })
            .with_config_calls(account.last_timestamp_ms, account.config_hash());

        let response = self
            .pacer
            .run(self.client.call(request))
            .await
            .map_err(|e| Error::sequence("remote config version", e))?;
        merge::merge_response(account, &response);

        let staged = merge::parse_remote_config(&response)
            .map_err(|e| Error::sequence("remote config version", e))?;
        self.pacer.pause(pacing::AFTER_REMOTE_CONFIG).await?;

        let Some(staged) = staged else {
            debug!(
                "No remote config version for account {}, keeping the previous one.",
                account.username
            );
            return Ok(SyncReport::default());
        };

        let (old_asset_time, old_template_time) = account
            .remote_config
            .as_ref()
            .map_or((0.0, 0.0), |config| (config.asset_time, config.template_time));

        let mut report = SyncReport::default();

        if staged.asset_time > old_asset_time {
            self.pacer.pause(pacing::BEFORE_ASSET_DIGEST).await?;
            report.asset_pages = self
                .download(account, PageKind::AssetDigest, &staged.hash)
                .await?;
        }

        if staged.template_time > old_template_time {
            report.template_pages = self
                .download(account, PageKind::ItemTemplates, &staged.hash)
                .await?;
        }

        info!(
            "Remote config of account {} is up to date ({} asset pages, {} template pages).",
            account.username, report.asset_pages, report.template_pages
        );
        account.remote_config = Some(staged);

        Ok(report)
    }

    /// Run one continuation download and return the number of pages requested
    async fn download(&self, account: &mut Account, kind: PageKind, hash: &str) -> Result<u32> {
        let mut cursor = PaginationCursor::new();
        let mut burst = BurstPacer::new();

        while cursor.has_more() {
            if cursor.request_count >= self.max_pages {
                return Err(Error::PaginationExhausted {
                    operation: kind.name().to_string(),
                    pages: cursor.request_count,
                });
            }

            let request = RequestEnvelope::new()
                .with(kind.operation(self.app_version, &cursor))
                .with_config_calls(account.last_timestamp_ms, Some(hash));

            let response = self
                .pacer
                .run(self.client.call(request))
                .await
                .map_err(|e| Error::sequence(kind.stage(), e))?;
            merge::merge_inventory(account, &response);
            cursor.request_count += 1;

            self.pacer.pause_all(burst.next_pauses()).await?;

            let page = kind.page(&response).ok_or_else(|| {
                Error::sequence(
                    kind.stage(),
                    Error::protocol(format!("{} missing from page response", kind.name())),
                )
            })?;
            cursor.advance(page);

            if let PageResult::Unknown(code) = cursor.result {
                warn!(
                    "Unexpected {} result {} after {} pages, stopping.",
                    kind.name(),
                    code,
                    cursor.request_count
                );
            }
        }

        debug!(
            "{} finished after {} pages.",
            kind.name(),
            cursor.request_count
        );
        Ok(cursor.request_count)
    }
}
