//! Hub publish adapter.
//!
//! Publishes report files as shared content items on the external hub,
//! keyed by a per-extension content name so multi-format exports of the
//! same report live on distinct entries.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use courier_core::model::settings::{DistributeMode, HubSettings};
use courier_core::model::{DeliveryResult, Report, ResultFields};
use courier_core::traits::{CatalogSession, ContentTag, ContentUpload, HubContent};
use courier_core::{AppError, AppResult};

use crate::name::{hub_content_name, target_filename};
use crate::TaskContext;

/// Tag attached to every content item published by this service.
const PUBLISHER_TAG: &str = "courier";

/// Description attached to created content items.
const CONTENT_DESCRIPTION: &str = "Created by Report Courier";

/// Publishes report files to the hub.
#[derive(Debug, Clone, Copy, Default)]
pub struct HubSink;

impl HubSink {
    /// Publish every output path of a report as shared content.
    ///
    /// `purged_owners` records which delete-all-first scopes have already
    /// been purged during this run; the purge runs at most once per scope
    /// no matter how many reports target it.
    pub async fn deliver(
        ctx: &TaskContext,
        report: &Report,
        settings: &HubSettings,
        session: &Arc<dyn CatalogSession>,
        purged_owners: &mut HashSet<String>,
    ) -> Vec<DeliveryResult> {
        let report_name = report.name.trim();
        if report_name.is_empty() {
            return vec![Self::error_result(ctx, "", "The report has no filename.")];
        }

        let owner = settings
            .owner
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty());

        if let Some(owner) = owner {
            // The owner must resolve to exactly one directory user.
            if let Err(err) = session.lookup_user_id(owner).await {
                warn!("The delivery via 'hub' failed: {err}");
                return vec![Self::error_result(ctx, report_name, err.message)];
            }
        }

        if settings.mode == DistributeMode::DeleteAllFirst {
            let scope = owner.unwrap_or_default().to_string();
            if purged_owners.insert(scope.clone()) {
                if let Err(err) = Self::purge_scope(session, owner).await {
                    warn!("The hub purge for scope '{scope}' failed: {err}");
                    return vec![Self::error_result(ctx, report_name, err.message)];
                }
            } else {
                debug!("Hub scope '{scope}' was already purged in this run");
            }
        }

        let mut results = Vec::with_capacity(report.paths.len());
        let multiple = report.paths.len() > 1;
        for (index, path) in report.paths.iter().enumerate() {
            let ordinal = multiple.then_some(index + 1);
            let filename = target_filename(report_name, path, ordinal);
            match Self::publish_one(report, path, report_name, &filename, settings, owner, session)
                .await
            {
                Ok((link, full_link)) => {
                    info!("Report '{report_name}' was published as '{filename}'");
                    results.push(DeliveryResult::Hub {
                        common: ResultFields::ok(
                            &ctx.task_name,
                            report_name,
                            &ctx.report_state,
                            "Report was successfully published.",
                        ),
                        link: Some(link),
                        full_link: Some(full_link),
                    });
                }
                Err(err) => {
                    warn!("The delivery via 'hub' failed: {err}");
                    results.push(Self::error_result(ctx, report_name, err.message));
                }
            }
        }
        results
    }

    /// Delete every content item in one delete-all-first scope.
    ///
    /// A configured owner scopes the purge to that owner's items; without
    /// an owner only items carrying the publisher tag are removed.
    async fn purge_scope(
        session: &Arc<dyn CatalogSession>,
        owner: Option<&str>,
    ) -> AppResult<()> {
        let contents = session.list_all().await?;
        let mut deleted = 0usize;
        for content in contents {
            let in_scope = match owner {
                Some(owner) => content.owner.as_deref() == Some(owner),
                None => content.tags.iter().any(|t| t.name == PUBLISHER_TAG),
            };
            if in_scope {
                session.delete(content.id).await?;
                deleted += 1;
            }
        }
        info!("Purged {deleted} hub content item(s) before delivery");
        Ok(())
    }

    /// Publish one file and return its `(link, full_link)` pair.
    #[allow(clippy::too_many_arguments)]
    async fn publish_one(
        report: &Report,
        path: &str,
        report_name: &str,
        filename: &str,
        settings: &HubSettings,
        owner: Option<&str>,
        session: &Arc<dyn CatalogSession>,
    ) -> AppResult<(String, String)> {
        let file_data = report
            .file_data(path)
            .ok_or_else(|| AppError::not_found(format!("No file data for path '{path}' found.")))?;

        let content_name = hub_content_name(report_name, filename);
        let existing = session.find(&content_name, owner).await?;

        let now = Utc::now();
        let upload = ContentUpload {
            name: content_name.clone(),
            description: CONTENT_DESCRIPTION.to_string(),
            shared_content_type: settings.shared_content_type.clone(),
            content_type: Self::content_type(filename),
            external_path: filename.to_string(),
            data: file_data.data.clone(),
            tags: vec![ContentTag {
                name: PUBLISHER_TAG.to_string(),
                created: now,
                modified: now,
            }],
        };

        let content = match settings.mode {
            // Once the scope is purged, delete-all-first behaves create-only:
            // a second hit on the same content name is a conflict.
            DistributeMode::CreateOnly | DistributeMode::DeleteAllFirst
                if !existing.is_empty() =>
            {
                return Err(AppError::storage(format!(
                    "The hub content '{content_name}' already exists."
                )));
            }
            DistributeMode::Override if !existing.is_empty() => {
                // Update refreshes the payload and the tag timestamps.
                session.update(existing[0].id, upload).await?
            }
            _ => session.create(upload).await?,
        };

        // Ownership is reassigned after create and update alike.
        let content = if let Some(owner) = owner {
            session.change_owner(content.id, owner).await?
        } else {
            content
        };

        Self::resolve_link(session, &content, &content_name, filename, owner).await
    }

    /// Re-fetch the published item and extract the download link for the
    /// uploaded file.
    async fn resolve_link(
        session: &Arc<dyn CatalogSession>,
        content: &HubContent,
        content_name: &str,
        filename: &str,
        owner: Option<&str>,
    ) -> AppResult<(String, String)> {
        // The upload response may not carry references yet.
        let refreshed = if content.references.is_empty() {
            session
                .find(content_name, owner)
                .await?
                .into_iter()
                .find(|c| c.id == content.id)
                .unwrap_or_else(|| content.clone())
        } else {
            content.clone()
        };

        let needle = format!("/{filename}");
        let link = refreshed
            .references
            .iter()
            .find(|r| r.logical_path.replace('+', " ").contains(&needle))
            .map(|r| r.external_path.clone())
            .ok_or_else(|| {
                AppError::external(format!(
                    "No download link for '{filename}' was found. Please check the security rules."
                ))
            })?;
        let full_link = format!("{}{link}", session.base_url());
        Ok((link, full_link))
    }

    /// Content type derived from the file extension.
    fn content_type(filename: &str) -> String {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("octet-stream")
            .to_lowercase();
        format!("application/{ext}")
    }

    fn error_result(
        ctx: &TaskContext,
        report_name: &str,
        message: impl Into<String>,
    ) -> DeliveryResult {
        DeliveryResult::Hub {
            common: ResultFields::error(&ctx.task_name, report_name, message),
            link: None,
            full_link: None,
        }
    }
}
