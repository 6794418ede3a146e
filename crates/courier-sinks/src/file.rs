//! File-system / network-share copy adapter.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info, warn};

use courier_core::model::settings::{DistributeMode, FileSettings};
use courier_core::model::{DeliveryResult, Report, ResultFields};
use courier_core::traits::CatalogSession;
use courier_core::{AppError, AppResult};

use crate::name::target_filename;
use crate::TaskContext;

/// Copies report files to a (library-path resolved) target directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSink;

impl FileSink {
    /// Deliver every output path of a report to the configured target.
    ///
    /// `session` is the leased catalog connection used to resolve
    /// `lib://` targets; `path_cache` maps already-resolved targets for
    /// the duration of one run. The caller releases the lease.
    pub async fn deliver(
        ctx: &TaskContext,
        report: &Report,
        settings: &FileSettings,
        session: Option<&Arc<dyn CatalogSession>>,
        path_cache: &mut HashMap<String, String>,
    ) -> Vec<DeliveryResult> {
        let report_name = report.name.trim();
        if report_name.is_empty() {
            return vec![Self::error_result(ctx, "", "The report filename is empty.")];
        }

        let target = settings.target.as_deref().map(str::trim).unwrap_or_default();
        if target.is_empty() {
            let message = format!("No target file path for report '{report_name}' found.");
            warn!("{message}");
            return vec![Self::error_result(ctx, report_name, message)];
        }

        let is_lib_path = target.to_lowercase().starts_with("lib://");
        if !is_lib_path && session.is_some() {
            let message = format!("Target value '{target}' is not a 'lib://' connection.");
            warn!("{message}");
            return vec![Self::error_result(ctx, report_name, message)];
        }

        let target_dir = match Self::resolve_target(target, session, path_cache).await {
            Ok(dir) => dir,
            Err(err) => {
                return vec![Self::error_result(ctx, report_name, err.message)];
            }
        };
        info!("Use the resolved target path '{target_dir}'...");

        let mut results = Vec::with_capacity(report.paths.len());
        let multiple = report.paths.len() > 1;
        for (index, path) in report.paths.iter().enumerate() {
            let ordinal = multiple.then_some(index + 1);
            let filename = target_filename(report_name, path, ordinal);
            let target_file = Path::new(&target_dir).join(&filename);

            match Self::write_one(report, path, &target_file, &target_dir, settings.mode).await {
                Ok(()) => {
                    debug!(path = %target_file.display(), "File was copied");
                    results.push(DeliveryResult::File {
                        common: ResultFields::ok(
                            &ctx.task_name,
                            report_name,
                            &ctx.report_state,
                            "Report was successfully delivered.",
                        ),
                        copy_path: Some(target_file.display().to_string()),
                    });
                }
                Err(err) => {
                    warn!("The delivery process for 'file' failed: {err}");
                    results.push(Self::error_result(ctx, report_name, err.message));
                }
            }
        }
        results
    }

    /// Resolve a target to a real directory, caching per unique target.
    async fn resolve_target(
        target: &str,
        session: Option<&Arc<dyn CatalogSession>>,
        path_cache: &mut HashMap<String, String>,
    ) -> AppResult<String> {
        if let Some(cached) = path_cache.get(target) {
            debug!("Target '{target}' resolved from cache");
            return Ok(cached.clone());
        }
        let resolved = match session {
            Some(session) => session.resolve_library_path(target).await?,
            // Without a catalog connection the target is a plain path.
            None => target.to_string(),
        };
        path_cache.insert(target.to_string(), resolved.clone());
        Ok(resolved)
    }

    /// Write one file according to the distribute mode.
    async fn write_one(
        report: &Report,
        path: &str,
        target_file: &Path,
        target_dir: &str,
        mode: DistributeMode,
    ) -> AppResult<()> {
        let file_data = report
            .file_data(path)
            .ok_or_else(|| AppError::not_found(format!("No file data for path '{path}' found.")))?;

        match mode {
            DistributeMode::Override => {
                fs::create_dir_all(target_dir).await?;
                fs::write(target_file, &file_data.data).await?;
            }
            DistributeMode::DeleteAllFirst => {
                if fs::try_exists(target_file).await? {
                    fs::remove_file(target_file).await?;
                }
                fs::create_dir_all(target_dir).await?;
                fs::write(target_file, &file_data.data).await?;
            }
            DistributeMode::CreateOnly => {
                if fs::try_exists(target_file).await? {
                    return Err(AppError::storage(format!(
                        "The file '{}' already exists.",
                        target_file.display()
                    )));
                }
                fs::create_dir_all(target_dir).await?;
                fs::write(target_file, &file_data.data).await?;
            }
        }
        Ok(())
    }

    fn error_result(ctx: &TaskContext, report_name: &str, message: impl Into<String>) -> DeliveryResult {
        DeliveryResult::File {
            common: ResultFields::error(&ctx.task_name, report_name, message),
            copy_path: None,
        }
    }
}
