//! FTP/FTPS upload adapter.
//!
//! The wire protocol lives behind [`FtpTransport`]; this adapter owns the
//! delivery semantics: one session per report, mode handling per path,
//! recursive remote directory creation before upload.

use tracing::{debug, warn};

use courier_core::model::settings::{DistributeMode, FtpSettings};
use courier_core::model::{DeliveryResult, Report, ResultFields};
use courier_core::traits::{FtpSession, FtpTransport};
use courier_core::AppResult;

use crate::name::target_filename;
use crate::TaskContext;

/// Uploads report files to an FTP/FTPS server.
#[derive(Debug, Clone, Copy, Default)]
pub struct FtpSink;

impl FtpSink {
    /// Deliver every output path of a report to the configured remote path.
    ///
    /// `settings` must already carry the decrypted password.
    pub async fn deliver(
        ctx: &TaskContext,
        report: &Report,
        settings: &FtpSettings,
        transport: &dyn FtpTransport,
    ) -> Vec<DeliveryResult> {
        let report_name = report.name.trim();
        if report_name.is_empty() {
            return vec![Self::error_result(ctx, "", "The report has no filename.")];
        }

        let remote_path = settings
            .remote_path
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        if remote_path.is_empty() {
            let message = format!("No target ftp path for report '{report_name}' found.");
            warn!("{message}");
            return vec![Self::error_result(ctx, report_name, message)];
        }

        // One session per report.
        let mut session = match transport.connect(settings).await {
            Ok(session) => session,
            Err(err) => {
                warn!("The delivery via 'ftp' failed: {err}");
                return vec![Self::error_result(ctx, report_name, err.message)];
            }
        };

        let mut results = Vec::with_capacity(report.paths.len());
        let multiple = report.paths.len() > 1;
        for (index, path) in report.paths.iter().enumerate() {
            let ordinal = multiple.then_some(index + 1);
            let filename = target_filename(report_name, path, ordinal);
            let remote_file = format!("{}/{}", remote_path.trim_end_matches('/'), filename);
            debug!("ftp distribute mode {}", settings.mode);

            match Self::upload_one(
                report,
                path,
                &remote_file,
                remote_path,
                settings.mode,
                session.as_mut(),
            )
            .await
            {
                Ok(uploaded) => {
                    let message = if uploaded {
                        "FTP upload was executed successfully."
                    } else {
                        "Remote file already exists, upload was skipped."
                    };
                    results.push(DeliveryResult::Ftp {
                        common: ResultFields::ok(
                            &ctx.task_name,
                            report_name,
                            &ctx.report_state,
                            message,
                        ),
                        ftp_path: Some(format!("ftp://{}{remote_file}", settings.host)),
                    });
                }
                Err(err) => {
                    warn!("The delivery via 'ftp' failed: {err}");
                    results.push(Self::error_result(ctx, report_name, err.message));
                }
            }
        }
        results
    }

    /// Upload one file according to the distribute mode.
    ///
    /// Returns `false` when create-only semantics skipped an existing
    /// remote file.
    async fn upload_one(
        report: &Report,
        path: &str,
        remote_file: &str,
        remote_dir: &str,
        mode: DistributeMode,
        session: &mut dyn FtpSession,
    ) -> AppResult<bool> {
        let file_data = report.file_data(path).ok_or_else(|| {
            courier_core::AppError::not_found(format!("No file data for path '{path}' found."))
        })?;

        match mode {
            DistributeMode::CreateOnly => {
                if session.exists(remote_file).await? {
                    return Ok(false);
                }
            }
            DistributeMode::DeleteAllFirst => {
                // Best effort; "not found" is not an error.
                session.delete(remote_file).await?;
            }
            DistributeMode::Override => {}
        }

        session.ensure_dir(remote_dir).await?;
        session.upload(remote_file, file_data.data.clone()).await?;
        Ok(true)
    }

    fn error_result(
        ctx: &TaskContext,
        report_name: &str,
        message: impl Into<String>,
    ) -> DeliveryResult {
        DeliveryResult::Ftp {
            common: ResultFields::error(&ctx.task_name, report_name, message),
            ftp_path: None,
        }
    }
}
