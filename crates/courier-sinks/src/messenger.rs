//! Messenger webhook adapter.
//!
//! Posts a human-readable summary of the whole distribution run to a chat
//! webhook. The summary is rendered from the cumulative result list, so
//! the orchestrator invokes this sink last.

use serde_json::json;
use tracing::warn;

use courier_core::model::settings::{MessengerKind, MessengerSettings};
use courier_core::model::{DeliveryResult, ResultFields};
use courier_core::traits::WebhookClient;

use crate::TaskContext;

/// Card title used for the Microsoft Teams payload.
const TEAMS_TITLE: &str = "Message from Report Courier";

/// Posts run summaries to Microsoft Teams or Slack webhooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessengerSink;

impl MessengerSink {
    /// Post a summary of `results` to the configured webhook.
    pub async fn deliver(
        ctx: &TaskContext,
        settings: &MessengerSettings,
        results: &[DeliveryResult],
        client: &dyn WebhookClient,
    ) -> DeliveryResult {
        let target = Self::target_name(settings.messenger);
        let url = settings.url.trim();
        if url.is_empty() {
            let message = format!("No webhook url for '{target}' configured.");
            warn!("{message}");
            return Self::error_result(ctx, target, message);
        }

        let lines = Self::summary_lines(results);
        let payload = match settings.messenger {
            MessengerKind::MicrosoftTeams => json!({
                "contentType": "html",
                "title": TEAMS_TITLE,
                "text": Self::render_html(&lines),
            }),
            MessengerKind::Slack => json!({
                "text": Self::render_text(&lines),
            }),
        };

        match client.post_json(url, &payload).await {
            Ok(()) => DeliveryResult::Messenger {
                common: ResultFields::ok(
                    &ctx.task_name,
                    target,
                    &ctx.report_state,
                    "Delivery summary was successfully posted.",
                ),
            },
            Err(err) => {
                warn!("The delivery via 'messenger' failed: {err}");
                Self::error_result(ctx, target, err.message)
            }
        }
    }

    fn target_name(kind: MessengerKind) -> &'static str {
        match kind {
            MessengerKind::MicrosoftTeams => "Microsoft Teams",
            MessengerKind::Slack => "Slack",
        }
    }

    /// One sentence per result record.
    fn summary_lines(results: &[DeliveryResult]) -> Vec<String> {
        if results.is_empty() {
            return vec![
                "No delivery results are available yet. Please check the reporting task \
                 configuration."
                    .to_string(),
            ];
        }
        results.iter().map(Self::summary_line).collect()
    }

    fn summary_line(result: &DeliveryResult) -> String {
        let common = result.common();
        if !common.success {
            return format!(
                "Delivery of report '{}' in task '{}' failed: {}",
                common.report_name, common.task_name, common.message
            );
        }
        match result {
            DeliveryResult::File { common, copy_path } => format!(
                "Report '{}' was copied to '{}'.",
                common.report_name,
                copy_path.as_deref().unwrap_or_default()
            ),
            DeliveryResult::Ftp { common, ftp_path } => format!(
                "Report '{}' was uploaded to '{}'.",
                common.report_name,
                ftp_path.as_deref().unwrap_or_default()
            ),
            DeliveryResult::Hub {
                common, full_link, ..
            } => format!(
                "Report '{}' was published at '{}'.",
                common.report_name,
                full_link.as_deref().unwrap_or_default()
            ),
            DeliveryResult::Mail { common, to, .. } => format!(
                "Report '{}' was mailed to '{}'.",
                common.report_name,
                to.as_deref().unwrap_or_default()
            ),
            DeliveryResult::Messenger { common } => format!(
                "A delivery summary for task '{}' was posted.",
                common.task_name
            ),
            DeliveryResult::Distribution { common } | DeliveryResult::Error { common } => {
                format!("Task '{}': {}", common.task_name, common.message)
            }
        }
    }

    fn render_html(lines: &[String]) -> String {
        format!("<p>Hello, here are the latest delivery results:</p><p>{}</p>", lines.join("<br>"))
    }

    fn render_text(lines: &[String]) -> String {
        format!("Hello, here are the latest delivery results:\n{}", lines.join("\n"))
    }

    fn error_result(ctx: &TaskContext, target: &str, message: impl Into<String>) -> DeliveryResult {
        DeliveryResult::Messenger {
            common: ResultFields::error(&ctx.task_name, target, message),
        }
    }
}
