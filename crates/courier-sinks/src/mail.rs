//! Consolidating mail adapter.
//!
//! Mail delivery is deferred: during sink dispatch every mail-sink hit is
//! only collected, merged by an exact subject/body/recipient key. The
//! orchestrator flushes the consolidator once per run, after all reports
//! were processed, so recipients get one message per key instead of one
//! per report.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use pulldown_cmark::{html, Parser};
use tracing::{debug, info, warn};
use validator::ValidateEmail;

use courier_core::model::settings::{MailBodyType, MailSettings};
use courier_core::model::{DeliveryResult, Report, ResultFields};
use courier_core::error::ErrorKind;
use courier_core::traits::{MailAttachment, MailSession, MailTransport, OutgoingMail};
use courier_core::{AppError, AppResult};

use crate::name::target_filename;
use crate::TaskContext;

/// One report that contributed to a merged message.
#[derive(Debug, Clone)]
struct Contributor {
    task_name: String,
    report_name: String,
    report_state: String,
}

/// A pending merged message.
#[derive(Debug)]
struct MailGroup {
    key: String,
    settings: MailSettings,
    attachments: Vec<MailAttachment>,
    contributors: Vec<Contributor>,
}

/// Collects mail sink hits and sends them merged on flush.
///
/// Groups are flushed in first-seen order; one SMTP session is reused for
/// every group bound for the same server.
#[derive(Debug, Default)]
pub struct MailConsolidator {
    groups: Vec<MailGroup>,
}

impl MailConsolidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any message is pending.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Register one report for mail delivery.
    ///
    /// Returns an immediate error result when the hit cannot be queued;
    /// otherwise delivery outcomes are produced by [`flush`](Self::flush).
    pub fn add(
        &mut self,
        ctx: &TaskContext,
        report: &Report,
        settings: &MailSettings,
    ) -> Option<DeliveryResult> {
        let report_name = report.name.trim();
        if settings.mail_server.is_none() {
            let message = format!("No mail server for report '{report_name}' configured.");
            warn!("{message}");
            return Some(Self::error_result(&ctx.task_name, report_name, message));
        }

        let mut attachments = Vec::new();
        if settings.send_attachment {
            let multiple = report.paths.len() > 1;
            for (index, path) in report.paths.iter().enumerate() {
                let Some(file_data) = report.file_data(path) else {
                    let message = format!("No file data for path '{path}' found.");
                    warn!("{message}");
                    return Some(Self::error_result(&ctx.task_name, report_name, message));
                };
                let ordinal = multiple.then_some(index + 1);
                attachments.push(MailAttachment {
                    filename: target_filename(report_name, path, ordinal),
                    data: file_data.data.clone(),
                });
            }
        }

        let key = settings.group_key();
        let contributor = Contributor {
            task_name: ctx.task_name.clone(),
            report_name: report_name.to_string(),
            report_state: ctx.report_state.clone(),
        };

        match self.groups.iter_mut().find(|g| g.key == key) {
            Some(group) => {
                debug!("Merging report '{report_name}' into an existing mail");
                group.attachments.extend(attachments);
                group.contributors.push(contributor);
            }
            None => self.groups.push(MailGroup {
                key,
                settings: settings.clone(),
                attachments,
                contributors: vec![contributor],
            }),
        }
        None
    }

    /// Send every pending message and drain the consolidator.
    ///
    /// Produces one result per merged message; its report name is the
    /// comma-joined list of every contributing report.
    pub async fn flush(
        &mut self,
        transport: &dyn MailTransport,
        credentials_dir: &Path,
    ) -> Vec<DeliveryResult> {
        let mut results = Vec::new();
        let mut sessions: HashMap<String, Box<dyn MailSession>> = HashMap::new();

        for group in self.groups.drain(..) {
            let first = &group.contributors[0];
            let report_names = group
                .contributors
                .iter()
                .map(|c| c.report_name.as_str())
                .collect::<Vec<_>>()
                .join(",");
            match Self::send_group(&group, transport, credentials_dir, &mut sessions).await {
                Ok(recipients) => {
                    info!(
                        "Mail for report(s) '{report_names}' was sent with {} attachment(s)",
                        group.attachments.len()
                    );
                    results.push(DeliveryResult::Mail {
                        common: ResultFields::ok(
                            &first.task_name,
                            &report_names,
                            &first.report_state,
                            "Report was successfully sent by the mail server.",
                        ),
                        to: Some(recipients),
                        subject: Some(Self::subject(&group.settings)),
                    });
                }
                Err(err) => {
                    warn!("The delivery via 'mail' failed: {err}");
                    results.push(Self::error_result(
                        &first.task_name,
                        &report_names,
                        err.message,
                    ));
                }
            }
        }
        results
    }

    /// Assemble and send one merged message, returning the display form of
    /// the primary recipient list.
    async fn send_group(
        group: &MailGroup,
        transport: &dyn MailTransport,
        credentials_dir: &Path,
        sessions: &mut HashMap<String, Box<dyn MailSession>>,
    ) -> AppResult<String> {
        let settings = &group.settings;
        // Checked at add time.
        let server = settings
            .mail_server
            .as_ref()
            .ok_or_else(|| AppError::configuration("No mail server configured."))?;

        let to_raw = settings.to.as_deref().unwrap_or_default();
        let to = Self::parse_recipients(to_raw);
        if to.is_empty() {
            return Err(AppError::validation(format!(
                "No valid mail recipient in '{to_raw}' found."
            )));
        }
        let cc = Self::parse_recipients(settings.cc.as_deref().unwrap_or_default());
        let bcc = Self::parse_recipients(settings.bcc.as_deref().unwrap_or_default());

        let (body, html) = Self::render_body(
            settings.message.as_deref().unwrap_or_default(),
            settings.mail_type,
        );

        let mut server = server.clone();
        if server.use_base64_password && !server.password.is_empty() {
            server.password = Self::decode_password(&server.password)?;
        }
        let client_certs = if server.use_certificate {
            Self::client_certificates(credentials_dir)?
        } else {
            Vec::new()
        };

        let session_key = format!("{}:{}|{}", server.host, server.port, server.username);
        if !sessions.contains_key(&session_key) {
            let session = transport.connect(&server, &client_certs).await?;
            sessions.insert(session_key.clone(), session);
        }
        let session = sessions
            .get_mut(&session_key)
            .ok_or_else(|| AppError::internal("mail session vanished"))?;

        if server.send_delay > 0 {
            tokio::time::sleep(std::time::Duration::from_secs(server.send_delay)).await;
        }

        let mail = OutgoingMail {
            from: server.from.clone(),
            to,
            cc,
            bcc,
            subject: Self::subject(settings),
            body,
            html,
            attachments: group.attachments.clone(),
        };
        session.send(&mail).await?;
        Ok(to_raw.replace(';', ","))
    }

    /// Subject with a fallback for unconfigured messages.
    fn subject(settings: &MailSettings) -> String {
        settings
            .subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("No subject was specified.")
            .to_string()
    }

    /// Split a `;`-delimited recipient list, dropping invalid addresses.
    fn parse_recipients(raw: &str) -> Vec<String> {
        raw.split(';')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .filter(|a| {
                let valid = a.validate_email();
                if !valid {
                    warn!("The mail address '{a}' is invalid and was skipped");
                }
                valid
            })
            .map(str::to_string)
            .collect()
    }

    /// Render the body per the configured content type.
    fn render_body(message: &str, mail_type: MailBodyType) -> (String, bool) {
        match mail_type {
            MailBodyType::Text => (message.replace("{n}", "\n"), false),
            MailBodyType::Html => (message.to_string(), true),
            MailBodyType::Markdown => {
                let mut out = String::new();
                html::push_html(&mut out, Parser::new(message));
                (out, true)
            }
        }
    }

    fn decode_password(encoded: &str) -> AppResult<String> {
        let bytes = BASE64.decode(encoded.trim()).map_err(|err| {
            AppError::with_source(
                ErrorKind::Configuration,
                "The mail password is not valid base64.",
                err,
            )
        })?;
        String::from_utf8(bytes).map_err(|err| {
            AppError::with_source(
                ErrorKind::Configuration,
                "The decoded mail password is not valid UTF-8.",
                err,
            )
        })
    }

    /// All `mailcert.*` files in the credentials directory.
    fn client_certificates(dir: &Path) -> AppResult<Vec<PathBuf>> {
        let mut certs = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_cert = path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.eq_ignore_ascii_case("mailcert"));
            if is_cert && path.is_file() {
                certs.push(path);
            }
        }
        Ok(certs)
    }

    fn error_result(
        task_name: &str,
        report_name: &str,
        message: impl Into<String>,
    ) -> DeliveryResult {
        DeliveryResult::Mail {
            common: ResultFields::error(task_name, report_name, message),
            to: None,
            subject: None,
        }
    }
}
