//! The distribution orchestrator.
//!
//! Walks job results in batch order, reports in list order, and sinks in
//! delivery-document key order. File, FTP and hub dispatches of one report
//! run as explicit futures joined before the job's mail-flush/messenger
//! phase; mail is consolidated per job; messengers receive the cumulative
//! result list. Cancellation is polled before every job, report, and sink
//! dispatch.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::FuturesOrdered;
use futures::StreamExt;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use courier_core::crypto::{resolve_document, Decryptor, PassthroughDecryptor};
use courier_core::model::{
    DeliveryResult, FileSettings, FtpSettings, HubSettings, JobResult, MailSettings,
    MessengerSettings, ResultFields, SinkType, TaskStatus,
};
use courier_core::traits::{FtpTransport, MailTransport, SessionFactory, WebhookClient};
use courier_core::{AppError, AppResult};
use courier_sinks::file::FileSink;
use courier_sinks::ftp::FtpSink;
use courier_sinks::hub::HubSink;
use courier_sinks::mail::MailConsolidator;
use courier_sinks::messenger::MessengerSink;
use courier_sinks::TaskContext;

use crate::normalize;
use crate::pool::{ConnectionManager, Lease};
use crate::settings;
use crate::state::RunState;
use crate::transport::{
    UnconfiguredFtpTransport, UnconfiguredMailTransport, UnconfiguredSessionFactory,
    UnconfiguredWebhookClient,
};

/// Orchestrates one distribution pass over a batch of job results.
#[derive(Debug)]
pub struct Distributor {
    pool: ConnectionManager,
    ftp: Arc<dyn FtpTransport>,
    mail: Arc<dyn MailTransport>,
    webhook: Arc<dyn WebhookClient>,
    decryptor: Arc<dyn Decryptor>,
    credentials_dir: PathBuf,
}

/// Builder wiring the external collaborators into a [`Distributor`].
#[derive(Debug)]
pub struct DistributorBuilder {
    factory: Arc<dyn SessionFactory>,
    ftp: Arc<dyn FtpTransport>,
    mail: Arc<dyn MailTransport>,
    webhook: Arc<dyn WebhookClient>,
    decryptor: Arc<dyn Decryptor>,
    credentials_dir: PathBuf,
}

impl Default for DistributorBuilder {
    fn default() -> Self {
        Self {
            factory: Arc::new(UnconfiguredSessionFactory),
            ftp: Arc::new(UnconfiguredFtpTransport),
            mail: Arc::new(UnconfiguredMailTransport),
            webhook: Arc::new(UnconfiguredWebhookClient),
            decryptor: Arc::new(PassthroughDecryptor),
            credentials_dir: PathBuf::from("."),
        }
    }
}

impl DistributorBuilder {
    pub fn session_factory(mut self, factory: Arc<dyn SessionFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn ftp_transport(mut self, ftp: Arc<dyn FtpTransport>) -> Self {
        self.ftp = ftp;
        self
    }

    pub fn mail_transport(mut self, mail: Arc<dyn MailTransport>) -> Self {
        self.mail = mail;
        self
    }

    pub fn webhook_client(mut self, webhook: Arc<dyn WebhookClient>) -> Self {
        self.webhook = webhook;
        self
    }

    pub fn decryptor(mut self, decryptor: Arc<dyn Decryptor>) -> Self {
        self.decryptor = decryptor;
        self
    }

    pub fn credentials_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.credentials_dir = dir.into();
        self
    }

    pub fn build(self) -> Distributor {
        Distributor {
            pool: ConnectionManager::new(self.factory),
            ftp: self.ftp,
            mail: self.mail,
            webhook: self.webhook,
            decryptor: self.decryptor,
            credentials_dir: self.credentials_dir,
        }
    }
}

impl Distributor {
    pub fn builder() -> DistributorBuilder {
        DistributorBuilder::default()
    }

    /// Connection pool, exposed for run post-conditions.
    pub fn pool(&self) -> &ConnectionManager {
        &self.pool
    }

    /// Run one distribution pass and return the serialized result array.
    ///
    /// Jobs are mutated in place: a delivery failure downgrades the job's
    /// status to ERROR and records the cause.
    pub async fn run(
        &self,
        jobs: &mut [JobResult],
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        info!("Starting the distribution of {} job result(s)", jobs.len());
        let outcome = self.process_batch(jobs, cancel).await;
        // Sessions never outlive the run, not even a failed one.
        self.pool.release_all();
        let mut results = outcome?;

        normalize::sort_by_task(&mut results);
        normalize::normalize_report_state(&mut results);
        info!("The distribution finished with {} result(s)", results.len());
        Ok(serde_json::to_string_pretty(&results)?)
    }

    async fn process_batch(
        &self,
        jobs: &mut [JobResult],
        cancel: &CancellationToken,
    ) -> AppResult<Vec<DeliveryResult>> {
        let mut results: Vec<DeliveryResult> = Vec::new();
        let state = Arc::new(AsyncMutex::new(RunState::new()));

        for (index, job) in jobs.iter_mut().enumerate() {
            if cancel.is_cancelled() {
                return Err(AppError::canceled("The distribution run was canceled."));
            }
            if job.task_name.trim().is_empty() {
                job.task_name = format!("Task {}", index + 1);
            }

            match job.status {
                TaskStatus::Error | TaskStatus::RetryError => {
                    warn!("Task '{}' failed upstream, skipping delivery", job.task_name);
                    results.push(DeliveryResult::Error {
                        common: ResultFields::error(
                            &job.task_name,
                            "",
                            job.exception_message("The task has an error."),
                        ),
                    });
                }
                TaskStatus::Inactive => {
                    debug!("Task '{}' is inactive, skipping delivery", job.task_name);
                    results.push(DeliveryResult::Error {
                        common: ResultFields::ok(
                            &job.task_name,
                            "",
                            "INACTIVE",
                            "The task is inactive.",
                        ),
                    });
                }
                TaskStatus::Abort => {
                    debug!("Task '{}' was aborted, skipping delivery", job.task_name);
                    results.push(DeliveryResult::Error {
                        common: ResultFields::ok(
                            &job.task_name,
                            "",
                            "ABORT",
                            "The task was canceled.",
                        ),
                    });
                }
                TaskStatus::Unknown => {
                    warn!("Task '{}' has an unknown status", job.task_name);
                    results.push(DeliveryResult::Error {
                        common: ResultFields {
                            task_name: job.task_name.clone(),
                            success: false,
                            message: "The task has an unknown status.".to_string(),
                            report_name: String::new(),
                            report_state: "UNKNOWN".to_string(),
                        },
                    });
                }
                TaskStatus::Warning => {
                    warn!("Task '{}' finished with warnings", job.task_name);
                    self.process_job(job, cancel, &state, &mut results).await?;
                }
                TaskStatus::Success => {
                    self.process_job(job, cancel, &state, &mut results).await?;
                }
            }
        }
        Ok(results)
    }

    /// Dispatch every report of one job, then flush mail and notify the
    /// job's messengers with the cumulative result list.
    async fn process_job(
        &self,
        job: &mut JobResult,
        cancel: &CancellationToken,
        state: &Arc<AsyncMutex<RunState>>,
        results: &mut Vec<DeliveryResult>,
    ) -> AppResult<()> {
        let ctx = TaskContext::new(&job.task_name, job.status.as_report_state());
        let job_start = results.len();
        let mut consolidator = MailConsolidator::new();
        let mut messengers: Vec<MessengerSettings> = Vec::new();

        for report in &job.reports {
            if cancel.is_cancelled() {
                return Err(AppError::canceled("The distribution run was canceled."));
            }
            self.process_report(report, cancel, &ctx, state, &mut consolidator, &mut messengers, results)
                .await?;
        }

        if !consolidator.is_empty() {
            let flushed = consolidator.flush(self.mail.as_ref(), &self.credentials_dir).await;
            results.extend(flushed);
        }

        // A delivery failure downgrades the job itself; messenger outcomes
        // are notifications about the run, not deliveries of the job.
        if let Some(failed) = results[job_start..].iter().find(|r| !r.success()) {
            job.status = TaskStatus::Error;
            job.exception = Some(failed.common().message.clone());
        }

        for settings in messengers {
            let result =
                MessengerSink::deliver(&ctx, &settings, results, self.webhook.as_ref()).await;
            results.push(result);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_report(
        &self,
        report: &courier_core::model::Report,
        cancel: &CancellationToken,
        ctx: &TaskContext,
        state: &Arc<AsyncMutex<RunState>>,
        consolidator: &mut MailConsolidator,
        messengers: &mut Vec<MessengerSettings>,
        results: &mut Vec<DeliveryResult>,
    ) -> AppResult<()> {
        let Some(doc) = report.distribute.clone() else {
            results.push(Self::no_sink_result(ctx, report));
            return Ok(());
        };
        let mut doc = doc;
        resolve_document(self.decryptor.as_ref(), &mut doc);

        let mut dispatched = 0usize;
        let mut dispatches: FuturesOrdered<BoxFuture<'_, Vec<DeliveryResult>>> =
            FuturesOrdered::new();

        for (key, probe) in settings::probe_sinks(&doc) {
            if cancel.is_cancelled() {
                return Err(AppError::canceled("The distribution run was canceled."));
            }
            if !probe.active {
                debug!("The delivery key '{key}' is deactivated, skipping");
                continue;
            }

            match probe.sink {
                SinkType::Mail => {
                    let mail = match settings::decode_sink::<MailSettings>(&key, &doc) {
                        Ok(mail) => mail,
                        Err(err) => {
                            dispatched += 1;
                            results.push(Self::bad_settings_result(ctx, report, probe.sink, err));
                            continue;
                        }
                    };
                    dispatched += 1;
                    if let Some(result) = consolidator.add(ctx, report, &mail) {
                        results.push(result);
                    }
                }
                SinkType::Messenger => {
                    let messenger =
                        match settings::decode_sink::<MessengerSettings>(&key, &doc) {
                            Ok(messenger) => messenger,
                            Err(err) => {
                                dispatched += 1;
                                results.push(Self::bad_settings_result(
                                    ctx, report, probe.sink, err,
                                ));
                                continue;
                            }
                        };
                    dispatched += 1;
                    messengers.push(messenger);
                }
                SinkType::File => {
                    let file = match settings::decode_sink::<FileSettings>(&key, &doc) {
                        Ok(file) => file,
                        Err(err) => {
                            dispatched += 1;
                            results.push(Self::bad_settings_result(ctx, report, probe.sink, err));
                            continue;
                        }
                    };
                    dispatched += 1;
                    let ctx = ctx.clone();
                    let state = Arc::clone(state);
                    dispatches.push_back(Box::pin(async move {
                        let lease = if file.connections.is_empty() {
                            None
                        } else {
                            match self.pool.lease(&file.connections).await {
                                Ok(lease) => Some(lease),
                                Err(err) => {
                                    warn!("Could not lease a catalog session: {err}");
                                    return vec![DeliveryResult::File {
                                        common: ResultFields::error(
                                            &ctx.task_name,
                                            report.name.trim(),
                                            err.message,
                                        ),
                                        copy_path: None,
                                    }];
                                }
                            }
                        };
                        let mut state = state.lock().await;
                        FileSink::deliver(
                            &ctx,
                            report,
                            &file,
                            lease.as_ref().map(Lease::session),
                            &mut state.path_cache,
                        )
                        .await
                    }));
                }
                SinkType::Ftp => {
                    let ftp = match settings::decode_sink::<FtpSettings>(&key, &doc) {
                        Ok(ftp) => ftp,
                        Err(err) => {
                            dispatched += 1;
                            results.push(Self::bad_settings_result(ctx, report, probe.sink, err));
                            continue;
                        }
                    };
                    dispatched += 1;
                    let ctx = ctx.clone();
                    dispatches.push_back(Box::pin(async move {
                        FtpSink::deliver(&ctx, report, &ftp, self.ftp.as_ref()).await
                    }));
                }
                SinkType::Hub => {
                    let hub = match settings::decode_sink::<HubSettings>(&key, &doc) {
                        Ok(hub) => hub,
                        Err(err) => {
                            dispatched += 1;
                            results.push(Self::bad_settings_result(ctx, report, probe.sink, err));
                            continue;
                        }
                    };
                    dispatched += 1;
                    let ctx = ctx.clone();
                    let state = Arc::clone(state);
                    dispatches.push_back(Box::pin(async move {
                        let lease = match self.pool.lease(&hub.connections).await {
                            Ok(lease) => lease,
                            Err(err) => {
                                warn!("Could not lease a hub session: {err}");
                                return vec![DeliveryResult::Hub {
                                    common: ResultFields::error(
                                        &ctx.task_name,
                                        report.name.trim(),
                                        err.message,
                                    ),
                                    link: None,
                                    full_link: None,
                                }];
                            }
                        };
                        let mut state = state.lock().await;
                        HubSink::deliver(
                            &ctx,
                            report,
                            &hub,
                            lease.session(),
                            &mut state.purged_owners,
                        )
                        .await
                    }));
                }
            }
        }

        // Join every dispatch of this report, in dispatch order.
        while let Some(batch) = dispatches.next().await {
            results.extend(batch);
        }

        if dispatched == 0 {
            results.push(Self::no_sink_result(ctx, report));
        }
        Ok(())
    }

    /// Typed error record for an activated sink whose settings could not
    /// be decoded. The record carries the sink's own variant so the
    /// consumer sees which delivery was attempted.
    fn bad_settings_result(
        ctx: &TaskContext,
        report: &courier_core::model::Report,
        sink: SinkType,
        err: AppError,
    ) -> DeliveryResult {
        let common = ResultFields::error(&ctx.task_name, report.name.trim(), err.message);
        match sink {
            SinkType::File => DeliveryResult::File {
                common,
                copy_path: None,
            },
            SinkType::Ftp => DeliveryResult::Ftp {
                common,
                ftp_path: None,
            },
            SinkType::Hub => DeliveryResult::Hub {
                common,
                link: None,
                full_link: None,
            },
            SinkType::Mail => DeliveryResult::Mail {
                common,
                to: None,
                subject: None,
            },
            SinkType::Messenger => DeliveryResult::Messenger { common },
        }
    }

    fn no_sink_result(ctx: &TaskContext, report: &courier_core::model::Report) -> DeliveryResult {
        debug!("No delivery type was selected for report '{}'", report.name);
        DeliveryResult::Distribution {
            common: ResultFields::ok(
                &ctx.task_name,
                report.name.trim(),
                &ctx.report_state,
                "No delivery type was selected for the report.",
            ),
        }
    }
}
