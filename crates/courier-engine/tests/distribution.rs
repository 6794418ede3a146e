//! End-to-end distribution runs against in-memory collaborators.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use courier_core::model::settings::{ConnectionConfig, MailServerSettings};
use courier_core::model::{FileData, JobResult, Report, TaskStatus};
use courier_core::traits::{
    CatalogSession, ContentUpload, HubContent, HubRepository, LibraryPathResolver, MailSession,
    MailTransport, OutgoingMail, SessionFactory, WebhookClient,
};
use courier_core::{AppError, AppResult};
use courier_engine::Distributor;

/// Catalog session resolving `lib://<conn>/<rest>` below a fixed root.
#[derive(Debug)]
struct DirCatalog {
    root: PathBuf,
}

#[async_trait]
impl LibraryPathResolver for DirCatalog {
    async fn resolve_library_path(&self, target: &str) -> AppResult<String> {
        let rest = target
            .strip_prefix("lib://")
            .and_then(|t| t.split_once('/'))
            .map(|(_, rest)| rest)
            .ok_or_else(|| AppError::not_found(format!("Unknown connection in '{target}'.")))?;
        Ok(self.root.join(rest).display().to_string())
    }
}

#[async_trait]
impl HubRepository for DirCatalog {
    async fn find(&self, _: &str, _: Option<&str>) -> AppResult<Vec<HubContent>> {
        Ok(Vec::new())
    }
    async fn list_all(&self) -> AppResult<Vec<HubContent>> {
        Ok(Vec::new())
    }
    async fn create(&self, _: ContentUpload) -> AppResult<HubContent> {
        Err(AppError::internal("not a hub"))
    }
    async fn update(&self, _: Uuid, _: ContentUpload) -> AppResult<HubContent> {
        Err(AppError::internal("not a hub"))
    }
    async fn change_owner(&self, _: Uuid, _: &str) -> AppResult<HubContent> {
        Err(AppError::internal("not a hub"))
    }
    async fn delete(&self, _: Uuid) -> AppResult<()> {
        Ok(())
    }
    async fn lookup_user_id(&self, _: &str) -> AppResult<Uuid> {
        Ok(Uuid::new_v4())
    }
    fn base_url(&self) -> String {
        String::new()
    }
}

#[derive(Debug)]
struct DirCatalogFactory {
    root: PathBuf,
    opened: Arc<Mutex<usize>>,
}

#[async_trait]
impl SessionFactory for DirCatalogFactory {
    async fn open(&self, _: &ConnectionConfig) -> AppResult<Arc<dyn CatalogSession>> {
        *self.opened.lock().unwrap() += 1;
        Ok(Arc::new(DirCatalog {
            root: self.root.clone(),
        }))
    }
}

#[derive(Debug, Default)]
struct RecordingMail {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
}

struct RecordingMailSession {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
}

#[async_trait]
impl MailTransport for RecordingMail {
    async fn connect(
        &self,
        _: &MailServerSettings,
        _: &[PathBuf],
    ) -> AppResult<Box<dyn MailSession>> {
        Ok(Box::new(RecordingMailSession {
            sent: self.sent.clone(),
        }))
    }
}

#[async_trait]
impl MailSession for RecordingMailSession {
    async fn send(&mut self, mail: &OutgoingMail) -> AppResult<()> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RecordingWebhook {
    posts: Arc<Mutex<Vec<(String, Value)>>>,
}

#[async_trait]
impl WebhookClient for RecordingWebhook {
    async fn post_json(&self, url: &str, payload: &Value) -> AppResult<()> {
        self.posts
            .lock()
            .unwrap()
            .push((url.to_string(), payload.clone()));
        Ok(())
    }
}

fn report(name: &str, files: &[(&str, &[u8])], distribute: Option<Value>) -> Report {
    Report {
        name: name.to_string(),
        paths: files.iter().map(|(p, _)| p.to_string()).collect(),
        data: files
            .iter()
            .map(|(p, d)| FileData {
                filename: std::path::Path::new(p)
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .to_string(),
                data: Bytes::copy_from_slice(d),
            })
            .collect(),
        distribute,
    }
}

fn job(name: &str, status: TaskStatus, reports: Vec<Report>) -> JobResult {
    JobResult {
        task_id: Some(Uuid::new_v4()),
        task_name: name.to_string(),
        status,
        exception: None,
        reports,
    }
}

fn parse(output: &str) -> Vec<Value> {
    serde_json::from_str::<Vec<Value>>(output).unwrap()
}

#[tokio::test]
async fn test_file_delivery_resolves_library_path_for_two_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let opened = Arc::new(Mutex::new(0usize));
    let distributor = Distributor::builder()
        .session_factory(Arc::new(DirCatalogFactory {
            root: dir.path().to_path_buf(),
            opened: opened.clone(),
        }))
        .build();

    let doc = json!({
        "file": {
            "target": "lib://conn/out",
            "mode": "OVERRIDE",
            "connections": {"serverUri": "https://catalog.example.com"}
        }
    });
    let mut jobs = vec![job(
        "Task 1",
        TaskStatus::Success,
        vec![report(
            "sales",
            &[("/job/a.pdf", b"pdf"), ("/job/b.xlsx", b"xlsx")],
            Some(doc),
        )],
    )];

    let output = distributor
        .run(&mut jobs, &CancellationToken::new())
        .await
        .unwrap();

    let results = parse(&output);
    assert_eq!(results.len(), 2);
    for entry in &results {
        assert_eq!(entry["distributionMode"], "File System");
        assert_eq!(entry["success"], true);
        assert_eq!(entry["reportName"], "sales");
        assert_eq!(entry["reportState"], "SUCCESS");
    }
    let paths: Vec<&str> = results
        .iter()
        .map(|e| e["copyPath"].as_str().unwrap())
        .collect();
    assert!(paths[0].ends_with("sales_1.pdf"));
    assert!(paths[1].ends_with("sales_2.xlsx"));
    assert!(dir.path().join("out/sales_1.pdf").exists());
    assert!(dir.path().join("out/sales_2.xlsx").exists());

    assert_eq!(*opened.lock().unwrap(), 1);
    // The run released its pooled sessions.
    assert!(distributor.pool().is_empty());
    assert_eq!(jobs[0].status, TaskStatus::Success);
}

#[tokio::test]
async fn test_aborted_job_emits_one_result_and_no_dispatch() {
    let opened = Arc::new(Mutex::new(0usize));
    let dir = tempfile::tempdir().unwrap();
    let distributor = Distributor::builder()
        .session_factory(Arc::new(DirCatalogFactory {
            root: dir.path().to_path_buf(),
            opened: opened.clone(),
        }))
        .build();

    let doc = json!({"file": {"target": "lib://conn/out"}});
    let mut jobs = vec![job(
        "Task 1",
        TaskStatus::Abort,
        vec![report("sales", &[("/job/a.pdf", b"pdf")], Some(doc))],
    )];

    let output = distributor
        .run(&mut jobs, &CancellationToken::new())
        .await
        .unwrap();

    let results = parse(&output);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["distributionMode"], "Error");
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[0]["reportState"], "ABORT");
    assert_eq!(*opened.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_cancellation_fails_the_run_and_releases_the_pool() {
    let distributor = Distributor::builder().build();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut jobs = vec![job("Task 1", TaskStatus::Success, Vec::new())];
    let err = distributor.run(&mut jobs, &cancel).await.unwrap_err();

    assert!(err.is_canceled());
    assert!(distributor.pool().is_empty());
    assert_eq!(distributor.pool().active_leases(), 0);
}

#[tokio::test]
async fn test_identical_mail_settings_merge_across_reports() {
    let mail = RecordingMail::default();
    let sent = mail.sent.clone();
    let distributor = Distributor::builder().mail_transport(Arc::new(mail)).build();

    let doc = json!({
        "mail": {
            "subject": "Weekly",
            "message": "body",
            "to": "a@example.com",
            "mailServer": {"host": "smtp.example.com", "from": "noreply@example.com"}
        }
    });
    let mut jobs = vec![job(
        "Task 1",
        TaskStatus::Success,
        vec![
            report("sales", &[("/job/sales.pdf", b"pdf")], Some(doc.clone())),
            report("stock", &[("/job/stock.pdf", b"pdf")], Some(doc)),
        ],
    )];

    let output = distributor
        .run(&mut jobs, &CancellationToken::new())
        .await
        .unwrap();

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].attachments.len(), 2);

    let results = parse(&output);
    let mail_results: Vec<&Value> = results
        .iter()
        .filter(|e| e["distributionMode"] == "Mail")
        .collect();
    assert_eq!(mail_results.len(), 1);
    assert_eq!(mail_results[0]["reportName"], "sales,stock");
    assert_eq!(mail_results[0]["to"], "a@example.com");
}

#[tokio::test]
async fn test_report_without_delivery_document_gets_a_synthetic_result() {
    let distributor = Distributor::builder().build();
    let mut jobs = vec![job(
        "Task 1",
        TaskStatus::Success,
        vec![report("sales", &[("/job/a.pdf", b"pdf")], None)],
    )];

    let output = distributor
        .run(&mut jobs, &CancellationToken::new())
        .await
        .unwrap();

    let results = parse(&output);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["distributionMode"], "Distribution");
    assert_eq!(results[0]["success"], true);
    assert_eq!(
        results[0]["message"],
        "No delivery type was selected for the report."
    );
}

#[tokio::test]
async fn test_delivery_failure_downgrades_the_job() {
    let distributor = Distributor::builder().build();

    // Empty target is a configuration error for the file sink.
    let doc = json!({"file": {"target": ""}});
    let mut jobs = vec![job(
        "Task 1",
        TaskStatus::Success,
        vec![report("sales", &[("/job/a.pdf", b"pdf")], Some(doc))],
    )];

    let output = distributor
        .run(&mut jobs, &CancellationToken::new())
        .await
        .unwrap();

    let results = parse(&output);
    assert_eq!(results[0]["success"], false);
    assert_eq!(jobs[0].status, TaskStatus::Error);
    assert!(jobs[0].exception.is_some());
}

#[tokio::test]
async fn test_undecodable_sink_settings_yield_a_typed_error_result() {
    let distributor = Distributor::builder().build();

    // An activated mail sink with an unknown body type is a hard
    // configuration error, recorded as a mail result of its own.
    let doc = json!({
        "mail": {
            "mailType": "WEIRD",
            "to": "a@example.com",
            "mailServer": {"host": "smtp.example.com", "from": "noreply@example.com"}
        }
    });
    let mut jobs = vec![job(
        "Task 1",
        TaskStatus::Success,
        vec![report("sales", &[("/job/a.pdf", b"pdf")], Some(doc))],
    )];

    let output = distributor
        .run(&mut jobs, &CancellationToken::new())
        .await
        .unwrap();

    let results = parse(&output);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["distributionMode"], "Mail");
    assert_eq!(results[0]["success"], false);
    assert_eq!(results[0]["reportName"], "sales");
    assert!(results[0]["message"]
        .as_str()
        .unwrap()
        .contains("could not be decoded"));
    assert_eq!(jobs[0].status, TaskStatus::Error);
}

#[tokio::test]
async fn test_messenger_receives_the_cumulative_results() {
    let dir = tempfile::tempdir().unwrap();
    let webhook = RecordingWebhook::default();
    let posts = webhook.posts.clone();
    let distributor = Distributor::builder()
        .session_factory(Arc::new(DirCatalogFactory {
            root: dir.path().to_path_buf(),
            opened: Arc::new(Mutex::new(0)),
        }))
        .webhook_client(Arc::new(webhook))
        .build();

    let doc = json!({
        "file": {
            "target": "lib://conn/out",
            "mode": "OVERRIDE",
            "connections": {"serverUri": "https://catalog.example.com"}
        },
        "messenger": {"messenger": "SLACK", "url": "https://hooks.example.com/x"}
    });
    let mut jobs = vec![job(
        "Task 1",
        TaskStatus::Success,
        vec![report("sales", &[("/job/a.pdf", b"pdf")], Some(doc))],
    )];

    let output = distributor
        .run(&mut jobs, &CancellationToken::new())
        .await
        .unwrap();

    let posts = posts.lock().unwrap();
    assert_eq!(posts.len(), 1);
    let text = posts[0].1["text"].as_str().unwrap();
    assert!(text.contains("Report 'sales' was copied"));

    let results = parse(&output);
    assert!(results
        .iter()
        .any(|e| e["distributionMode"] == "Messenger" && e["reportName"] == "Slack"));
}

#[tokio::test]
async fn test_partial_failure_is_normalized_to_a_whole_task_error() {
    let dir = tempfile::tempdir().unwrap();
    let distributor = Distributor::builder()
        .session_factory(Arc::new(DirCatalogFactory {
            root: dir.path().to_path_buf(),
            opened: Arc::new(Mutex::new(0)),
        }))
        .build();

    // The file copy succeeds; the ftp upload fails because no FTP client
    // is wired in.
    let doc = json!({
        "file": {
            "target": "lib://conn/out",
            "mode": "OVERRIDE",
            "connections": {"serverUri": "https://catalog.example.com"}
        },
        "ftp": {"host": "ftp.example.com", "remotePath": "/reports"}
    });
    let mut jobs = vec![job(
        "Task 1",
        TaskStatus::Success,
        vec![report("sales", &[("/job/a.pdf", b"pdf")], Some(doc))],
    )];

    let output = distributor
        .run(&mut jobs, &CancellationToken::new())
        .await
        .unwrap();

    let results = parse(&output);
    assert_eq!(results.len(), 2);
    // Worst-case-wins: the successful copy reads as ERROR too.
    assert!(results.iter().all(|e| e["reportState"] == "ERROR"));
    let file_entry = results
        .iter()
        .find(|e| e["distributionMode"] == "File System")
        .unwrap();
    assert_eq!(file_entry["success"], true);
}

#[tokio::test]
async fn test_unnamed_jobs_are_assigned_ordinal_task_names() {
    let distributor = Distributor::builder().build();
    let mut jobs = vec![
        JobResult {
            task_id: None,
            task_name: String::new(),
            status: TaskStatus::Inactive,
            exception: None,
            reports: Vec::new(),
        },
        JobResult {
            task_id: None,
            task_name: String::new(),
            status: TaskStatus::Abort,
            exception: None,
            reports: Vec::new(),
        },
    ];

    let output = distributor
        .run(&mut jobs, &CancellationToken::new())
        .await
        .unwrap();

    let results = parse(&output);
    assert_eq!(results[0]["taskName"], "Task 1");
    assert_eq!(results[1]["taskName"], "Task 2");
    assert_eq!(jobs[0].task_name, "Task 1");
}
