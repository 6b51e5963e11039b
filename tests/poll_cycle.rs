//! End-to-end poll cycles against scripted golemsp output

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use nodewatch::adapters::{Clock, StatusSource, Transport};
use nodewatch::config::MonitorConfig;
use nodewatch::error::{NodewatchError, Result};
use nodewatch::persistence::RecipientId;
use nodewatch::{Monitor, Platform, SnapshotStore, SubscriberRegistry};
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

const TEMPLATE: &str = include_str!("fixtures/golemsp_status.txt");

fn golemsp_output(total: &str, in_progress: u64, total_processed: u64) -> String {
    TEMPLATE
        .replace("{total}", total)
        .replace("{processed}", "0")
        .replace("{in_progress}", &in_progress.to_string())
        .replace("{total_processed}", &total_processed.to_string())
}

#[derive(Default)]
struct ScriptedSource {
    outputs: Mutex<VecDeque<Option<String>>>,
}

impl ScriptedSource {
    fn push(&self, output: Option<String>) {
        self.outputs.lock().unwrap().push_back(output);
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn run_status_check(&self, platform: &Platform) -> Result<String> {
        match self.outputs.lock().unwrap().pop_front() {
            Some(Some(output)) => Ok(output),
            _ => Err(NodewatchError::Timeout {
                platform: platform.name.clone(),
                secs: 30,
            }),
        }
    }
}

#[derive(Default)]
struct Inbox {
    messages: Mutex<Vec<(RecipientId, String)>>,
}

#[async_trait]
impl Transport for Inbox {
    async fn deliver(&self, recipient: RecipientId, message: &str) -> Result<()> {
        self.messages
            .lock()
            .unwrap()
            .push((recipient, message.to_string()));
        Ok(())
    }
}

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 5, 12, 0, 0).unwrap()
    }
}

fn monitor(data_dir: &Path, source: Arc<ScriptedSource>, inbox: Arc<Inbox>) -> Monitor {
    let config = MonitorConfig {
        delivery_delay_ms: 0,
        ..Default::default()
    };
    Monitor::new(
        config,
        vec![Platform::golem()],
        source,
        inbox,
        SnapshotStore::in_dir(data_dir),
        Arc::new(SubscriberRegistry::in_dir(data_dir)),
    )
    .with_clock(Arc::new(FixedClock))
}

#[tokio::test]
async fn test_activity_produces_one_message_per_change() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::default());
    let inbox = Arc::new(Inbox::default());
    let monitor = monitor(dir.path(), source.clone(), inbox.clone());
    monitor.register_subscriber(42).await;

    source.push(Some(golemsp_output("10.0", 0, 5)));
    source.push(Some(golemsp_output("10.5", 2, 7)));

    let first = monitor.run_cycle().await;
    assert!(!first.outcome("golem").unwrap().changes.any());

    let second = monitor.run_cycle().await;
    let changes = &second.outcome("golem").unwrap().changes;
    assert_eq!(changes.new_job_count, 2);
    assert_eq!(changes.completed_job_count, 2);
    assert_eq!(changes.wallet_balance_delta, dec!(0.5));

    let messages = inbox.messages.lock().unwrap().clone();
    assert_eq!(messages.len(), 3);
    assert!(messages.iter().all(|(recipient, _)| *recipient == 42));
    assert!(messages[0].1.contains("New jobs on GolemSP"));
    assert!(messages[1].1.contains("Jobs completed on GolemSP"));
    assert!(messages[2].1.contains("Payment received on GolemSP"));
}

#[tokio::test]
async fn test_failed_check_keeps_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::default());
    let inbox = Arc::new(Inbox::default());
    let monitor = monitor(dir.path(), source.clone(), inbox.clone());
    monitor.register_subscriber(1).await;

    source.push(Some(golemsp_output("3", 1, 10)));
    source.push(None);
    source.push(Some(golemsp_output("3", 1, 11)));

    monitor.run_cycle().await;
    let failed = monitor.run_cycle().await;
    assert!(failed.failed("golem"));
    assert_eq!(
        monitor
            .latest_snapshot("golem")
            .await
            .unwrap()
            .tasks
            .total_processed,
        Some(10)
    );

    // Diff is against the last good snapshot
    let recovered = monitor.run_cycle().await;
    assert_eq!(
        recovered.outcome("golem").unwrap().changes.completed_job_count,
        1
    );
    assert_eq!(inbox.messages.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::default());
    let inbox = Arc::new(Inbox::default());

    {
        let first = monitor(dir.path(), source.clone(), inbox.clone());
        first.register_subscriber(3).await;
        source.push(Some(golemsp_output("1", 0, 1)));
        first.run_cycle().await;
    }

    let second = monitor(dir.path(), source.clone(), inbox.clone());
    assert!(second.is_subscribed(3).await);

    source.push(Some(golemsp_output("1", 0, 1)));
    let cycle = second.run_cycle().await;
    assert!(!cycle.outcome("golem").unwrap().changes.any());
    assert!(inbox.messages.lock().unwrap().is_empty());

    assert!(dir.path().join("state.json").exists());
    assert!(!dir.path().join("state.json.tmp").exists());
}

#[tokio::test]
async fn test_unsubscribed_recipient_gets_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::default());
    let inbox = Arc::new(Inbox::default());
    let monitor = monitor(dir.path(), source.clone(), inbox.clone());

    monitor.register_subscriber(1).await;
    monitor.register_subscriber(2).await;
    assert!(monitor.unregister_subscriber(2).await);

    source.push(Some(golemsp_output("1", 0, 1)));
    source.push(Some(golemsp_output("1", 3, 1)));
    monitor.run_cycle().await;
    monitor.run_cycle().await;

    let messages = inbox.messages.lock().unwrap().clone();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, 1);
}
