//! Skipped triggers are reported at warning level

mod common;

use anyhow::Result;
use common::{config, mount_destination, mount_source};
use log::{Level, Log, Metadata, Record};
use resource_cloner::migration::Orchestrator;
use std::sync::Mutex;
use wiremock::MockServer;

struct Capture {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for Capture {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    records: Mutex::new(Vec::new()),
};

#[tokio::test]
async fn test_trigger_outside_questionnaire_is_warned() -> Result<()> {
    log::set_logger(&CAPTURE).map_err(|e| anyhow::anyhow!("{}", e))?;
    log::set_max_level(log::LevelFilter::Trace);

    let source = MockServer::start().await;
    let destination = MockServer::start().await;
    mount_source(&source).await;
    mount_destination(&destination, 201).await;

    let workdir = tempfile::tempdir()?;
    let orchestrator = Orchestrator::with_client(config(&source, &destination, workdir.path()), reqwest::Client::new());
    orchestrator.run(&mut ()).await?;

    let records = CAPTURE.records.lock().map_err(|e| anyhow::anyhow!("{}", e))?;
    assert!(
        records
            .iter()
            .any(|(level, message)| *level == Level::Warn && message.contains("t-foreign")),
        "no warning for the skipped trigger"
    );
    Ok(())
}
