use crate::output::print_event;
use anyhow::Context;
use futures_util::StreamExt;
use simple_ssdp::DiscoveryEngine;
use simple_ssdp::SsdpConfig;
use simple_ssdp::SsdpEvent;
use std::sync::Arc;
use std::time::Duration;

pub async fn search(config: SsdpConfig, target: &str, timeout: u64, json: bool) -> anyhow::Result<()> {
    // Our own announcements must not come back as responses.
    let config = config.with_multicast_loop(false);
    let engine = Arc::new(DiscoveryEngine::new(config).context("Failed to create the SSDP engine")?);
    let own_uuid = engine.identity().uuid.to_string();
    let mut events = engine.subscribe();
    engine.start().await?;
    engine.discover(target).await;

    let mut found = 0;
    let collect = async {
        while let Some(event) = events.next().await {
            if is_own(&event, &own_uuid) {
                continue;
            }
            if let SsdpEvent::Discover(_) = event {
                found += 1;
            }
            print_event(&event, json)?;
        }
        anyhow::Ok(())
    };
    if let Ok(result) = tokio::time::timeout(Duration::from_secs(timeout), collect).await {
        result?;
    }
    log::info!("Received {} responses for {}", found, target);

    engine.stop(&own_uuid).await?;
    Ok(())
}

/// Whether `event` was sent by the device with `own_uuid`.
fn is_own(event: &SsdpEvent, own_uuid: &str) -> bool {
    let record = match event {
        SsdpEvent::Discover(record) | SsdpEvent::Notify(record) => record,
        SsdpEvent::Error(_) => return false,
    };
    record
        .header("usn")
        .is_some_and(|usn| usn.starts_with(own_uuid))
}
