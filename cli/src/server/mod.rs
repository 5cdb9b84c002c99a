use crate::output::print_event;
use anyhow::Context;
use futures_util::StreamExt;
use simple_ssdp::DiscoveryEngine;
use simple_ssdp::SsdpConfig;
use std::sync::Arc;

pub async fn serve(config: SsdpConfig, services: Vec<String>, json: bool) -> anyhow::Result<()> {
    let mut engine = DiscoveryEngine::new(config).context("Failed to create the SSDP engine")?;
    for service in &services {
        engine.register(service);
    }
    log::info!(
        "Registered {} services for device {}",
        engine.registry().count(),
        engine.identity().uuid
    );
    let engine = Arc::new(engine);
    let mut events = engine.subscribe();
    engine.start().await?;

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => print_event(&event, json)?,
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    log::info!("Withdrawing {} services", engine.registry().count());
    for usn in engine.registry().services() {
        engine.withdraw(usn).await?;
    }
    engine.stop(&engine.identity().uuid.to_string()).await?;
    Ok(())
}
