/**
 * Informer Sync Replay
 *
 * Feeds a recorded stream of bus messages through an in-process monitor and
 * prints the resulting connection status view as JSON.
 *
 * Input is newline-delimited JSON on stdin, one instruction per line:
 *
 * ```text
 * {"kind":"snapshot","connections":{"k8s":[{"id":"cluster-1","name":"Production"}]}}
 * {"kind":"publish","topic":"connection/status","payload":{"pluginID":"k8s","connectionID":"cluster-1","status":"CONNECTED"}}
 * {"kind":"publish","topic":"informer/STATE","payload":{"pluginID":"k8s","connectionID":"cluster-1","resourceKey":"Pod","state":"synced"}}
 * {"kind":"wait","millis":6000}
 * ```
 */

#[cfg(feature = "cli")]
mod replay {
    use informer_sync::connection::InMemoryClient;
    use informer_sync::monitor::SyncMonitor;
    use informer_sync::realtime::EventBus;
    use informer_sync::shared::{ConnectionSnapshot, MonitorConfig};
    use serde::Deserialize;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, BufReader};

    /// Time given to the monitor to drain after each instruction
    const SETTLE: Duration = Duration::from_millis(20);

    #[derive(Debug, Deserialize)]
    #[serde(tag = "kind", rename_all = "snake_case")]
    enum Instruction {
        Publish {
            topic: String,
            payload: serde_json::Value,
        },
        Snapshot {
            connections: ConnectionSnapshot,
        },
        Wait {
            millis: u64,
        },
    }

    pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
        let config = MonitorConfig::from_env()?;
        tracing::info!("[Replay] Using {:?}", config);

        let bus = EventBus::from_config(&config);
        let client = Arc::new(InMemoryClient::new());
        let monitor = SyncMonitor::spawn(&bus, Arc::clone(&client), config);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut line_number = 0usize;
        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }

            let instruction: Instruction = match serde_json::from_str(&line) {
                Ok(instruction) => instruction,
                Err(e) => {
                    tracing::warn!("[Replay] Skipping line {}: {}", line_number, e);
                    continue;
                }
            };

            match instruction {
                Instruction::Publish { topic, payload } => {
                    let receivers = bus.publish(&topic, payload);
                    tracing::debug!("[Replay] Line {} reached {} receivers", line_number, receivers);
                }
                Instruction::Snapshot { connections } => {
                    client.set_snapshot(connections);
                    monitor.refresh()?;
                }
                Instruction::Wait { millis } => {
                    tokio::time::sleep(Duration::from_millis(millis)).await;
                }
            }
            tokio::time::sleep(SETTLE).await;
        }

        let status = monitor.status();
        println!("{}", serde_json::to_string_pretty(&status)?);
        monitor.shutdown().await;
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("[Replay] Reading instructions from stdin");
    replay::run().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("Replay requires the 'cli' feature to be enabled.");
    eprintln!("Run with: cargo run --bin informer-sync-replay --features cli");
    std::process::exit(1);
}
