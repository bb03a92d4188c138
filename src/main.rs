use log::{error, info};
use tokio::time::sleep;

use rust_motor_monitor::config::MonitorConfig;
use rust_motor_monitor::forwarding::ForwardingNode;
use rust_motor_monitor::sensing::relays::{LoggingRelayPin, RelayBank};
use rust_motor_monitor::sensing::sampler::SimulatedSensorBank;
use rust_motor_monitor::sensing::SensingNode;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match MonitorConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // Sensing node with the simulated sensor bank and logging relay pins
    let relays = RelayBank::new(
        LoggingRelayPin::new("overcurrent"),
        LoggingRelayPin::new("overvoltage"),
        LoggingRelayPin::new("overtemperature"),
        config.relay_active_low,
    );
    let sensing = SensingNode::new(config.clone(), SimulatedSensorBank::new(), relays);

    // Simulated speed-sensor edge source, standing in for the hardware
    // interrupt. It only ever touches the shared pulse counter.
    let counter = sensing.pulse_counter();
    let edge_interval = config.simulated_edge_interval();
    tokio::spawn(async move {
        loop {
            sleep(edge_interval).await;
            counter.record_edge();
        }
    });

    // Inter-node serial link: sensing writes frames, forwarding reads them
    let (sensing_link, forwarding_link) = tokio::io::duplex(1024);
    let forwarding = ForwardingNode::new(config)?;

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        let _ = tx.send(());
    });

    // Run both node loops or wait for shutdown signal
    tokio::select! {
        result = sensing.run(sensing_link) => {
            match result {
                Ok(_) => info!("Sensing node stopped"),
                Err(e) => error!("Sensing node failed: {}", e),
            }
        }
        result = forwarding.run(forwarding_link) => {
            match result {
                Ok(_) => info!("Forwarding node stopped"),
                Err(e) => error!("Forwarding node failed: {}", e),
            }
        }
        _ = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
