/// Sensing node: the fixed-period control loop that owns sampling,
/// pulse-rate estimation, relay control, and frame encoding.
pub mod pulse;
pub mod relays;
pub mod sampler;

use std::sync::Arc;

use log::{debug, error, info};
use time::OffsetDateTime;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::sleep;

use crate::config::MonitorConfig;
use crate::models::MeasurementSample;
use crate::protocol::encode_frame;
use crate::utils::format_datetime;
use pulse::{PulseCounter, RpmEstimator};
use relays::{RelayBank, RelayPin};
use sampler::{update_sample, CurrentSensor, EnvSensor, VoltageSensor};

/// The sensing node. All mutable state lives here, owned by the control
/// loop; the pulse counter is the single exception, shared with the edge
/// handler through an atomic.
pub struct SensingNode<S, P: RelayPin> {
    config: MonitorConfig,
    counter: Arc<PulseCounter>,
    estimator: RpmEstimator,
    sample: MeasurementSample,
    relays: RelayBank<P>,
    sensors: S,
}

impl<S, P> SensingNode<S, P>
where
    S: CurrentSensor + VoltageSensor + EnvSensor,
    P: RelayPin,
{
    pub fn new(config: MonitorConfig, sensors: S, relays: RelayBank<P>) -> Self {
        SensingNode {
            config,
            counter: Arc::new(PulseCounter::new()),
            estimator: RpmEstimator::new(),
            sample: MeasurementSample::zeroed(),
            relays,
            sensors,
        }
    }

    /// Handle for the speed-sensor edge source. Incrementing through
    /// this handle is the only operation permitted outside the loop.
    pub fn pulse_counter(&self) -> Arc<PulseCounter> {
        Arc::clone(&self.counter)
    }

    /// Run one measurement window: claim the pulse count, re-sample all
    /// sensors, evaluate the relay thresholds, and encode the frame.
    pub fn run_window(&mut self) -> String {
        let pulse_count = self.counter.take();
        let rpm = self
            .estimator
            .update(pulse_count, self.config.rpm_factor);

        let current_raw = CurrentSensor::read_raw(&mut self.sensors);
        let voltage_raw = VoltageSensor::read_raw(&mut self.sensors);
        let env = self.sensors.read();

        update_sample(
            &mut self.sample,
            current_raw,
            voltage_raw,
            rpm,
            env,
            &self.config,
        );

        let flags = self.relays.evaluate(&self.sample, &self.config);
        debug!(
            "Window: pulses={}, rpm={}, current={}, voltage={}, temp={}C, status={}",
            pulse_count,
            rpm,
            self.sample.current,
            self.sample.voltage,
            self.sample.temp_c,
            flags.aggregate().as_str()
        );

        encode_frame(&self.config.frame_type_tag, &self.sample, &flags)
    }

    /// Control loop: one frame per window, pushed onto the link. A
    /// failed write means that frame is permanently lost; sampling and
    /// relay protection continue regardless.
    pub async fn run<W>(mut self, mut link: W) -> Result<(), Box<dyn std::error::Error>>
    where
        W: AsyncWrite + Unpin,
    {
        info!(
            "Sensing node started at {} (window {:?})",
            format_datetime(&OffsetDateTime::now_utc()),
            self.config.window
        );

        loop {
            sleep(self.config.window).await;

            let frame = self.run_window();
            let mut line = frame.into_bytes();
            line.push(b'\n');
            if let Err(e) = link.write_all(&line).await {
                error!("Frame lost, link write failed: {}", e);
            }
        }
    }
}
