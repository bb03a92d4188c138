/// Threshold-driven relay control.
///
/// Each protected channel compares the latest sample against a single
/// normal-range bound. Two levels only (normal vs. triggered), no
/// hysteresis band; an earlier three-level NOR/ALM/BUZ scheme was
/// abandoned and is intentionally not implemented.
use log::info;

use crate::config::MonitorConfig;
use crate::models::{MeasurementSample, RelayFlags, RelayStatus};

/// One digital relay output. Implementations receive the electrical
/// level to drive; polarity is resolved by the channel.
pub trait RelayPin {
    fn write(&mut self, level: bool);
}

/// Pin stand-in that logs transitions, the way the reference firmware
/// printed relay actions on its console.
#[derive(Debug)]
pub struct LoggingRelayPin {
    name: &'static str,
}

impl LoggingRelayPin {
    pub fn new(name: &'static str) -> Self {
        LoggingRelayPin { name }
    }
}

impl RelayPin for LoggingRelayPin {
    fn write(&mut self, level: bool) {
        info!("Relay pin {} driven {}", self.name, if level { "HIGH" } else { "LOW" });
    }
}

/// One channel of the relay state machine. The flag is owned here
/// exclusively; the frame encoder only reads the flags reported by
/// `RelayBank::evaluate`.
#[derive(Debug)]
pub struct RelayChannel<P: RelayPin> {
    pin: P,
    flag: RelayStatus,
    active_low: bool,
}

impl<P: RelayPin> RelayChannel<P> {
    /// Drives the pin to its inactive level once so the output is never
    /// left floating before the first evaluation.
    pub fn new(mut pin: P, active_low: bool) -> Self {
        pin.write(active_low);
        RelayChannel {
            pin,
            flag: RelayStatus::Off,
            active_low,
        }
    }

    fn drive(&mut self, active: bool) {
        let level = if self.active_low { !active } else { active };
        self.pin.write(level);
    }

    /// Evaluate the level comparison for this window. The pin is written
    /// only on a transition, so re-evaluating an unchanged sample is
    /// idempotent.
    pub fn evaluate(&mut self, value: u32, bound: u32) -> RelayStatus {
        let triggered = value > bound;
        match (triggered, self.flag) {
            (true, RelayStatus::Off) => {
                self.drive(true);
                self.flag = RelayStatus::On;
            }
            (false, RelayStatus::On) => {
                self.drive(false);
                self.flag = RelayStatus::Off;
            }
            _ => {}
        }
        self.flag
    }

    pub fn flag(&self) -> RelayStatus {
        self.flag
    }
}

/// The three protected channels, evaluated together once per window.
#[derive(Debug)]
pub struct RelayBank<P: RelayPin> {
    overcurrent: RelayChannel<P>,
    overvoltage: RelayChannel<P>,
    overtemperature: RelayChannel<P>,
}

impl<P: RelayPin> RelayBank<P> {
    pub fn new(current_pin: P, voltage_pin: P, temp_pin: P, active_low: bool) -> Self {
        RelayBank {
            overcurrent: RelayChannel::new(current_pin, active_low),
            overvoltage: RelayChannel::new(voltage_pin, active_low),
            overtemperature: RelayChannel::new(temp_pin, active_low),
        }
    }

    pub fn evaluate(&mut self, sample: &MeasurementSample, config: &MonitorConfig) -> RelayFlags {
        RelayFlags {
            overcurrent: self.overcurrent.evaluate(sample.current, config.current_bound),
            overvoltage: self.overvoltage.evaluate(sample.voltage, config.voltage_bound),
            overtemperature: self
                .overtemperature
                .evaluate(sample.temp_c, config.temp_bound),
        }
    }

    pub fn flags(&self) -> RelayFlags {
        RelayFlags {
            overcurrent: self.overcurrent.flag(),
            overvoltage: self.overvoltage.flag(),
            overtemperature: self.overtemperature.flag(),
        }
    }
}
