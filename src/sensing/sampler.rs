/// Sensor seams, scaling rules, and the simulated sensor bank.
use log::warn;

use crate::config::MonitorConfig;
use crate::models::MeasurementSample;

/// Raw environmental reading. Temperature and humidity come from one
/// physical sensor and succeed or fail together.
#[derive(Debug, Clone, Copy)]
pub struct EnvReading {
    pub temp_c: f32,
    pub humidity: f32,
}

/// Raw ADC source for the motor current channel.
pub trait CurrentSensor {
    fn read_raw(&mut self) -> u32;
}

/// Raw ADC source for the motor voltage channel.
pub trait VoltageSensor {
    fn read_raw(&mut self) -> u32;
}

/// Environmental sensor. Returns `None` on a failed read (the hardware
/// part reports NaN); the window's environmental update is then skipped
/// and the previous values are retained.
pub trait EnvSensor {
    fn read(&mut self) -> Option<EnvReading>;
}

/// Scale a raw current ADC reading. Readings below the noise floor are
/// forced to zero before any scaling applies.
pub fn scale_current(raw: u32, config: &MonitorConfig) -> u32 {
    if raw < config.current_floor {
        return 0;
    }
    (raw as f32 * config.current_scale) as u32
}

/// Scale a raw voltage ADC reading through the divider constant
/// (`raw / divisor * 1000`). Scaled values below the floor report zero.
pub fn scale_voltage(raw: u32, config: &MonitorConfig) -> u32 {
    let scaled = (raw as f32 / config.voltage_divisor * 1000.0) as u32;
    if scaled < config.voltage_floor {
        0
    } else {
        scaled
    }
}

fn c_to_f(temp_c: f32) -> f32 {
    temp_c * 9.0 / 5.0 + 32.0
}

fn as_field(value: f32) -> u32 {
    if value.is_finite() && value > 0.0 {
        value as u32
    } else {
        0
    }
}

/// Fold one window's raw readings into the sample, retaining previous
/// environmental values when the sensor read failed.
pub fn update_sample(
    sample: &mut MeasurementSample,
    current_raw: u32,
    voltage_raw: u32,
    rpm: u32,
    env: Option<EnvReading>,
    config: &MonitorConfig,
) {
    sample.current = scale_current(current_raw, config);
    sample.voltage = scale_voltage(voltage_raw, config);
    sample.rpm = rpm;

    match env {
        Some(reading) if reading.temp_c.is_finite() && reading.humidity.is_finite() => {
            // Heat index per the original system's simplified model.
            let heat_index_c = reading.temp_c + reading.humidity / 100.0 * 2.0;
            sample.temp_c = as_field(reading.temp_c);
            sample.humidity = as_field(reading.humidity);
            sample.temp_f = as_field(c_to_f(reading.temp_c));
            sample.heat_index_c = as_field(heat_index_c);
            sample.heat_index_f = as_field(c_to_f(heat_index_c));
        }
        _ => {
            warn!("Environmental sensor read failed, retaining previous values");
        }
    }
}

/// Deterministic stand-in for the board's sensors so the binary runs
/// end-to-end without hardware. Values wobble around the reference
/// baselines (6.25 A-scale current, 24 V-scale voltage, 25 C ambient)
/// instead of using a random source, which keeps runs reproducible.
#[derive(Debug, Default)]
pub struct SimulatedSensorBank {
    tick: u32,
}

impl SimulatedSensorBank {
    pub fn new() -> Self {
        SimulatedSensorBank { tick: 0 }
    }

    fn wobble(&self, span: u32) -> u32 {
        // Triangle wave over `2 * span` ticks.
        let phase = self.tick % (span * 2);
        if phase < span {
            phase
        } else {
            span * 2 - phase
        }
    }
}

impl CurrentSensor for SimulatedSensorBank {
    fn read_raw(&mut self) -> u32 {
        625 + self.wobble(30)
    }
}

impl VoltageSensor for SimulatedSensorBank {
    fn read_raw(&mut self) -> u32 {
        900 + self.wobble(20)
    }
}

impl EnvSensor for SimulatedSensorBank {
    // Read once per window, after the electrical channels; advances the
    // wobble phase for the next window.
    fn read(&mut self) -> Option<EnvReading> {
        let reading = EnvReading {
            temp_c: 25.0 + self.wobble(6) as f32 * 0.5,
            humidity: 45.0 + self.wobble(10) as f32,
        };
        self.tick = self.tick.wrapping_add(1);
        Some(reading)
    }
}
