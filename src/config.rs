use std::env;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

/// Runtime configuration, loaded once at startup and immutable afterwards.
///
/// Everything is supplied through environment variables (a `.env` file is
/// honored). Only the collector base URL is required; all sensing-side
/// constants carry board-appropriate defaults.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Base URL of the remote collector; frames are POSTed to
    /// `<base>/send-data`.
    pub collector_base_url: String,
    /// Fixed measurement window over which pulses accumulate and all
    /// sensors are re-sampled.
    pub window: Duration,
    /// Type tag prefixed to every transmission frame.
    pub frame_type_tag: String,

    // Per-channel normal-range bounds, in the same scaled units as the
    // measurement sample. A reading strictly above its bound trips the
    // channel relay.
    pub current_bound: u32,
    pub voltage_bound: u32,
    pub temp_bound: u32,

    // Sensor scaling constants (board wiring details).
    /// Raw current ADC readings below this floor report as 0.
    pub current_floor: u32,
    /// Multiplier applied to raw current readings above the floor.
    pub current_scale: f32,
    /// Voltage divider constant: volts_scaled = raw / divisor * 1000.
    pub voltage_divisor: f32,
    /// Scaled voltage readings below this floor report as 0.
    pub voltage_floor: u32,
    /// Pulses-to-RPM constant; encodes pulses-per-revolution and the
    /// window-to-per-minute conversion together.
    pub rpm_factor: u32,

    /// Relay coil polarity: true means logic LOW drives the coil ON
    /// (the reference wiring).
    pub relay_active_low: bool,

    /// Bound on a single uplink HTTP request.
    pub uplink_timeout: Duration,
    /// Edge rate for the simulated pulse source in the demo binary.
    pub simulated_pulse_hz: u32,
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("{} has an unparseable value: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

impl MonitorConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        let collector_base_url = env::var("COLLECTOR_BASE_URL")
            .map_err(|_| "COLLECTOR_BASE_URL environment variable not set")?;
        Url::parse(&collector_base_url)
            .map_err(|e| format!("COLLECTOR_BASE_URL is not a valid URL: {}", e))?;
        // POST path is appended later; a trailing slash would double up.
        let collector_base_url = collector_base_url.trim_end_matches('/').to_string();

        let config = MonitorConfig {
            collector_base_url,
            window: Duration::from_secs(env_or("WINDOW_SECS", 10u64)?),
            frame_type_tag: env::var("FRAME_TYPE_TAG").unwrap_or_else(|_| "ADU_TEXT".to_string()),
            current_bound: env_or("CURRENT_BOUND", 900)?,
            voltage_bound: env_or("VOLTAGE_BOUND", 22_000)?,
            temp_bound: env_or("TEMP_BOUND", 50)?,
            current_floor: env_or("CURRENT_FLOOR", 20)?,
            current_scale: env_or("CURRENT_SCALE", 1.0f32)?,
            voltage_divisor: env_or("VOLTAGE_DIVISOR", 42.8f32)?,
            voltage_floor: env_or("VOLTAGE_FLOOR", 1000)?,
            rpm_factor: env_or("RPM_FACTOR", 3)?,
            relay_active_low: env_or("RELAY_ACTIVE_LOW", true)?,
            uplink_timeout: Duration::from_secs(env_or("UPLINK_TIMEOUT_SECS", 10u64)?),
            simulated_pulse_hz: env_or("SIMULATED_PULSE_HZ", 50)?,
        };

        if config.window.is_zero() {
            return Err("WINDOW_SECS must be at least 1".into());
        }
        if config.voltage_divisor <= 0.0 {
            return Err("VOLTAGE_DIVISOR must be positive".into());
        }

        Ok(config)
    }

    /// Interval between simulated speed-sensor edges. Computed in
    /// microseconds and never zero, so the edge task always yields even
    /// at rates above 1 kHz.
    pub fn simulated_edge_interval(&self) -> Duration {
        Duration::from_micros((1_000_000 / u64::from(self.simulated_pulse_hz.max(1))).max(1))
    }

    /// Fixed defaults with a given collector URL, used by tests and the
    /// integration harness.
    pub fn with_collector(collector_base_url: &str) -> Self {
        MonitorConfig {
            collector_base_url: collector_base_url.trim_end_matches('/').to_string(),
            window: Duration::from_secs(10),
            frame_type_tag: "ADU_TEXT".to_string(),
            current_bound: 900,
            voltage_bound: 22_000,
            temp_bound: 50,
            current_floor: 20,
            current_scale: 1.0,
            voltage_divisor: 42.8,
            voltage_floor: 1000,
            rpm_factor: 3,
            relay_active_low: true,
            uplink_timeout: Duration::from_secs(10),
            simulated_pulse_hz: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_wiring() {
        let config = MonitorConfig::with_collector("http://localhost:5000/");
        assert_eq!(config.collector_base_url, "http://localhost:5000");
        assert_eq!(config.window, Duration::from_secs(10));
        assert_eq!(config.rpm_factor, 3);
        assert_eq!(config.current_floor, 20);
        assert!(config.relay_active_low);
    }

    #[test]
    fn edge_interval_never_truncates_to_zero() {
        let mut config = MonitorConfig::with_collector("http://localhost:5000");
        assert_eq!(config.simulated_edge_interval(), Duration::from_millis(20));

        config.simulated_pulse_hz = 5000;
        assert_eq!(config.simulated_edge_interval(), Duration::from_micros(200));

        // Rates past 1 MHz and a zero rate both stay schedulable.
        config.simulated_pulse_hz = 10_000_000;
        assert_eq!(config.simulated_edge_interval(), Duration::from_micros(1));
        config.simulated_pulse_hz = 0;
        assert_eq!(config.simulated_edge_interval(), Duration::from_secs(1));
    }

    #[test]
    fn env_or_rejects_garbage() {
        std::env::set_var("TEST_ENV_OR_GARBAGE", "not-a-number");
        let result: Result<u32, String> = env_or("TEST_ENV_OR_GARBAGE", 5);
        assert!(result.is_err());
        std::env::remove_var("TEST_ENV_OR_GARBAGE");
    }
}
