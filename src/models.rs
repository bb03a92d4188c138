#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStatus {
    On,
    Off,
}

impl RelayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayStatus::On => "ON",
            RelayStatus::Off => "OFF",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ON" => Some(RelayStatus::On),
            "OFF" => Some(RelayStatus::Off),
            _ => None,
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, RelayStatus::On)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateStatus {
    Normal,
    Alert,
}

impl AggregateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateStatus::Normal => "NORMAL",
            AggregateStatus::Alert => "ALERT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NORMAL" => Some(AggregateStatus::Normal),
            "ALERT" => Some(AggregateStatus::Alert),
            _ => None,
        }
    }
}

/// One measurement window's readings, in scaled engineering units.
///
/// Values are integer-scaled because the wire format carries plain
/// decimal integer strings. A sample is produced once per window and
/// replaced wholesale by the next window's sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementSample {
    pub current: u32,
    pub voltage: u32,
    pub rpm: u32,
    pub temp_c: u32,
    pub humidity: u32,
    pub temp_f: u32,
    pub heat_index_c: u32,
    pub heat_index_f: u32,
}

impl MeasurementSample {
    pub fn zeroed() -> Self {
        MeasurementSample {
            current: 0,
            voltage: 0,
            rpm: 0,
            temp_c: 0,
            humidity: 0,
            temp_f: 0,
            heat_index_c: 0,
            heat_index_f: 0,
        }
    }
}

/// Relay flags for the three protected channels, in frame order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayFlags {
    pub overcurrent: RelayStatus,
    pub overvoltage: RelayStatus,
    pub overtemperature: RelayStatus,
}

impl RelayFlags {
    pub fn all_off() -> Self {
        RelayFlags {
            overcurrent: RelayStatus::Off,
            overvoltage: RelayStatus::Off,
            overtemperature: RelayStatus::Off,
        }
    }

    /// NORMAL iff every channel flag is OFF. Reporting convenience only,
    /// never authoritative state.
    pub fn aggregate(&self) -> AggregateStatus {
        if self.overcurrent.is_on() || self.overvoltage.is_on() || self.overtemperature.is_on() {
            AggregateStatus::Alert
        } else {
            AggregateStatus::Normal
        }
    }
}

/// A decoded transmission frame, typed immediately after field-count
/// validation so downstream logic never handles raw field strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    pub sample: MeasurementSample,
    pub relays: RelayFlags,
    pub aggregate: AggregateStatus,
}
