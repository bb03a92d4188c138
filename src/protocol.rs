/// Transmission frame encoding and decoding.
///
/// One frame per measurement window, ampersand-delimited, fixed field
/// order:
///
/// `TYPE&v1&v2&v3&v4&v5&v6&v7&v8&r1&r2&r3&agg&RSV`
///
/// - 8 numeric sensor fields, rendered as plain decimal integer strings
///   (current, voltage, rpm, temp C, humidity, temp F, heat index C,
///   heat index F)
/// - 3 relay status tokens (ON/OFF)
/// - 1 aggregate status token (NORMAL/ALERT)
/// - 1 reserved trailer, always "RSV"
///
/// Field identity is positional; a shifted field silently corrupts every
/// downstream value, so the decoder rejects anything that does not match
/// the layout exactly.
use serde::Serialize;
use thiserror::Error;

use crate::models::{AggregateStatus, FrameRecord, MeasurementSample, RelayFlags, RelayStatus};

/// Reserved delimiter; must never appear inside a field value.
pub const DELIMITER: char = '&';
/// Fixed number of fields in a frame, type tag and reserved trailer
/// included.
pub const FIELD_COUNT: usize = 14;
/// Upper bound on a single field's length when reading untrusted input.
pub const MAX_FIELD_LEN: usize = 16;
/// Upper bound on a whole frame line, used by the link reader to cap
/// buffer growth on malformed or truncated input.
pub const MAX_FRAME_LEN: usize = 256;

const RESERVED_TOKEN: &str = "RSV";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("expected {FIELD_COUNT} fields, got {0}")]
    WrongFieldCount(usize),
    #[error("field {0} exceeds {MAX_FIELD_LEN} bytes")]
    OversizeField(usize),
    #[error("missing or unexpected type tag '{0}'")]
    BadTypeTag(String),
    #[error("field {0} is not a decimal integer: '{1}'")]
    BadNumeric(usize, String),
    #[error("field {0} is not a valid status token: '{1}'")]
    BadToken(usize, String),
    #[error("reserved field holds '{0}' instead of '{RESERVED_TOKEN}'")]
    BadReserved(String),
}

/// Serialize one sample plus the relay flags into a frame.
///
/// The returned string carries no terminator; the link writer appends
/// the newline message boundary.
pub fn encode_frame(type_tag: &str, sample: &MeasurementSample, relays: &RelayFlags) -> String {
    let fields: [String; FIELD_COUNT] = [
        type_tag.to_string(),
        sample.current.to_string(),
        sample.voltage.to_string(),
        sample.rpm.to_string(),
        sample.temp_c.to_string(),
        sample.humidity.to_string(),
        sample.temp_f.to_string(),
        sample.heat_index_c.to_string(),
        sample.heat_index_f.to_string(),
        relays.overcurrent.as_str().to_string(),
        relays.overvoltage.as_str().to_string(),
        relays.overtemperature.as_str().to_string(),
        relays.aggregate().as_str().to_string(),
        RESERVED_TOKEN.to_string(),
    ];
    fields.join(&DELIMITER.to_string())
}

/// A validated frame: the typed record for downstream logic, plus the
/// original field strings so the uplink payload preserves the exact
/// decimal representation produced by the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFrame {
    pub record: FrameRecord,
    fields: Vec<String>,
}

impl ParsedFrame {
    /// Field value by ordinal position (0 = type tag).
    pub fn field(&self, index: usize) -> &str {
        &self.fields[index]
    }
}

fn parse_numeric(fields: &[&str], index: usize) -> Result<u32, FrameError> {
    let raw = fields[index];
    // str::parse would tolerate a leading '+', which the encoder never
    // emits; inbound frames get the same plain-decimal contract.
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FrameError::BadNumeric(index, raw.to_string()));
    }
    raw.parse::<u32>()
        .map_err(|_| FrameError::BadNumeric(index, raw.to_string()))
}

fn parse_relay(fields: &[&str], index: usize) -> Result<RelayStatus, FrameError> {
    let raw = fields[index];
    RelayStatus::from_str(raw).ok_or_else(|| FrameError::BadToken(index, raw.to_string()))
}

/// Split one raw line into the fixed field layout and decode it.
///
/// Rejects on wrong field count, oversize field, or a type tag other
/// than `expected_tag`. A rejected frame must be dropped whole; nothing
/// partially parsed is ever forwarded.
pub fn decode_frame(line: &str, expected_tag: &str) -> Result<ParsedFrame, FrameError> {
    // One extra split slot so an over-long frame shows up as a count
    // mismatch instead of silently merging trailing fields.
    let fields: Vec<&str> = line.splitn(FIELD_COUNT + 1, DELIMITER).collect();
    if fields.len() != FIELD_COUNT {
        return Err(FrameError::WrongFieldCount(fields.len()));
    }
    for (index, field) in fields.iter().enumerate() {
        if field.len() > MAX_FIELD_LEN {
            return Err(FrameError::OversizeField(index));
        }
    }
    if fields[0] != expected_tag {
        return Err(FrameError::BadTypeTag(fields[0].to_string()));
    }

    let sample = MeasurementSample {
        current: parse_numeric(&fields, 1)?,
        voltage: parse_numeric(&fields, 2)?,
        rpm: parse_numeric(&fields, 3)?,
        temp_c: parse_numeric(&fields, 4)?,
        humidity: parse_numeric(&fields, 5)?,
        temp_f: parse_numeric(&fields, 6)?,
        heat_index_c: parse_numeric(&fields, 7)?,
        heat_index_f: parse_numeric(&fields, 8)?,
    };
    let relays = RelayFlags {
        overcurrent: parse_relay(&fields, 9)?,
        overvoltage: parse_relay(&fields, 10)?,
        overtemperature: parse_relay(&fields, 11)?,
    };
    let aggregate = AggregateStatus::from_str(fields[12])
        .ok_or_else(|| FrameError::BadToken(12, fields[12].to_string()))?;
    if fields[13] != RESERVED_TOKEN {
        return Err(FrameError::BadReserved(fields[13].to_string()));
    }

    Ok(ParsedFrame {
        record: FrameRecord {
            sample,
            relays,
            aggregate,
        },
        fields: fields.into_iter().map(str::to_string).collect(),
    })
}

/// The collector's JSON contract: key `TYPE` plus `VAL1`..`VAL12`
/// assigned positionally, all values carried as strings. The reserved
/// trailer is not forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UplinkPayload {
    #[serde(rename = "TYPE")]
    pub frame_type: String,
    #[serde(rename = "VAL1")]
    pub val1: String,
    #[serde(rename = "VAL2")]
    pub val2: String,
    #[serde(rename = "VAL3")]
    pub val3: String,
    #[serde(rename = "VAL4")]
    pub val4: String,
    #[serde(rename = "VAL5")]
    pub val5: String,
    #[serde(rename = "VAL6")]
    pub val6: String,
    #[serde(rename = "VAL7")]
    pub val7: String,
    #[serde(rename = "VAL8")]
    pub val8: String,
    #[serde(rename = "VAL9")]
    pub val9: String,
    #[serde(rename = "VAL10")]
    pub val10: String,
    #[serde(rename = "VAL11")]
    pub val11: String,
    #[serde(rename = "VAL12")]
    pub val12: String,
}

/// Map an accepted frame into the outgoing payload, preserving the
/// decimal-string representation already on the wire.
pub fn uplink_payload(frame: &ParsedFrame) -> UplinkPayload {
    let fields = &frame.fields;
    UplinkPayload {
        frame_type: fields[0].clone(),
        val1: fields[1].clone(),
        val2: fields[2].clone(),
        val3: fields[3].clone(),
        val4: fields[4].clone(),
        val5: fields[5].clone(),
        val6: fields[6].clone(),
        val7: fields[7].clone(),
        val8: fields[8].clone(),
        val9: fields[9].clone(),
        val10: fields[10].clone(),
        val11: fields[11].clone(),
        val12: fields[12].clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MeasurementSample {
        MeasurementSample {
            current: 10,
            voltage: 200,
            rpm: 1500,
            temp_c: 25,
            humidity: 60,
            temp_f: 77,
            heat_index_c: 26,
            heat_index_f: 79,
        }
    }

    fn relays() -> RelayFlags {
        RelayFlags {
            overcurrent: RelayStatus::Off,
            overvoltage: RelayStatus::On,
            overtemperature: RelayStatus::Off,
        }
    }

    #[test]
    fn encodes_fixed_layout() {
        let frame = encode_frame("ADU_TEXT", &sample(), &relays());
        assert_eq!(
            frame,
            "ADU_TEXT&10&200&1500&25&60&77&26&79&OFF&ON&OFF&ALERT&RSV"
        );
    }

    #[test]
    fn round_trip_preserves_every_field_byte_for_byte() {
        let encoded = encode_frame("ADU_TEXT", &sample(), &relays());
        let decoded = decode_frame(&encoded, "ADU_TEXT").unwrap();
        assert_eq!(decoded.record.sample, sample());
        assert_eq!(decoded.record.relays, relays());
        assert_eq!(decoded.record.aggregate, AggregateStatus::Alert);

        let original_fields: Vec<&str> = encoded.split(DELIMITER).collect();
        for (index, field) in original_fields.iter().enumerate() {
            assert_eq!(decoded.field(index), *field);
        }
    }

    #[test]
    fn round_trip_holds_across_numeric_range() {
        for value in [0u32, 1, 255, 1000, 65535] {
            let mut s = sample();
            s.voltage = value;
            s.rpm = value;
            let encoded = encode_frame("ADU_TEXT", &s, &RelayFlags::all_off());
            let decoded = decode_frame(&encoded, "ADU_TEXT").unwrap();
            assert_eq!(decoded.record.sample.voltage, value);
            assert_eq!(decoded.record.sample.rpm, value);
            assert_eq!(decoded.record.aggregate, AggregateStatus::Normal);
        }
    }

    #[test]
    fn rejects_missing_field() {
        let line = "ADU_TEXT&10&200&1500&25&60&77&26&79&OFF&ON&OFF&ALERT";
        assert_eq!(
            decode_frame(line, "ADU_TEXT"),
            Err(FrameError::WrongFieldCount(13))
        );
    }

    #[test]
    fn rejects_extra_delimiter() {
        let line = "ADU_TEXT&10&200&1500&25&60&77&26&79&OFF&ON&OFF&ALERT&RSV&";
        assert_eq!(
            decode_frame(line, "ADU_TEXT"),
            Err(FrameError::WrongFieldCount(15))
        );
    }

    #[test]
    fn rejects_wrong_type_tag() {
        let line = "PLC_TEXT&10&200&1500&25&60&77&26&79&OFF&ON&OFF&ALERT&RSV";
        assert_eq!(
            decode_frame(line, "ADU_TEXT"),
            Err(FrameError::BadTypeTag("PLC_TEXT".to_string()))
        );
    }

    #[test]
    fn rejects_over_length_field() {
        let oversize = "9".repeat(MAX_FIELD_LEN + 1);
        let line = format!(
            "ADU_TEXT&{}&200&1500&25&60&77&26&79&OFF&ON&OFF&ALERT&RSV",
            oversize
        );
        assert_eq!(
            decode_frame(&line, "ADU_TEXT"),
            Err(FrameError::OversizeField(1))
        );
    }

    #[test]
    fn rejects_non_numeric_and_bad_tokens() {
        let line = "ADU_TEXT&ten&200&1500&25&60&77&26&79&OFF&ON&OFF&ALERT&RSV";
        assert_eq!(
            decode_frame(line, "ADU_TEXT"),
            Err(FrameError::BadNumeric(1, "ten".to_string()))
        );

        // A signed value parses as u32 but the encoder can never emit
        // it; the plain-decimal contract rejects it on the way in too.
        let line = "ADU_TEXT&+10&200&1500&25&60&77&26&79&OFF&ON&OFF&ALERT&RSV";
        assert_eq!(
            decode_frame(line, "ADU_TEXT"),
            Err(FrameError::BadNumeric(1, "+10".to_string()))
        );

        let line = "ADU_TEXT&10&200&&25&60&77&26&79&OFF&ON&OFF&ALERT&RSV";
        assert_eq!(
            decode_frame(line, "ADU_TEXT"),
            Err(FrameError::BadNumeric(3, "".to_string()))
        );

        let line = "ADU_TEXT&10&200&1500&25&60&77&26&79&MAYBE&ON&OFF&ALERT&RSV";
        assert_eq!(
            decode_frame(line, "ADU_TEXT"),
            Err(FrameError::BadToken(9, "MAYBE".to_string()))
        );

        let line = "ADU_TEXT&10&200&1500&25&60&77&26&79&OFF&ON&OFF&ALM&RSV";
        assert_eq!(
            decode_frame(line, "ADU_TEXT"),
            Err(FrameError::BadToken(12, "ALM".to_string()))
        );

        let line = "ADU_TEXT&10&200&1500&25&60&77&26&79&OFF&ON&OFF&ALERT&XXX";
        assert_eq!(
            decode_frame(line, "ADU_TEXT"),
            Err(FrameError::BadReserved("XXX".to_string()))
        );
    }

    #[test]
    fn payload_serializes_thirteen_positional_keys() {
        let line = "ADU_TEXT&10&200&1500&25&60&77&26&79&OFF&ON&OFF&ALERT&RSV";
        let frame = decode_frame(line, "ADU_TEXT").unwrap();
        let payload = uplink_payload(&frame);

        let value = serde_json::to_value(&payload).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 13);
        assert_eq!(object["TYPE"], "ADU_TEXT");
        assert_eq!(object["VAL1"], "10");
        assert_eq!(object["VAL3"], "1500");
        assert_eq!(object["VAL8"], "79");
        assert_eq!(object["VAL9"], "OFF");
        assert_eq!(object["VAL10"], "ON");
        assert_eq!(object["VAL12"], "ALERT");
        assert!(object.get("VAL13").is_none());
        assert!(object.values().all(|v| v.is_string()));
    }
}
