//! Packet validation - raw datagram bytes to a validated measurement
//!
//! The wire payload is a small UTF-8 JSON object:
//! `{ "node": "A", "peer": "B", "distance": 2.0, "quality": 0.8, "ts": 123 }`
//!
//! Strict mode requires all four data fields to be present. Lenient mode
//! substitutes out-of-range placeholders for missing fields, which the range
//! checks then reject anyway; the toggle only changes the rejection reason.

use serde_json::Value;
use thiserror::Error;

use proxima_core::{Measurement, NodeId};

/// Why a packet was rejected; every variant counts as invalid
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("payload is not valid JSON")]
    MalformedJson,

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing required field {0:?}")]
    MissingField(&'static str),

    #[error("field {0:?} has the wrong type")]
    WrongType(&'static str),

    #[error("field {0:?} is not a single-character id")]
    BadNodeId(&'static str),

    #[error("distance out of range [0, 100]")]
    DistanceOutOfRange,

    #[error("quality out of range [0, 1]")]
    QualityOutOfRange,
}

const REQUIRED_FIELDS: [&str; 4] = ["node", "peer", "distance", "quality"];

/// Validate one raw datagram payload, stamping it with the arrival time
pub fn validate_packet(
    payload: &[u8],
    now: f64,
    strict: bool,
) -> Result<Measurement, RejectReason> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|_| RejectReason::MalformedJson)?;
    let object = value.as_object().ok_or(RejectReason::NotAnObject)?;

    if strict {
        for field in REQUIRED_FIELDS {
            if !object.contains_key(field) {
                return Err(RejectReason::MissingField(field));
            }
        }
    }

    let node = id_field(&value, "node")?;
    let peer = id_field(&value, "peer")?;
    let distance = num_field(&value, "distance")?;
    let quality = num_field(&value, "quality")?;

    // contains() is false for NaN, so non-finite values are rejected too
    if !(0.0..=100.0).contains(&distance) {
        return Err(RejectReason::DistanceOutOfRange);
    }
    if !(0.0..=1.0).contains(&quality) {
        return Err(RejectReason::QualityOutOfRange);
    }

    let timestamp = value.get("ts").and_then(Value::as_f64).unwrap_or(now);

    Ok(Measurement {
        node,
        peer,
        distance,
        quality,
        timestamp,
        received_at: now,
    })
}

fn id_field(value: &Value, field: &'static str) -> Result<NodeId, RejectReason> {
    match value.get(field) {
        Some(Value::String(s)) => {
            NodeId::parse(s).map_err(|_| RejectReason::BadNodeId(field))
        }
        Some(_) => Err(RejectReason::WrongType(field)),
        // lenient path: treated as the empty string, which is not a valid id
        None => Err(RejectReason::BadNodeId(field)),
    }
}

fn num_field(value: &Value, field: &'static str) -> Result<f64, RejectReason> {
    match value.get(field) {
        Some(Value::Number(n)) => n.as_f64().ok_or(RejectReason::WrongType(field)),
        // numeric strings parse, as the reporting firmware sometimes quotes
        Some(Value::String(s)) => {
            s.trim().parse::<f64>().map_err(|_| RejectReason::WrongType(field))
        }
        Some(_) => Err(RejectReason::WrongType(field)),
        // lenient path: placeholder that fails the range check
        None => Ok(-1.0),
    }
}
