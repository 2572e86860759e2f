use serde::Serialize;

/// One measurement of one payload, as written to CSV or JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRecord {
    pub timestamp: String, // UTC RFC 3339, shared by the whole batch
    pub payload_index: usize,
    pub payload: String, // base64 as received
    pub name: &'static str,
    pub value: f64,
}
