//! Persisted fence encoding.
//!
//! Each fence is stored as a flat object with the legacy field names:
//!
//! ```json
//! {"latitude":35.0,"longitude":139.0,"radius":500.0,
//!  "identifier":"F1","note":"Home","eventType":0}
//! ```
//!
//! There is no version field; the field set and the integer trigger encoding
//! are the format.

use super::error::StoreError;
use crate::fence::{Coordinate, FenceRecord, TriggerOn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire form of one fence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredFence {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub identifier: String,
    pub note: String,
    #[serde(rename = "eventType")]
    pub event_type: TriggerOn,
}

impl From<&FenceRecord> for StoredFence {
    fn from(fence: &FenceRecord) -> Self {
        let center = fence.center();
        Self {
            latitude: center.latitude,
            longitude: center.longitude,
            radius: fence.radius(),
            identifier: fence.identifier().to_string(),
            note: fence.note().to_string(),
            event_type: fence.trigger_on(),
        }
    }
}

impl From<StoredFence> for FenceRecord {
    fn from(stored: StoredFence) -> Self {
        FenceRecord::new(
            stored.identifier,
            Coordinate::new(stored.latitude, stored.longitude),
            stored.radius,
            stored.note,
            stored.event_type,
        )
    }
}

/// Encode the full ordered collection.
pub fn encode(fences: &[FenceRecord]) -> Result<Value, StoreError> {
    let stored: Vec<StoredFence> = fences.iter().map(StoredFence::from).collect();
    serde_json::to_value(stored).map_err(|e| StoreError::SerializationFailed(e.to_string()))
}

/// Decode a persisted collection, keeping order.
///
/// Entries that do not decode are skipped with a warning so one damaged
/// record does not hide the rest. A value that is not a list at all is an
/// error.
pub fn decode(value: Value) -> Result<Vec<FenceRecord>, StoreError> {
    let Value::Array(entries) = value else {
        return Err(StoreError::DeserializationFailed(
            "expected a list of fences".to_string(),
        ));
    };

    let mut fences = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<StoredFence>(entry) {
            Ok(stored) => fences.push(FenceRecord::from(stored)),
            Err(e) => tracing::warn!(index, error = %e, "Skipping undecodable fence entry"),
        }
    }
    Ok(fences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_legacy_field_names() {
        let fence = FenceRecord::new(
            "F1",
            Coordinate::new(35.0, 139.0),
            500.0,
            "Home",
            TriggerOn::OnExit,
        );
        let value = encode(&[fence]).unwrap();
        assert_eq!(
            value,
            json!([{
                "latitude": 35.0,
                "longitude": 139.0,
                "radius": 500.0,
                "identifier": "F1",
                "note": "Home",
                "eventType": 1
            }])
        );
    }

    #[test]
    fn decode_skips_damaged_entries_and_keeps_order() {
        let value = json!([
            {"latitude": 1.0, "longitude": 2.0, "radius": 10.0,
             "identifier": "A", "note": "", "eventType": 0},
            {"latitude": 1.0, "longitude": 2.0, "radius": 10.0,
             "identifier": "BAD", "note": "", "eventType": 9},
            {"identifier": "MISSING"},
            {"latitude": 3.0, "longitude": 4.0, "radius": 20.0,
             "identifier": "B", "note": "x", "eventType": 1}
        ]);
        let fences = decode(value).unwrap();
        let ids: Vec<&str> = fences.iter().map(|f| f.identifier()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn decode_rejects_non_list() {
        assert!(matches!(
            decode(json!({"identifier": "A"})),
            Err(StoreError::DeserializationFailed(_))
        ));
    }
}
