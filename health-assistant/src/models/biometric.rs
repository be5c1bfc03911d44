//! Biometric documents as stored, and the flat record derived from them.
//!
//! Uploads are written by other services, so most fields are loosely typed:
//! counts may arrive as int32, int64 or double, and some totals are stored as
//! strings. [`BiometricDocument`] keeps those fields as raw BSON and
//! [`BiometricRecord::from_document`] applies the per-field coercion rules.

use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stress label used when a document carries none.
pub const UNKNOWN_STRESS_LEVEL: &str = "Unknown";

/// Totals that default to the string `"0"` when missing.
const ZERO_TEXT: &str = "0";

/// A scalar value passed through as stored, number or text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Numbers (including Decimal128) and strings map to a scalar; every other
    /// BSON type counts as missing.
    pub fn from_bson(value: &Bson) -> Option<Self> {
        match value {
            Bson::Int32(v) => Some(Scalar::Integer(i64::from(*v))),
            Bson::Int64(v) => Some(Scalar::Integer(*v)),
            Bson::Double(v) => Some(Scalar::Float(*v)),
            Bson::String(s) => Some(Scalar::Text(s.clone())),
            // Kept in its decimal text form so no precision is lost.
            Bson::Decimal128(d) => Some(Scalar::Text(d.to_string())),
            _ => None,
        }
    }

    /// Integer view: doubles truncate toward zero, strings must parse.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Scalar::Integer(v) => Some(*v),
            Scalar::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            Scalar::Float(_) => None,
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Integer(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

/// One biometric upload in the `biometric_data` collection.
///
/// List fields hold time-ordered entries such as `{"percentage": 97}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Usually a BSON date, but older uploads carry strings or epoch numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<Bson>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_steps: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_heart_rate: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_heart_rate: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_heart_rate: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_distance_km: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_sleep_hours: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_hydration_liters: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_score: Option<Bson>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_temperature: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Bson>,
}

/// Flattened health snapshot handed to the assistant.
///
/// Built from the latest document of a user, or empty when the user has
/// none. When a document exists, the daily totals default to zero (or
/// `"Unknown"` for the stress label) while list-derived readings stay
/// absent. Absent fields are omitted from the JSON form, so the empty
/// record serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BiometricRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_heart_rate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_heart_rate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_heart_rate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hydration_liters: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_temperature: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_m: Option<Scalar>,
}

impl BiometricRecord {
    /// Record for a user without any stored document.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn from_document(doc: &BiometricDocument) -> Self {
        Self {
            steps: Some(integer_or_zero("totalSteps", doc.total_steps.as_ref())),
            avg_heart_rate: Some(integer_or_zero("avgHeartRate", doc.avg_heart_rate.as_ref())),
            min_heart_rate: Some(integer_or_zero("minHeartRate", doc.min_heart_rate.as_ref())),
            max_heart_rate: Some(integer_or_zero("maxHeartRate", doc.max_heart_rate.as_ref())),
            distance_km: Some(scalar_or_zero_text(doc.total_distance_km.as_ref())),
            sleep_hours: Some(scalar_or_zero_text(doc.total_sleep_hours.as_ref())),
            hydration_liters: Some(scalar_or_zero_text(doc.total_hydration_liters.as_ref())),
            stress_level: Some(
                doc.stress_level
                    .as_ref()
                    .and_then(Bson::as_str)
                    .unwrap_or(UNKNOWN_STRESS_LEVEL)
                    .to_string(),
            ),
            stress_score: Some(integer_or_zero("stressScore", doc.stress_score.as_ref())),
            oxygen_saturation: last_entry_value(doc.oxygen_saturation.as_ref(), "percentage"),
            body_temperature: last_entry_value(doc.body_temperature.as_ref(), "temperature"),
            blood_pressure: last_blood_pressure(doc.blood_pressure.as_ref()),
            weight_kg: last_entry_value(doc.weight.as_ref(), "weight"),
            height_m: last_entry_value(doc.height.as_ref(), "height"),
        }
    }

    /// Human-readable `(label, value)` pairs for every present field, in a
    /// stable order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let fields: [(&'static str, Option<String>); 14] = [
            ("Steps", self.steps.map(|v| v.to_string())),
            (
                "Average heart rate (bpm)",
                self.avg_heart_rate.map(|v| v.to_string()),
            ),
            (
                "Minimum heart rate (bpm)",
                self.min_heart_rate.map(|v| v.to_string()),
            ),
            (
                "Maximum heart rate (bpm)",
                self.max_heart_rate.map(|v| v.to_string()),
            ),
            ("Distance (km)", self.distance_km.as_ref().map(Scalar::to_string)),
            ("Sleep (hours)", self.sleep_hours.as_ref().map(Scalar::to_string)),
            (
                "Hydration (liters)",
                self.hydration_liters.as_ref().map(Scalar::to_string),
            ),
            ("Stress level", self.stress_level.clone()),
            ("Stress score", self.stress_score.map(|v| v.to_string())),
            (
                "Oxygen saturation (%)",
                self.oxygen_saturation.as_ref().map(Scalar::to_string),
            ),
            (
                "Body temperature (°C)",
                self.body_temperature.as_ref().map(Scalar::to_string),
            ),
            ("Blood pressure (mmHg)", self.blood_pressure.clone()),
            ("Weight (kg)", self.weight_kg.as_ref().map(Scalar::to_string)),
            ("Height (m)", self.height_m.as_ref().map(Scalar::to_string)),
        ];

        fields
            .into_iter()
            .filter_map(|(label, value)| value.map(|v| (label, v)))
            .collect()
    }
}

fn integer_or_zero(field: &str, value: Option<&Bson>) -> i64 {
    let Some(value) = value else {
        return 0;
    };
    match Scalar::from_bson(value).and_then(|s| s.as_integer()) {
        Some(v) => v,
        None => {
            if !matches!(value, Bson::Null) {
                tracing::warn!(field = %field, value = %value, "Ignoring non-integer biometric value");
            }
            0
        }
    }
}

fn scalar_or_zero_text(value: Option<&Bson>) -> Scalar {
    value
        .and_then(Scalar::from_bson)
        .unwrap_or_else(|| Scalar::Text(ZERO_TEXT.to_string()))
}

/// Last entry of a list field, when it is a sub-document.
fn last_entry(list: Option<&Bson>) -> Option<&Document> {
    match list? {
        Bson::Array(items) => items.last()?.as_document(),
        _ => None,
    }
}

fn last_entry_value(list: Option<&Bson>, key: &str) -> Option<Scalar> {
    last_entry(list)?.get(key).and_then(Scalar::from_bson)
}

fn last_blood_pressure(list: Option<&Bson>) -> Option<String> {
    let entry = last_entry(list)?;
    let systolic = entry.get("systolic").and_then(Scalar::from_bson);
    let diastolic = entry.get("diastolic").and_then(Scalar::from_bson);

    if systolic.is_none() && diastolic.is_none() {
        return None;
    }

    let render = |part: Option<Scalar>| part.map_or_else(|| "?".to_string(), |s| s.to_string());
    Some(format!("{}/{}", render(systolic), render(diastolic)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{self, doc, Decimal128};

    fn document(raw: Document) -> BiometricDocument {
        bson::from_document(raw).expect("valid biometric document")
    }

    #[test]
    fn empty_record_serializes_to_empty_object() {
        let record = BiometricRecord::empty();
        assert!(record.is_empty());
        assert_eq!(serde_json::to_value(&record).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn oxygen_saturation_takes_last_entry() {
        let doc = document(doc! {
            "userId": "u1",
            "oxygenSaturation": [{ "percentage": 97 }, { "percentage": 95 }],
        });
        let record = BiometricRecord::from_document(&doc);
        assert_eq!(record.oxygen_saturation, Some(Scalar::Integer(95)));
    }

    #[test]
    fn blood_pressure_renders_systolic_over_diastolic() {
        let doc = document(doc! {
            "bloodPressure": [{ "systolic": 120, "diastolic": 80 }],
        });
        let record = BiometricRecord::from_document(&doc);
        assert_eq!(record.blood_pressure.as_deref(), Some("120/80"));
    }

    #[test]
    fn blood_pressure_uses_last_reading_and_marks_missing_part() {
        let doc = document(doc! {
            "bloodPressure": [
                { "systolic": 130, "diastolic": 85 },
                { "systolic": 118 },
            ],
        });
        let record = BiometricRecord::from_document(&doc);
        assert_eq!(record.blood_pressure.as_deref(), Some("118/?"));
    }

    #[test]
    fn blood_pressure_without_components_is_absent() {
        let doc = document(doc! { "bloodPressure": [{ "timestamp": "08:00" }] });
        assert_eq!(BiometricRecord::from_document(&doc).blood_pressure, None);
    }

    #[test]
    fn missing_totals_default_to_zero_and_readings_stay_absent() {
        let record = BiometricRecord::from_document(&document(doc! { "userId": "u1" }));

        assert_eq!(record.steps, Some(0));
        assert_eq!(record.avg_heart_rate, Some(0));
        assert_eq!(record.min_heart_rate, Some(0));
        assert_eq!(record.max_heart_rate, Some(0));
        assert_eq!(record.distance_km, Some(Scalar::from("0")));
        assert_eq!(record.sleep_hours, Some(Scalar::from("0")));
        assert_eq!(record.hydration_liters, Some(Scalar::from("0")));
        assert_eq!(record.stress_level.as_deref(), Some(UNKNOWN_STRESS_LEVEL));
        assert_eq!(record.stress_score, Some(0));

        assert_eq!(record.oxygen_saturation, None);
        assert_eq!(record.body_temperature, None);
        assert_eq!(record.blood_pressure, None);
        assert_eq!(record.weight_kg, None);
        assert_eq!(record.height_m, None);
        assert!(!record.is_empty());
    }

    #[test]
    fn string_totals_pass_through_unchanged() {
        let doc = document(doc! {
            "totalDistanceKm": "5.20",
            "totalSleepHours": 7.5,
            "totalHydrationLiters": "1.8",
        });
        let record = BiometricRecord::from_document(&doc);
        assert_eq!(record.distance_km, Some(Scalar::from("5.20")));
        assert_eq!(record.sleep_hours, Some(Scalar::Float(7.5)));
        assert_eq!(record.hydration_liters, Some(Scalar::from("1.8")));
    }

    #[test]
    fn integer_fields_accept_mixed_numeric_types() {
        let doc = document(doc! {
            "totalSteps": 8421_i64,
            "avgHeartRate": 72.9,
            "minHeartRate": "55",
            "maxHeartRate": 141_i32,
            "stressScore": "high",
            "stressLevel": "Moderate",
        });
        let record = BiometricRecord::from_document(&doc);
        assert_eq!(record.steps, Some(8421));
        assert_eq!(record.avg_heart_rate, Some(72));
        assert_eq!(record.min_heart_rate, Some(55));
        assert_eq!(record.max_heart_rate, Some(141));
        assert_eq!(record.stress_score, Some(0));
        assert_eq!(record.stress_level.as_deref(), Some("Moderate"));
    }

    #[test]
    fn empty_or_malformed_lists_yield_absent_readings() {
        let doc = document(doc! {
            "oxygenSaturation": [],
            "bodyTemperature": "36.6",
            "weight": [72.5],
            "height": [{ "height": 1.78 }, { "unit": "m" }],
        });
        let record = BiometricRecord::from_document(&doc);
        assert_eq!(record.oxygen_saturation, None);
        assert_eq!(record.body_temperature, None);
        assert_eq!(record.weight_kg, None);
        assert_eq!(record.height_m, None);
    }

    #[test]
    fn entries_follow_field_order_and_skip_absent_values() {
        let doc = document(doc! {
            "totalSteps": 1200,
            "bodyTemperature": [{ "temperature": 36.8 }],
            "weight": [{ "weight": 70 }, { "weight": 69.4 }],
        });
        let entries = BiometricRecord::from_document(&doc).entries();
        let labels: Vec<&str> = entries.iter().map(|(label, _)| *label).collect();

        assert_eq!(labels.first(), Some(&"Steps"));
        assert!(labels.contains(&"Body temperature (°C)"));
        assert!(!labels.contains(&"Oxygen saturation (%)"));
        assert_eq!(entries.last(), Some(&("Weight (kg)", "69.4".to_string())));
        assert!(BiometricRecord::empty().entries().is_empty());
    }

    #[test]
    fn record_json_uses_snake_case_keys() {
        let doc = document(doc! {
            "totalSteps": 10,
            "bloodPressure": [{ "systolic": 120, "diastolic": 80 }],
        });
        let json = serde_json::to_value(BiometricRecord::from_document(&doc)).unwrap();
        assert_eq!(json["steps"], 10);
        assert_eq!(json["blood_pressure"], "120/80");
        assert_eq!(json["distance_km"], "0");
        assert!(json.get("oxygen_saturation").is_none());
    }

    #[test]
    fn decimal_values_pass_through_as_text() {
        let decimal = |text: &str| text.parse::<Decimal128>().unwrap();
        let doc = document(doc! {
            "totalDistanceKm": decimal("72.5"),
            "weight": [{ "weight": decimal("72.5") }],
            "totalSteps": decimal("8000"),
        });
        let record = BiometricRecord::from_document(&doc);

        assert_eq!(record.distance_km, Some(Scalar::from("72.5")));
        assert_eq!(record.weight_kg, Some(Scalar::from("72.5")));
        assert_eq!(record.steps, Some(8000));
    }

    #[test]
    fn non_date_received_at_still_yields_a_record() {
        for received_at in [Bson::from("2025-05-01T10:00:00Z"), Bson::Int64(1_714_557_600_000)] {
            let doc = document(doc! {
                "userId": "alice",
                "receivedAt": received_at.clone(),
                "totalSteps": 5000,
            });
            assert_eq!(doc.received_at, Some(received_at));
            assert_eq!(BiometricRecord::from_document(&doc).steps, Some(5000));
        }
    }
}
