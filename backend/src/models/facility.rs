//! Facility records as seen by the comparison engine.
//!
//! Listing pages hand over loosely-typed JSON objects; the facility API returns
//! camelCase records. Both are decoded here into [`FacilitySummary`] and
//! [`FacilityDetail`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::geo::GeoPoint;
use super::hours::OperatingHours;

/// Facility category. A comparison only ever holds one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacilityType {
    Hospital,
    #[serde(alias = "lab")]
    Laboratory,
}

impl FacilityType {
    /// Collection segment of the facility API (`/api/{collection}/{id}`).
    pub fn collection(&self) -> &'static str {
        match self {
            FacilityType::Hospital => "hospitals",
            FacilityType::Laboratory => "labs",
        }
    }

    /// Plural noun used in user-facing messages.
    pub fn plural(&self) -> &'static str {
        match self {
            FacilityType::Hospital => "hospitals",
            FacilityType::Laboratory => "laboratories",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FacilityType::Hospital => "hospital",
            FacilityType::Laboratory => "laboratory",
        }
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacilityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hospital" | "hospitals" => Ok(FacilityType::Hospital),
            "laboratory" | "laboratories" | "lab" | "labs" => Ok(FacilityType::Laboratory),
            other => Err(format!("Unknown facility type: {}", other)),
        }
    }
}

/// Canonical facility identity.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FacilityId(String);

impl FacilityId {
    pub fn new(value: impl Into<String>) -> Self {
        FacilityId(value.into())
    }

    /// Trimmed, non-empty identity or `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| FacilityId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FacilityId {
    fn from(value: &str) -> Self {
        FacilityId::new(value)
    }
}

/// Identity fields in preference order.
const IDENTITY_FIELDS: [&str; 2] = ["_id", "id"];

/// Extract the canonical identity from a facility-like JSON object.
///
/// Tries `_id`, then `id`. Strings are trimmed, integers are stringified and
/// `{"$oid": ".."}` wrappers are unwrapped. Every identity lookup in the crate
/// goes through this function.
pub fn identity_of(item: &Value) -> Option<FacilityId> {
    let object = item.as_object()?;
    IDENTITY_FIELDS
        .iter()
        .find_map(|field| object.get(*field).and_then(identity_from_scalar))
}

fn identity_from_scalar(value: &Value) -> Option<FacilityId> {
    match value {
        Value::String(s) => FacilityId::parse(s),
        Value::Number(n) => n
            .as_i64()
            .map(|i| i.to_string())
            .or_else(|| n.as_u64().map(|u| u.to_string()))
            .map(FacilityId),
        Value::Object(o) => o.get("$oid").and_then(identity_from_scalar),
        _ => None,
    }
}

/// Errors raised while decoding facility records.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record has no usable `_id` or `id` field")]
    MissingIdentity,

    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("malformed facility record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Selection-list view of a facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilitySummary {
    pub identity: FacilityId,
    pub display_name: String,
    /// Original record fields, with `_id` normalized to `identity`.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl FacilitySummary {
    /// Normalize a listing record into a summary.
    pub fn from_value(item: &Value) -> Result<Self, RecordError> {
        let identity = identity_of(item).ok_or(RecordError::MissingIdentity)?;
        let mut fields = item.as_object().cloned().ok_or(RecordError::NotAnObject)?;
        let display_name = fields
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Unknown")
            .to_string();
        fields.insert("_id".to_string(), Value::String(identity.to_string()));

        Ok(Self {
            identity,
            display_name,
            fields,
        })
    }
}

/// Structured postal address; every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, deserialize_with = "lenient")]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub area: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub pincode: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub landmark: Option<String>,
}

/// Pincodes arrive both as `"400001"` and `400001`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// Field-level decoders for records we do not control. A field with the wrong
// shape decodes to its default; the rest of the record is kept.

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Drops the elements that fail to decode instead of the whole list.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Numbers or numeric strings such as `"4.5"`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    })
}

fn non_blank(part: &Option<String>) -> Option<&str> {
    part.as_deref().map(str::trim).filter(|p| !p.is_empty())
}

impl Address {
    /// "street, area, city, state, pincode" with blank parts skipped.
    pub fn full(&self) -> Option<String> {
        let parts: Vec<&str> = [
            &self.street,
            &self.area,
            &self.city,
            &self.state,
            &self.pincode,
        ]
        .into_iter()
        .filter_map(non_blank)
        .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }

    /// "city, state" as shown under a facility name.
    pub fn locality(&self) -> String {
        match (non_blank(&self.city), non_blank(&self.state)) {
            (Some(city), Some(state)) => format!("{}, {}", city, state),
            (Some(city), None) => city.to_string(),
            (None, Some(state)) => state.to_string(),
            (None, None) => String::new(),
        }
    }

    pub fn landmark(&self) -> Option<&str> {
        non_blank(&self.landmark)
    }
}

/// One priced service or test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedService {
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Full facility record fetched at comparison time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacilityDetail {
    pub identity: FacilityId,
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub google_rating: Option<f64>,
    pub google_review_count: Option<u64>,
    pub user_rating: Option<f64>,
    pub user_review_count: Option<u64>,
    pub location: Option<GeoPoint>,
    /// Computed from the user's location; never part of the stored record.
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub priced_services: Vec<PricedService>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub operating_hours: OperatingHours,
    #[serde(default)]
    pub feature_flags: Vec<String>,
    #[serde(default)]
    pub emergency_available: bool,
    #[serde(default)]
    pub home_collection: bool,
    pub report_turnaround: Option<String>,
}

/// Entry of a `services` or `tests` list: a priced object or a bare name.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireService {
    #[serde(rename_all = "camelCase")]
    Priced {
        name: String,
        #[serde(default, deserialize_with = "lenient_number")]
        price: Option<f64>,
        #[serde(default, deserialize_with = "lenient")]
        is_available: Option<bool>,
    },
    Named(String),
}

impl WireService {
    fn is_offered(&self) -> bool {
        !matches!(
            self,
            WireService::Priced {
                is_available: Some(false),
                ..
            }
        )
    }
}

impl From<WireService> for PricedService {
    fn from(service: WireService) -> Self {
        match service {
            WireService::Priced { name, price, .. } => PricedService { name, price },
            WireService::Named(name) => PricedService { name, price: None },
        }
    }
}

#[derive(Deserialize, Default)]
struct WireLocation {
    #[serde(default, deserialize_with = "lenient_vec")]
    coordinates: Vec<f64>,
}

/// Facility API record shape (camelCase, Mongo-style).
///
/// Every field decodes on its own, so one malformed field never costs the
/// rest of the record.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct WireFacility {
    #[serde(deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    images: Vec<String>,
    #[serde(deserialize_with = "lenient_number")]
    google_rating: Option<f64>,
    #[serde(deserialize_with = "lenient_count")]
    google_review_count: Option<u64>,
    #[serde(deserialize_with = "lenient_number")]
    website_rating: Option<f64>,
    #[serde(deserialize_with = "lenient_count")]
    total_reviews: Option<u64>,
    #[serde(deserialize_with = "lenient")]
    location: Option<WireLocation>,
    #[serde(deserialize_with = "lenient")]
    address: Option<Address>,
    /// Priced catalogue; labs keep their prices here.
    #[serde(deserialize_with = "lenient_vec")]
    services: Vec<WireService>,
    #[serde(deserialize_with = "lenient_vec")]
    tests: Vec<WireService>,
    #[serde(deserialize_with = "lenient")]
    phone: Option<String>,
    #[serde(deserialize_with = "lenient")]
    email: Option<String>,
    #[serde(deserialize_with = "lenient")]
    operating_hours: Option<OperatingHours>,
    #[serde(deserialize_with = "lenient_vec")]
    facilities: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    emergency_available: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    home_collection: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    report_time: Option<String>,
}

impl WireFacility {
    /// Offered `services` when there are any, else the `tests` list.
    fn priced_services(services: Vec<WireService>, tests: Vec<WireService>) -> Vec<PricedService> {
        let offered: Vec<PricedService> = services
            .into_iter()
            .filter(WireService::is_offered)
            .map(PricedService::from)
            .collect();
        if !offered.is_empty() {
            return offered;
        }
        tests.into_iter().map(PricedService::from).collect()
    }
}

impl FacilityDetail {
    /// Decode a facility API record.
    pub fn from_wire(record: &Value) -> Result<Self, RecordError> {
        if !record.is_object() {
            return Err(RecordError::NotAnObject);
        }
        let identity = identity_of(record).ok_or(RecordError::MissingIdentity)?;
        let wire = WireFacility::deserialize(record)?;
        Ok(Self::from_wire_parts(identity, wire))
    }

    fn from_wire_parts(identity: FacilityId, wire: WireFacility) -> Self {
        let priced_services = WireFacility::priced_services(wire.services, wire.tests);

        Self {
            identity,
            name: wire.name.unwrap_or_else(|| "Unknown".to_string()),
            images: wire.images,
            google_rating: wire.google_rating,
            google_review_count: wire.google_review_count,
            user_rating: wire.website_rating,
            user_review_count: wire.total_reviews,
            location: wire
                .location
                .and_then(|l| GeoPoint::from_geojson(&l.coordinates)),
            distance_km: None,
            address: wire.address.unwrap_or_default(),
            priced_services,
            phone: wire.phone.filter(|p| !p.trim().is_empty()),
            email: wire.email.filter(|e| !e.trim().is_empty()),
            operating_hours: wire.operating_hours.unwrap_or_default(),
            feature_flags: wire.facilities,
            emergency_available: wire.emergency_available.unwrap_or(false),
            home_collection: wire.home_collection.unwrap_or(false),
            report_turnaround: wire.report_time.filter(|r| !r.trim().is_empty()),
        }
    }

    /// Degraded record built from the summary held in the selection.
    ///
    /// Uses whatever the listing record carried; a field that fails to decode
    /// is left empty and the others are kept.
    pub fn from_summary(summary: &FacilitySummary) -> Self {
        let record = Value::Object(summary.fields.clone());
        let wire = WireFacility::deserialize(&record).unwrap_or_else(|e| {
            log::debug!("summary for {} not decodable: {}", summary.identity, e);
            WireFacility::default()
        });
        let mut detail = Self::from_wire_parts(summary.identity.clone(), wire);
        if detail.name == "Unknown" {
            detail.name = summary.display_name.clone();
        }
        detail
    }

    /// Set `distance_km` relative to `origin` when the record has a position.
    pub fn with_distance_from(mut self, origin: Option<&GeoPoint>) -> Self {
        self.distance_km = match (origin, self.location.as_ref()) {
            (Some(origin), Some(location)) => Some(origin.distance_km(location)),
            _ => None,
        };
        self
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.feature_flags.iter().any(|f| f == feature)
    }

    /// Price of the first listed service.
    pub fn starting_price(&self) -> Option<f64> {
        self.priced_services.first().and_then(|s| s.price)
    }
}
