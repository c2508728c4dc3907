#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Mutex;

use facility_compare::db::LocalRepository;
use facility_compare::models::FacilityType;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on unwind and serializes access to the
/// process environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub const DELHI: (f64, f64) = (28.6139, 77.2090);
pub const MUMBAI: (f64, f64) = (19.0760, 72.8777);

/// Hospital record as the listing API returns it.
pub fn hospital_record(id: &str, name: &str, (lat, lon): (f64, f64)) -> Value {
    json!({
        "_id": id,
        "name": name,
        "images": [format!("https://img.example/{}.jpg", id)],
        "googleRating": 4.2,
        "googleReviewCount": 310,
        "websiteRating": 4.0,
        "totalReviews": 12,
        "location": {"type": "Point", "coordinates": [lon, lat]},
        "address": {"street": "1 Ring Road", "city": "New Delhi", "state": "Delhi", "pincode": 110001},
        "tests": [{"name": "X-Ray", "price": 600}, {"name": "ECG", "price": 300}],
        "phone": "011-2658-8500",
        "operatingHours": {"open": "9:00 AM", "close": "9:00 PM"},
        "facilities": ["ICU", "Pharmacy"],
        "emergencyAvailable": true
    })
}

/// Laboratory record as the listing API returns it.
pub fn lab_record(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "tests": ["CBC", "Lipid Profile"],
        "services": [
            {"name": "CBC", "category": "Blood", "price": 350, "isAvailable": true},
            {"name": "Lipid Profile", "category": "Blood", "price": 700}
        ],
        "homeCollection": true,
        "reportTime": "24 hours",
        "facilities": ["NABL Accredited"]
    })
}

/// Local repository holding hospitals `h1`..`h4` and laboratory `l1`.
pub fn seeded_repository() -> LocalRepository {
    let repo = LocalRepository::new();
    for (id, name) in [
        ("h1", "AIIMS"),
        ("h2", "Safdarjung"),
        ("h3", "Max Saket"),
        ("h4", "Fortis"),
    ] {
        repo.insert_record(FacilityType::Hospital, &hospital_record(id, name, DELHI))
            .expect("valid hospital fixture");
    }
    repo.insert_record(FacilityType::Laboratory, &lab_record("l1", "Dr Lal PathLabs"))
        .expect("valid lab fixture");
    repo
}
