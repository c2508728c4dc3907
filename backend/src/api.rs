//! Public API surface for the comparison engine.
//!
//! This file consolidates the DTO types of a rendered comparison: the header,
//! the ordered rows and the per-item cells. All types derive
//! Serialize/Deserialize for JSON serialization.

pub use crate::models::{FacilityDetail, FacilityId, FacilitySummary, FacilityType, GeoPoint};
pub use crate::services::selection::SelectionSnapshot;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a navigation action leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavigationTarget {
    /// Detail page of one facility.
    FacilityDetail {
        facility_type: FacilityType,
        identity: FacilityId,
    },
    /// The facility listing.
    Listing,
}

impl NavigationTarget {
    pub fn detail(facility_type: FacilityType, identity: FacilityId) -> Self {
        NavigationTarget::FacilityDetail {
            facility_type,
            identity,
        }
    }

    /// Client route, e.g. `/hospital/abc` or `/`.
    pub fn path(&self) -> String {
        match self {
            NavigationTarget::FacilityDetail {
                facility_type,
                identity,
            } => format!("/{}/{}", facility_type, identity),
            NavigationTarget::Listing => "/".to_string(),
        }
    }
}

/// Row groups, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSection {
    Ratings,
    Location,
    Cost,
    Contact,
    Hours,
    Emergency,
    LabSpecific,
    Features,
    Actions,
}

impl RowSection {
    pub fn title(&self) -> &'static str {
        match self {
            RowSection::Ratings => "Ratings & Reviews",
            RowSection::Location => "Location & Distance",
            RowSection::Cost => "Cost & Pricing",
            RowSection::Contact => "Contact Details",
            RowSection::Hours => "Operating Hours",
            RowSection::Emergency => "Emergency Services",
            RowSection::LabSpecific => "Lab Specific",
            RowSection::Features => "Facilities & Services",
            RowSection::Actions => "Actions",
        }
    }
}

/// One priced entry of a [`CellValue::PriceList`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub name: String,
    pub price: Option<f64>,
}

/// Value shown for one item in one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellValue {
    /// Rating out of 5. `None` when unrated.
    Rating {
        value: Option<f64>,
        review_count: Option<u64>,
    },
    /// Distance from the user. `None` when no location is known.
    Distance { km: Option<f64> },
    /// Amount in rupees.
    Price { amount: Option<f64> },
    /// Leading entries of a price list; `hidden` counts the rest.
    PriceList {
        entries: Vec<PriceEntry>,
        hidden: usize,
    },
    /// Free text with the label shown when it is missing.
    Text {
        value: Option<String>,
        fallback: String,
    },
    /// Opening hours of one day.
    Hours { value: Option<String>, closed: bool },
    /// Feature flag membership.
    Presence { available: bool },
    /// Service availability (emergency, home collection).
    Availability { available: bool },
    /// Per-item actions.
    Actions {
        detail: NavigationTarget,
        call: Option<String>,
    },
    /// Explanatory cell of a placeholder row.
    Placeholder { message: String },
}

impl CellValue {
    pub fn text(value: Option<impl Into<String>>, fallback: &str) -> Self {
        CellValue::Text {
            value: value.map(Into::into),
            fallback: fallback.to_string(),
        }
    }

    pub fn hours(value: Option<&str>) -> Self {
        CellValue::Hours {
            closed: value.is_some_and(|v| v.trim().eq_ignore_ascii_case("closed")),
            value: value.map(str::to_string),
        }
    }
}

/// `450` for whole amounts, `450.50` otherwise.
fn format_rupees(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("₹{:.0}", amount)
    } else {
        format!("₹{:.2}", amount)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Rating { value: Some(v), .. } => write!(f, "{:.1}", v),
            CellValue::Rating { value: None, .. } => f.write_str("N/A"),
            CellValue::Distance { km: Some(km) } => write!(f, "{:.1} km away", km),
            CellValue::Distance { km: None } => f.write_str("Enable GPS"),
            CellValue::Price { amount: Some(a) } => f.write_str(&format_rupees(*a)),
            CellValue::Price { amount: None } => f.write_str("N/A"),
            CellValue::PriceList { entries, .. } if entries.is_empty() => {
                f.write_str("No tests listed")
            }
            CellValue::PriceList { entries, hidden } => {
                let listed: Vec<String> = entries
                    .iter()
                    .map(|e| match e.price {
                        Some(p) => format!("{} {}", e.name, format_rupees(p)),
                        None => e.name.clone(),
                    })
                    .collect();
                f.write_str(&listed.join(", "))?;
                if *hidden > 0 {
                    write!(f, " (+{} more)", hidden)?;
                }
                Ok(())
            }
            CellValue::Text { value, fallback } => {
                f.write_str(value.as_deref().unwrap_or(fallback))
            }
            CellValue::Hours { value, .. } => f.write_str(value.as_deref().unwrap_or("N/A")),
            CellValue::Presence { available } => {
                f.write_str(if *available { "Yes" } else { "No" })
            }
            CellValue::Availability { available } => {
                f.write_str(if *available { "Available" } else { "Not Available" })
            }
            CellValue::Actions { call, .. } => match call {
                Some(_) => f.write_str("View Full Details | Call Now"),
                None => f.write_str("View Full Details"),
            },
            CellValue::Placeholder { message } => f.write_str(message),
        }
    }
}

/// One row of the comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub section: RowSection,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// One cell per compared item, in selection order.
    pub cells: Vec<CellValue>,
    /// Item favored by the row's ordering, if it has one.
    pub best_index: Option<usize>,
}

/// Column header for one compared item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderCell {
    pub identity: FacilityId,
    pub name: String,
    pub image: Option<String>,
    /// `"city, state"`
    pub locality: String,
    pub detail: NavigationTarget,
}

/// Fully laid-out comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    #[serde(rename = "type")]
    pub facility_type: FacilityType,
    pub header: Vec<HeaderCell>,
    pub rows: Vec<ComparisonRow>,
    /// Size of the feature union.
    pub feature_count: usize,
    pub last_updated: DateTime<Utc>,
    /// Items rendered from the selection summary because their fetch failed.
    pub degraded: Vec<FacilityId>,
    pub sequence: u64,
}

impl ComparisonTable {
    /// First row with the given label.
    pub fn row(&self, label: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod api_tests;
