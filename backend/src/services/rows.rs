//! Comparison table layout.
//!
//! Turns a [`LoadedComparison`] into a header plus a fixed sequence of rows.
//! Orderable rows pick their highlighted item with [`compute_best_index`];
//! every other row has no best marker.

use std::collections::BTreeSet;

use crate::api::{
    CellValue, ComparisonRow, ComparisonTable, HeaderCell, NavigationTarget, PriceEntry,
    RowSection,
};
use crate::models::{FacilityDetail, FacilityType, Weekday};

use super::compare::LoadedComparison;

/// Number of price list entries shown per item.
pub const PRICE_LIST_DISPLAY_LIMIT: usize = 4;

/// Label of the row shown when no item lists any feature.
pub const NO_FEATURES_LABEL: &str = "No facilities";

const NO_FEATURES_MESSAGE: &str = "No facilities added by the owner";

/// Sorted, de-duplicated union of every item's feature flags.
pub fn compute_feature_union(items: &[FacilityDetail]) -> Vec<String> {
    items
        .iter()
        .flat_map(|item| item.feature_flags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Index of the highest score. `None` and NaN scores are skipped; ties go to
/// the earliest item. Callers negate scores where lower is better.
pub fn compute_best_index<T, F>(items: &[T], value_fn: F) -> Option<usize>
where
    F: Fn(&T) -> Option<f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for (index, item) in items.iter().enumerate() {
        let Some(score) = value_fn(item).filter(|s| !s.is_nan()) else {
            continue;
        };
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

/// Ratings of zero mean "unrated".
fn rating_score(rating: Option<f64>) -> Option<f64> {
    rating.filter(|r| *r > 0.0)
}

struct RowBuilder<'a> {
    items: &'a [FacilityDetail],
    rows: Vec<ComparisonRow>,
}

impl<'a> RowBuilder<'a> {
    fn new(items: &'a [FacilityDetail]) -> Self {
        Self {
            items,
            rows: Vec::new(),
        }
    }

    fn push(
        &mut self,
        section: RowSection,
        label: impl Into<String>,
        icon: Option<&str>,
        cell: impl Fn(&FacilityDetail) -> CellValue,
    ) {
        self.rows.push(ComparisonRow {
            section,
            label: label.into(),
            icon: icon.map(str::to_string),
            cells: self.items.iter().map(cell).collect(),
            best_index: None,
        });
    }

    fn push_ranked(
        &mut self,
        section: RowSection,
        label: &str,
        icon: Option<&str>,
        cell: impl Fn(&FacilityDetail) -> CellValue,
        score: impl Fn(&FacilityDetail) -> Option<f64>,
    ) {
        self.push(section, label, icon, cell);
        if let Some(row) = self.rows.last_mut() {
            row.best_index = compute_best_index(self.items, score);
        }
    }

    fn ratings(&mut self) {
        self.push_ranked(
            RowSection::Ratings,
            "Google Rating",
            Some("google"),
            |item| CellValue::Rating {
                value: rating_score(item.google_rating),
                review_count: item.google_review_count,
            },
            |item| rating_score(item.google_rating),
        );
        self.push_ranked(
            RowSection::Ratings,
            "User Rating",
            Some("star"),
            |item| CellValue::Rating {
                value: rating_score(item.user_rating),
                review_count: item.user_review_count,
            },
            |item| rating_score(item.user_rating),
        );
    }

    fn location(&mut self) {
        self.push_ranked(
            RowSection::Location,
            "Distance",
            Some("map-marker"),
            |item| CellValue::Distance {
                km: item.distance_km,
            },
            |item| item.distance_km.map(|km| -km),
        );
        self.push(RowSection::Location, "Address", Some("map-marker"), |item| {
            CellValue::text(item.address.full(), "Not Available")
        });
        self.push(RowSection::Location, "Landmark", Some("map-marker"), |item| {
            CellValue::text(item.address.landmark(), "Not mentioned")
        });
    }

    fn cost(&mut self) {
        self.push_ranked(
            RowSection::Cost,
            "Starting Cost",
            Some("rupee"),
            |item| CellValue::Price {
                amount: item.starting_price(),
            },
            |item| item.starting_price().map(|p| -p),
        );
        self.push(RowSection::Cost, "Test Prices", Some("rupee"), |item| {
            let services = &item.priced_services;
            CellValue::PriceList {
                entries: services
                    .iter()
                    .take(PRICE_LIST_DISPLAY_LIMIT)
                    .map(|s| PriceEntry {
                        name: s.name.clone(),
                        price: s.price,
                    })
                    .collect(),
                hidden: services.len().saturating_sub(PRICE_LIST_DISPLAY_LIMIT),
            }
        });
    }

    fn contact(&mut self) {
        self.push(RowSection::Contact, "Phone", Some("phone"), |item| {
            CellValue::text(item.phone.as_deref(), "N/A")
        });
        self.push(RowSection::Contact, "Email", Some("envelope"), |item| {
            CellValue::text(item.email.as_deref(), "N/A")
        });
    }

    fn hours(&mut self) {
        for day in Weekday::ALL {
            self.push(RowSection::Hours, day.label(), Some("clock"), |item| {
                CellValue::hours(item.operating_hours.get(day))
            });
        }
    }

    fn type_specific(&mut self, facility_type: FacilityType) {
        match facility_type {
            FacilityType::Hospital => {
                self.push(
                    RowSection::Emergency,
                    "24/7 Emergency",
                    Some("ambulance"),
                    |item| CellValue::Availability {
                        available: item.emergency_available,
                    },
                );
            }
            FacilityType::Laboratory => {
                self.push(RowSection::LabSpecific, "Home Collection", None, |item| {
                    CellValue::Availability {
                        available: item.home_collection,
                    }
                });
                self.push(RowSection::LabSpecific, "Report Time", Some("clock"), |item| {
                    CellValue::text(item.report_turnaround.as_deref(), "N/A")
                });
            }
        }
    }

    fn features(&mut self, union: &[String]) {
        if union.is_empty() {
            self.push(RowSection::Features, NO_FEATURES_LABEL, None, |_| {
                CellValue::Placeholder {
                    message: NO_FEATURES_MESSAGE.to_string(),
                }
            });
            return;
        }
        for feature in union {
            self.push(RowSection::Features, feature.as_str(), None, |item| {
                CellValue::Presence {
                    available: item.has_feature(feature),
                }
            });
        }
    }

    fn actions(&mut self, facility_type: FacilityType) {
        self.push(RowSection::Actions, "Actions", None, |item| CellValue::Actions {
            detail: NavigationTarget::detail(facility_type, item.identity.clone()),
            call: item.phone.as_ref().map(|p| format!("tel:{}", p)),
        });
    }
}

fn header_cell(facility_type: FacilityType, item: &FacilityDetail) -> HeaderCell {
    HeaderCell {
        identity: item.identity.clone(),
        name: item.name.clone(),
        image: item.images.first().cloned(),
        locality: item.address.locality(),
        detail: NavigationTarget::detail(facility_type, item.identity.clone()),
    }
}

/// Lay out a loaded comparison as header plus rows.
pub fn build_comparison_table(loaded: &LoadedComparison) -> ComparisonTable {
    let facility_type = loaded.facility_type;
    let items = loaded.items.as_slice();
    let union = compute_feature_union(items);

    let mut builder = RowBuilder::new(items);
    builder.ratings();
    builder.location();
    builder.cost();
    builder.contact();
    builder.hours();
    builder.type_specific(facility_type);
    builder.features(&union);
    builder.actions(facility_type);

    ComparisonTable {
        facility_type,
        header: items.iter().map(|i| header_cell(facility_type, i)).collect(),
        rows: builder.rows,
        feature_count: union.len(),
        last_updated: loaded.last_updated,
        degraded: loaded.degraded.clone(),
        sequence: loaded.sequence,
    }
}

#[cfg(test)]
#[path = "rows_tests.rs"]
mod rows_tests;
