//! Filter criteria over the listing catalog.
//!
//! A [`FilterState`] always carries exactly one [`FilterCriterion`] per
//! [`FilterKind`]. A criterion equal to its kind's default is unrestricted and
//! takes no part in evaluation.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::FilterError;

pub const RANGE_MIN: i64 = 0;
pub const PRICE_RANGE_MAX: i64 = 250_000;
pub const MILEAGE_RANGE_MAX: i64 = 250_000;
pub const RANGE_STEP: i64 = 1_000;

// Unrestricted fuel / colour selection
pub const ANY: &str = "Any";

pub const FUEL_OPTIONS: [&str; 4] = ["Gasoline", "Diesel", "Hybrid", "Electric"];
pub const COLOUR_OPTIONS: [&str; 9] = [
    "White", "Black", "Brown", "Red", "Orange", "Yellow", "Green", "Blue", "Purple",
];

pub static REGISTRATION_FROM: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid calendar date"));
pub static REGISTRATION_TO: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid calendar date"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Price,
    Mileage,
    Fuel,
    Colour,
    Registration,
}

// How the UI picks a value for a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionType {
    Selection,
    Range,
    Date,
}

impl FilterKind {
    pub const ALL: [FilterKind; 5] = [
        FilterKind::Price,
        FilterKind::Mileage,
        FilterKind::Fuel,
        FilterKind::Colour,
        FilterKind::Registration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterKind::Price => "price",
            FilterKind::Mileage => "mileage",
            FilterKind::Fuel => "fuel",
            FilterKind::Colour => "colour",
            FilterKind::Registration => "registration",
        }
    }

    pub fn selection_type(self) -> SelectionType {
        match self {
            FilterKind::Price | FilterKind::Mileage => SelectionType::Range,
            FilterKind::Fuel | FilterKind::Colour => SelectionType::Selection,
            FilterKind::Registration => SelectionType::Date,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FilterError::UnknownKind(s.to_string()))
    }
}

/// One filter dimension with its selected value.
///
/// JSON form is tagged by `criterion`, e.g.
/// `{"criterion": "priceRange", "min": 15000, "max": 50000}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "criterion", rename_all = "camelCase")]
pub enum FilterCriterion {
    PriceRange { min: i64, max: i64 },
    MileageRange { min: i64, max: i64 },
    FuelEquals { fuel: String },
    ColourEquals { colour: String },
    RegistrationDateRange { from: NaiveDate, to: NaiveDate },
}

pub fn is_unrestricted(selection: &str) -> bool {
    selection.trim().eq_ignore_ascii_case(ANY)
}

impl FilterCriterion {
    /// The unrestricted criterion for `kind`.
    pub fn default_for(kind: FilterKind) -> Self {
        match kind {
            FilterKind::Price => FilterCriterion::PriceRange {
                min: RANGE_MIN,
                max: PRICE_RANGE_MAX,
            },
            FilterKind::Mileage => FilterCriterion::MileageRange {
                min: RANGE_MIN,
                max: MILEAGE_RANGE_MAX,
            },
            FilterKind::Fuel => FilterCriterion::FuelEquals { fuel: ANY.to_string() },
            FilterKind::Colour => FilterCriterion::ColourEquals { colour: ANY.to_string() },
            FilterKind::Registration => FilterCriterion::RegistrationDateRange {
                from: *REGISTRATION_FROM,
                to: *REGISTRATION_TO,
            },
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            FilterCriterion::PriceRange { .. } => FilterKind::Price,
            FilterCriterion::MileageRange { .. } => FilterKind::Mileage,
            FilterCriterion::FuelEquals { .. } => FilterKind::Fuel,
            FilterCriterion::ColourEquals { .. } => FilterKind::Colour,
            FilterCriterion::RegistrationDateRange { .. } => FilterKind::Registration,
        }
    }

    pub fn is_default(&self) -> bool {
        match self {
            FilterCriterion::FuelEquals { fuel } => is_unrestricted(fuel),
            FilterCriterion::ColourEquals { colour } => is_unrestricted(colour),
            other => *other == FilterCriterion::default_for(other.kind()),
        }
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        match self {
            FilterCriterion::PriceRange { min, max } | FilterCriterion::MileageRange { min, max }
                if min > max =>
            {
                Err(FilterError::InvertedRange {
                    kind: self.kind(),
                    min: *min,
                    max: *max,
                })
            }
            FilterCriterion::FuelEquals { fuel: value }
            | FilterCriterion::ColourEquals { colour: value }
                if value.trim().is_empty() =>
            {
                Err(FilterError::EmptySelection(self.kind()))
            }
            _ => Ok(()),
        }
    }

    /// Title shown on the filter chip once the criterion differs from its default.
    pub fn label(&self) -> Option<String> {
        if self.is_default() {
            return None;
        }
        let label = match self {
            FilterCriterion::PriceRange { min, max } => {
                format!("Price: {} - {}", group_thousands(*min), group_thousands(*max))
            }
            FilterCriterion::MileageRange { min, max } => {
                format!("Mileage: {} - {}", group_thousands(*min), group_thousands(*max))
            }
            FilterCriterion::FuelEquals { fuel } => fuel.clone(),
            FilterCriterion::ColourEquals { colour } => colour.clone(),
            FilterCriterion::RegistrationDateRange { from, to } => format!(
                "Registration: {} - {}",
                from.format("%m-%Y"),
                to.format("%m-%Y")
            ),
        };
        Some(label)
    }
}

// 1234567 -> "1,234,567"
fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterStatus {
    Unfiltered,
    Filtered,
}

// Active criterion as rendered on the filter bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterBadge {
    pub kind: FilterKind,
    pub label: String,
}

/// Current value of every criterion, indexed by kind.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    criteria: [FilterCriterion; 5],
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            criteria: FilterKind::ALL.map(FilterCriterion::default_for),
        }
    }
}

impl FilterState {
    pub fn get(&self, kind: FilterKind) -> &FilterCriterion {
        &self.criteria[kind.index()]
    }

    /// Replace the criterion of the same kind.
    pub fn set(&mut self, criterion: FilterCriterion) {
        let slot = criterion.kind().index();
        self.criteria[slot] = criterion;
    }

    pub fn with(mut self, criterion: FilterCriterion) -> Self {
        self.set(criterion);
        self
    }

    pub fn reset(mut self, kind: FilterKind) -> Self {
        self.set(FilterCriterion::default_for(kind));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterCriterion> {
        self.criteria.iter()
    }

    /// Criteria that restrict the catalog.
    pub fn active(&self) -> impl Iterator<Item = &FilterCriterion> {
        self.criteria.iter().filter(|c| !c.is_default())
    }

    pub fn status(&self) -> FilterStatus {
        if self.active().next().is_some() {
            FilterStatus::Filtered
        } else {
            FilterStatus::Unfiltered
        }
    }

    pub fn badges(&self) -> Vec<FilterBadge> {
        self.criteria
            .iter()
            .filter_map(|c| {
                c.label().map(|label| FilterBadge {
                    kind: c.kind(),
                    label,
                })
            })
            .collect()
    }
}
