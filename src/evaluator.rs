// Predicate evaluation of the filter state over the catalog

use chrono::{Datelike, NaiveDate};

use crate::filters::{FilterCriterion, FilterState, is_unrestricted};
use crate::models::Listing;

/// Listings satisfying every non-default criterion, in catalog order.
pub fn evaluate(catalog: &[Listing], state: &FilterState) -> Vec<Listing> {
    let active: Vec<&FilterCriterion> = state.active().collect();
    if active.is_empty() {
        return catalog.to_vec();
    }
    catalog
        .iter()
        .filter(|listing| active.iter().all(|criterion| holds(criterion, listing)))
        .cloned()
        .collect()
}

/// Whether a single criterion admits `listing`.
pub fn holds(criterion: &FilterCriterion, listing: &Listing) -> bool {
    match criterion {
        FilterCriterion::PriceRange { min, max } => (*min..=*max).contains(&listing.price),
        FilterCriterion::MileageRange { min, max } => (*min..=*max).contains(&listing.mileage),
        FilterCriterion::FuelEquals { fuel } => {
            is_unrestricted(fuel) || listing.fuel.trim().eq_ignore_ascii_case(fuel.trim())
        }
        FilterCriterion::ColourEquals { colour } => match &listing.colour {
            None => true, // Absent colour is skipped, not excluded
            Some(c) => is_unrestricted(colour) || c.trim().eq_ignore_ascii_case(colour.trim()),
        },
        FilterCriterion::RegistrationDateRange { from, to } => {
            let Some(raw) = listing.first_registration.as_deref() else {
                return true;
            };
            match parse_registration(raw) {
                Some(registered) => {
                    let lower = month_start((*from).min(*to));
                    let upper = month_start((*from).max(*to));
                    (lower..=upper).contains(&registered)
                }
                None => {
                    // NOTE: unparsable registrations pass, same as an absent one
                    tracing::debug!(listing_id = listing.id, raw, "Unparsable first registration, keeping listing");
                    true
                }
            }
        }
    }
}

/// Parse a first-registration string to the first day of its month.
///
/// Accepts `MM-YYYY`, `MM/YYYY`, `MM.YYYY` and ISO `YYYY-MM-DD`.
pub fn parse_registration(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(month_start(date));
    }
    let (month, year) = raw.split_once(['-', '/', '.'])?;
    let month: u32 = month.trim().parse().ok()?;
    let year = year.trim();
    if year.len() != 4 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
