// Filter set: current criteria plus their persistence in the settings store

use crate::error::FilterError;
use crate::filters::{FilterCriterion, FilterKind, FilterState};
use crate::store::{SettingsKey, SettingsRepository, StoredValue};

pub struct FilterSet {
    state: FilterState,
    store: Box<dyn SettingsRepository>,
}

impl std::fmt::Debug for FilterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterSet").field("state", &self.state).finish_non_exhaustive()
    }
}

impl FilterSet {
    /// Rebuild the set from whatever `store` remembers.
    pub fn restore(store: Box<dyn SettingsRepository>) -> Self {
        let mut state = FilterState::default();
        for kind in FilterKind::ALL {
            state.set(read_criterion(store.as_ref(), kind));
        }
        tracing::info!(status = ?state.status(), "Restored filter selections");
        FilterSet { state, store }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn get(&self, kind: FilterKind) -> &FilterCriterion {
        self.state.get(kind)
    }

    /// Validate, store and persist `criterion`, replacing the one of the same kind.
    pub fn set(&mut self, criterion: FilterCriterion) -> Result<(), FilterError> {
        criterion.validate()?;
        write_criterion(self.store.as_mut(), &criterion)?;
        tracing::debug!(kind = %criterion.kind(), label = ?criterion.label(), "Filter updated");
        self.state.set(criterion);
        Ok(())
    }

    /// Reset one kind (persisting its default values) or, with `None`, every
    /// kind (clearing the store).
    pub fn reset(&mut self, kind: Option<FilterKind>) -> Result<(), FilterError> {
        match kind {
            Some(kind) => {
                let criterion = FilterCriterion::default_for(kind);
                write_criterion(self.store.as_mut(), &criterion)?;
                self.state.set(criterion);
                tracing::debug!(%kind, "Filter reset to default");
            }
            None => {
                self.store.remove_many(&SettingsKey::ALL)?;
                self.state = FilterState::default();
                tracing::debug!("All filters reset");
            }
        }
        Ok(())
    }
}

fn keys_for(kind: FilterKind) -> (SettingsKey, Option<SettingsKey>) {
    match kind {
        FilterKind::Price => (SettingsKey::MinPrice, Some(SettingsKey::MaxPrice)),
        FilterKind::Mileage => (SettingsKey::MinMileage, Some(SettingsKey::MaxMileage)),
        FilterKind::Fuel => (SettingsKey::FuelType, None),
        FilterKind::Colour => (SettingsKey::Colour, None),
        FilterKind::Registration => (SettingsKey::RegistrationFrom, Some(SettingsKey::RegistrationTo)),
    }
}

fn write_criterion(
    store: &mut dyn SettingsRepository,
    criterion: &FilterCriterion,
) -> Result<(), FilterError> {
    let (first, second) = keys_for(criterion.kind());
    let (a, b) = match criterion {
        FilterCriterion::PriceRange { min, max } | FilterCriterion::MileageRange { min, max } => (
            StoredValue::Number(*min as f64),
            Some(StoredValue::Number(*max as f64)),
        ),
        FilterCriterion::FuelEquals { fuel: value } | FilterCriterion::ColourEquals { colour: value } => {
            (StoredValue::Text(value.clone()), None)
        }
        FilterCriterion::RegistrationDateRange { from, to } => {
            (StoredValue::Date(*from), Some(StoredValue::Date(*to)))
        }
    };
    let mut entries = vec![(first, a)];
    if let (Some(key), Some(value)) = (second, b) {
        entries.push((key, value));
    }
    // Both halves of a range land together or not at all
    store.write_many(entries)?;
    Ok(())
}

// Slider values may have been stored fractional
fn to_amount(value: &StoredValue) -> Option<i64> {
    value
        .as_number()
        .filter(|n| n.is_finite())
        .map(|n| n.round() as i64)
}

// Stored value under `key` converted with `convert`; a value of the wrong
// type is logged and treated as absent
fn typed<T>(
    store: &dyn SettingsRepository,
    key: SettingsKey,
    convert: impl Fn(&StoredValue) -> Option<T>,
) -> Option<T> {
    let Some(value) = store.read(key) else {
        tracing::trace!(key = key.as_str(), "No stored value, using default");
        return None;
    };
    let converted = convert(&value);
    if converted.is_none() {
        tracing::warn!(key = key.as_str(), stored = ?value, "Malformed stored value, using default");
    }
    converted
}

fn read_criterion(store: &dyn SettingsRepository, kind: FilterKind) -> FilterCriterion {
    let default = FilterCriterion::default_for(kind);
    let (first, second) = keys_for(kind);

    // Each stored half falls back to its default independently
    let amount = |key: Option<SettingsKey>| key.and_then(|key| typed(store, key, to_amount));
    let text = |key: SettingsKey| typed(store, key, |v| v.as_text().map(str::to_string));
    let date = |key: Option<SettingsKey>| key.and_then(|key| typed(store, key, StoredValue::as_date));

    let restored = match default {
        FilterCriterion::PriceRange { min, max } | FilterCriterion::MileageRange { min, max } => {
            let min = amount(Some(first)).unwrap_or(min);
            let max = amount(second).unwrap_or(max);
            if kind == FilterKind::Price {
                FilterCriterion::PriceRange { min, max }
            } else {
                FilterCriterion::MileageRange { min, max }
            }
        }
        FilterCriterion::FuelEquals { fuel } => FilterCriterion::FuelEquals {
            fuel: text(first).unwrap_or(fuel),
        },
        FilterCriterion::ColourEquals { colour } => FilterCriterion::ColourEquals {
            colour: text(first).unwrap_or(colour),
        },
        FilterCriterion::RegistrationDateRange { from, to } => FilterCriterion::RegistrationDateRange {
            from: date(Some(first)).unwrap_or(from),
            to: date(second).unwrap_or(to),
        },
    };

    match restored.validate() {
        Ok(()) => restored,
        Err(e) => {
            tracing::warn!(%kind, error = %e, "Stored filter is invalid, using default");
            FilterCriterion::default_for(kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::filters::FilterStatus;
    use crate::store::{JsonFileStore, MemoryStore};
    use chrono::NaiveDate;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    // Memory store whose writes and removals of one key always fail
    struct FlakyStore {
        inner: MemoryStore,
        broken: SettingsKey,
    }

    impl FlakyStore {
        fn failure(&self) -> StoreError {
            StoreError::Io {
                path: "flaky.json".into(),
                source: std::io::Error::other(format!("cannot touch {}", self.broken.as_str())),
            }
        }
    }

    impl SettingsRepository for FlakyStore {
        fn read(&self, key: SettingsKey) -> Option<StoredValue> {
            self.inner.read(key)
        }

        fn write(&mut self, key: SettingsKey, value: StoredValue) -> Result<(), StoreError> {
            if key == self.broken {
                return Err(self.failure());
            }
            self.inner.write(key, value)
        }

        fn remove(&mut self, key: SettingsKey) -> Result<(), StoreError> {
            if key == self.broken {
                return Err(self.failure());
            }
            self.inner.remove(key)
        }
    }

    // Collects formatted log output
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn fresh() -> FilterSet {
        FilterSet::restore(Box::new(MemoryStore::new()))
    }

    #[test]
    fn empty_store_restores_defaults() {
        let set = fresh();
        assert_eq!(set.state(), &FilterState::default());
        assert_eq!(set.state().status(), FilterStatus::Unfiltered);
    }

    #[test]
    fn set_replaces_criterion_of_same_kind() {
        let mut set = fresh();
        set.set(FilterCriterion::FuelEquals { fuel: "Diesel".into() }).unwrap();
        set.set(FilterCriterion::FuelEquals { fuel: "Hybrid".into() }).unwrap();
        assert_eq!(
            set.get(FilterKind::Fuel),
            &FilterCriterion::FuelEquals { fuel: "Hybrid".into() }
        );
        assert_eq!(set.state().active().count(), 1);
    }

    #[test]
    fn invalid_criterion_leaves_state_untouched() {
        let mut set = fresh();
        let err = set
            .set(FilterCriterion::PriceRange { min: 50_000, max: 1_000 })
            .unwrap_err();
        assert!(matches!(err, FilterError::InvertedRange { .. }));
        assert!(set.get(FilterKind::Price).is_default());
    }

    #[test]
    fn selections_survive_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("filters.json");
        let from = NaiveDate::from_ymd_opt(2014, 2, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2020, 8, 1).unwrap();

        {
            let mut set = FilterSet::restore(Box::new(JsonFileStore::open(&path)));
            set.set(FilterCriterion::MileageRange { min: 10_000, max: 90_000 }).unwrap();
            set.set(FilterCriterion::ColourEquals { colour: "Blue".into() }).unwrap();
            set.set(FilterCriterion::RegistrationDateRange { from, to }).unwrap();
        }

        let set = FilterSet::restore(Box::new(JsonFileStore::open(&path)));
        assert_eq!(
            set.get(FilterKind::Mileage),
            &FilterCriterion::MileageRange { min: 10_000, max: 90_000 }
        );
        assert_eq!(
            set.get(FilterKind::Colour),
            &FilterCriterion::ColourEquals { colour: "Blue".into() }
        );
        assert_eq!(
            set.get(FilterKind::Registration),
            &FilterCriterion::RegistrationDateRange { from, to }
        );
        assert!(set.get(FilterKind::Price).is_default());
    }

    #[test]
    fn reset_one_persists_its_default() {
        let mut store = MemoryStore::new();
        store.write(SettingsKey::FuelType, StoredValue::Text("Electric".into())).unwrap();
        store.write(SettingsKey::MinPrice, StoredValue::Number(5_000.0)).unwrap();
        let mut set = FilterSet::restore(Box::new(store));
        assert_eq!(set.state().active().count(), 2);

        set.reset(Some(FilterKind::Fuel)).unwrap();
        assert!(set.get(FilterKind::Fuel).is_default());
        assert!(!set.get(FilterKind::Price).is_default());
        assert_eq!(
            set.store.read(SettingsKey::FuelType),
            Some(StoredValue::Text("Any".into()))
        );
    }

    #[test]
    fn reset_all_clears_store() {
        let mut set = fresh();
        set.set(FilterCriterion::PriceRange { min: 1_000, max: 2_000 }).unwrap();
        set.set(FilterCriterion::FuelEquals { fuel: "Diesel".into() }).unwrap();
        set.reset(None).unwrap();
        assert_eq!(set.state().status(), FilterStatus::Unfiltered);
        for key in SettingsKey::ALL {
            assert!(set.store.read(key).is_none());
        }
    }

    #[test]
    fn half_stored_range_falls_back_per_value() {
        let mut store = MemoryStore::new();
        store.write(SettingsKey::MaxPrice, StoredValue::Number(30_000.4)).unwrap();
        store.write(SettingsKey::MinMileage, StoredValue::Text("oops".into())).unwrap();
        let set = FilterSet::restore(Box::new(store));
        assert_eq!(
            set.get(FilterKind::Price),
            &FilterCriterion::PriceRange { min: 0, max: 30_000 }
        );
        assert!(set.get(FilterKind::Mileage).is_default());
    }

    #[test]
    fn inverted_stored_range_restores_default() {
        let mut store = MemoryStore::new();
        store.write(SettingsKey::MinPrice, StoredValue::Number(90_000.0)).unwrap();
        store.write(SettingsKey::MaxPrice, StoredValue::Number(10_000.0)).unwrap();
        let set = FilterSet::restore(Box::new(store));
        assert!(set.get(FilterKind::Price).is_default());
    }

    #[test]
    fn failed_range_save_leaves_nothing_behind() {
        let mut set = FilterSet::restore(Box::new(FlakyStore {
            inner: MemoryStore::new(),
            broken: SettingsKey::MaxPrice,
        }));
        let err = set
            .set(FilterCriterion::PriceRange { min: 40_000, max: 60_000 })
            .unwrap_err();
        assert!(matches!(err, FilterError::Store(_)));
        assert!(set.get(FilterKind::Price).is_default());

        // The min half must not survive on its own
        assert!(set.store.read(SettingsKey::MinPrice).is_none());
        assert!(read_criterion(set.store.as_ref(), FilterKind::Price).is_default());
    }

    #[test]
    fn failed_reset_all_keeps_stored_selections() {
        let mut inner = MemoryStore::new();
        inner.write(SettingsKey::FuelType, StoredValue::Text("Diesel".into())).unwrap();
        inner.write(SettingsKey::Colour, StoredValue::Text("Red".into())).unwrap();
        let mut set = FilterSet::restore(Box::new(FlakyStore {
            inner,
            broken: SettingsKey::Colour,
        }));
        assert_eq!(set.state().active().count(), 2);

        assert!(set.reset(None).is_err());
        assert_eq!(set.state().active().count(), 2);
        assert_eq!(
            set.store.read(SettingsKey::FuelType),
            Some(StoredValue::Text("Diesel".into()))
        );
        assert_eq!(
            set.store.read(SettingsKey::Colour),
            Some(StoredValue::Text("Red".into()))
        );
    }

    #[test]
    fn wrong_typed_value_is_logged_and_ignored() {
        let mut store = MemoryStore::new();
        store.write(SettingsKey::MinMileage, StoredValue::Text("lots".into())).unwrap();
        store.write(SettingsKey::FuelType, StoredValue::Number(3.0)).unwrap();

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let set = tracing::subscriber::with_default(subscriber, || FilterSet::restore(Box::new(store)));

        assert!(set.get(FilterKind::Mileage).is_default());
        assert!(set.get(FilterKind::Fuel).is_default());
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Malformed stored value"));
        assert!(output.contains("minMileage"));
        assert!(output.contains("fuelType"));
    }
}
