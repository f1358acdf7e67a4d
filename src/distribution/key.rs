use std::collections::BTreeMap;

use crate::domain::{MeshCell, NO_DATA_FACTOR};

const KEY_SCALE: f64 = 1e6;

/// Humus value quantized to 1e-6 so it can key an ordered map
///
/// Two cell means that agree to six decimals share a key. NaN, the no-data
/// value 0 and anything with `|humus| < 5e-7` all map to
/// [`HumusKey::NO_DATA`]; [`MeshCell::has_humus`] uses the same threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HumusKey(i64);

impl HumusKey {
    pub const NO_DATA: HumusKey = HumusKey(0);

    pub fn from_value(humus: f64) -> Self {
        Self((humus * KEY_SCALE).round() as i64)
    }

    pub fn value(self) -> f64 {
        self.0 as f64 / KEY_SCALE
    }

    pub fn is_no_data(self) -> bool {
        self == Self::NO_DATA
    }
}

/// Summed cell area per distinct humus value, ascending by humus
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HumusAreaMap(BTreeMap<HumusKey, f64>);

impl HumusAreaMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: &[MeshCell]) -> Self {
        let mut map = Self::new();
        for cell in cells {
            map.add(cell.humus_mean, cell.area);
        }
        map
    }

    pub fn add(&mut self, humus: f64, area: f64) {
        *self.0.entry(HumusKey::from_value(humus)).or_insert(0.0) += area;
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_no_data(&self) -> bool {
        self.0.contains_key(&HumusKey::NO_DATA)
    }

    pub fn iter(&self) -> impl Iterator<Item = (HumusKey, f64)> + '_ {
        self.0.iter().map(|(k, a)| (*k, *a))
    }

    /// Entries with a humus reading, ascending
    pub fn with_data(&self) -> impl Iterator<Item = (HumusKey, f64)> + '_ {
        self.iter().filter(|(k, _)| !k.is_no_data())
    }
}

impl FromIterator<(f64, f64)> for HumusAreaMap {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (humus, area) in iter {
            map.add(humus, area);
        }
        map
    }
}

/// Adjustment factor per distinct humus value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable(BTreeMap<HumusKey, f64>);

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: HumusKey, factor: f64) {
        self.0.insert(key, factor);
    }

    pub fn mark_no_data(&mut self) {
        self.insert(HumusKey::NO_DATA, NO_DATA_FACTOR);
    }

    pub fn get(&self, humus: f64) -> Option<f64> {
        self.0.get(&HumusKey::from_value(humus)).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HumusKey, f64)> + '_ {
        self.0.iter().map(|(k, f)| (*k, *f))
    }
}
