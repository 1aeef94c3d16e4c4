use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IllustraError;
use crate::model::{IllustrationRow, RowField};

/// Address of one overridable cell: option slot, policy year, row field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverrideKey {
    pub slot: usize,
    pub year: u32,
    pub field: RowField,
}

impl OverrideKey {
    pub fn new(slot: usize, year: u32, field: RowField) -> Self {
        Self { slot, year, field }
    }
}

impl fmt::Display for OverrideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.slot, self.year, self.field)
    }
}

impl FromStr for OverrideKey {
    type Err = IllustraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || IllustraError::Other(format!("invalid override key: {value}"));
        let mut parts = value.splitn(3, ':');
        let slot = parts.next().and_then(|s| s.parse().ok()).ok_or_else(invalid)?;
        let year = parts.next().and_then(|s| s.parse().ok()).ok_or_else(invalid)?;
        let field = parts.next().ok_or_else(invalid)?.parse()?;
        Ok(Self { slot, year, field })
    }
}

/// User corrections layered over parsed rows. Rows themselves are never
/// touched; reads go through [`OverrideMap::value`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideMap {
    #[serde(with = "override_serde")]
    entries: BTreeMap<OverrideKey, f64>,
}

impl OverrideMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, slot: usize, year: u32, field: RowField, value: f64) {
        self.entries.insert(OverrideKey::new(slot, year, field), value);
    }

    pub fn get(&self, slot: usize, year: u32, field: RowField) -> Option<f64> {
        self.entries
            .get(&OverrideKey::new(slot, year, field))
            .copied()
    }

    pub fn contains(&self, slot: usize, year: u32, field: RowField) -> bool {
        self.entries
            .contains_key(&OverrideKey::new(slot, year, field))
    }

    /// The override for the row's cell if there is one, else the row's value.
    pub fn value(&self, slot: usize, row: &IllustrationRow, field: RowField) -> Option<f64> {
        match self.get(slot, row.year, field) {
            Some(value) => Some(value),
            None => row.field(field),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops every override of one slot and returns how many were removed.
    pub fn clear_slot(&mut self, slot: usize) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.slot != slot);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OverrideKey, &f64)> {
        self.entries.iter()
    }
}

mod override_serde {
    use std::collections::BTreeMap;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::OverrideKey;

    pub fn serialize<S>(entries: &BTreeMap<OverrideKey, f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let keyed: BTreeMap<String, f64> = entries
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect();
        keyed.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<OverrideKey, f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let keyed = BTreeMap::<String, f64>::deserialize(deserializer)?;
        keyed
            .into_iter()
            .map(|(key, value)| {
                key.parse::<OverrideKey>()
                    .map(|key| (key, value))
                    .map_err(D::Error::custom)
            })
            .collect()
    }
}
