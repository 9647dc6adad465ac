//! Location lookup set.

use std::collections::HashSet;
use std::path::Path;

use crate::error::PipelineResult;
use crate::ingestion::{ingest_from_path, IngestionOptions};
use crate::types::{DataType, Field, Schema, Value};

/// Column holding location names in the lookup file.
pub const AREA_COLUMN: &str = "Area";

/// Immutable set of valid location names, loaded once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationLookup {
    areas: HashSet<String>,
}

impl LocationLookup {
    /// Load the `Area` column of a CSV or workbook file. Blank cells are ignored.
    pub fn load(path: impl AsRef<Path>, options: &IngestionOptions) -> PipelineResult<Self> {
        let schema = Schema::new(vec![Field::new(AREA_COLUMN, DataType::Utf8)]);
        let ds = ingest_from_path(path, &schema, options)?;
        let idx = ds.schema.index_of(AREA_COLUMN).unwrap_or(0);
        let areas = ds
            .rows
            .iter()
            .filter_map(|row| match row.get(idx) {
                Some(Value::Utf8(s)) => Some(s.clone()),
                _ => None,
            })
            .collect();
        Ok(Self { areas })
    }

    /// Exact, case-sensitive membership test. `None` is never a member.
    pub fn contains(&self, location: Option<&str>) -> bool {
        location.is_some_and(|l| self.areas.contains(l))
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for LocationLookup {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            areas: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LocationLookup;

    #[test]
    fn membership_is_exact_and_null_is_invalid() {
        let lookup: LocationLookup = ["BTM", "Koramangala 5th Block"].into_iter().collect();
        assert!(lookup.contains(Some("BTM")));
        assert!(!lookup.contains(Some("btm")));
        assert!(!lookup.contains(Some("Atlantis")));
        assert!(!lookup.contains(None));
        assert_eq!(lookup.len(), 2);
    }
}
