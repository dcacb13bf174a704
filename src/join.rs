use crate::types::{EducationRecord, FeatureId};
use std::collections::HashMap;

/// County id to education record. When several records share a FIPS code the
/// first one wins, same as scanning the list front to back.
pub struct JoinIndex<'a> {
    by_fips: HashMap<i64, &'a EducationRecord>,
}

impl<'a> JoinIndex<'a> {
    pub fn new(records: &'a [EducationRecord]) -> Self {
        let mut by_fips = HashMap::with_capacity(records.len());
        for record in records {
            by_fips.entry(record.fips).or_insert(record);
        }
        Self { by_fips }
    }

    /// Exact match only: string ids never match, whatever they contain.
    pub fn lookup(&self, id: Option<&FeatureId>) -> Option<&'a EducationRecord> {
        let fips = id?.as_fips()?;
        self.by_fips.get(&fips).copied()
    }

    pub fn fips_count(&self) -> usize {
        self.by_fips.len()
    }
}
