use gwas_io::read::VariantRecord;
use log::trace;

/// A record-level predicate applied by the workers between dequeue and
/// kernel. Filters are chained: a record must pass every filter.
pub trait VariantFilter: Send + Sync {
    fn name(&self) -> &'static str;
    fn passes(&self, record: &VariantRecord) -> bool;
}

/// Apply a filter chain to a batch. An empty chain passes every record
/// without copying.
pub fn apply_chain(records: Vec<VariantRecord>, filters: &[Box<dyn VariantFilter>]) -> Vec<VariantRecord> {
    if filters.is_empty() {
        return records
    }
    records
        .into_iter()
        .filter(|record| {
            filters.iter().all(|filter| {
                let passed = filter.passes(record);
                if !passed {
                    trace!("{}:{} rejected by filter '{}'", record.chromosome, record.position, filter.name());
                }
                passed
            })
        })
        .collect()
}

/// Rejects every record falling inside a chromosome interval (both ends
/// inclusive). Useful to blank out regions of known assembly trouble.
pub struct RegionExclusion {
    pub chromosome: String,
    pub start     : u64,
    pub end       : u64,
}

impl VariantFilter for RegionExclusion {
    fn name(&self) -> &'static str {
        "region-exclusion"
    }

    fn passes(&self, record: &VariantRecord) -> bool {
        record.chromosome != self.chromosome
            || record.position < self.start
            || record.position > self.end
    }
}
