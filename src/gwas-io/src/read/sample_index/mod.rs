use ahash::AHashMap;

mod error;
pub use error::SampleIndexError;

/// Maps a sample identifier to its column within the genotype matrix.
///
/// Built once from the ordered sample-name list accompanying a variant
/// stream, then read-only. Lookup is case-insensitive. Duplicate
/// identifiers are a fatal input error: two columns claiming the same
/// sample would make every downstream join ambiguous.
#[derive(Debug, Clone)]
pub struct SampleIndex {
    positions: AHashMap<String, usize>,
}

impl SampleIndex {
    pub fn from_names<I, S>(names: I) -> Result<Self, SampleIndexError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut positions = AHashMap::new();
        for (column, name) in names.into_iter().enumerate() {
            let key = name.as_ref().to_ascii_lowercase();
            if positions.insert(key, column).is_some() {
                return Err(SampleIndexError::DuplicateSample { id: name.as_ref().to_string() })
            }
        }
        Ok(Self { positions })
    }

    /// Column of the given sample, if present.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(&id.to_ascii_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
