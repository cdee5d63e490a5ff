use crate::risky::RiskyCombination;

/// What happened to a candidate submitted to the ranking.
#[derive(Debug)]
pub enum RankingOutcome {
    /// Entered at `position`; `evicted` carries the former tail when the
    /// insertion pushed the ranking over capacity. The caller owns the
    /// evicted combination.
    Inserted {
        position: usize,
        evicted : Option<RiskyCombination>,
    },
    /// Ranking full and the candidate did not beat the tail; handed back.
    Rejected(RiskyCombination),
}

/// Bounded best-N list of risky combinations, ordered by descending
/// accuracy. Ties keep first-inserted entries ahead.
pub struct Ranking {
    entries : Vec<RiskyCombination>,
    capacity: usize,
}

impl Ranking {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: Vec::with_capacity(capacity), capacity }
    }

    /// Cheap pre-check: would a candidate with this accuracy enter? Lets
    /// callers skip cloning a scratchpad that stands no chance.
    pub fn accepts(&self, accuracy: f64) -> bool {
        self.entries.len() < self.capacity
            || self.entries.last().is_some_and(|tail| accuracy > tail.accuracy())
    }

    /// Insert by descending accuracy. A candidate beating some entry lands
    /// right before the first entry it beats (so equal scores stack in
    /// arrival order); otherwise it is appended while room remains.
    pub fn insert(&mut self, combination: RiskyCombination) -> RankingOutcome {
        let beats = self.entries.iter().position(|entry| combination.accuracy() > entry.accuracy());
        match beats {
            Some(position) => {
                self.entries.insert(position, combination);
                let evicted = (self.entries.len() > self.capacity).then(|| self.entries.pop()).flatten();
                RankingOutcome::Inserted { position, evicted }
            }
            None if self.entries.len() < self.capacity => {
                self.entries.push(combination);
                RankingOutcome::Inserted { position: self.entries.len() - 1, evicted: None }
            }
            None => RankingOutcome::Rejected(combination),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn head(&self) -> Option<&RiskyCombination> {
        self.entries.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RiskyCombination> {
        self.entries.iter()
    }
}

impl IntoIterator for Ranking {
    type Item = RiskyCombination;
    type IntoIter = std::vec::IntoIter<RiskyCombination>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
