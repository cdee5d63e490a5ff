use std::fmt;

use crate::classify::RuleAux;
use crate::counts::GenotypeCells;

/// One SNP tuple flagged by the high-risk rule: the tuple's SNP indices,
/// the genotype cells classified high-risk (k codes per cell), the rule's
/// payload, and the accuracy once evaluated.
///
/// A worker keeps one of these as a reusable scratchpad, `assign`ing it per
/// tuple and cloning only when the ranking actually accepts the entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskyCombination {
    order   : usize,
    snps    : Vec<usize>,
    cells   : Vec<u8>,
    aux     : RuleAux,
    accuracy: f64,
}

impl RiskyCombination {
    /// An empty scratchpad for order-k tuples.
    pub fn new(order: usize) -> Self {
        Self { order, snps: Vec::with_capacity(order), cells: Vec::new(), aux: RuleAux::Mdr, accuracy: 0.0 }
    }

    /// Refill the scratchpad with a freshly classified tuple.
    pub fn assign(&mut self, snps: &[usize], cells: &GenotypeCells, risky_cells: &[usize], aux: RuleAux) {
        debug_assert_eq!(snps.len(), self.order);
        debug_assert_eq!(cells.order(), self.order);
        self.snps.clear();
        self.snps.extend_from_slice(snps);
        self.cells.clear();
        for &cell in risky_cells {
            self.cells.extend_from_slice(cells.cell(cell));
        }
        self.aux = aux;
        self.accuracy = 0.0;
    }

    pub fn set_accuracy(&mut self, accuracy: f64) {
        self.accuracy = accuracy;
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn snps(&self) -> &[usize] {
        &self.snps
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn aux(&self) -> &RuleAux {
        &self.aux
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len() / self.order
    }

    /// Iterate over the flagged cells, k codes each.
    pub fn cells(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks_exact(self.order)
    }
}

impl fmt::Display for RiskyCombination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "snps [")?;
        for (i, snp) in self.snps.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{snp}")?;
        }
        write!(f, "] cells {} accuracy {:.6}", self.num_cells(), self.accuracy)
    }
}
