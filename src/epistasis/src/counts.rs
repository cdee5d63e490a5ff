use genotype::NUM_GENOTYPE_CODES;

use crate::masks::MaskBuffer;

/// The 3^k genotype cells of an order-k tuple, flattened (k codes per
/// cell). Cells are enumerated odometer-style, last SNP varying fastest.
pub struct GenotypeCells {
    order: usize,
    flat : Vec<u8>,
}

impl GenotypeCells {
    pub fn new(order: usize) -> Self {
        let count = NUM_GENOTYPE_CODES.pow(order as u32);
        let mut flat = Vec::with_capacity(count * order);
        let mut current = vec![0u8; order];
        for _ in 0..count {
            flat.extend_from_slice(&current);
            for digit in current.iter_mut().rev() {
                *digit += 1;
                if usize::from(*digit) < NUM_GENOTYPE_CODES {
                    break
                }
                *digit = 0;
            }
        }
        Self { order, flat }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of cells: 3^order.
    pub fn len(&self) -> usize {
        self.flat.len() / self.order
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    /// The k genotype codes of cell `index`.
    pub fn cell(&self, index: usize) -> &[u8] {
        &self.flat[index * self.order..(index + 1) * self.order]
    }
}

/// Load one 8-byte word of a mask. The padded-to-16 geometry guarantees
/// whole words inside each half, so alignment never matters.
#[inline]
fn load_word(mask: &[u8], at: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&mask[at..at + 8]);
    u64::from_le_bytes(word)
}

/// AND the chosen per-SNP masks over `[start, start + len)` and popcount.
/// Every matching sample contributes 8 set bits.
#[inline]
pub(crate) fn and_popcount(blocks: &[&[u8]], start: usize, len: usize) -> u32 {
    let mut bits = 0u32;
    let mut at = start;
    while at < start + len {
        let mut word = load_word(blocks[0], at);
        for block in &blocks[1..] {
            word &= load_word(block, at);
        }
        bits += word.count_ones();
        at += 8;
    }
    bits / 8
}

/// Count, for the first `rows` tuple rows of `masks` and every genotype
/// cell, how many affected and unaffected samples carry that cell. Outputs
/// are parallel, `rows * cells.len()` long, row-major.
pub fn combination_counts(
    masks       : &MaskBuffer,
    cells       : &GenotypeCells,
    rows        : usize,
    counts_aff  : &mut Vec<u32>,
    counts_unaff: &mut Vec<u32>,
) {
    assert_eq!(masks.order(), cells.order(), "mask buffer and cell table disagree on order");
    assert!(rows <= masks.rows(), "row count exceeds the mask buffer capacity");
    let layout = *masks.layout();

    counts_aff.clear();
    counts_unaff.clear();
    counts_aff.reserve(rows * cells.len());
    counts_unaff.reserve(rows * cells.len());

    let mut blocks: Vec<&[u8]> = Vec::with_capacity(masks.order());
    for row in 0..rows {
        for cell_idx in 0..cells.len() {
            let cell = cells.cell(cell_idx);
            blocks.clear();
            blocks.extend(cell.iter().enumerate().map(|(snp, &code)| masks.snp_block(row, snp, code)));

            // The two sweeps are independent: affected half, then unaffected.
            counts_aff.push(and_popcount(&blocks, 0, layout.padded_affected()));
            counts_unaff.push(and_popcount(&blocks, layout.padded_affected(), layout.padded_unaffected()));
        }
    }
}
