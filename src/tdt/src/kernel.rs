use genotype::GenotypeCall;
use gwas_io::read::{Family, Pedigree, SampleIndex, VariantRecord};
use log::trace;

use crate::result::TdtResult;

/// Allele transmitted (or withheld) by a heterozygous parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transmitted {
    Ref,
    Alt,
}

/// Run the transmission-disequilibrium count for one variant over the whole
/// family table and derive the per-variant statistics.
pub fn test_variant(
    record  : &VariantRecord,
    pedigree: &Pedigree,
    samples : &SampleIndex,
    affected: &(dyn Fn(f64) -> bool + Send + Sync),
    permute : Option<&(dyn Fn(&Family) -> bool + Send + Sync)>,
) -> TdtResult {
    let mut t1 = 0u32;
    let mut t2 = 0u32;
    for family in pedigree.families() {
        family_transmissions(record, family, samples, affected, permute, &mut t1, &mut t2);
    }
    TdtResult::new(&record.chromosome, record.position, &record.reference, &record.alternate, t1, t2)
}

/// Accumulate one family's transmission counts into `t1` (ref) / `t2` (alt).
///
/// A family is skipped outright when a parent slot is absent, unpositioned,
/// ungenotyped, when both parents are homozygous, or when a parent carries
/// the half-missing `a/0` (a ≠ 0) marker. The same marker rule silences
/// individual children, as do unaffected phenotypes and missing genotypes.
fn family_transmissions(
    record  : &VariantRecord,
    family  : &Family,
    samples : &SampleIndex,
    affected: &(dyn Fn(f64) -> bool + Send + Sync),
    permute : Option<&(dyn Fn(&Family) -> bool + Send + Sync)>,
    t1      : &mut u32,
    t2      : &mut u32,
) {
    let (Some(father), Some(mother)) = (family.father.as_ref(), family.mother.as_ref()) else {
        return
    };
    let Some(father_pos) = samples.position(&father.id) else {
        trace!("family {}: father '{}' is not positioned", family.id, father.id);
        return
    };
    let Some(mother_pos) = samples.position(&mother.id) else {
        trace!("family {}: mother '{}' is not positioned", family.id, mother.id);
        return
    };
    let Some(father_cell) = record.sample_cell(father_pos) else { return };
    let Some(mother_cell) = record.sample_cell(mother_pos) else { return };
    let GenotypeCall::Alleles(father_a1, father_a2) = GenotypeCall::decode(father_cell) else { return };
    let GenotypeCall::Alleles(mother_a1, mother_a2) = GenotypeCall::decode(mother_cell) else { return };

    // We need two genotyped parents, with at least one het.
    if father_a1 == father_a2 && mother_a1 == mother_a2 {
        return
    }
    // Half-missing marker: a non-zero first allele over a zero second one.
    if (father_a1 != 0 && father_a2 == 0) || (mother_a1 != 0 && mother_a2 == 0) {
        return
    }

    let flip = permute.map_or(false, |flip| flip(family));
    let father_het_01 = father_a1 == 0 && father_a2 != 0;
    let mother_het_01 = mother_a1 == 0 && mother_a2 != 0;

    for child in &family.children {
        if !affected(child.phenotype) {
            continue
        }
        let Some(child_pos) = samples.position(&child.id) else { continue };
        let Some(child_cell) = record.sample_cell(child_pos) else { continue };
        let GenotypeCall::Alleles(child_a1, child_a2) = GenotypeCall::decode(child_cell) else { continue };
        if child_a1 != 0 && child_a2 == 0 {
            continue
        }

        use Transmitted::{Alt, Ref};
        // (transmitted, untransmitted) pairs: one per het parent, father first.
        let first: (Transmitted, Transmitted);
        let mut second: Option<(Transmitted, Transmitted)> = None;

        if child_a1 == 0 && child_a2 == 0 {
            first = (Ref, Alt);
            if father_het_01 && mother_het_01 {
                second = Some((Ref, Alt));
            }
        } else if child_a1 == 0 && child_a2 != 0 {
            if father_a1 != father_a2 {
                if mother_a1 != mother_a2 {
                    first  = (Ref, Alt);
                    second = Some((Alt, Ref));
                } else if mother_a1 == 0 {
                    first = (Alt, Ref); // The alternate can only come from the het father.
                } else {
                    first = (Ref, Alt);
                }
            } else if father_a1 == 0 {
                first = (Alt, Ref);
            } else {
                first = (Ref, Alt);
            }
        } else {
            first = (Alt, Ref);
            if father_het_01 && mother_het_01 {
                second = Some((Alt, Ref));
            }
        }

        let mut transmissions = [Some(first), second];
        if flip {
            for pair in transmissions.iter_mut().flatten() {
                *pair = (pair.1, pair.0);
            }
        }
        for (transmitted, _) in transmissions.into_iter().flatten() {
            match transmitted {
                Ref => *t1 += 1,
                Alt => *t2 += 1,
            }
        }
        trace!(
            "TDT {}:{} family {}: child '{}' F {father_a1}/{father_a2} M {mother_a1}/{mother_a2} C {child_a1}/{child_a2} -> t1={t1} t2={t2}",
            record.chromosome, record.position, family.id, child.id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::affected_code;
    use crate::result::UNDEFINED_CHI_SQUARE;
    use genotype::Sex;
    use gwas_io::read::Individual;
    use pretty_assertions::assert_eq;

    fn individual(id: &str, phenotype: f64) -> Individual {
        Individual { id: id.to_string(), sex: Sex::Unknown, phenotype }
    }

    fn trio_pedigree(child_phenotype: f64) -> Pedigree {
        Pedigree::from_iter([Family {
            id      : "FAM1".to_string(),
            father  : Some(individual("father", 1.0)),
            mother  : Some(individual("mother", 1.0)),
            children: vec![individual("child", child_phenotype)],
        }])
    }

    fn trio_index() -> SampleIndex {
        SampleIndex::from_names(["father", "mother", "child"]).unwrap()
    }

    fn trio_record(father: &str, mother: &str, child: &str) -> VariantRecord {
        VariantRecord::new("1", 1000, "A", "C", &[father, mother, child])
    }

    fn run_trio(father: &str, mother: &str, child: &str, child_phenotype: f64) -> TdtResult {
        let affected = affected_code(2.0);
        test_variant(
            &trio_record(father, mother, child),
            &trio_pedigree(child_phenotype),
            &trio_index(),
            &*affected,
            None,
        )
    }

    #[test]
    fn all_heterozygous_trio_is_balanced() {
        let result = run_trio("0/1", "0/1", "0/1", 2.0);
        assert_eq!((result.t1, result.t2), (1, 1));
        assert_eq!(result.chi_square, 0.0);
        assert_eq!(result.odds_ratio, 1.0);
    }

    #[test]
    fn pure_mendelian_alt_transmission() {
        // Only the mother is het; she transmitted the alternate allele.
        let result = run_trio("1/1", "0/1", "1/1", 2.0);
        assert_eq!((result.t1, result.t2), (0, 1));
        assert_eq!(result.chi_square, 1.0);
        assert!(result.odds_ratio.is_nan());
    }

    #[test]
    fn homozygous_parents_are_skipped() {
        let result = run_trio("0/0", "1/1", "0/1", 2.0);
        assert_eq!((result.t1, result.t2), (0, 0));
        assert_eq!(result.chi_square, UNDEFINED_CHI_SQUARE);
    }

    #[test]
    fn unaffected_child_is_skipped() {
        let result = run_trio("0/1", "0/0", "0/1", 1.0);
        assert_eq!((result.t1, result.t2), (0, 0));
        assert_eq!(result.chi_square, UNDEFINED_CHI_SQUARE);
    }

    #[test]
    fn het_child_het_father_hom_ref_mother() {
        // The child's alternate allele can only come from the het father.
        let result = run_trio("0/1", "0/0", "0/1", 2.0);
        assert_eq!((result.t1, result.t2), (0, 1));
    }

    #[test]
    fn het_child_het_father_hom_alt_mother() {
        // The mother supplied the alternate; the het father transmitted ref.
        let result = run_trio("0/1", "1/1", "0/1", 2.0);
        assert_eq!((result.t1, result.t2), (1, 0));
    }

    #[test]
    fn het_child_het_mother_only() {
        let result = run_trio("0/0", "0/1", "0/1", 2.0);
        assert_eq!((result.t1, result.t2), (0, 1));

        let result = run_trio("1/1", "0/1", "0/1", 2.0);
        assert_eq!((result.t1, result.t2), (1, 0));
    }

    #[test]
    fn hom_ref_child_counts_one_ref_per_het_parent() {
        let result = run_trio("0/1", "0/1", "0/0", 2.0);
        assert_eq!((result.t1, result.t2), (2, 0));

        let result = run_trio("0/1", "0/0", "0/0", 2.0);
        assert_eq!((result.t1, result.t2), (1, 0));
    }

    #[test]
    fn hom_alt_child_counts_one_alt_per_het_parent() {
        let result = run_trio("0/1", "0/1", "1/1", 2.0);
        assert_eq!((result.t1, result.t2), (0, 2));
    }

    #[test]
    fn missing_genotypes_are_skipped() {
        // Missing parent genotype skips the family.
        let result = run_trio("./.", "0/1", "0/1", 2.0);
        assert_eq!((result.t1, result.t2), (0, 0));
        // Missing child genotype skips the child.
        let result = run_trio("0/1", "0/1", "./.", 2.0);
        assert_eq!((result.t1, result.t2), (0, 0));
    }

    #[test]
    fn half_missing_marker_skips_family_or_child() {
        // `1/0` on a parent reads as half-missing, not as a het call.
        let result = run_trio("1/0", "0/1", "0/1", 2.0);
        assert_eq!((result.t1, result.t2), (0, 0));
        // Same marker on the child silences only that child.
        let result = run_trio("0/1", "0/1", "1/0", 2.0);
        assert_eq!((result.t1, result.t2), (0, 0));
    }

    #[test]
    fn absent_or_unpositioned_parents_skip_the_family() {
        let affected = affected_code(2.0);
        let record = trio_record("0/1", "0/1", "0/1");

        let no_father = Pedigree::from_iter([Family {
            id      : "FAM1".to_string(),
            father  : None,
            mother  : Some(individual("mother", 1.0)),
            children: vec![individual("child", 2.0)],
        }]);
        let result = test_variant(&record, &no_father, &trio_index(), &*affected, None);
        assert_eq!((result.t1, result.t2), (0, 0));

        let stranger = Pedigree::from_iter([Family {
            id      : "FAM1".to_string(),
            father  : Some(individual("somebody_else", 1.0)),
            mother  : Some(individual("mother", 1.0)),
            children: vec![individual("child", 2.0)],
        }]);
        let result = test_variant(&record, &stranger, &trio_index(), &*affected, None);
        assert_eq!((result.t1, result.t2), (0, 0));
    }

    #[test]
    fn sample_lookup_is_case_insensitive() {
        let affected = affected_code(2.0);
        let pedigree = Pedigree::from_iter([Family {
            id      : "FAM1".to_string(),
            father  : Some(individual("FATHER", 1.0)),
            mother  : Some(individual("Mother", 1.0)),
            children: vec![individual("Child", 2.0)],
        }]);
        let result = test_variant(
            &trio_record("0/1", "0/1", "0/1"), &pedigree, &trio_index(), &*affected, None,
        );
        assert_eq!((result.t1, result.t2), (1, 1));
    }

    #[test]
    fn configurable_affected_coding() {
        let affected = affected_code(1.0);
        let result = test_variant(
            &trio_record("1/1", "0/1", "1/1"),
            &trio_pedigree(1.0),
            &trio_index(),
            &*affected,
            None,
        );
        assert_eq!((result.t1, result.t2), (0, 1));
    }

    #[test]
    fn permutation_swaps_transmissions() {
        let affected = affected_code(2.0);
        let always_flip: crate::config::PermuteCall = std::sync::Arc::new(|_: &Family| true);
        let result = test_variant(
            &trio_record("1/1", "0/1", "1/1"),
            &trio_pedigree(2.0),
            &trio_index(),
            &*affected,
            Some(&*always_flip),
        );
        // Without the flip this counts (0, 1).
        assert_eq!((result.t1, result.t2), (1, 0));
    }

    #[test]
    fn two_affected_children_accumulate() {
        let affected = affected_code(2.0);
        let pedigree = Pedigree::from_iter([Family {
            id      : "FAM1".to_string(),
            father  : Some(individual("father", 1.0)),
            mother  : Some(individual("mother", 1.0)),
            children: vec![individual("kid1", 2.0), individual("kid2", 2.0)],
        }]);
        let index = SampleIndex::from_names(["father", "mother", "kid1", "kid2"]).unwrap();
        let record = VariantRecord::new("1", 5, "A", "G", &["0/1", "0/0", "0/1", "0/0"]);
        let result = test_variant(&record, &pedigree, &index, &*affected, None);
        // kid1: alt from the het father; kid2: ref from the het father.
        assert_eq!((result.t1, result.t2), (1, 1));
    }
}
