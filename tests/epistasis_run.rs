//! End-to-end epistasis searches over small on-disk cohorts.

mod common;

use anyhow::Result;
use common::{write_ped, write_vcf};
use epistasis::{CaseControlDataset, EpistasisConfig, Evaluator};

/// 8 affected samples all carrying (1/1, 1/1) over two SNPs; 8 unaffected
/// all (0/0, 0/0). A perfectly separating pair.
fn separated_cohort(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let samples: Vec<String> = (0..8).map(|i| format!("case{i}"))
        .chain((0..8).map(|i| format!("ctrl{i}")))
        .collect();
    let sample_refs: Vec<&str> = samples.iter().map(String::as_str).collect();

    let case_cells: Vec<&str> = std::iter::repeat("1/1").take(8)
        .chain(std::iter::repeat("0/0").take(8))
        .collect();
    let rows: Vec<(&str, u64, &str, &str, &[&str])> = vec![
        ("1", 100, "A", "C", &case_cells),
        ("1", 200, "G", "T", &case_cells),
    ];
    let vcf = write_vcf(dir, "cohort.vcf", &sample_refs, &rows);

    let mut ped_rows: Vec<[String; 6]> = Vec::new();
    for (i, sample) in samples.iter().enumerate() {
        let phenotype = if i < 8 { "2" } else { "1" };
        // Founder-only records do not build families, so give every sample
        // a synthetic parent to carry its phenotype into the table.
        ped_rows.push([format!("FAM{i}"), format!("anc{i}"), "0".into(), "0".into(), "1".into(), "1".into()]);
        ped_rows.push([format!("FAM{i}"), sample.clone(), format!("anc{i}"), "0".into(), "1".into(), phenotype.into()]);
    }
    let ped_refs: Vec<[&str; 6]> = ped_rows.iter()
        .map(|row| [row[0].as_str(), row[1].as_str(), row[2].as_str(), row[3].as_str(), row[4].as_str(), row[5].as_str()])
        .collect();
    let ped = write_ped(dir, "cohort.ped", &ped_refs);
    (vcf, ped)
}

#[test]
fn perfectly_separating_pair_tops_the_ranking() -> Result<()> {
    let tmpdir = tempfile::tempdir()?;
    let (vcf, ped) = separated_cohort(tmpdir.path());

    let affected = tdt::affected_code(2.0);
    let dataset = CaseControlDataset::from_files(&vcf, &ped, &*affected, 1)?;
    assert_eq!(dataset.num_affected(), 8);
    assert_eq!(dataset.num_unaffected(), 8);

    let mut config = EpistasisConfig::new(2);
    config.num_folds = 1;
    config.evaluator = Evaluator::BalancedAccuracy;
    let ranking = epistasis::run(&dataset, &config)?;

    let head = ranking.head().expect("the separating pair must rank");
    assert_eq!(head.snps(), &[0, 1]);
    assert_eq!(head.accuracy(), 1.0);
    assert_eq!(head.num_cells(), 1);
    assert_eq!(head.cells().next().unwrap(), &[2, 2]);
    Ok(())
}

#[test]
fn cross_validated_search_stays_perfect_on_separated_data() -> Result<()> {
    let tmpdir = tempfile::tempdir()?;
    let (vcf, ped) = separated_cohort(tmpdir.path());

    let affected = tdt::affected_code(2.0);
    let dataset = CaseControlDataset::from_files(&vcf, &ped, &*affected, 1)?;

    let mut config = EpistasisConfig::new(2);
    config.num_folds = 4;
    config.max_ranking_size = 16;
    let ranking = epistasis::run(&dataset, &config)?;

    // One insertion per fold for the separating pair; every score is 1.0.
    assert!(ranking.len() >= 4);
    for combination in ranking.iter().take(4) {
        assert_eq!(combination.accuracy(), 1.0);
    }
    Ok(())
}
