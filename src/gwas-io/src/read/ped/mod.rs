use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use ahash::AHashMap;
use anyhow::{Context, Result};
use log::{debug, warn};

use genotype::Sex;

mod error;
pub use error::PedError;

/// Number of mandatory columns in a pedigree line:
/// family, individual, father, mother, sex, phenotype.
const PED_NUM_FIELDS: usize = 6;

/// A genotyped study participant, as declared in the pedigree file.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    pub id       : String,
    pub sex      : Sex,
    pub phenotype: f64,
}

/// A nuclear family: one father slot, one mother slot (either may be
/// absent), and the children in file order.
#[derive(Debug, Clone, Default)]
pub struct Family {
    pub id      : String,
    pub father  : Option<Individual>,
    pub mother  : Option<Individual>,
    pub children: Vec<Individual>,
}

impl Family {
    fn new(id: &str) -> Self {
        Self { id: id.to_string(), ..Default::default() }
    }
}

/// The family table of a study, keyed by family identifier.
///
/// Built from a whitespace-separated six-column PED file. A parent
/// identifier of `0` marks an absent slot; a referenced parent whose own
/// record is missing from the file is likewise treated as absent.
/// Individuals that are neither a child nor a referenced parent do not
/// appear in any family.
#[derive(Debug, Default)]
pub struct Pedigree {
    families: AHashMap<String, Family>,
}

/// One raw pedigree line, before family linkage.
struct PedRecord {
    family   : String,
    id       : String,
    father   : Option<String>,
    mother   : Option<String>,
    sex      : Sex,
    phenotype: f64,
}

impl PedRecord {
    fn individual(&self) -> Individual {
        Individual { id: self.id.clone(), sex: self.sex, phenotype: self.phenotype }
    }
}

impl Pedigree {
    /// Read and link a pedigree file.
    ///
    /// Parsing is two-pass: every record is collected first, then children
    /// are attached and parent slots resolved, so record order within the
    /// file does not matter. Malformed lines are fatal: a half-read
    /// pedigree would silently bias every downstream family count.
    pub fn read(path: &Path) -> Result<Self> {
        let loc_msg = || format!("While reading pedigree file '{}'", path.display());
        let file = File::open(path).map_err(PedError::Open).with_context(loc_msg)?;

        let mut records = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(PedError::ReadLine).with_context(loc_msg)?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue
            }
            records.push(Self::parse_record(trimmed, number + 1).with_context(loc_msg)?);
        }

        let pedigree = Self::link(records);
        debug!("Pedigree parsed: {} families", pedigree.families.len());
        Ok(pedigree)
    }

    fn parse_record(line: &str, number: usize) -> Result<PedRecord, PedError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < PED_NUM_FIELDS {
            return Err(PedError::TruncatedLine { number, found: fields.len() })
        }
        let parent = |id: &str| (id != "0").then(|| id.to_string());
        let sex = fields[4].parse::<Sex>()
            .map_err(|_| PedError::InvalidField { number, field: "sex", value: fields[4].to_string() })?;
        let phenotype = fields[5].parse::<f64>()
            .map_err(|_| PedError::InvalidField { number, field: "phenotype", value: fields[5].to_string() })?;

        Ok(PedRecord {
            family: fields[0].to_string(),
            id    : fields[1].to_string(),
            father: parent(fields[2]),
            mother: parent(fields[3]),
            sex,
            phenotype,
        })
    }

    /// Attach children to their family and resolve parent slots.
    fn link(records: Vec<PedRecord>) -> Self {
        // Index records by (family, individual) for parent resolution.
        let by_id: AHashMap<(&str, &str), &PedRecord> = records.iter()
            .map(|record| ((record.family.as_str(), record.id.as_str()), record))
            .collect();

        let mut families: AHashMap<String, Family> = AHashMap::new();
        for record in &records {
            if record.father.is_none() && record.mother.is_none() {
                continue // Founder: only enters a family through a child's reference.
            }
            let family = families.entry(record.family.clone())
                .or_insert_with(|| Family::new(&record.family));
            family.children.push(record.individual());

            let mut fill_slot = |slot: &mut Option<Individual>, reference: &Option<String>, label: &str| {
                let Some(parent_id) = reference else { return };
                let parent = by_id.get(&(record.family.as_str(), parent_id.as_str()));
                match slot {
                    None => *slot = parent.map(|p| p.individual()),
                    Some(existing) if &existing.id != parent_id => {
                        warn!("Family {}: conflicting {label} references ('{}' vs '{parent_id}'); keeping the first",
                              record.family, existing.id);
                    }
                    Some(_) => (),
                }
            };
            // Borrow the two slots separately to keep the closure usable.
            let Family { father, mother, .. } = family;
            fill_slot(father, &record.father, "father");
            fill_slot(mother, &record.mother, "mother");
        }

        Self { families }
    }

    pub fn get(&self, family_id: &str) -> Option<&Family> {
        self.families.get(family_id)
    }

    pub fn insert(&mut self, family: Family) {
        self.families.insert(family.id.clone(), family);
    }

    /// Iterate over families, in arbitrary but stable order.
    pub fn families(&self) -> impl Iterator<Item = &Family> {
        self.families.values()
    }

    /// Every distinct individual of the table: parents first, then children,
    /// family by family.
    pub fn individuals(&self) -> impl Iterator<Item = &Individual> {
        self.families.values().flat_map(|family| {
            family.father.iter()
                .chain(family.mother.iter())
                .chain(family.children.iter())
        })
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

impl FromIterator<Family> for Pedigree {
    fn from_iter<I: IntoIterator<Item = Family>>(iter: I) -> Self {
        let mut pedigree = Self::default();
        for family in iter {
            pedigree.insert(family);
        }
        pedigree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TRIO: &str = "\
FAM1 father 0 0 1 1
FAM1 mother 0 0 2 1
FAM1 child  father mother 1 2
";

    fn read_ped(contents: &str) -> Result<Pedigree> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(contents.as_bytes())?;
        Pedigree::read(file.path())
    }

    #[test]
    fn parse_trio() -> Result<()> {
        let pedigree = read_ped(TRIO)?;
        assert_eq!(pedigree.len(), 1);

        let family = pedigree.get("FAM1").expect("missing family");
        assert_eq!(family.father.as_ref().map(|f| f.id.as_str()), Some("father"));
        assert_eq!(family.mother.as_ref().map(|m| m.id.as_str()), Some("mother"));
        assert_eq!(family.children.len(), 1);
        assert_eq!(family.children[0].id, "child");
        assert_eq!(family.children[0].phenotype, 2.0);
        Ok(())
    }

    #[test]
    fn absent_parent_slot() -> Result<()> {
        let pedigree = read_ped("FAM1 mother 0 0 2 1\nFAM1 child 0 mother 2 2\n")?;
        let family = pedigree.get("FAM1").unwrap();
        assert!(family.father.is_none());
        assert!(family.mother.is_some());
        Ok(())
    }

    #[test]
    fn referenced_parent_without_record_is_absent() -> Result<()> {
        let pedigree = read_ped("FAM1 child ghost 0 1 2\n")?;
        let family = pedigree.get("FAM1").unwrap();
        assert!(family.father.is_none());
        assert_eq!(family.children.len(), 1);
        Ok(())
    }

    #[test]
    fn children_keep_file_order() -> Result<()> {
        let contents = "\
FAM1 dad 0 0 1 1
FAM1 mum 0 0 2 1
FAM1 kid_b dad mum 1 2
FAM1 kid_a dad mum 2 1
";
        let pedigree = read_ped(contents)?;
        let ids: Vec<&str> = pedigree.get("FAM1").unwrap()
            .children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["kid_b", "kid_a"]);
        Ok(())
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() -> Result<()> {
        let pedigree = read_ped("# header\n\nFAM1 dad 0 0 1 1\nFAM1 kid dad 0 1 2\n")?;
        assert_eq!(pedigree.len(), 1);
        Ok(())
    }

    #[test]
    fn truncated_line_is_fatal() {
        assert!(read_ped("FAM1 child father mother 1\n").is_err());
    }

    #[test]
    fn invalid_phenotype_is_fatal() {
        assert!(read_ped("FAM1 child father mother 1 sick\n").is_err());
    }

    #[test]
    fn missing_file_is_fatal() {
        assert!(Pedigree::read(Path::new("/nonexistent/study.ped")).is_err());
    }
}
