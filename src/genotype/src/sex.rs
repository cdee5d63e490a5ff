use std::str::FromStr;

use thiserror::Error;

/// Sex of an individual, as coded in pedigree files (1 = male, 2 = female,
/// anything else = unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

#[derive(Debug, Error)]
#[error("Invalid sex field '{0}'")]
pub struct ParseSexError(String);

impl FromStr for Sex {
    type Err = ParseSexError;

    fn from_str(field: &str) -> Result<Self, Self::Err> {
        match field {
            "1" => Ok(Self::Male),
            "2" => Ok(Self::Female),
            "0" | "-9" | "other" => Ok(Self::Unknown),
            _   => Err(ParseSexError(field.to_string())),
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Male    => write!(f, "male"),
            Self::Female  => write!(f, "female"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
