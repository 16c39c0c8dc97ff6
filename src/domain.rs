use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ProteomeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxId(u32);

impl TaxId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TaxId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl FromStr for TaxId {
    type Err = ProteomeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(ProteomeError::InvalidTaxId(value.to_string()));
        }
        trimmed
            .parse::<u32>()
            .map(Self)
            .map_err(|_| ProteomeError::InvalidTaxId(value.to_string()))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum LineageGroup {
    Archaea,
    Bacteria,
    Fungi,
    Viral,
    Metagenomes,
    Plant,
    #[serde(rename = "protazoa", alias = "protozoa")]
    #[value(name = "protazoa", alias = "protozoa")]
    Protozoa,
    VertebrateMammalian,
    VertebrateOther,
    Invertebrate,
    All,
}

impl LineageGroup {
    pub const ALL_GROUPS: [LineageGroup; 11] = [
        LineageGroup::Archaea,
        LineageGroup::Bacteria,
        LineageGroup::Fungi,
        LineageGroup::Viral,
        LineageGroup::Metagenomes,
        LineageGroup::Plant,
        LineageGroup::Protozoa,
        LineageGroup::VertebrateMammalian,
        LineageGroup::VertebrateOther,
        LineageGroup::Invertebrate,
        LineageGroup::All,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LineageGroup::Archaea => "archaea",
            LineageGroup::Bacteria => "bacteria",
            LineageGroup::Fungi => "fungi",
            LineageGroup::Viral => "viral",
            LineageGroup::Metagenomes => "metagenomes",
            LineageGroup::Plant => "plant",
            LineageGroup::Protozoa => "protazoa",
            LineageGroup::VertebrateMammalian => "vertebrate_mammalian",
            LineageGroup::VertebrateOther => "vertebrate_other",
            LineageGroup::Invertebrate => "invertebrate",
            LineageGroup::All => "all",
        }
    }

    pub fn download_name(&self) -> &'static str {
        match self {
            LineageGroup::Protozoa => "protozoa",
            other => other.label(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, LineageGroup::All)
    }
}

impl fmt::Display for LineageGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for LineageGroup {
    type Err = ProteomeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        if normalized == "protozoa" {
            return Ok(LineageGroup::Protozoa);
        }
        Self::ALL_GROUPS
            .into_iter()
            .find(|group| group.label() == normalized)
            .ok_or_else(|| ProteomeError::InvalidGroup(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssemblyAccession(String);

impl AssemblyAccession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssemblyAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AssemblyAccession {
    type Err = ProteomeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        let is_valid = normalized.starts_with("GCF_") || normalized.starts_with("GCA_");
        let has_numeric = normalized
            .split('.')
            .next()
            .map(|prefix| prefix.trim_start_matches("GCF_").trim_start_matches("GCA_"))
            .map(|rest| !rest.is_empty() && rest.chars().all(|ch| ch.is_ascii_digit()))
            .unwrap_or(false);
        if !is_valid || !has_numeric {
            return Err(ProteomeError::InvalidAssemblyAccession(value.to_string()));
        }
        Ok(Self(normalized))
    }
}
