use serde::Serialize;

use crate::domain::{LineageGroup, TaxId};
use crate::error::ProteomeError;
use crate::taxonomy::{TaxonomyDb, TaxonomySource};

const PROTOZOA_CLADES: [&str; 7] = [
    "Cryptophyceae",
    "Apusozoa",
    "Amoebozoa",
    "Haptista",
    "Metamonada",
    "Discoba",
    "Sar",
];

pub fn classify_lineage<S: AsRef<str>>(names: &[S]) -> LineageGroup {
    let has = |marker: &str| names.iter().any(|name| name.as_ref() == marker);

    if has("Archaea") {
        LineageGroup::Archaea
    } else if has("Bacteria") {
        LineageGroup::Bacteria
    } else if has("Fungi") {
        LineageGroup::Fungi
    } else if has("Viruses") {
        LineageGroup::Viral
    } else if has("metagenomes") {
        LineageGroup::Metagenomes
    } else if has("Viridiplantae") || has("Rhodophyta") {
        LineageGroup::Plant
    } else if PROTOZOA_CLADES.into_iter().any(|clade| has(clade)) {
        LineageGroup::Protozoa
    } else if has("Opisthokonta") {
        if !has("Vertebrata") {
            LineageGroup::Invertebrate
        } else if has("Mammalia") {
            LineageGroup::VertebrateMammalian
        } else {
            LineageGroup::VertebrateOther
        }
    } else {
        LineageGroup::All
    }
}

pub fn classify<T: TaxonomySource + ?Sized>(
    taxonomy: &T,
    taxid: TaxId,
) -> Result<LineageGroup, ProteomeError> {
    let names = taxonomy.lineage_names(taxid)?;
    Ok(classify_lineage(names.as_slice()))
}

#[derive(Debug, Clone, Serialize)]
pub struct LineageReport {
    pub taxid: TaxId,
    pub resolved: TaxId,
    pub group: LineageGroup,
    pub lineage: Vec<LineageStep>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineageStep {
    pub taxid: TaxId,
    pub rank: String,
    pub name: String,
}

pub fn lineage_report(db: &TaxonomyDb, taxid: TaxId) -> Result<LineageReport, ProteomeError> {
    let resolved = db.resolve(taxid)?;
    let lineage = db
        .lineage(resolved)?
        .into_iter()
        .filter_map(|id| {
            db.node(id).map(|node| LineageStep {
                taxid: id,
                rank: node.rank.clone(),
                name: node.name.clone(),
            })
        })
        .collect::<Vec<_>>();
    let names = lineage.iter().map(|step| step.name.as_str()).collect::<Vec<_>>();
    Ok(LineageReport {
        taxid,
        resolved,
        group: classify_lineage(names.as_slice()),
        lineage,
    })
}
