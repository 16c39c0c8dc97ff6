use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use crate::classify;
use crate::domain::{LineageGroup, TaxId};
use crate::error::ProteomeError;
use crate::taxonomy::TaxonomySource;
use crate::tsv;

pub const TAXID_COLUMN: &str = "TaxId";
pub const GROUP_COLUMN: &str = "NCBIGroups";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonRow {
    pub taxid: TaxId,
    pub group: Option<LineageGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonEntry {
    pub taxid: TaxId,
    pub group: LineageGroup,
}

pub fn read_taxon_table(path: &Path) -> Result<Vec<TaxonRow>, ProteomeError> {
    let file = File::open(path)
        .map_err(|err| ProteomeError::InputTable(format!("open {}: {err}", path.display())))?;
    parse_taxon_table(BufReader::new(file))
}

pub fn parse_taxon_table<R: std::io::BufRead>(reader: R) -> Result<Vec<TaxonRow>, ProteomeError> {
    let table = tsv::read_table(reader)?;
    let taxid_idx = table
        .column_index(TAXID_COLUMN)
        .ok_or_else(|| ProteomeError::InputTable(format!("missing {TAXID_COLUMN} column")))?;
    let group_idx = table.column_index(GROUP_COLUMN);

    table
        .rows
        .iter()
        .map(|row| {
            let taxid: TaxId = row[taxid_idx].parse()?;
            let group = match group_idx.map(|idx| row[idx].trim()) {
                None => None,
                Some(cell) if is_missing(cell) => None,
                Some(cell) => Some(cell.parse::<LineageGroup>()?),
            };
            Ok(TaxonRow { taxid, group })
        })
        .collect::<Result<Vec<_>, ProteomeError>>()
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || matches!(cell, "nan" | "NaN" | "NA" | "None")
}

pub fn resolve_group<T: TaxonomySource + ?Sized>(
    row: &TaxonRow,
    default_group: LineageGroup,
    taxonomy: &T,
) -> Result<LineageGroup, ProteomeError> {
    match row.group {
        Some(group) if !group.is_wildcard() => Ok(group),
        _ if !default_group.is_wildcard() => Ok(default_group),
        _ => classify::classify(taxonomy, row.taxid),
    }
}

pub fn expand_taxa<T: TaxonomySource + ?Sized>(
    rows: &[TaxonRow],
    default_group: LineageGroup,
    taxonomy: &T,
) -> Result<Vec<TaxonEntry>, ProteomeError> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for row in rows {
        let descendants = match taxonomy.descendants(row.taxid) {
            Ok(ids) => ids,
            Err(ProteomeError::UnknownTaxId(taxid)) => {
                tracing::debug!(%taxid, "skipping taxid absent from taxonomy");
                continue;
            }
            Err(err) => return Err(err),
        };
        let group = resolve_group(row, default_group, taxonomy)?;
        entries.extend(
            descendants
                .into_iter()
                .filter(|taxid| seen.insert(*taxid))
                .map(|taxid| TaxonEntry { taxid, group }),
        );
    }

    Ok(entries)
}

pub fn write_taxon_table<W: Write>(writer: &mut W, entries: &[TaxonEntry]) -> std::io::Result<()> {
    tsv::write_row(writer, &[TAXID_COLUMN, GROUP_COLUMN])?;
    for entry in entries {
        tsv::write_row(writer, &[entry.taxid.to_string(), entry.group.to_string()])?;
    }
    Ok(())
}

pub fn group_by_lineage(entries: &[TaxonEntry]) -> BTreeMap<LineageGroup, Vec<TaxId>> {
    let mut groups: BTreeMap<LineageGroup, Vec<TaxId>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.group).or_default().push(entry.taxid);
    }
    groups
}
