use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::domain::TaxId;
use crate::error::ProteomeError;

pub const TAXA_FILE: &str = "taxa.tsv";
pub const MERGED_FILE: &str = "merged.tsv";

pub trait TaxonomySource {
    fn descendants(&self, taxid: TaxId) -> Result<Vec<TaxId>, ProteomeError>;
    fn lineage_names(&self, taxid: TaxId) -> Result<Vec<String>, ProteomeError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonNode {
    pub parent: TaxId,
    pub rank: String,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct TaxonomyDb {
    nodes: HashMap<TaxId, TaxonNode>,
    children: HashMap<TaxId, Vec<TaxId>>,
    merged: HashMap<TaxId, TaxId>,
}

impl TaxonomyDb {
    pub fn from_nodes(
        nodes: impl IntoIterator<Item = (TaxId, TaxonNode)>,
        merged: impl IntoIterator<Item = (TaxId, TaxId)>,
    ) -> Self {
        let nodes: HashMap<TaxId, TaxonNode> = nodes.into_iter().collect();
        let mut children: HashMap<TaxId, Vec<TaxId>> = HashMap::new();
        for (taxid, node) in &nodes {
            if node.parent != *taxid {
                children.entry(node.parent).or_default().push(*taxid);
            }
        }
        for list in children.values_mut() {
            list.sort_unstable();
        }
        Self {
            nodes,
            children,
            merged: merged.into_iter().collect(),
        }
    }

    pub fn from_dump<N: BufRead, M: BufRead, G: BufRead>(
        nodes: N,
        names: M,
        merged: Option<G>,
    ) -> Result<Self, ProteomeError> {
        let mut scientific = HashMap::new();
        for line in names.lines() {
            let line = line.map_err(|err| ProteomeError::TaxonomyParse(err.to_string()))?;
            let fields = split_dump_line(&line);
            if fields.len() < 4 || fields[3] != "scientific name" {
                continue;
            }
            scientific.insert(parse_taxid(fields[0])?, fields[1].to_string());
        }

        let mut parsed = Vec::new();
        for line in nodes.lines() {
            let line = line.map_err(|err| ProteomeError::TaxonomyParse(err.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let fields = split_dump_line(&line);
            if fields.len() < 3 {
                return Err(ProteomeError::TaxonomyParse(format!(
                    "short nodes.dmp line: {line}"
                )));
            }
            let taxid = parse_taxid(fields[0])?;
            let parent = parse_taxid(fields[1])?;
            let name = scientific.remove(&taxid).unwrap_or_default();
            parsed.push((
                taxid,
                TaxonNode {
                    parent,
                    rank: fields[2].to_string(),
                    name,
                },
            ));
        }

        let mut merged_ids = Vec::new();
        if let Some(merged) = merged {
            for line in merged.lines() {
                let line = line.map_err(|err| ProteomeError::TaxonomyParse(err.to_string()))?;
                let fields = split_dump_line(&line);
                if fields.len() < 2 {
                    continue;
                }
                merged_ids.push((parse_taxid(fields[0])?, parse_taxid(fields[1])?));
            }
        }

        Ok(Self::from_nodes(parsed, merged_ids))
    }

    pub fn load(dir: &Path) -> Result<Self, ProteomeError> {
        let taxa_path = dir.join(TAXA_FILE);
        if !taxa_path.exists() {
            return Err(ProteomeError::TaxonomyMissing(dir.to_path_buf()));
        }
        let taxa = File::open(&taxa_path)
            .map_err(|err| ProteomeError::Filesystem(format!("open {}: {err}", taxa_path.display())))?;

        let mut nodes = Vec::new();
        for line in BufReader::new(taxa).lines() {
            let line = line.map_err(|err| ProteomeError::TaxonomyParse(err.to_string()))?;
            let mut fields = line.splitn(4, '\t');
            let (Some(taxid), Some(parent), Some(rank), Some(name)) =
                (fields.next(), fields.next(), fields.next(), fields.next())
            else {
                return Err(ProteomeError::TaxonomyParse(format!(
                    "short {TAXA_FILE} line: {line}"
                )));
            };
            nodes.push((
                parse_taxid(taxid)?,
                TaxonNode {
                    parent: parse_taxid(parent)?,
                    rank: rank.to_string(),
                    name: name.to_string(),
                },
            ));
        }

        let mut merged = Vec::new();
        let merged_path = dir.join(MERGED_FILE);
        if merged_path.exists() {
            let file = File::open(&merged_path).map_err(|err| {
                ProteomeError::Filesystem(format!("open {}: {err}", merged_path.display()))
            })?;
            for line in BufReader::new(file).lines() {
                let line = line.map_err(|err| ProteomeError::TaxonomyParse(err.to_string()))?;
                if let Some((old, new)) = line.split_once('\t') {
                    merged.push((parse_taxid(old)?, parse_taxid(new)?));
                }
            }
        }

        Ok(Self::from_nodes(nodes, merged))
    }

    pub fn write_snapshot<W: Write, V: Write>(
        &self,
        taxa: &mut W,
        merged: &mut V,
    ) -> std::io::Result<()> {
        let mut ids = self.nodes.keys().copied().collect::<Vec<_>>();
        ids.sort_unstable();
        for taxid in ids {
            let node = &self.nodes[&taxid];
            writeln!(taxa, "{taxid}\t{}\t{}\t{}", node.parent, node.rank, node.name)?;
        }
        let mut pairs = self.merged.iter().collect::<Vec<_>>();
        pairs.sort_unstable();
        for (old, new) in pairs {
            writeln!(merged, "{old}\t{new}")?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn merged_len(&self) -> usize {
        self.merged.len()
    }

    pub fn node(&self, taxid: TaxId) -> Option<&TaxonNode> {
        self.nodes.get(&taxid)
    }

    pub fn resolve(&self, taxid: TaxId) -> Result<TaxId, ProteomeError> {
        if self.nodes.contains_key(&taxid) {
            return Ok(taxid);
        }
        match self.merged.get(&taxid) {
            Some(current) if self.nodes.contains_key(current) => Ok(*current),
            _ => Err(ProteomeError::UnknownTaxId(taxid)),
        }
    }

    pub fn lineage(&self, taxid: TaxId) -> Result<Vec<TaxId>, ProteomeError> {
        let mut current = self.resolve(taxid)?;
        let mut path = vec![current];
        while let Some(node) = self.nodes.get(&current) {
            if node.parent == current || path.len() > self.nodes.len() {
                break;
            }
            current = node.parent;
            path.push(current);
        }
        path.reverse();
        Ok(path)
    }
}

impl TaxonomySource for TaxonomyDb {
    fn descendants(&self, taxid: TaxId) -> Result<Vec<TaxId>, ProteomeError> {
        let root = self.resolve(taxid)?;
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(children) = self.children.get(&current) {
                stack.extend(children.iter().rev());
            }
        }
        Ok(out)
    }

    fn lineage_names(&self, taxid: TaxId) -> Result<Vec<String>, ProteomeError> {
        Ok(self
            .lineage(taxid)?
            .into_iter()
            .filter_map(|id| self.nodes.get(&id).map(|node| node.name.clone()))
            .collect())
    }
}

fn split_dump_line(line: &str) -> Vec<&str> {
    line.trim_end_matches(['\n', '\r'])
        .trim_end_matches("\t|")
        .split("\t|\t")
        .collect()
}

fn parse_taxid(value: &str) -> Result<TaxId, ProteomeError> {
    value
        .parse()
        .map_err(|_| ProteomeError::TaxonomyParse(format!("bad taxid field: {value:?}")))
}
