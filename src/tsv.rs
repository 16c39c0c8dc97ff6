use std::io::{BufRead, Write};

use crate::error::ProteomeError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}

pub fn read_table<R: BufRead>(reader: R) -> Result<Table, ProteomeError> {
    let mut lines = reader.lines();
    let header = loop {
        match lines.next() {
            Some(line) => {
                let line = line.map_err(|err| ProteomeError::Filesystem(err.to_string()))?;
                if !line.trim().is_empty() {
                    break line;
                }
            }
            None => return Ok(Table::default()),
        }
    };
    let columns = split_row(&header);

    let mut rows = Vec::new();
    for line in lines {
        let line = line.map_err(|err| ProteomeError::Filesystem(err.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let mut row = split_row(&line);
        if row.len() < columns.len() {
            row.resize(columns.len(), String::new());
        }
        rows.push(row);
    }
    Ok(Table { columns, rows })
}

pub fn write_row<W: Write, S: AsRef<str>>(writer: &mut W, fields: &[S]) -> std::io::Result<()> {
    let line = fields
        .iter()
        .map(|field| quote_field(field.as_ref()))
        .collect::<Vec<_>>()
        .join("\t");
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")
}

fn quote_field(field: &str) -> String {
    if field.contains(['\t', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn split_row(line: &str) -> Vec<String> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    let mut at_field_start = true;

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
            continue;
        }
        match ch {
            '\t' => {
                fields.push(std::mem::take(&mut current));
                at_field_start = true;
                continue;
            }
            '"' if at_field_start => in_quotes = true,
            other => current.push(other),
        }
        at_field_start = false;
    }
    fields.push(current);
    fields
}
