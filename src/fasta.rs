use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::ProteomeError;

const LINE_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub id: String,
    pub description: String,
    pub seq: String,
}

impl FastaRecord {
    pub fn title(&self) -> String {
        let first = self.description.split_whitespace().next();
        if self.description.is_empty() {
            self.id.clone()
        } else if first == Some(self.id.as_str()) {
            self.description.clone()
        } else {
            format!("{} {}", self.id, self.description)
        }
    }
}

pub struct FastaReader<R: BufRead> {
    reader: R,
    line_buf: String,
    pending_title: Option<String>,
    started: bool,
}

pub fn open_gz(path: &Path) -> Result<BufReader<MultiGzDecoder<File>>, ProteomeError> {
    let file = File::open(path)
        .map_err(|err| ProteomeError::Filesystem(format!("open {}: {err}", path.display())))?;
    Ok(BufReader::with_capacity(1024 * 1024, MultiGzDecoder::new(file)))
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buf: String::with_capacity(256),
            pending_title: None,
            started: false,
        }
    }

    fn read_line(&mut self) -> std::io::Result<bool> {
        self.line_buf.clear();
        Ok(self.reader.read_line(&mut self.line_buf)? > 0)
    }

    pub fn read_next(&mut self) -> std::io::Result<Option<FastaRecord>> {
        if !self.started {
            self.started = true;
            while self.read_line()? {
                if let Some(title) = self.line_buf.strip_prefix('>') {
                    self.pending_title = Some(title.trim_end().to_string());
                    break;
                }
            }
        }

        let Some(description) = self.pending_title.take() else {
            return Ok(None);
        };

        let mut seq = String::new();
        while self.read_line()? {
            if let Some(title) = self.line_buf.strip_prefix('>') {
                self.pending_title = Some(title.trim_end().to_string());
                break;
            }
            seq.extend(
                self.line_buf
                    .chars()
                    .filter(|ch| !matches!(ch, ' ' | '\r' | '\n')),
            );
        }

        let id = description
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(Some(FastaRecord {
            id,
            description,
            seq,
        }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = std::io::Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

pub fn write_record<W: Write>(writer: &mut W, record: &FastaRecord) -> std::io::Result<()> {
    writeln!(writer, ">{}", record.title())?;
    let bytes = record.seq.as_bytes();
    for chunk in bytes.chunks(LINE_WIDTH) {
        writer.write_all(chunk)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
