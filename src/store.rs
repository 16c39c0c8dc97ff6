use std::fs;
use std::io::{BufReader, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tempfile::{Builder, NamedTempFile};

use crate::error::ProteomeError;
use crate::fs_util;
use crate::ncbi::TaxonomyClient;
use crate::taxonomy::{MERGED_FILE, TAXA_FILE, TaxonomyDb};

pub const ARCHIVE_FILE: &str = "taxdmp.zip";
pub const SNAPSHOT_FILE: &str = "snapshot.json";
const DUMP_MEMBERS: [&str; 3] = ["nodes.dmp", "names.dmp", "merged.dmp"];

#[derive(Debug, Clone)]
pub struct TaxonomyStore {
    dir: Utf8PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub source: String,
    pub built_at: String,
    pub tool: String,
    pub taxa: usize,
    pub merged: usize,
}

impl TaxonomyStore {
    pub fn new() -> Result<Self, ProteomeError> {
        let dir = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.home_dir()
                        .join(".cache")
                        .join("fetch-proteome")
                        .join("taxonomy"),
                )
                .ok()
            })
            .ok_or_else(|| {
                ProteomeError::Filesystem("unable to resolve cache directory".to_string())
            })?;
        Ok(Self { dir })
    }

    pub fn new_with_dir(dir: Utf8PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    pub fn archive_path(&self) -> Utf8PathBuf {
        self.dir.join(ARCHIVE_FILE)
    }

    pub fn metadata_path(&self) -> Utf8PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    pub fn exists(&self) -> bool {
        self.dir.join(TAXA_FILE).as_std_path().exists()
            && self.metadata_path().as_std_path().exists()
    }

    pub fn ensure<C: TaxonomyClient>(&self, client: &C, update: bool) -> Result<bool, ProteomeError> {
        if self.exists() && !update {
            return Ok(false);
        }
        fs::create_dir_all(self.dir.as_std_path())
            .map_err(|err| ProteomeError::Filesystem(err.to_string()))?;

        let archive = self.archive_path();
        tracing::info!(source = client.source(), "downloading taxonomy dump");
        client.download_dump(archive.as_std_path())?;
        self.ingest_archive(&archive, client.source())?;
        Ok(true)
    }

    pub fn ingest_archive(&self, archive: &Utf8Path, source: &str) -> Result<SnapshotMetadata, ProteomeError> {
        let temp_dir = Builder::new()
            .prefix("fetch-proteome-taxdump")
            .tempdir_in(self.dir.as_std_path())
            .map_err(|err| ProteomeError::Filesystem(err.to_string()))?;
        fs_util::extract_members(archive.as_std_path(), temp_dir.path(), &DUMP_MEMBERS)?;

        let open = |name: &str| {
            let path = temp_dir.path().join(name);
            fs::File::open(&path)
                .map(BufReader::new)
                .map_err(|err| ProteomeError::Filesystem(format!("open {}: {err}", path.display())))
        };
        let db = TaxonomyDb::from_dump(
            open("nodes.dmp")?,
            open("names.dmp")?,
            Some(open("merged.dmp")?),
        )?;

        let mut taxa = self.temp_file()?;
        let mut merged = self.temp_file()?;
        {
            let mut taxa_writer = BufWriter::new(taxa.as_file_mut());
            let mut merged_writer = BufWriter::new(merged.as_file_mut());
            db.write_snapshot(&mut taxa_writer, &mut merged_writer)
                .and_then(|_| taxa_writer.flush())
                .and_then(|_| merged_writer.flush())
                .map_err(|err| ProteomeError::Filesystem(err.to_string()))?;
        }
        persist(taxa, &self.dir.join(TAXA_FILE))?;
        persist(merged, &self.dir.join(MERGED_FILE))?;

        let metadata = SnapshotMetadata {
            source: source.to_string(),
            built_at: chrono::Utc::now().to_rfc3339(),
            tool: format!("fetch-proteome/{}", env!("CARGO_PKG_VERSION")),
            taxa: db.len(),
            merged: db.merged_len(),
        };
        Self::write_metadata(&self.metadata_path(), &metadata)?;
        fs_util::remove_if_exists(archive.as_std_path())?;
        tracing::info!(taxa = metadata.taxa, dir = %self.dir, "taxonomy snapshot built");
        Ok(metadata)
    }

    pub fn load(&self) -> Result<TaxonomyDb, ProteomeError> {
        if !self.exists() {
            return Err(ProteomeError::TaxonomyMissing(self.dir.clone().into_std_path_buf()));
        }
        TaxonomyDb::load(self.dir.as_std_path())
    }

    pub fn read_metadata(&self) -> Result<SnapshotMetadata, ProteomeError> {
        let path = self.metadata_path();
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| ProteomeError::Filesystem(format!("read {path}: {err}")))?;
        serde_json::from_str(&content).map_err(|err| ProteomeError::TaxonomyParse(err.to_string()))
    }

    pub fn write_metadata(path: &Utf8Path, metadata: &SnapshotMetadata) -> Result<(), ProteomeError> {
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(metadata)
            .map_err(|err| ProteomeError::Filesystem(err.to_string()))?;
        fs::write(tmp_path.as_std_path(), &content)
            .map_err(|err| ProteomeError::Filesystem(err.to_string()))?;
        fs::rename(tmp_path.as_std_path(), path.as_std_path())
            .map_err(|err| ProteomeError::Filesystem(err.to_string()))?;
        Ok(())
    }

    fn temp_file(&self) -> Result<NamedTempFile, ProteomeError> {
        Builder::new()
            .prefix("fetch-proteome-snapshot")
            .tempfile_in(self.dir.as_std_path())
            .map_err(|err| ProteomeError::Filesystem(err.to_string()))
    }
}

fn persist(temp: NamedTempFile, dest: &Utf8Path) -> Result<(), ProteomeError> {
    temp.persist(dest.as_std_path())
        .map_err(|err| ProteomeError::Filesystem(err.to_string()))?;
    Ok(())
}
