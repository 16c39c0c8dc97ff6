use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::error::ProteomeError;

pub fn extract_members(
    zip_path: &Path,
    target_dir: &Path,
    members: &[&str],
) -> Result<Vec<PathBuf>, ProteomeError> {
    let file = fs::File::open(zip_path).map_err(|err| {
        ProteomeError::Filesystem(format!("open zip {}: {err}", zip_path.display()))
    })?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| ProteomeError::TaxonomyParse(err.to_string()))?;
    fs::create_dir_all(target_dir).map_err(|err| ProteomeError::Filesystem(err.to_string()))?;

    let mut extracted = Vec::with_capacity(members.len());
    for member in members {
        let mut entry = archive.by_name(member).map_err(|_| {
            ProteomeError::TaxonomyParse(format!(
                "{member} missing from {}",
                zip_path.display()
            ))
        })?;
        let Some(name) = entry.enclosed_name() else {
            return Err(ProteomeError::Filesystem(
                "zip entry path traversal detected".to_string(),
            ));
        };
        let entry_path = target_dir.join(name);
        let mut outfile = fs::File::create(&entry_path)
            .map_err(|err| ProteomeError::Filesystem(err.to_string()))?;
        io::copy(&mut entry, &mut outfile)
            .map_err(|err| ProteomeError::Filesystem(err.to_string()))?;
        extracted.push(entry_path);
    }
    Ok(extracted)
}

pub fn remove_if_exists(path: &Path) -> Result<bool, ProteomeError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(ProteomeError::Filesystem(format!(
            "remove {}: {err}",
            path.display()
        ))),
    }
}

pub fn ensure_parent(path: &Path) -> Result<(), ProteomeError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|err| ProteomeError::Filesystem(format!("create {}: {err}", parent.display()))),
        _ => Ok(()),
    }
}

pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.exists().then(|| candidate.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    for path in std::env::split_paths(&path_var) {
        let exe = path.join(format!("{name}.exe"));
        if exe.exists() {
            return Some(exe);
        }
        let plain = path.join(name);
        if plain.exists() {
            return Some(plain);
        }
    }
    None
}
