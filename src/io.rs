//! Ambient I/O discipline: atomic writes, output-directory creation, and
//! the artifact-path check the CLI performs before touching anything else.
//! Every write goes through a temp file that is flushed and renamed into
//! place; the temp file is removed on any failure.

use crate::error::{DenoxError, DenoxResult};
use std::io::Write;
use std::path::{Path, PathBuf};

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> DenoxResult<()> {
    let tmp = tmp_path(path);
    let write_result = (|| -> std::io::Result<()> {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.flush()
    })();
    if let Err(source) = write_result {
        let _ = std::fs::remove_file(&tmp);
        return Err(DenoxError::AtomicWriteFailed { path: path.display().to_string(), reason: source.to_string() });
    }
    if let Err(source) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(DenoxError::AtomicWriteFailed { path: path.display().to_string(), reason: source.to_string() });
    }
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote file atomically");
    Ok(())
}

pub fn atomic_write_str(path: &Path, text: &str) -> DenoxResult<()> {
    atomic_write_bytes(path, text.as_bytes())
}

pub fn ensure_output_dir(name: &'static str, path: &Path, mkdir: bool) -> DenoxResult<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(DenoxError::OutputDirNotADirectory { name, path: path.display().to_string() }),
        Err(_) if mkdir => std::fs::create_dir_all(path)
            .map_err(|source| DenoxError::CreateDirFailed { path: path.display().to_string(), source }),
        Err(_) => Err(DenoxError::OutputDirMissing { name, path: path.display().to_string() }),
    }
}

pub fn validate_artifact_path(path: &Path) -> DenoxResult<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(DenoxError::ArtifactMissing(path.display().to_string())),
    }
}

/// Computes `target`'s path relative to `base`, falling back to `target`
/// unmodified when either side cannot be canonicalized (e.g. `base` does
/// not exist because `--bin-dir` was not given).
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base_abs = match base.canonicalize() {
        Ok(p) => p,
        Err(_) => return target.to_path_buf(),
    };
    let target_abs = match target.canonicalize() {
        Ok(p) => p,
        Err(_) => return target.to_path_buf(),
    };
    let base_components: Vec<_> = base_abs.components().collect();
    let target_components: Vec<_> = target_abs.components().collect();
    let common = base_components
        .iter()
        .zip(target_components.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut result = PathBuf::new();
    for _ in common..base_components.len() {
        result.push("..");
    }
    for component in &target_components[common..] {
        result.push(component.as_os_str());
    }
    result
}
