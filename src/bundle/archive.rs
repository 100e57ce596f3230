use std::fs::File;
use std::io::{self, Cursor};
use std::path::Path;

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{RepoError, Result};
use crate::utils::fs::ensure_dir;

/// Zip the contents of `src` into `dest`, replacing it atomically.
pub(crate) fn write_zip(src: &Path, dest: &Path) -> Result<u64> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    ensure_dir(parent)?;
    let tmp = tempfile::NamedTempFile::new_in(parent)?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(tmp.reopen()?);
    let mut files = 0u64;
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| RepoError::Io(err.into()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| RepoError::InvalidInput(format!("path escapes {}", src.display())))?;
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options)?;
            let mut input = File::open(entry.path())?;
            io::copy(&mut input, &mut zip)?;
            files += 1;
        }
    }
    zip.finish()?;

    tmp.persist(dest).map_err(|err| RepoError::Io(err.error))?;
    Ok(files)
}

/// Extract a zip file into `dest`. Entries escaping `dest` are rejected.
pub(crate) fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let bytes = std::fs::read(archive)?;
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    archive.extract(dest)?;
    Ok(())
}
