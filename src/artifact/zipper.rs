// ABOUTME: Zips a local directory or file into an uploadable application archive.
// ABOUTME: Output is deterministic for identical trees so fingerprints stay stable.

use std::fs;
use std::io::{Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::convert::ConvertError;
use super::location::ArchiveFormat;

/// Write `source` as a zip archive into `writer`.
///
/// - a directory is zipped recursively with paths relative to it
/// - a `.zip` or `.jar` file is copied through unchanged
/// - any other file becomes a single-entry archive
///
/// Entries are visited in sorted order and carry a fixed timestamp, so the
/// archive bytes depend only on names, modes, and content.
pub fn zip_path<W: Write + Seek>(source: &Path, mut writer: W) -> Result<W, ConvertError> {
    let metadata = fs::metadata(source)?;

    if metadata.is_file() {
        let name = source.to_string_lossy();
        if ArchiveFormat::from_path(&name) == Some(ArchiveFormat::Zip) {
            let mut file = fs::File::open(source)?;
            std::io::copy(&mut file, &mut writer)?;
            return Ok(writer);
        }

        let mut zip = ZipWriter::new(writer);
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "application".to_string());
        add_file(&mut zip, source, &file_name, &metadata)?;
        return Ok(zip.finish()?);
    }

    let mut zip = ZipWriter::new(writer);
    add_directory_contents(&mut zip, source, "")?;
    Ok(zip.finish()?)
}

fn add_directory_contents<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    dir: &Path,
    prefix: &str,
) -> Result<(), ConvertError> {
    let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = format!("{}{}", prefix, entry.file_name().to_string_lossy());
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_symlink() {
            // Follow links to files, skip links to directories to avoid cycles.
            let target = match fs::metadata(&path) {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!(path = %path.display(), "skipping dangling symlink: {}", e);
                    continue;
                }
            };
            if target.is_file() {
                add_file(zip, &path, &name, &target)?;
            } else {
                tracing::debug!(path = %path.display(), "skipping symlinked directory");
            }
            continue;
        }

        if file_type.is_dir() {
            zip.add_directory(name.as_str(), entry_options(&entry.metadata()?))?;
            add_directory_contents(zip, &path, &format!("{}/", name))?;
        } else {
            add_file(zip, &path, &name, &entry.metadata()?)?;
        }
    }

    Ok(())
}

fn add_file<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    path: &Path,
    name: &str,
    metadata: &fs::Metadata,
) -> Result<(), ConvertError> {
    zip.start_file(
        name,
        entry_options(metadata).compression_method(CompressionMethod::Deflated),
    )?;
    let mut file = fs::File::open(path)?;
    std::io::copy(&mut file, zip)?;
    Ok(())
}

fn entry_options(metadata: &fs::Metadata) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(unix_mode(metadata))
}

#[cfg(unix)]
fn unix_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn unix_mode(metadata: &fs::Metadata) -> u32 {
    if metadata.is_dir() { 0o755 } else { 0o644 }
}
