// ABOUTME: Streaming conversion of tar and tar.gz archives into zip archives.
// ABOUTME: Strips a single leading root folder so the zip holds the app at its top level.

use std::io::{Read, Seek, Write};

use chrono::{Datelike, Timelike};
use flate2::read::GzDecoder;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Errors raised while building a zip archive from a tarball or a local tree.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Reading the source or copying entry bytes failed.
    #[error("archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the zip archive failed.
    #[error("failed to write zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Compression wrapping the tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarCompression {
    None,
    Gzip,
}

/// Convert a tar stream into a zip archive written to `writer`.
///
/// If the first tar entry is a directory it is treated as a root folder: it is
/// not written, and the first path segment of every later entry is dropped.
/// Entries are read strictly in stream order. On error the writer may hold a
/// partial archive that the caller must discard.
pub fn tar_to_zip<R, W>(
    reader: R,
    compression: TarCompression,
    writer: W,
) -> Result<W, ConvertError>
where
    R: Read,
    W: Write + Seek,
{
    match compression {
        TarCompression::None => write_tar_to_zip(reader, writer),
        TarCompression::Gzip => write_tar_to_zip(GzDecoder::new(reader), writer),
    }
}

fn write_tar_to_zip<R: Read, W: Write + Seek>(reader: R, writer: W) -> Result<W, ConvertError> {
    let mut archive = tar::Archive::new(reader);
    let mut zip = ZipWriter::new(writer);
    let mut has_root_folder = false;

    for (index, entry) in archive.entries()?.enumerate() {
        let mut entry = entry?;
        let is_dir = entry.header().entry_type().is_dir();
        let raw_name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();

        if index == 0 && is_dir {
            tracing::debug!(root = %raw_name, "dropping tar root folder");
            has_root_folder = true;
            continue;
        }

        let name = if has_root_folder {
            strip_first_segment(&raw_name)
        } else {
            raw_name
        };
        if name.is_empty() || name == "/" {
            continue;
        }

        let mode = entry.header().mode().unwrap_or(if is_dir { 0o755 } else { 0o644 });
        let mut options = SimpleFileOptions::default().unix_permissions(mode);
        if let Some(modified) = entry.header().mtime().ok().and_then(zip_timestamp) {
            options = options.last_modified_time(modified);
        }

        if is_dir {
            zip.add_directory(name.trim_end_matches('/'), options)?;
            continue;
        }

        zip.start_file(
            name,
            options.compression_method(CompressionMethod::Deflated),
        )?;
        std::io::copy(&mut entry, &mut zip)?;
    }

    Ok(zip.finish()?)
}

fn strip_first_segment(path: &str) -> String {
    path.split('/').skip(1).collect::<Vec<_>>().join("/")
}

/// Convert a unix timestamp into a zip (DOS) timestamp, if representable.
fn zip_timestamp(secs: u64) -> Option<zip::DateTime> {
    let time = chrono::DateTime::from_timestamp(i64::try_from(secs).ok()?, 0)?;
    zip::DateTime::from_date_and_time(
        u16::try_from(time.year()).ok()?,
        time.month() as u8,
        time.day() as u8,
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
    )
    .ok()
}
