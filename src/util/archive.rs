//! Archive extraction for bundle files.
//!
//! Supports zip (including `.kotlinsourcezip`), gzip-compressed tar and
//! plain tar. Entries that would land outside the destination are skipped,
//! as are tar symlinks and hard links.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};

/// A supported archive format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
    Tar,
}

/// Recognized file name suffixes, longest first.
const SUFFIXES: [(&str, ArchiveFormat); 5] = [
    (".kotlinsourcezip", ArchiveFormat::Zip),
    (".tar.gz", ArchiveFormat::TarGz),
    (".tgz", ArchiveFormat::TarGz),
    (".tar", ArchiveFormat::Tar),
    (".zip", ArchiveFormat::Zip),
];

impl ArchiveFormat {
    /// Detect the format from a file name.
    pub fn detect(file_name: &str) -> Option<Self> {
        Self::split_suffix(file_name).map(|(_, _, format)| format)
    }

    /// Split a file name into its stem and recognized archive suffix.
    pub fn split_suffix(file_name: &str) -> Option<(&str, &'static str, ArchiveFormat)> {
        let lower = file_name.to_ascii_lowercase();
        SUFFIXES
            .iter()
            .find(|(suffix, _)| lower.ends_with(suffix) && lower.len() > suffix.len())
            .map(|&(suffix, format)| {
                (
                    &file_name[..file_name.len() - suffix.len()],
                    &suffix[1..],
                    format,
                )
            })
    }
}

/// Extract an archive file into `dest`.
///
/// Files with no recognized suffix are read as zip.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = ArchiveFormat::detect(&file_name).unwrap_or(ArchiveFormat::Zip);

    std::fs::create_dir_all(dest)
        .with_context(|| format!("failed to create destination directory: {}", dest.display()))?;

    let file = File::open(archive)
        .with_context(|| format!("failed to open archive: {}", archive.display()))?;

    match format {
        ArchiveFormat::Zip => extract_zip(file, dest),
        ArchiveFormat::TarGz => extract_tar(flate2::read::GzDecoder::new(BufReader::new(file)), dest),
        ArchiveFormat::Tar => extract_tar(BufReader::new(file), dest),
    }
    .with_context(|| format!("failed to extract {}", archive.display()))
}

fn extract_zip(file: File, dest: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(file).context("failed to read zip archive")?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).context("failed to read zip entry")?;

        let Some(relative) = entry.enclosed_name() else {
            tracing::debug!("Skipping unsafe zip entry: {}", entry.name());
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)
                .with_context(|| format!("failed to create directory: {}", out_path.display()))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let mut out = File::create(&out_path)
            .with_context(|| format!("failed to create file: {}", out_path.display()))?;
        std::io::copy(&mut entry, &mut out)
            .with_context(|| format!("failed to extract file: {}", out_path.display()))?;
    }

    Ok(())
}

fn extract_tar<R: Read>(reader: R, dest: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries().context("failed to read tarball entries")? {
        let mut entry = entry.context("failed to read tarball entry")?;
        let entry_path = entry
            .path()
            .context("failed to get entry path")?
            .to_string_lossy()
            .into_owned();

        let entry_type = entry.header().entry_type();
        match entry_type {
            tar::EntryType::Directory
            | tar::EntryType::Regular
            | tar::EntryType::Continuous => {
                let unpacked = entry
                    .unpack_in(dest)
                    .with_context(|| format!("failed to extract {}", entry_path))?;
                if !unpacked {
                    tracing::debug!("Skipping tar entry outside destination: {}", entry_path);
                }
            }
            tar::EntryType::Symlink | tar::EntryType::Link => {
                tracing::debug!("Skipping link entry: {}", entry_path);
            }
            other => {
                tracing::debug!("Skipping unsupported entry type {:?}: {}", other, entry_path);
            }
        }
    }

    Ok(())
}
