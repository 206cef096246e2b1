/// Archive extraction for files sorted into the archives category.
///
/// Zip, tar and gzip-compressed tar archives are unpacked. The format is sniffed
/// from the file content first and from the extension second, so a renamed
/// archive is still unpacked with the right decoder.
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Archive formats that can be unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
}

impl ArchiveFormat {
    /// Maps a MIME type reported by content sniffing to a format.
    fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "application/zip" => Some(Self::Zip),
            "application/x-tar" => Some(Self::Tar),
            "application/gzip" => Some(Self::TarGz),
            _ => None,
        }
    }

    /// Maps a file extension, with or without its dot, to a format.
    fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.').to_lowercase();
        match extension.as_str() {
            "zip" => Some(Self::Zip),
            "tar" => Some(Self::Tar),
            "gz" | "tgz" => Some(Self::TarGz),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
        }
    }
}

/// Errors that can occur while unpacking an archive.
#[derive(Debug)]
pub enum ArchiveError {
    /// The archive type is recognized by its extension but cannot be unpacked.
    Unsupported { path: PathBuf, extension: String },
    /// The archive could not be decoded.
    Corrupt { path: PathBuf, reason: String },
    /// Reading the archive or writing its contents failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported { path, extension } => write!(
                f,
                "Unsupported archive format '{}' for {}",
                extension,
                path.display()
            ),
            Self::Corrupt { path, reason } => {
                write!(f, "Failed to unpack {}: {}", path.display(), reason)
            }
            Self::Io { path, source } => write!(f, "I/O error on {}: {}", path.display(), source),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Unpacks archives into destination folders.
pub struct ArchiveExpander;

impl ArchiveExpander {
    /// Determines the format of an archive, or `None` if it cannot be unpacked.
    pub fn detect_format(archive_path: &Path) -> Option<ArchiveFormat> {
        let sniffed = infer::get_from_path(archive_path)
            .ok()
            .flatten()
            .and_then(|kind| ArchiveFormat::from_mime(kind.mime_type()));

        sniffed.or_else(|| {
            archive_path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(ArchiveFormat::from_extension)
        })
    }

    /// Extracts every entry of `archive_path` into `dest_dir`.
    ///
    /// `dest_dir` is created if it does not exist. If extraction fails and this
    /// call created `dest_dir`, the folder and anything already written into it
    /// are removed again.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::archive::ArchiveExpander;
    /// use std::path::Path;
    ///
    /// match ArchiveExpander::expand(
    ///     Path::new("/data/archives/photos.zip"),
    ///     Path::new("/data/archives/photos"),
    /// ) {
    ///     Ok(format) => println!("Unpacked {} archive", format.name()),
    ///     Err(e) => eprintln!("{}", e),
    /// }
    /// ```
    pub fn expand(archive_path: &Path, dest_dir: &Path) -> ArchiveResult<ArchiveFormat> {
        let format =
            Self::detect_format(archive_path).ok_or_else(|| ArchiveError::Unsupported {
                path: archive_path.to_path_buf(),
                extension: archive_path
                    .extension()
                    .map(|ext| ext.to_string_lossy().to_string())
                    .unwrap_or_default(),
            })?;

        let created = !dest_dir.exists();
        fs::create_dir_all(dest_dir).map_err(|e| ArchiveError::Io {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;

        let unpacked = match format {
            ArchiveFormat::Zip => Self::unpack_zip(archive_path, dest_dir),
            ArchiveFormat::Tar => {
                let file = Self::open(archive_path)?;
                Self::unpack_tar(archive_path, file, dest_dir)
            }
            ArchiveFormat::TarGz => {
                let file = Self::open(archive_path)?;
                Self::unpack_tar(archive_path, GzDecoder::new(file), dest_dir)
            }
        };

        if let Err(e) = unpacked {
            if created {
                let _ = fs::remove_dir_all(dest_dir);
            }
            return Err(e);
        }

        Ok(format)
    }

    fn open(archive_path: &Path) -> ArchiveResult<File> {
        File::open(archive_path).map_err(|e| ArchiveError::Io {
            path: archive_path.to_path_buf(),
            source: e,
        })
    }

    fn unpack_zip(archive_path: &Path, dest_dir: &Path) -> ArchiveResult<()> {
        let file = Self::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| ArchiveError::Corrupt {
            path: archive_path.to_path_buf(),
            reason: e.to_string(),
        })?;

        archive
            .extract(dest_dir)
            .map_err(|e| ArchiveError::Corrupt {
                path: archive_path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    fn unpack_tar<R: std::io::Read>(
        archive_path: &Path,
        reader: R,
        dest_dir: &Path,
    ) -> ArchiveResult<()> {
        tar::Archive::new(reader)
            .unpack(dest_dir)
            .map_err(|e| ArchiveError::Corrupt {
                path: archive_path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).expect("Failed to create zip");
        let mut writer = zip::ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, content) in entries {
            writer
                .start_file(*name, options)
                .expect("Failed to start zip entry");
            writer
                .write_all(content.as_bytes())
                .expect("Failed to write zip entry");
        }
        writer.finish().expect("Failed to finish zip");
    }

    fn write_tar_gz(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).expect("Failed to create tar.gz");
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .expect("Failed to append tar entry");
        }
        builder
            .into_inner()
            .expect("Failed to finish tar")
            .finish()
            .expect("Failed to finish gzip");
    }

    #[test]
    fn test_detect_format_by_extension() {
        assert_eq!(
            ArchiveFormat::from_extension(".ZIP"),
            Some(ArchiveFormat::Zip)
        );
        assert_eq!(
            ArchiveFormat::from_extension("tgz"),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(ArchiveFormat::from_extension(".rar"), None);
    }

    #[test]
    fn test_detect_format_by_content() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        // A zip archive with a misleading extension is still detected as zip.
        let path = temp_dir.path().join("bundle.gz");
        write_zip(&path, &[("a.txt", "alpha")]);

        assert_eq!(
            ArchiveExpander::detect_format(&path),
            Some(ArchiveFormat::Zip)
        );
    }

    #[test]
    fn test_expand_zip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let archive = temp_dir.path().join("docs.zip");
        write_zip(&archive, &[("a.txt", "alpha"), ("nested/b.txt", "beta")]);

        let dest = temp_dir.path().join("docs");
        let format = ArchiveExpander::expand(&archive, &dest).expect("Failed to expand");

        assert_eq!(format, ArchiveFormat::Zip);
        assert_eq!(
            fs::read_to_string(dest.join("a.txt")).expect("Failed to read"),
            "alpha"
        );
        assert!(dest.join("nested").join("b.txt").exists());
        assert!(archive.exists(), "Archive itself is kept");
    }

    #[test]
    fn test_expand_tar_gz() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let archive = temp_dir.path().join("backup.gz");
        write_tar_gz(&archive, &[("notes.md", "# notes")]);

        let dest = temp_dir.path().join("backup");
        let format = ArchiveExpander::expand(&archive, &dest).expect("Failed to expand");

        assert_eq!(format, ArchiveFormat::TarGz);
        assert!(dest.join("notes.md").exists());
    }

    #[test]
    fn test_expand_into_existing_folder() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let archive = temp_dir.path().join("docs.zip");
        write_zip(&archive, &[("a.txt", "alpha")]);

        let dest = temp_dir.path().join("docs");
        fs::create_dir(&dest).expect("Failed to create dest");
        fs::write(dest.join("keep.txt"), "keep").expect("Failed to write");

        ArchiveExpander::expand(&archive, &dest).expect("Failed to expand");
        assert!(dest.join("a.txt").exists());
        assert!(dest.join("keep.txt").exists());
    }

    #[test]
    fn test_expand_unsupported_format() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let archive = temp_dir.path().join("disk.iso");
        fs::write(&archive, b"not really an iso").expect("Failed to write");

        let dest = temp_dir.path().join("disk");
        let result = ArchiveExpander::expand(&archive, &dest);

        assert!(matches!(result, Err(ArchiveError::Unsupported { .. })));
        assert!(!dest.exists(), "No folder is created for unsupported archives");
    }

    #[test]
    fn test_expand_corrupt_zip_cleans_up() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let archive = temp_dir.path().join("broken.zip");
        fs::write(&archive, b"definitely not a zip file").expect("Failed to write");

        let dest = temp_dir.path().join("broken");
        let result = ArchiveExpander::expand(&archive, &dest);

        assert!(matches!(result, Err(ArchiveError::Corrupt { .. })));
        assert!(!dest.exists(), "Half-created folder should be removed");
    }
}
