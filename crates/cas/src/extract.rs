//! Archive extraction for the formats the pinned sources actually use.

use crossenv_core::artifact::ArchiveKind;
use crossenv_core::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tar::Archive;
use tracing::debug;

/// Unpack a verified archive file into `dest`.
///
/// `dest` is a staging directory; promotion into the store happens after
/// extraction succeeds, so a failure here never leaves a visible entry.
///
/// # Errors
///
/// Returns an I/O error if the archive cannot be read or unpacked.
pub fn unpack(kind: &ArchiveKind, archive: &Path, dest: &Path) -> Result<()> {
    debug!(?archive, ?dest, ?kind, "unpacking archive");
    match kind {
        ArchiveKind::TarGz => {
            let file =
                File::open(archive).map_err(|e| Error::io(e, archive, "open"))?;
            Archive::new(GzDecoder::new(file))
                .unpack(dest)
                .map_err(|e| Error::io(e, dest, "unpack tar.gz"))
        }
        ArchiveKind::Zip => {
            let file =
                File::open(archive).map_err(|e| Error::io(e, archive, "open"))?;
            let mut zip = zip::ZipArchive::new(file)
                .map_err(|e| Error::io(std::io::Error::other(e), archive, "read zip"))?;
            zip.extract(dest)
                .map_err(|e| Error::io(std::io::Error::other(e), dest, "unpack zip"))
        }
        ArchiveKind::GzipBinary { file_name } => {
            let file =
                File::open(archive).map_err(|e| Error::io(e, archive, "open"))?;
            let bin_dir = dest.join("bin");
            std::fs::create_dir_all(&bin_dir)
                .map_err(|e| Error::io(e, bin_dir.clone(), "create_dir_all"))?;
            let target = bin_dir.join(file_name);

            let mut content = Vec::new();
            GzDecoder::new(file)
                .read_to_end(&mut content)
                .map_err(|e| Error::io(e, archive, "decompress"))?;
            std::fs::write(&target, &content)
                .map_err(|e| Error::io(e, target.clone(), "write"))?;

            // Gzip carries no mode bits; the payload is an executable.
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755))
                    .map_err(|e| Error::io(e, target, "chmod"))?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tar::Builder;
    use tempfile::TempDir;

    fn write_tarball(dir: &Path, files: &[(&str, &[u8])]) -> std::path::PathBuf {
        let path = dir.join("archive.tar.gz");
        let file = File::create(&path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = Builder::new(encoder);
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_path(name).unwrap();
            header.set_size(content.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append(&header, &content[..]).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
        path
    }

    #[test]
    fn test_unpack_tar_gz() {
        let tmp = TempDir::new().unwrap();
        let archive = write_tarball(
            tmp.path(),
            &[
                ("toolchain/bin/gcc", b"fake gcc".as_slice()),
                ("toolchain/lib/libc.a", b"fake libc".as_slice()),
            ],
        );

        let dest = tmp.path().join("out");
        unpack(&ArchiveKind::TarGz, &archive, &dest).unwrap();

        assert_eq!(
            std::fs::read(dest.join("toolchain/bin/gcc")).unwrap(),
            b"fake gcc"
        );
        assert_eq!(
            std::fs::read(dest.join("toolchain/lib/libc.a")).unwrap(),
            b"fake libc"
        );
    }

    #[test]
    fn test_unpack_zip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("archive.zip");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("tool/bin/linker", options).unwrap();
        zip.write_all(b"fake linker").unwrap();
        zip.finish().unwrap();

        let dest = tmp.path().join("out");
        unpack(&ArchiveKind::Zip, &path, &dest).unwrap();

        assert_eq!(
            std::fs::read(dest.join("tool/bin/linker")).unwrap(),
            b"fake linker"
        );
    }

    #[test]
    fn test_unpack_gzip_binary() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rust-analyzer.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(b"#!/bin/true").unwrap();
        encoder.finish().unwrap();

        let dest = tmp.path().join("out");
        unpack(
            &ArchiveKind::GzipBinary {
                file_name: "rust-analyzer".into(),
            },
            &path,
            &dest,
        )
        .unwrap();

        let target = dest.join("bin/rust-analyzer");
        assert_eq!(std::fs::read(&target).unwrap(), b"#!/bin/true");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&target).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111, "binary must be executable");
        }
    }

    #[test]
    fn test_unpack_garbage_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("not-an-archive");
        std::fs::write(&path, b"plain bytes").unwrap();

        let dest = tmp.path().join("out");
        assert!(unpack(&ArchiveKind::TarGz, &path, &dest).is_err());
    }
}
