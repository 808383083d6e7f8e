//! # tplfetch TAR Extraction (`common::archive::extract`)
//!
//! File: cli/src/common/archive/extract.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Unpacks a provider-style tarball (`<top-level>/...`) into a directory,
//! dropping the single top-level directory and optionally keeping only one
//! subdirectory of the archive.
//!
//! Entry paths are checked before anything touches the disk: absolute paths,
//! `..` components and symlinks pointing outside the target are rejected, as
//! is any entry that would be written through a symlink extracted earlier.
//! Hard links are skipped. PAX header entries (GitHub prepends a global one
//! carrying the commit id) are ignored.
//!
use crate::core::error::Result;
use anyhow::{bail, Context};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};
use tracing::{debug, warn};

/// Summary of an extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Entries written to the target (files, directories, symlinks).
    pub entries: usize,
    /// Whether any archive entry matched the requested subdirectory.
    /// Always true when no subdirectory was requested and the archive had content.
    pub matched: bool,
}

/// Unpacks the gzipped tar at `archive` into `target`.
///
/// `subdir` (in `a/b` form) restricts extraction to that directory of the
/// archive, which then becomes the root of `target`.
pub fn unpack_tarball(archive: &Path, target: &Path, subdir: Option<&str>) -> Result<ExtractSummary> {
    let file = File::open(archive)
        .with_context(|| format!("Failed to open archive '{}'", archive.display()))?;
    let mut tar_archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    fs::create_dir_all(target)
        .with_context(|| format!("Failed to create '{}'", target.display()))?;

    let subdir_path = subdir.map(PathBuf::from);
    let mut summary = ExtractSummary::default();

    for entry in tar_archive.entries().context("Failed to read tar entries")? {
        let mut entry = entry.context("Corrupt tar entry")?;
        let entry_type = entry.header().entry_type();
        if matches!(
            entry_type,
            EntryType::XGlobalHeader | EntryType::XHeader | EntryType::GNULongName | EntryType::GNULongLink
        ) {
            continue;
        }

        let raw_path = entry.path().context("Invalid entry path")?.into_owned();
        let Some(relative) = strip_top_level(&raw_path)? else {
            continue;
        };
        let relative = match &subdir_path {
            Some(sub) => match relative.strip_prefix(sub) {
                Ok(rest) => {
                    summary.matched = true;
                    rest.to_path_buf()
                }
                Err(_) => continue,
            },
            None => {
                summary.matched = true;
                relative
            }
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        ensure_no_symlink_on_path(target, &relative)?;
        let destination = target.join(&relative);
        match entry_type {
            EntryType::Directory => {
                fs::create_dir_all(&destination).with_context(|| {
                    format!("Failed to create directory '{}'", destination.display())
                })?;
            }
            EntryType::Link => {
                warn!("Skipping hard link entry '{}'", raw_path.display());
                continue;
            }
            EntryType::Symlink => {
                let link = entry
                    .link_name()
                    .context("Invalid symlink target")?
                    .map(|l| l.into_owned())
                    .unwrap_or_default();
                check_symlink_target(target, &destination, &link)?;
                unpack_entry(&mut entry, &destination)?;
            }
            _ => unpack_entry(&mut entry, &destination)?,
        }
        summary.entries += 1;
    }

    debug!(
        "Extracted {} entries from '{}' into '{}'",
        summary.entries,
        archive.display(),
        target.display()
    );
    Ok(summary)
}

fn unpack_entry<R: std::io::Read>(entry: &mut tar::Entry<'_, R>, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;
    }
    entry
        .unpack(destination)
        .with_context(|| format!("Failed to write '{}'", destination.display()))?;
    Ok(())
}

/// Drops the archive's top-level directory, validating the remainder.
///
/// Returns `None` for the top-level directory entry itself.
fn strip_top_level(path: &Path) -> Result<Option<PathBuf>> {
    let mut components = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir));
    match components.next() {
        Some(Component::Normal(_)) => {}
        None => return Ok(None),
        Some(_) => bail!("Unsafe path in archive: '{}'", path.display()),
    }
    let mut relative = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => bail!("Unsafe path in archive: '{}'", path.display()),
        }
    }
    if relative.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(relative))
    }
}

/// Fails if `root/relative`, or any directory between `root` and it, already
/// exists as a symlink. Writing through such a link could land outside `root`.
fn ensure_no_symlink_on_path(root: &Path, relative: &Path) -> Result<()> {
    let mut current = root.to_path_buf();
    for component in relative.components() {
        current.push(component);
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => bail!(
                "Archive entry '{}' would be written through symlink '{}'",
                relative.display(),
                current.display()
            ),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to inspect '{}'", current.display()))
            }
        }
    }
    Ok(())
}

/// Rejects symlinks that are absolute, resolve outside `root`, or pass
/// through another symlink already extracted under `root`. A link naming
/// another link as its final component is fine.
fn check_symlink_target(root: &Path, link_location: &Path, target: &Path) -> Result<()> {
    if target.is_absolute() {
        bail!(
            "Symlink '{}' points to absolute path '{}'",
            link_location.display(),
            target.display()
        );
    }
    let mut resolved = link_location
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    for component in target.components() {
        if matches!(component, Component::Normal(_) | Component::ParentDir)
            && fs::symlink_metadata(&resolved).is_ok_and(|m| m.file_type().is_symlink())
        {
            bail!(
                "Symlink '{}' resolves through another symlink",
                link_location.display()
            );
        }
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::ParentDir => {
                if !resolved.pop() || !resolved.starts_with(root) {
                    bail!(
                        "Symlink '{}' escapes the extraction directory",
                        link_location.display()
                    );
                }
            }
            Component::CurDir => {}
            _ => bail!("Unsupported symlink target '{}'", target.display()),
        }
    }
    if !resolved.starts_with(root) {
        bail!(
            "Symlink '{}' escapes the extraction directory",
            link_location.display()
        );
    }
    Ok(())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::archive::tar::create_prefixed_tarball;
    use flate2::write::GzEncoder;
    use tempfile::tempdir;

    fn sample_tree(root: &Path) -> Result<()> {
        fs::write(root.join("README.md"), "# root")?;
        fs::create_dir_all(root.join("vanilla/basic/src"))?;
        fs::write(root.join("vanilla/basic/package.json"), "{\"name\":\"basic\"}")?;
        fs::write(root.join("vanilla/basic/src/index.tsx"), "render()")?;
        fs::create_dir_all(root.join("vanilla/js"))?;
        fs::write(root.join("vanilla/js/package.json"), "{}")?;
        Ok(())
    }

    /// Writes a tarball whose single entry has a raw (unvalidated) path.
    fn raw_tarball(path: &Path, entry_name: &str) -> Result<()> {
        let file = File::create(path)?;
        let mut builder = tar::Builder::new(GzEncoder::new(file, flate2::Compression::default()));
        let data = b"pwned";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(EntryType::Regular);
        {
            let name = header.as_old_mut().name.as_mut();
            name[..entry_name.len()].copy_from_slice(entry_name.as_bytes());
        }
        header.set_cksum();
        builder.append(&header, &data[..])?;
        builder.into_inner()?.finish()?;
        Ok(())
    }

    #[test]
    fn test_strips_top_level_directory() -> Result<()> {
        let src = tempdir()?;
        let work = tempdir()?;
        sample_tree(src.path())?;
        let archive = work.path().join("a.tar.gz");
        create_prefixed_tarball(src.path(), "o-n-1234567", &archive)?;

        let target = work.path().join("out");
        let summary = unpack_tarball(&archive, &target, None)?;
        assert!(summary.matched);
        assert!(target.join("README.md").is_file());
        assert!(target.join("vanilla/basic/src/index.tsx").is_file());
        assert!(!target.join("o-n-1234567").exists());
        Ok(())
    }

    #[test]
    fn test_subdir_becomes_root() -> Result<()> {
        let src = tempdir()?;
        let work = tempdir()?;
        sample_tree(src.path())?;
        let archive = work.path().join("a.tar.gz");
        create_prefixed_tarball(src.path(), "o-n-1234567", &archive)?;

        let target = work.path().join("out");
        let summary = unpack_tarball(&archive, &target, Some("vanilla/basic"))?;
        assert!(summary.matched);
        assert!(target.join("package.json").is_file());
        assert!(target.join("src").is_dir());
        assert!(!target.join("README.md").exists());
        assert!(!target.join("js").exists());
        assert_eq!(
            fs::read_to_string(target.join("package.json"))?,
            "{\"name\":\"basic\"}"
        );
        Ok(())
    }

    #[test]
    fn test_missing_subdir_reports_no_match() -> Result<()> {
        let src = tempdir()?;
        let work = tempdir()?;
        sample_tree(src.path())?;
        let archive = work.path().join("a.tar.gz");
        create_prefixed_tarball(src.path(), "p", &archive)?;

        let summary = unpack_tarball(&archive, &work.path().join("out"), Some("nope"))?;
        assert!(!summary.matched);
        assert_eq!(summary.entries, 0);
        Ok(())
    }

    #[test]
    fn test_sibling_prefix_is_not_a_match() -> Result<()> {
        let src = tempdir()?;
        let work = tempdir()?;
        fs::create_dir_all(src.path().join("vanilla/basic-ts"))?;
        fs::write(src.path().join("vanilla/basic-ts/x"), "x")?;
        let archive = work.path().join("a.tar.gz");
        create_prefixed_tarball(src.path(), "p", &archive)?;

        let summary = unpack_tarball(&archive, &work.path().join("out"), Some("vanilla/basic"))?;
        assert!(!summary.matched);
        Ok(())
    }

    #[test]
    fn test_parent_dir_entries_are_rejected() -> Result<()> {
        let work = tempdir()?;
        let archive = work.path().join("evil.tar.gz");
        raw_tarball(&archive, "top/../../escape.txt")?;

        let target = work.path().join("out");
        assert!(unpack_tarball(&archive, &target, None).is_err());
        assert!(!work.path().join("escape.txt").exists());
        Ok(())
    }

    #[test]
    fn test_corrupt_archive_fails() -> Result<()> {
        let work = tempdir()?;
        let archive = work.path().join("junk.tar.gz");
        fs::write(&archive, [0xDE, 0xAD, 0xBE, 0xEF])?;
        assert!(unpack_tarball(&archive, &work.path().join("out"), None).is_err());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_chain_cannot_escape() -> Result<()> {
        let work = tempdir()?;
        let archive = work.path().join("chain.tar.gz");
        {
            let file = File::create(&archive)?;
            let mut builder =
                tar::Builder::new(GzEncoder::new(file, flate2::Compression::default()));
            for (name, link) in [("top/a", "."), ("top/b", "a/..")] {
                let mut header = tar::Header::new_gnu();
                header.set_entry_type(EntryType::Symlink);
                header.set_size(0);
                header.set_mode(0o777);
                builder.append_link(&mut header, name, link)?;
            }
            let data = b"pwned";
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(EntryType::Regular);
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, "top/b/escaped.txt", &data[..])?;
            builder.into_inner()?.finish()?;
        }

        let target = work.path().join("stage/tree");
        assert!(unpack_tarball(&archive, &target, None).is_err());
        assert!(!work.path().join("stage/escaped.txt").exists());
        assert!(!work.path().join("escaped.txt").exists());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_link_to_link_is_allowed() -> Result<()> {
        let work = tempdir()?;
        let root = work.path().join("tree");
        fs::create_dir_all(root.join("dir"))?;
        std::os::unix::fs::symlink("dir", root.join("a"))?;

        assert!(check_symlink_target(&root, &root.join("b"), Path::new("a")).is_ok());
        assert!(check_symlink_target(&root, &root.join("c"), Path::new("a/..")).is_err());
        assert!(check_symlink_target(&root, &root.join("d"), Path::new("a/x")).is_err());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_entry_over_existing_symlink_is_rejected() -> Result<()> {
        let work = tempdir()?;
        let target = work.path().join("tree");
        fs::create_dir_all(&target)?;
        std::os::unix::fs::symlink(work.path(), target.join("link"))?;

        assert!(ensure_no_symlink_on_path(&target, Path::new("link/x.txt")).is_err());
        assert!(ensure_no_symlink_on_path(&target, Path::new("link")).is_err());
        assert!(ensure_no_symlink_on_path(&target, Path::new("plain/x.txt")).is_ok());
        Ok(())
    }

    #[test]
    fn test_symlink_escape_check() {
        let root = Path::new("/stage/tree");
        assert!(check_symlink_target(root, &root.join("a/link"), Path::new("../b.txt")).is_ok());
        assert!(check_symlink_target(root, &root.join("a/link"), Path::new("../../x")).is_err());
        assert!(check_symlink_target(root, &root.join("link"), Path::new("/etc/passwd")).is_err());
    }
}
