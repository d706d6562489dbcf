// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ToolError;
use crate::model::Document;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to stable storage where
    /// possible. Exact guarantees are platform/filesystem-dependent.
    Durable,
}

/// Reads and decodes a document of kind `D` from `path`.
pub fn load_document<D: Document>(path: &Path) -> Result<D, ToolError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ToolError::ResourceNotFound { path: path.to_path_buf() });
        }
        Err(source) => return Err(ToolError::io(path, source)),
    };
    D::decode(&bytes)
        .map_err(|source| ToolError::Upstream { path: Some(path.to_path_buf()), source })
}

/// Encodes `document` and writes it to `path` atomically.
pub fn write_document<D: Document>(
    path: &Path,
    document: &D,
    durability: WriteDurability,
) -> Result<(), ToolError> {
    let bytes = document
        .encode()
        .map_err(|source| ToolError::Upstream { path: Some(path.to_path_buf()), source })?;
    write_atomic(path, &bytes, durability)
}

/// Writes `contents` to a sibling temp file, then renames it over `path`.
///
/// On failure the temp file is removed and `path` keeps its previous contents.
pub fn write_atomic(
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), ToolError> {
    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => {
            return Err(ToolError::invalid_request(format!(
                "refusing to write through symlink at {}",
                path.display()
            )));
        }
        Ok(md) if md.is_dir() => {
            return Err(ToolError::invalid_request(format!(
                "output path {} is a directory",
                path.display()
            )));
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(ToolError::io(path, source)),
    }

    let Some(file_name) = path.file_name() else {
        return Err(ToolError::io(path, io::Error::other("path has no file name")));
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|source| ToolError::io(&parent, source))?;

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let tmp_path = parent.join(format!(
        ".folio.tmp.{}.{}.{nanos}",
        file_name.to_string_lossy(),
        std::process::id()
    ));

    if let Err(err) = write_temp(&tmp_path, contents, durability) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(ToolError::io(path, source));
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            let dir = fs::File::open(&parent).map_err(|source| ToolError::io(&parent, source))?;
            dir.sync_all().map_err(|source| ToolError::io(&parent, source))?;
        }
    }

    Ok(())
}

fn write_temp(
    tmp_path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), ToolError> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(tmp_path)
        .map_err(|source| ToolError::io(tmp_path, source))?;

    file.write_all(contents).map_err(|source| ToolError::io(tmp_path, source))?;

    if durability == WriteDurability::Durable {
        file.sync_all().map_err(|source| ToolError::io(tmp_path, source))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::PagedDocument;
    use crate::testing::TempDir;

    fn leftover_temp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .expect("read dir")
            .map(|entry| entry.expect("entry").path())
            .filter(|path| path.to_string_lossy().contains(".folio.tmp."))
            .collect()
    }

    #[test]
    fn replaces_contents_without_leaving_temp_files() {
        let tmp = TempDir::new("atomic-replace");
        let path = tmp.path().join("doc.json");
        fs::write(&path, "old").expect("seed");

        write_atomic(&path, b"new", WriteDurability::Durable).expect("write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "new");
        assert!(leftover_temp_files(tmp.path()).is_empty());
    }

    #[test]
    fn creates_missing_parent_directories() {
        let tmp = TempDir::new("atomic-parent");
        let path = tmp.path().join("nested/out/doc.json");

        write_atomic(&path, b"{}", WriteDurability::BestEffort).expect("write");

        assert!(path.is_file());
    }

    #[test]
    fn refuses_to_overwrite_a_directory_and_keeps_it_intact() {
        let tmp = TempDir::new("atomic-dir");
        let path = tmp.path().join("taken");
        fs::create_dir_all(&path).expect("mkdir");

        let err = write_atomic(&path, b"x", WriteDurability::BestEffort).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(path.is_dir());
        assert!(leftover_temp_files(tmp.path()).is_empty());
    }

    #[test]
    fn load_distinguishes_missing_files_from_corrupt_ones() {
        let tmp = TempDir::new("atomic-load");
        let missing = tmp.path().join("missing.json");
        let err = load_document::<PagedDocument>(&missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceNotFound);

        let corrupt = tmp.path().join("corrupt.json");
        fs::write(&corrupt, "%PDF-1.7 not really").expect("seed");
        let err = load_document::<PagedDocument>(&corrupt).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
        assert!(matches!(err, ToolError::Upstream { .. }));
    }
}
