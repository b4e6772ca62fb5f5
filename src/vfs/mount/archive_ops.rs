/*!
 * Archive Operations
 * Zip export and import of folder trees
 */

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};

use time::OffsetDateTime;
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{DateTime, ZipWriter};

use super::MountPoint;
use crate::monitoring::{span_operation, OperationSpan};
use crate::search::IndexTask;
use crate::vfs::content::{copy_buffered, ContentStream};
use crate::vfs::local::LocalStore;
use crate::vfs::path::Path;
use crate::vfs::types::{FileType, VfsError, VfsResult};

impl MountPoint {
    /// Export a folder as a zip archive
    ///
    /// Entry names are relative to `folder`. Folder entries carry the DOS
    /// epoch; file entries carry the modification time of `folder`.
    pub fn zip(&self, folder: &Path) -> VfsResult<ContentStream> {
        self.require_folder(folder)?;
        let span = span_operation("zip", folder);
        let _entered = span.enter();
        span.observe(self.write_archive(folder, &span))
    }

    fn write_archive(&self, folder: &Path, span: &OperationSpan) -> VfsResult<ContentStream> {
        let folder_options = FileOptions::default().last_modified_time(DateTime::default());
        let file_options =
            FileOptions::default().last_modified_time(self.zip_timestamp(folder));

        let spool = tempfile::tempfile().map_err(|e| VfsError::io(e, "create zip spool"))?;
        let mut writer = ZipWriter::new(spool);
        let mut entries = 0usize;

        self.walk(folder, |path, file_type| {
            let name = path.sub_path(folder.len())?.to_relative_string();
            match file_type {
                FileType::Folder => writer.add_directory(name, folder_options)?,
                FileType::File => {
                    writer.start_file(name, file_options)?;
                    let _guard = self.lock_path(path.clone(), false)?;
                    let mut file = File::open(self.store.native(path))
                        .map_err(|e| VfsError::io(e, format!("open {}", path)))?;
                    copy_buffered(&mut file, &mut writer)
                        .map_err(|e| VfsError::io(e, format!("zip {}", path)))?;
                }
            }
            entries += 1;
            Ok(())
        })?;

        let mut spool = writer.finish()?;
        let len = spool
            .seek(SeekFrom::End(0))
            .and_then(|len| spool.seek(SeekFrom::Start(0)).map(|_| len))
            .map_err(|e| VfsError::io(e, "rewind zip spool"))?;

        span.record_items(entries);
        debug!(folder = %folder, entries, len, "folder zipped");
        if len < self.config.memory_threshold {
            let mut bytes = Vec::with_capacity(len as usize);
            spool
                .read_to_end(&mut bytes)
                .map_err(|e| VfsError::io(e, "read zip spool"))?;
            Ok(ContentStream::from_bytes(bytes))
        } else {
            Ok(ContentStream::Spooled { file: spool, len })
        }
    }

    /// Import a zip archive into `folder`
    ///
    /// The first `skip_first_levels` elements of every entry name are dropped,
    /// and entries with nothing left are ignored. Locked files are never
    /// replaced; other existing files are replaced only with `overwrite`.
    pub fn unzip<R: Read>(
        &self,
        folder: &Path,
        archive: R,
        overwrite: bool,
        skip_first_levels: usize,
    ) -> VfsResult<()> {
        self.require_folder(folder)?;
        let span = span_operation("unzip", folder);
        let _entered = span.enter();
        span.observe(self.import_archive(folder, archive, overwrite, skip_first_levels, &span))
    }

    fn import_archive<R: Read>(
        &self,
        folder: &Path,
        mut archive: R,
        overwrite: bool,
        skip_first_levels: usize,
        span: &OperationSpan,
    ) -> VfsResult<()> {
        let mut imported = 0usize;

        while let Some(mut entry) = zip::read::read_zipfile_from_stream(&mut archive)? {
            let relative = Path::parse(entry.name())?;
            if relative.len() <= skip_first_levels {
                continue;
            }
            let target = folder.join(&relative.sub_path(skip_first_levels)?.to_relative_string())?;
            if LocalStore::is_service_path(&target) {
                return Err(VfsError::Forbidden(format!(
                    "archive entry '{}' targets the service directory",
                    entry.name()
                )));
            }

            if entry.is_dir() {
                self.ensure_folders(folder, &target)?;
                continue;
            }

            if let Some(parent) = target.parent() {
                self.ensure_folders(folder, &parent)?;
            }
            match self.file_type(&target) {
                Some(FileType::Folder) => {
                    return Err(VfsError::Conflict(format!(
                        "archive file '{}' collides with folder '{}'",
                        entry.name(),
                        target
                    )))
                }
                Some(FileType::File) => {
                    if !self.active_lock(&target)?.is_none() {
                        return Err(VfsError::Forbidden(format!(
                            "file '{}' is locked and cannot be replaced",
                            target
                        )));
                    }
                    if !overwrite {
                        return Err(VfsError::Conflict(format!("file '{}' already exists", target)));
                    }
                }
                None => {}
            }

            let _guard = self.lock_path(target.clone(), true)?;
            let mut file = File::create(self.store.native(&target))
                .map_err(|e| VfsError::io(e, format!("create {}", target)))?;
            copy_buffered(&mut entry, &mut file)
                .map_err(|e| VfsError::io(e, format!("unzip {}", target)))?;
            imported += 1;
        }

        span.record_items(imported);
        info!(folder = %folder, files = imported, overwrite, skip_first_levels, "archive imported");
        self.notify(IndexTask::Add(self.indexed(folder, FileType::Folder)));
        Ok(())
    }

    /// Create every missing folder between `base` and `target`
    fn ensure_folders(&self, base: &Path, target: &Path) -> VfsResult<()> {
        for depth in base.len() + 1..=target.len() {
            let level = target.sub_path_to(0, depth)?;
            match self.file_type(&level) {
                Some(FileType::Folder) => {}
                Some(FileType::File) => {
                    return Err(VfsError::Conflict(format!(
                        "file '{}' is in the way of an archive folder",
                        level
                    )))
                }
                None => match fs::create_dir(self.store.native(&level)) {
                    Err(e) if e.kind() != std::io::ErrorKind::AlreadyExists => {
                        return Err(VfsError::io(e, format!("create folder {}", level)))
                    }
                    _ => {}
                },
            }
        }
        Ok(())
    }

    fn zip_timestamp(&self, folder: &Path) -> DateTime {
        let modified = match fs::metadata(self.store.native(folder)).and_then(|md| md.modified()) {
            Ok(modified) => OffsetDateTime::from(modified),
            Err(_) => return DateTime::default(),
        };
        DateTime::from_date_and_time(
            modified.year().clamp(1980, 2107) as u16,
            u8::from(modified.month()),
            modified.day(),
            modified.hour(),
            modified.minute(),
            modified.second(),
        )
        .unwrap_or_default()
    }
}
