// SPDX-License-Identifier: GPL-3.0-only

//! Gallery storage
//!
//! Photos are written through a [`MediaStore`]: an entry is created in a
//! pending state, filled through a write stream, then published. The
//! [`GalleryWriter`] drives that sequence and reports failure as `None`.

use crate::config::PhotoOutputFormat;
use crate::constants::{GALLERY_URI_PREFIX, PHOTO_FILE_PREFIX, PHOTO_TIMESTAMP_FORMAT};
use crate::errors::{StorageError, WriteError};
use crate::pipelines::photo::codec::DecodedImage;
use crate::pipelines::photo::encoding::PhotoEncoder;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Handle to a published photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryRecord {
    /// Stable identifier (`media://gallery/<file name>`)
    pub uri: String,
    /// Location on disk
    pub path: PathBuf,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
}

/// Metadata supplied when creating a media store entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    pub display_name: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

/// An entry that has been created but not yet published
#[derive(Debug)]
pub struct PendingEntry {
    pub id: Uuid,
    pub metadata: EntryMetadata,
    /// Where bytes are written while the entry is pending
    pub pending_path: PathBuf,
}

/// Shared media store
pub trait MediaStore: Send + Sync {
    /// Create a new pending entry
    fn create_entry(&self, metadata: &EntryMetadata) -> io::Result<PendingEntry>;

    /// Open a write stream for a pending entry
    fn open_write(&self, entry: &PendingEntry) -> io::Result<Box<dyn Write + Send>>;

    /// Make a fully written entry visible.
    ///
    /// On failure the store discards the entry itself.
    fn publish(&self, entry: PendingEntry, size_bytes: u64) -> io::Result<GalleryRecord>;

    /// Drop a pending entry
    fn discard(&self, entry: PendingEntry);

    /// Bytes available to the store
    fn available_space(&self) -> io::Result<u64>;

    /// Root location of the store
    fn location(&self) -> &Path;
}

/// Media store backed by a directory (e.g. ~/Pictures/pocket-camera)
///
/// Pending entries are hidden `.<name>.<id>.pending` files that are renamed
/// into place on publish. Existing photos are never overwritten.
#[derive(Debug, Clone)]
pub struct DirectoryMediaStore {
    root: PathBuf,
}

impl DirectoryMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<name>`, then `<stem>_1.<ext>`, `<stem>_2.<ext>`, ... inside the store
    fn candidate_paths<'a>(&'a self, display_name: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        let (stem, ext) = match display_name.rsplit_once('.') {
            Some((stem, ext)) => (stem, Some(ext)),
            None => (display_name, None),
        };

        std::iter::once(self.root.join(display_name)).chain((1u32..).map(move |n| match ext {
            Some(ext) => self.root.join(format!("{}_{}.{}", stem, n, ext)),
            None => self.root.join(format!("{}_{}", stem, n)),
        }))
    }

    /// Link `pending` under the first free candidate name
    ///
    /// `hard_link` fails with `AlreadyExists` instead of replacing, so a file
    /// that appears between attempts is never overwritten.
    fn claim_name(&self, pending: &Path, display_name: &str) -> io::Result<PathBuf> {
        for candidate in self.candidate_paths(display_name) {
            match std::fs::hard_link(pending, &candidate) {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free file name for {}", display_name),
        ))
    }
}

impl MediaStore for DirectoryMediaStore {
    fn create_entry(&self, metadata: &EntryMetadata) -> io::Result<PendingEntry> {
        std::fs::create_dir_all(&self.root)?;

        let id = Uuid::new_v4();
        let pending_path = self
            .root
            .join(format!(".{}.{}.pending", metadata.display_name, id));

        // Reserve the pending file so concurrent writers never share it
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&pending_path)?;

        debug!(path = %pending_path.display(), "Created pending entry");

        Ok(PendingEntry {
            id,
            metadata: metadata.clone(),
            pending_path,
        })
    }

    fn open_write(&self, entry: &PendingEntry) -> io::Result<Box<dyn Write + Send>> {
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&entry.pending_path)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn publish(&self, entry: PendingEntry, size_bytes: u64) -> io::Result<GalleryRecord> {
        let final_path = match self.claim_name(&entry.pending_path, &entry.metadata.display_name) {
            Ok(path) => path,
            Err(e) => {
                self.discard(entry);
                return Err(e);
            }
        };

        // The photo is already visible under its final name
        if let Err(e) = std::fs::remove_file(&entry.pending_path) {
            warn!(
                path = %entry.pending_path.display(),
                error = %e,
                "Failed to remove pending link"
            );
        }

        Ok(record_for_path(
            final_path,
            &entry.metadata.mime_type,
            entry.metadata.width,
            entry.metadata.height,
            size_bytes,
        ))
    }

    fn discard(&self, entry: PendingEntry) {
        if let Err(e) = std::fs::remove_file(&entry.pending_path)
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!(
                path = %entry.pending_path.display(),
                error = %e,
                "Failed to remove pending entry"
            );
        }
    }

    fn available_space(&self) -> io::Result<u64> {
        available_space(&self.root)
    }

    fn location(&self) -> &Path {
        &self.root
    }
}

/// Writes decoded images into a media store
#[derive(Clone)]
pub struct GalleryWriter {
    store: Arc<dyn MediaStore>,
    encoder: PhotoEncoder,
    min_free_space: u64,
}

impl GalleryWriter {
    pub fn new(store: Arc<dyn MediaStore>, encoder: PhotoEncoder, min_free_space: u64) -> Self {
        Self {
            store,
            encoder,
            min_free_space,
        }
    }

    /// Gallery location
    pub fn location(&self) -> &Path {
        self.store.location()
    }

    /// Check that the store has at least the configured free space
    ///
    /// Returns the available byte count when the check passes.
    pub fn check_free_space(&self) -> Result<u64, StorageError> {
        let available = self.store.available_space()?;
        if available < self.min_free_space {
            return Err(StorageError::InsufficientSpace {
                available,
                required: self.min_free_space,
            });
        }
        Ok(available)
    }

    /// Persist an image, returning its record or `None` on any failure
    pub fn save(&self, image: &DecodedImage) -> Option<GalleryRecord> {
        match self.try_save(image) {
            Ok(record) => {
                info!(uri = %record.uri, path = %record.path.display(), "Photo saved");
                Some(record)
            }
            Err(e) => {
                error!(error = %e, "Failed to save photo");
                None
            }
        }
    }

    /// [`GalleryWriter::save`] on the blocking pool
    pub async fn save_async(&self, image: DecodedImage) -> Option<GalleryRecord> {
        let writer = self.clone();
        match tokio::task::spawn_blocking(move || writer.save(&image)).await {
            Ok(record) => record,
            Err(e) => {
                error!(error = %e, "Save task failed");
                None
            }
        }
    }

    fn try_save(&self, image: &DecodedImage) -> Result<GalleryRecord, WriteError> {
        let encoded = self.encoder.encode(image)?;
        let metadata = EntryMetadata {
            display_name: photo_file_name(encoded.format),
            mime_type: encoded.format.mime_type().to_string(),
            width: encoded.width,
            height: encoded.height,
        };

        let entry = self
            .store
            .create_entry(&metadata)
            .map_err(|e| WriteError::EntryRejected(e.to_string()))?;

        if let Err(e) = Self::write_entry(self.store.as_ref(), &entry, &encoded.data) {
            self.store.discard(entry);
            return Err(e);
        }

        self.store
            .publish(entry, encoded.data.len() as u64)
            .map_err(|e| WriteError::PublishFailed(e.to_string()))
    }

    /// Write bytes into a pending entry; the stream is closed on return
    fn write_entry(
        store: &dyn MediaStore,
        entry: &PendingEntry,
        data: &[u8],
    ) -> Result<(), WriteError> {
        let mut stream = store
            .open_write(entry)
            .map_err(|e| WriteError::StreamOpenFailed(e.to_string()))?;
        stream
            .write_all(data)
            .map_err(|e| WriteError::WriteFailed(e.to_string()))?;
        stream
            .flush()
            .map_err(|e| WriteError::WriteFailed(e.to_string()))
    }

    /// Most recent photo in the gallery (for the gallery button)
    pub async fn latest(&self) -> Option<GalleryRecord> {
        let dir = self.store.location().to_path_buf();
        tokio::task::spawn_blocking(move || latest_in_dir(&dir))
            .await
            .ok()?
    }
}

/// Timestamped photo file name, e.g. `IMG_20240101_120000.jpg`
pub fn photo_file_name(format: PhotoOutputFormat) -> String {
    let timestamp = chrono::Local::now().format(PHOTO_TIMESTAMP_FORMAT);
    format!("{}{}.{}", PHOTO_FILE_PREFIX, timestamp, format.extension())
}

fn record_for_path(
    path: PathBuf,
    mime_type: &str,
    width: u32,
    height: u32,
    size_bytes: u64,
) -> GalleryRecord {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    GalleryRecord {
        uri: format!("{}{}", GALLERY_URI_PREFIX, name),
        path,
        mime_type: mime_type.to_string(),
        width,
        height,
        size_bytes,
    }
}

fn latest_in_dir(dir: &Path) -> Option<GalleryRecord> {
    let entries = std::fs::read_dir(dir).ok()?;

    let (path, size, format, _) = entries
        .flatten()
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|entry| {
            let path = entry.path();
            let format = PhotoOutputFormat::from_extension(&path.extension()?.to_string_lossy())?;
            let metadata = entry.metadata().ok()?;
            let modified = metadata.modified().ok()?;
            Some((path, metadata.len(), format, modified))
        })
        .max_by_key(|(_, _, _, modified)| *modified)?;

    let (width, height) = match image::image_dimensions(&path) {
        Ok(dims) => dims,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read photo dimensions");
            (0, 0)
        }
    };

    debug!(path = %path.display(), "Latest gallery photo");
    Some(record_for_path(path, format.mime_type(), width, height, size))
}

/// Free bytes available to unprivileged users on the filesystem holding `path`
///
/// If `path` does not exist yet, its nearest existing ancestor is queried.
#[cfg(unix)]
pub fn available_space(path: &Path) -> io::Result<u64> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let existing = path
        .ancestors()
        .find(|p| p.exists())
        .unwrap_or_else(|| Path::new("."));
    let c_path = CString::new(existing.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok((stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64))
}
