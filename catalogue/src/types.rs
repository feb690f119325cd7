//! Snapshots and requests exchanged with catalogue callers.
//!
//! Snapshots are detached copies: changing one never changes the catalogue.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use tapecat::checksum::ChecksumBlob;
use tapecat::identity::EntryLog;

/// An administrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminUser {
    pub name: String,
    pub comment: String,
    pub creation_log: EntryLog,
    pub last_modification_log: EntryLog,
}

/// A virtual organization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualOrganization {
    pub name: String,
    pub read_max_drives: u64,
    pub write_max_drives: u64,

    /// Maximum file size in bytes, zero meaning unlimited.
    pub max_file_size: u64,
    pub comment: String,
    pub creation_log: EntryLog,
    pub last_modification_log: EntryLog,
}

/// Attributes of a new virtual organization.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateVirtualOrganization {
    pub name: String,
    pub read_max_drives: u64,
    pub write_max_drives: u64,
    pub max_file_size: u64,
    pub comment: String,
}

/// A storage class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageClass {
    pub disk_instance: String,
    pub name: String,
    pub nb_copies: u64,
    pub comment: String,
    pub creation_log: EntryLog,
    pub last_modification_log: EntryLog,
}

/// A tape pool with its occupancy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TapePool {
    pub name: String,
    pub vo: String,
    pub nb_partial_tapes: u64,
    pub encryption: bool,
    pub supply: Option<String>,

    /// Number of tapes in the pool.
    pub nb_tapes: u64,

    /// Total capacity of the tapes in the pool, in bytes.
    pub capacity_bytes: u64,

    /// Total data written to the tapes in the pool, in bytes.
    pub data_bytes: u64,

    /// Total number of files written to the tapes in the pool.
    pub nb_physical_files: u64,

    pub comment: String,
    pub creation_log: EntryLog,
    pub last_modification_log: EntryLog,
}

/// An archive route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveRoute {
    pub disk_instance: String,
    pub storage_class_name: String,
    pub copy_nb: u64,
    pub tape_pool_name: String,
    pub comment: String,
    pub creation_log: EntryLog,
    pub last_modification_log: EntryLog,
}

/// A logical library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogicalLibrary {
    pub name: String,
    pub is_disabled: bool,
    pub comment: String,
    pub creation_log: EntryLog,
    pub last_modification_log: EntryLog,
}

/// A type of tape cartridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaType {
    pub name: String,
    pub cartridge: String,
    pub capacity_in_bytes: u64,
    pub primary_density_code: Option<u8>,
    pub secondary_density_code: Option<u8>,
    pub nb_wraps: Option<u32>,
    pub min_lpos: Option<u64>,
    pub max_lpos: Option<u64>,
    pub comment: String,
    pub creation_log: EntryLog,
    pub last_modification_log: EntryLog,
}

/// Attributes of a new media type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateMediaType {
    pub name: String,
    pub cartridge: String,
    pub capacity_in_bytes: u64,
    pub primary_density_code: Option<u8>,
    pub secondary_density_code: Option<u8>,
    pub nb_wraps: Option<u32>,
    pub min_lpos: Option<u64>,
    pub max_lpos: Option<u64>,
    pub comment: String,
}

/// Where and when something happened to a tape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TapeLog {
    pub drive: String,
    pub time: DateTime<Utc>,
}

/// A tape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tape {
    pub vid: String,
    pub media_type: String,
    pub vendor: String,
    pub logical_library_name: String,
    pub tape_pool_name: String,
    pub vo: String,
    pub encryption_key_name: Option<String>,
    pub capacity_in_bytes: u64,
    pub data_on_tape_in_bytes: u64,
    pub last_fseq: u64,
    pub nb_physical_files: u64,
    pub full: bool,
    pub disabled: bool,
    pub read_only: bool,
    pub is_from_castor: bool,
    pub label_log: Option<TapeLog>,
    pub last_read_log: Option<TapeLog>,
    pub last_write_log: Option<TapeLog>,
    pub read_mount_count: u64,
    pub write_mount_count: u64,
    pub comment: Option<String>,
    pub creation_log: EntryLog,
    pub last_modification_log: EntryLog,
}

impl Tape {
    pub fn is_labelled(&self) -> bool {
        self.label_log.is_some()
    }
}

/// Attributes of a new tape.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTape {
    pub vid: String,
    pub media_type: String,
    pub vendor: String,
    pub logical_library_name: String,
    pub tape_pool_name: String,
    pub capacity_in_bytes: u64,
    pub full: bool,
    pub disabled: bool,
    pub read_only: bool,
    pub comment: Option<String>,
}

/// A tape that can be written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TapeForWriting {
    pub vid: String,
    pub media_type: String,
    pub vendor: String,
    pub tape_pool: String,
    pub vo: String,
    pub capacity_in_bytes: u64,
    pub data_on_tape_in_bytes: u64,
    pub last_fseq: u64,
}

/// Criteria to select tapes by. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TapeSearchCriteria {
    pub vid: Option<String>,
    pub media_type: Option<String>,
    pub vendor: Option<String>,
    pub logical_library: Option<String>,
    pub tape_pool: Option<String>,
    pub vo: Option<String>,
    pub capacity_in_bytes: Option<u64>,
    pub disabled: Option<bool>,
    pub full: Option<bool>,
    pub read_only: Option<bool>,
}

/// A mount policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MountPolicy {
    pub name: String,
    pub archive_priority: u64,
    pub archive_min_request_age: u64,
    pub retrieve_priority: u64,
    pub retrieve_min_request_age: u64,
    pub max_drives_allowed: u64,
    pub comment: String,
    pub creation_log: EntryLog,
    pub last_modification_log: EntryLog,
}

/// Attributes of a new mount policy.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateMountPolicy {
    pub name: String,
    pub archive_priority: u64,
    pub archive_min_request_age: u64,
    pub retrieve_priority: u64,
    pub retrieve_min_request_age: u64,
    pub max_drives_allowed: u64,
    pub comment: String,
}

/// A rule assigning a mount policy to a requester or a requester group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MountRule {
    pub disk_instance: String,

    /// Name of the requester or of the requester group.
    pub name: String,
    pub mount_policy: String,
    pub comment: String,
    pub creation_log: EntryLog,
    pub last_modification_log: EntryLog,
}

/// A disk system.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskSystem {
    pub name: String,
    pub file_regexp: String,
    pub free_space_query_url: String,
    pub refresh_interval: u64,
    pub targeted_free_space: u64,
    pub sleep_time: u64,
    pub comment: String,
    pub creation_log: EntryLog,
    pub last_modification_log: EntryLog,
}

/// Attributes of a new disk system.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateDiskSystem {
    pub name: String,
    pub file_regexp: String,
    pub free_space_query_url: String,
    pub refresh_interval: u64,
    pub targeted_free_space: u64,
    pub sleep_time: u64,
    pub comment: String,
}

/// The fair share weight of a retrieve activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityFairShareWeight {
    pub disk_instance: String,
    pub activity: String,
    pub weight: f64,
    pub comment: String,
    pub creation_log: EntryLog,
    pub last_modification_log: EntryLog,
}

/// Disk-side metadata of an archived file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskFileInfo {
    pub path: String,
    pub owner_uid: u32,
    pub gid: u32,
}

/// A tape copy of an archived file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TapeFile {
    pub vid: String,
    pub fseq: u64,
    pub block_id: u64,
    pub file_size: u64,
    pub copy_nb: u64,
    pub creation_time: DateTime<Utc>,
    pub superseded_by_vid: Option<String>,
    pub superseded_by_fseq: Option<u64>,
}

impl TapeFile {
    pub fn is_superseded(&self) -> bool {
        self.superseded_by_vid.is_some()
    }
}

/// An archived file and its tape copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveFile {
    pub archive_file_id: u64,
    pub disk_instance: String,
    pub disk_file_id: String,
    pub disk_file_info: DiskFileInfo,
    pub file_size: u64,
    pub checksum_blob: ChecksumBlob,
    pub storage_class: String,
    pub creation_time: DateTime<Utc>,
    pub reconciliation_time: DateTime<Utc>,

    /// Tape copies, sorted by copy number then by creation.
    pub tape_files: Vec<TapeFile>,
}

impl ArchiveFile {
    /// Returns the live copy with the given copy number.
    pub fn live_copy(&self, copy_nb: u64) -> Option<&TapeFile> {
        self.tape_files
            .iter()
            .find(|tf| tf.copy_nb == copy_nb && !tf.is_superseded())
    }
}

/// A file copy just written to tape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapeFileWritten {
    pub archive_file_id: u64,
    pub disk_instance: String,
    pub disk_file_id: String,
    pub disk_file_path: String,
    pub disk_file_owner_uid: u32,
    pub disk_file_gid: u32,
    pub size: u64,
    pub checksum_blob: ChecksumBlob,
    pub storage_class_name: String,
    pub vid: String,
    pub fseq: u64,
    pub block_id: u64,
    pub copy_nb: u64,
    pub tape_drive: String,
}

/// An fSeq consumed on tape without a catalogued file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapePlaceholderWritten {
    pub vid: String,
    pub fseq: u64,
    pub tape_drive: String,
}

/// Something written to tape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapeItemWritten {
    File(TapeFileWritten),
    Placeholder(TapePlaceholderWritten),
}

impl TapeItemWritten {
    pub fn vid(&self) -> &str {
        match self {
            Self::File(f) => &f.vid,
            Self::Placeholder(p) => &p.vid,
        }
    }

    pub fn fseq(&self) -> u64 {
        match self {
            Self::File(f) => f.fseq,
            Self::Placeholder(p) => p.fseq,
        }
    }

    pub fn tape_drive(&self) -> &str {
        match self {
            Self::File(f) => &f.tape_drive,
            Self::Placeholder(p) => &p.tape_drive,
        }
    }
}

impl From<TapeFileWritten> for TapeItemWritten {
    fn from(file: TapeFileWritten) -> Self {
        Self::File(file)
    }
}

impl From<TapePlaceholderWritten> for TapeItemWritten {
    fn from(placeholder: TapePlaceholderWritten) -> Self {
        Self::Placeholder(placeholder)
    }
}

/// What an archive request needs to be queued.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveFileQueueCriteria {
    /// Destination tape pool of each copy number.
    pub copy_to_pool_map: BTreeMap<u64, String>,

    /// Number of copies the storage class requires.
    pub nb_copies: u64,

    pub mount_policy: MountPolicy,
}

/// What a retrieve request needs to be queued.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrieveFileQueueCriteria {
    /// The file, carrying only the copies it can be retrieved from.
    pub archive_file: ArchiveFile,

    pub mount_policy: MountPolicy,

    /// The activity of the request and its fair share weight, when one
    /// is configured.
    pub activity: Option<(String, f64)>,
}

/// Criteria to select archived files by. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TapeFileSearchCriteria {
    pub archive_file_id: Option<u64>,
    pub disk_instance: Option<String>,
    pub vid: Option<String>,

    /// Disk file IDs, only meaningful together with a disk instance.
    pub disk_file_ids: Option<Vec<String>>,
}

/// A deleted tape copy with the metadata of its archived file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecycleLog {
    pub vid: String,
    pub fseq: u64,
    pub block_id: u64,
    pub copy_nb: u64,
    pub tape_file_creation_time: DateTime<Utc>,
    pub archive_file_id: u64,
    pub disk_instance: String,
    pub disk_file_id: String,
    pub disk_file_info: DiskFileInfo,
    pub size_in_bytes: u64,
    pub checksum_blob: ChecksumBlob,
    pub storage_class: String,
    pub archive_file_creation_time: DateTime<Utc>,
    pub reconciliation_time: DateTime<Utc>,
    pub reason_log: String,
    pub recycle_log_time: DateTime<Utc>,
}

/// Criteria to select recycle log entries by. Unset criteria match
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecycleTapeFileSearchCriteria {
    pub vid: Option<String>,
    pub disk_instance: Option<String>,

    /// Disk file IDs, only meaningful together with a disk instance.
    pub disk_file_ids: Option<Vec<String>>,
    pub archive_file_id: Option<u64>,
    pub copy_nb: Option<u64>,
}

/// Totals over a set of tape copies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveFileSummary {
    pub total_bytes: u64,
    pub total_files: u64,
}

/// The version of the catalogue schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
}
