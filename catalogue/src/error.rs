//! Error handling.

use std::error::Error as StdError;

use anyhow::Error as AnyError;
use displaydoc::Display;
use sea_orm::{DbErr, SqlErr};

use tapecat::checksum::Error as ChecksumError;
use tapecat::TapecatError;

pub type CatalogueResult<T> = Result<T, CatalogueError>;

/// An error.
#[derive(Debug, Display)]
pub enum CatalogueError {
    // Validation
    /// Field "{field}" must not be empty.
    EmptyField { field: &'static str },

    /// Field "{field}" must not be zero.
    ZeroField { field: &'static str },

    /// Field "{field}" is out of range: {reason}
    OutOfRange { field: &'static str, reason: String },

    // Referential integrity
    /// The {entity} "{key}" does not exist.
    NotFound { entity: EntityType, key: String },

    /// The {entity} "{key}" cannot reference the {target} "{target_key}" because it does not exist.
    ReferentialViolation {
        entity: EntityType,
        key: String,
        target: EntityType,
        target_key: String,
    },

    // Conflicts
    /// The {entity} "{key}" already exists.
    AlreadyExists { entity: EntityType, key: String },

    // Dependencies
    /// The {entity} "{key}" is not empty: {reason}
    NotEmpty {
        entity: EntityType,
        key: String,
        reason: String,
    },

    /// The {entity} "{key}" is in use: {reason}
    InUse {
        entity: EntityType,
        key: String,
        reason: String,
    },

    // Ingestion consistency
    /// Size mismatch for archive file {archive_file_id} written to {vid} at fSeq {fseq}: catalogued size is {expected} bytes, got {actual}.
    FileSizeMismatch {
        archive_file_id: u64,
        vid: String,
        fseq: u64,
        expected: u64,
        actual: u64,
    },

    /// Checksum type mismatch for archive file {archive_file_id} written to {vid} at fSeq {fseq}: catalogued types are [{expected}], got [{actual}].
    ChecksumTypeMismatch {
        archive_file_id: u64,
        vid: String,
        fseq: u64,
        expected: String,
        actual: String,
    },

    /// Checksum value mismatch for archive file {archive_file_id} written to {vid} at fSeq {fseq}: catalogued {expected}, got {actual}.
    ChecksumValueMismatch {
        archive_file_id: u64,
        vid: String,
        fseq: u64,
        expected: String,
        actual: String,
    },

    /// Out-of-sequence write on tape {vid}: expected fSeq {expected}, got {actual}.
    TapeFseqMismatch {
        vid: String,
        expected: u64,
        actual: u64,
    },

    // Policy resolution
    /// The storage class "{storage_class}" of disk instance "{disk_instance}" has no archive routes.
    NoArchiveRoute {
        disk_instance: String,
        storage_class: String,
    },

    /// The storage class "{storage_class}" of disk instance "{disk_instance}" requires {expected} copies but has {actual} archive routes.
    WrongNumberOfArchiveRoutes {
        disk_instance: String,
        storage_class: String,
        expected: u64,
        actual: u64,
    },

    /// No mount rule applies to requester "{requester}" or group "{group}" of disk instance "{disk_instance}".
    NoMountRule {
        disk_instance: String,
        requester: String,
        group: String,
    },

    /// The archive file {archive_file_id} has no copy on an enabled tape.
    NoEligibleCopy { archive_file_id: u64 },

    /// The archive file {archive_file_id} belongs to disk instance "{expected}", not "{actual}".
    DiskInstanceMismatch {
        archive_file_id: u64,
        expected: String,
        actual: String,
    },

    /// {0}
    UserError(String),

    /// Database error: {0}
    DatabaseError(AnyError),

    /// Error from the common components.
    TapecatError(TapecatError),
}

/// The kind of an error.
///
/// Callers that only care about the broad class of a failure should
/// match on this rather than on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    /// validation error
    Validation,

    /// referential error
    Referential,

    /// conflict
    Conflict,

    /// dependency error
    Dependency,

    /// ingestion consistency error
    IngestionConsistency,

    /// policy resolution error
    PolicyResolution,

    /// user error
    User,

    /// infrastructure error
    Infrastructure,
}

/// A type of catalogued entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum EntityType {
    /// admin user
    AdminUser,

    /// virtual organization
    VirtualOrganization,

    /// storage class
    StorageClass,

    /// tape pool
    TapePool,

    /// archive route
    ArchiveRoute,

    /// logical library
    LogicalLibrary,

    /// media type
    MediaType,

    /// tape
    Tape,

    /// mount policy
    MountPolicy,

    /// requester mount rule
    RequesterMountRule,

    /// requester group mount rule
    RequesterGroupMountRule,

    /// disk system
    DiskSystem,

    /// activity fair share weight
    ActivityFairShareWeight,

    /// archive file
    ArchiveFile,

    /// file recycle log entry
    FileRecycleLog,
}

impl CatalogueError {
    pub fn database_error(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::DatabaseError(AnyError::new(error))
    }

    pub fn not_found(entity: EntityType, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn already_exists(entity: EntityType, key: impl ToString) -> Self {
        Self::AlreadyExists {
            entity,
            key: key.to_string(),
        }
    }

    pub fn referential_violation(
        entity: EntityType,
        key: impl ToString,
        target: EntityType,
        target_key: impl ToString,
    ) -> Self {
        Self::ReferentialViolation {
            entity,
            key: key.to_string(),
            target,
            target_key: target_key.to_string(),
        }
    }

    /// Turns a failed lookup of an entity referenced by another one into a
    /// referential violation of the latter.
    pub fn referenced_by(self, entity: EntityType, key: impl ToString) -> Self {
        match self {
            Self::NotFound {
                entity: target,
                key: target_key,
            } => Self::ReferentialViolation {
                entity,
                key: key.to_string(),
                target,
                target_key,
            },
            e => e,
        }
    }

    pub fn user_error(message: impl Into<String>) -> Self {
        Self::UserError(message.into())
    }

    /// Converts a failed insert or rename into a typed conflict.
    ///
    /// A concurrent writer can slip in between the existence check and the
    /// write, in which case the unique index is what catches it.
    pub fn from_write(error: DbErr, entity: EntityType, key: impl ToString) -> Self {
        match error.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::already_exists(entity, key),
            _ => Self::database_error(error),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyField { .. } | Self::ZeroField { .. } | Self::OutOfRange { .. } => {
                ErrorKind::Validation
            }

            Self::NotFound { .. } | Self::ReferentialViolation { .. } => ErrorKind::Referential,

            Self::AlreadyExists { .. } => ErrorKind::Conflict,

            Self::NotEmpty { .. } | Self::InUse { .. } => ErrorKind::Dependency,

            Self::FileSizeMismatch { .. }
            | Self::ChecksumTypeMismatch { .. }
            | Self::ChecksumValueMismatch { .. }
            | Self::TapeFseqMismatch { .. } => ErrorKind::IngestionConsistency,

            Self::NoArchiveRoute { .. }
            | Self::WrongNumberOfArchiveRoutes { .. }
            | Self::NoMountRule { .. }
            | Self::NoEligibleCopy { .. } => ErrorKind::PolicyResolution,

            Self::DiskInstanceMismatch { .. } | Self::UserError(_) | Self::TapecatError(_) => {
                ErrorKind::User
            }

            Self::DatabaseError(_) => ErrorKind::Infrastructure,
        }
    }

    /// Returns whether the error was caused by the request rather than
    /// by the catalogue's backing store.
    pub fn is_user_error(&self) -> bool {
        self.kind() != ErrorKind::Infrastructure
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::EmptyField { .. } => "EmptyField",
            Self::ZeroField { .. } => "ZeroField",
            Self::OutOfRange { .. } => "OutOfRange",
            Self::NotFound { .. } => "NotFound",
            Self::ReferentialViolation { .. } => "ReferentialViolation",
            Self::AlreadyExists { .. } => "AlreadyExists",
            Self::NotEmpty { .. } => "NotEmpty",
            Self::InUse { .. } => "InUse",
            Self::FileSizeMismatch { .. } => "FileSizeMismatch",
            Self::ChecksumTypeMismatch { .. } => "ChecksumTypeMismatch",
            Self::ChecksumValueMismatch { .. } => "ChecksumValueMismatch",
            Self::TapeFseqMismatch { .. } => "TapeFseqMismatch",
            Self::NoArchiveRoute { .. } => "NoArchiveRoute",
            Self::WrongNumberOfArchiveRoutes { .. } => "WrongNumberOfArchiveRoutes",
            Self::NoMountRule { .. } => "NoMountRule",
            Self::NoEligibleCopy { .. } => "NoEligibleCopy",
            Self::DiskInstanceMismatch { .. } => "DiskInstanceMismatch",
            Self::UserError(_) => "UserError",
            Self::DatabaseError(_) => "DatabaseError",
            Self::TapecatError(e) => e.name(),
        }
    }
}

impl StdError for CatalogueError {}

impl From<TapecatError> for CatalogueError {
    fn from(error: TapecatError) -> Self {
        Self::TapecatError(error)
    }
}

impl From<ChecksumError> for CatalogueError {
    fn from(error: ChecksumError) -> Self {
        Self::TapecatError(error.into())
    }
}
