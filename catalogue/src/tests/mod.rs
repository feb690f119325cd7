use super::*;

mod archive_files;
mod ingestion;
mod queue_criteria;
mod recycle_log;
mod registries;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tapecat::checksum::ChecksumBlob;
use tapecat::identity::{RequesterIdentity, SecurityIdentity};

use crate::types::{
    CreateMediaType, CreateMountPolicy, CreateTape, CreateVirtualOrganization, TapeFileWritten, TapeItemWritten,
    TapePlaceholderWritten,
};

const DISK_INSTANCE: &str = "eosdev";
const STORAGE_CLASS: &str = "dual";
const VO: &str = "atlas";
const POOL_1: &str = "pool_a";
const POOL_2: &str = "pool_b";
const LIBRARY: &str = "library";
const MEDIA_TYPE: &str = "LTO8";
const VID_1: &str = "V00001";
const VID_2: &str = "V00002";
const DRIVE: &str = "drive0";

/// Opens a migrated catalogue on a fresh in-memory database.
async fn catalogue_with_page_size(page_size: u64) -> Catalogue {
    let config = config::load_config_from_str(&format!(
        r#"
        [database]
        url = "sqlite::memory:"
        max-connections = 1

        [archive-file-listing]
        page-size = {}
        "#,
        page_size
    ))
    .expect("Invalid test configuration");

    migrated(config).await
}

/// Opens a migrated catalogue on a fresh database file, shared by several
/// connections.
///
/// The caller removes the returned file when done.
async fn catalogue_on_file(name: &str, max_connections: u32) -> (Catalogue, PathBuf) {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Clock before the epoch")
        .as_nanos();
    let path = std::env::temp_dir().join(format!(
        "tapecat-{}-{}-{}.db",
        name,
        std::process::id(),
        nanos
    ));

    let config = config::load_config_from_str(&format!(
        r#"
        [database]
        url = "sqlite://{}?mode=rwc"
        max-connections = {}
        "#,
        path.display(),
        max_connections
    ))
    .expect("Invalid test configuration");

    (migrated(config).await, path)
}

/// Removes a database file left by [`catalogue_on_file`], along with the
/// journal files SQLite keeps next to it.
fn remove_database_file(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

async fn migrated(config: config::Config) -> Catalogue {
    let catalogue = Catalogue::new(config);
    catalogue
        .run_migrations()
        .await
        .expect("Failed to run migrations");

    catalogue
}

async fn catalogue() -> Catalogue {
    catalogue_with_page_size(1000).await
}

fn admin() -> SecurityIdentity {
    SecurityIdentity::new("admin", "adminhost")
}

fn requester() -> RequesterIdentity {
    RequesterIdentity::new("alice", "physicists")
}

fn checksum(value: u32) -> ChecksumBlob {
    ChecksumBlob::adler32(value)
}

fn create_vo(name: &str) -> CreateVirtualOrganization {
    CreateVirtualOrganization {
        name: name.to_string(),
        read_max_drives: 1,
        write_max_drives: 1,
        max_file_size: 0,
        comment: "Virtual organization".to_string(),
    }
}

fn create_media_type(name: &str) -> CreateMediaType {
    CreateMediaType {
        name: name.to_string(),
        cartridge: "LTO-8".to_string(),
        capacity_in_bytes: 12_000_000_000_000,
        primary_density_code: Some(94),
        nb_wraps: Some(208),
        comment: "Media type".to_string(),
        ..Default::default()
    }
}

fn create_tape(vid: &str, pool: &str) -> CreateTape {
    CreateTape {
        vid: vid.to_string(),
        media_type: MEDIA_TYPE.to_string(),
        vendor: "vendor".to_string(),
        logical_library_name: LIBRARY.to_string(),
        tape_pool_name: pool.to_string(),
        capacity_in_bytes: 12_000_000_000_000,
        full: false,
        disabled: false,
        read_only: false,
        comment: None,
    }
}

fn create_mount_policy(name: &str, archive_priority: u64) -> CreateMountPolicy {
    CreateMountPolicy {
        name: name.to_string(),
        archive_priority,
        archive_min_request_age: 2,
        retrieve_priority: 3,
        retrieve_min_request_age: 4,
        max_drives_allowed: 5,
        comment: "Mount policy".to_string(),
    }
}

fn file_written(archive_file_id: u64, vid: &str, fseq: u64, copy_nb: u64) -> TapeFileWritten {
    TapeFileWritten {
        archive_file_id,
        disk_instance: DISK_INSTANCE.to_string(),
        disk_file_id: format!("disk_file_{}", archive_file_id),
        disk_file_path: format!("/eos/dev/file_{}", archive_file_id),
        disk_file_owner_uid: 1000,
        disk_file_gid: 100,
        size: 1000,
        checksum_blob: checksum(archive_file_id as u32),
        storage_class_name: STORAGE_CLASS.to_string(),
        vid: vid.to_string(),
        fseq,
        block_id: fseq * 100,
        copy_nb,
        tape_drive: DRIVE.to_string(),
    }
}

fn placeholder(vid: &str, fseq: u64) -> TapeItemWritten {
    TapePlaceholderWritten {
        vid: vid.to_string(),
        fseq,
        tape_drive: DRIVE.to_string(),
    }
    .into()
}

/// Creates a dual-copy storage class routed to two pools with one
/// labelled tape each, and a group mount rule for the requester.
async fn populate(catalogue: &Catalogue) {
    let admin = admin();

    catalogue
        .create_virtual_organization(&admin, &create_vo(VO))
        .await
        .unwrap();
    catalogue
        .create_storage_class(&admin, DISK_INSTANCE, STORAGE_CLASS, 2, "Two copies")
        .await
        .unwrap();

    for pool in [POOL_1, POOL_2] {
        catalogue
            .create_tape_pool(&admin, pool, VO, 2, false, None, "Tape pool")
            .await
            .unwrap();
    }

    catalogue
        .create_archive_route(&admin, DISK_INSTANCE, STORAGE_CLASS, 1, POOL_1, "Copy 1")
        .await
        .unwrap();
    catalogue
        .create_archive_route(&admin, DISK_INSTANCE, STORAGE_CLASS, 2, POOL_2, "Copy 2")
        .await
        .unwrap();

    catalogue
        .create_logical_library(&admin, LIBRARY, false, "Logical library")
        .await
        .unwrap();
    catalogue
        .create_media_type(&admin, &create_media_type(MEDIA_TYPE))
        .await
        .unwrap();

    for (vid, pool) in [(VID_1, POOL_1), (VID_2, POOL_2)] {
        catalogue
            .create_tape(&admin, &create_tape(vid, pool))
            .await
            .unwrap();
        catalogue.tape_labelled(vid, DRIVE).await.unwrap();
    }

    catalogue
        .create_mount_policy(&admin, &create_mount_policy("group_policy", 1))
        .await
        .unwrap();
    catalogue
        .create_requester_group_mount_rule(
            &admin,
            "group_policy",
            DISK_INSTANCE,
            &requester().group,
            "Group rule",
        )
        .await
        .unwrap();
}

/// Writes both copies of a file, each at the next fSeq of its tape.
async fn archive_both_copies(catalogue: &Catalogue, archive_file_id: u64, fseq: u64) {
    catalogue
        .files_written_to_tape(&[
            file_written(archive_file_id, VID_1, fseq, 1).into(),
            file_written(archive_file_id, VID_2, fseq, 2).into(),
        ])
        .await
        .unwrap();
}

async fn get_tape(catalogue: &Catalogue, vid: &str) -> types::Tape {
    let vids = BTreeSet::from([vid.to_string()]);

    catalogue
        .get_tapes_by_vid(&vids)
        .await
        .unwrap()
        .remove(vid)
        .expect("Tape not returned")
}

#[tokio::test]
async fn test_ping_and_schema_version() {
    let catalogue = catalogue().await;

    catalogue.ping().await.unwrap();

    let version = catalogue.get_schema_version().await.unwrap();
    assert_eq!(1, version.major);
}
