use super::*;

use futures::TryStreamExt;

use crate::types::RecycleTapeFileSearchCriteria;
use crate::DELETED_FROM_DISK_INSTANCE;

async fn recycled(
    catalogue: &Catalogue,
    criteria: &RecycleTapeFileSearchCriteria,
) -> Vec<types::FileRecycleLog> {
    catalogue
        .get_file_recycle_log_itor(criteria)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap()
}

fn copy_of(archive_file_id: u64, copy_nb: u64) -> RecycleTapeFileSearchCriteria {
    RecycleTapeFileSearchCriteria {
        archive_file_id: Some(archive_file_id),
        copy_nb: Some(copy_nb),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_deleted_file_is_restorable() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    archive_both_copies(&catalogue, 1, 1).await;
    catalogue.delete_archive_file(DISK_INSTANCE, 1).await.unwrap();

    let entries = recycled(&catalogue, &RecycleTapeFileSearchCriteria::default()).await;
    assert_eq!(2, entries.len());

    let entry = entries.iter().find(|entry| entry.copy_nb == 1).unwrap();
    assert_eq!(VID_1, entry.vid);
    assert_eq!(1, entry.fseq);
    assert_eq!(100, entry.block_id);
    assert_eq!(DISK_INSTANCE, entry.disk_instance);
    assert_eq!("disk_file_1", entry.disk_file_id);
    assert_eq!("/eos/dev/file_1", entry.disk_file_info.path);
    assert_eq!(1000, entry.size_in_bytes);
    assert_eq!(checksum(1), entry.checksum_blob);
    assert_eq!(STORAGE_CLASS, entry.storage_class);
    assert_eq!(DELETED_FROM_DISK_INSTANCE, entry.reason_log);

    // The file comes back under its new disk file ID
    catalogue
        .restore_file_in_recycle_log(&copy_of(1, 1), Some("disk_file_1_restored"))
        .await
        .unwrap();

    let file = catalogue.get_archive_file_by_id(1).await.unwrap();
    assert_eq!("disk_file_1_restored", file.disk_file_id);
    assert_eq!(checksum(1), file.checksum_blob);
    assert_eq!(STORAGE_CLASS, file.storage_class);
    assert_eq!(1, file.tape_files.len());

    let copy = file.live_copy(1).unwrap();
    assert_eq!(VID_1, copy.vid);
    assert_eq!(1, copy.fseq);
    assert_eq!(1, catalogue.get_nb_files_on_tape(VID_1).await.unwrap());

    // The second copy joins the restored file
    catalogue
        .restore_file_in_recycle_log(&copy_of(1, 2), None)
        .await
        .unwrap();

    let file = catalogue.get_archive_file_by_id(1).await.unwrap();
    assert_eq!("disk_file_1_restored", file.disk_file_id);
    assert_eq!(VID_2, file.live_copy(2).unwrap().vid);

    assert!(recycled(&catalogue, &RecycleTapeFileSearchCriteria::default())
        .await
        .is_empty());

    // Restored copies are retrievable again
    let retrieve = catalogue
        .prepare_to_retrieve_file(DISK_INSTANCE, 1, &requester(), None)
        .await
        .unwrap();
    assert_eq!(2, retrieve.archive_file.tape_files.len());
}

#[tokio::test]
async fn test_restore_errors() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    archive_both_copies(&catalogue, 1, 1).await;
    catalogue.delete_archive_file(DISK_INSTANCE, 1).await.unwrap();

    // Two copies match
    let e = catalogue
        .restore_file_in_recycle_log(
            &RecycleTapeFileSearchCriteria {
                archive_file_id: Some(1),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::User, e.kind());

    // None matches
    let e = catalogue
        .restore_file_in_recycle_log(&copy_of(2, 1), None)
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::User, e.kind());

    let e = catalogue
        .restore_file_in_recycle_log(&copy_of(1, 1), Some(""))
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::EmptyField {
            field: "new_disk_file_id"
        }
    ));

    // Nothing was restored by the failed attempts
    assert!(catalogue.get_archive_file_by_id(1).await.is_err());
    assert_eq!(
        2,
        recycled(&catalogue, &RecycleTapeFileSearchCriteria::default())
            .await
            .len()
    );

    // Copy 1 is written again before the old one is restored
    catalogue
        .create_tape(&admin(), &create_tape("V00003", POOL_1))
        .await
        .unwrap();
    catalogue.tape_labelled("V00003", DRIVE).await.unwrap();
    catalogue
        .files_written_to_tape(&[file_written(1, "V00003", 1, 1).into()])
        .await
        .unwrap();

    let e = catalogue
        .restore_file_in_recycle_log(&copy_of(1, 1), None)
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::User, e.kind());

    let file = catalogue.get_archive_file_by_id(1).await.unwrap();
    assert_eq!(1, file.tape_files.len());
    assert_eq!("V00003", file.live_copy(1).unwrap().vid);

    // Copy 2 is still missing and can be restored
    catalogue
        .restore_file_in_recycle_log(&copy_of(1, 2), None)
        .await
        .unwrap();
    assert_eq!(2, catalogue.get_archive_file_by_id(1).await.unwrap().tape_files.len());
}

#[tokio::test]
async fn test_delete_tape_file_copy() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    archive_both_copies(&catalogue, 1, 1).await;

    let e = catalogue
        .delete_tape_file_copy("other", 1, VID_2, "Damaged tape")
        .await
        .unwrap_err();
    assert!(matches!(e, CatalogueError::DiskInstanceMismatch { .. }));

    let e = catalogue
        .delete_tape_file_copy(DISK_INSTANCE, 2, VID_2, "Damaged tape")
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::NotFound {
            entity: EntityType::ArchiveFile,
            ..
        }
    ));

    let e = catalogue
        .delete_tape_file_copy(DISK_INSTANCE, 1, VID_2, "")
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Validation, e.kind());

    catalogue
        .delete_tape_file_copy(DISK_INSTANCE, 1, VID_2, "Damaged tape")
        .await
        .unwrap();

    let file = catalogue.get_archive_file_by_id(1).await.unwrap();
    assert_eq!(1, file.tape_files.len());
    assert_eq!(VID_1, file.tape_files[0].vid);
    assert_eq!(0, catalogue.get_nb_files_on_tape(VID_2).await.unwrap());

    let entries = recycled(
        &catalogue,
        &RecycleTapeFileSearchCriteria {
            vid: Some(VID_2.to_string()),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(1, entries.len());
    assert_eq!("Damaged tape", entries[0].reason_log);
    assert_eq!(2, entries[0].copy_nb);

    // No copy left on the tape
    let e = catalogue
        .delete_tape_file_copy(DISK_INSTANCE, 1, VID_2, "Damaged tape")
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::User, e.kind());

    // Deleting the file now only recycles the copy it still has
    catalogue.delete_archive_file(DISK_INSTANCE, 1).await.unwrap();
    assert_eq!(
        2,
        recycled(&catalogue, &RecycleTapeFileSearchCriteria::default())
            .await
            .len()
    );
}

#[tokio::test]
async fn test_recycle_log_listing() {
    let catalogue = catalogue_with_page_size(2).await;
    populate(&catalogue).await;

    for i in 1..=3 {
        archive_both_copies(&catalogue, i, i).await;
        catalogue.delete_archive_file(DISK_INSTANCE, i).await.unwrap();
    }

    let all = recycled(&catalogue, &RecycleTapeFileSearchCriteria::default()).await;
    assert_eq!(6, all.len());
    let ids: Vec<u64> = all.iter().map(|entry| entry.archive_file_id).collect();
    assert_eq!(vec![1, 1, 2, 2, 3, 3], ids);

    let on_vid_1 = recycled(
        &catalogue,
        &RecycleTapeFileSearchCriteria {
            vid: Some(VID_1.to_string()),
            ..Default::default()
        },
    )
    .await;
    let fseqs: Vec<u64> = on_vid_1.iter().map(|entry| entry.fseq).collect();
    assert_eq!(vec![1, 2, 3], fseqs);

    let by_disk_file_id = recycled(
        &catalogue,
        &RecycleTapeFileSearchCriteria {
            disk_instance: Some(DISK_INSTANCE.to_string()),
            disk_file_ids: Some(vec!["disk_file_2".to_string()]),
            copy_nb: Some(2),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(1, by_disk_file_id.len());
    assert_eq!(VID_2, by_disk_file_id[0].vid);

    let other_instance = recycled(
        &catalogue,
        &RecycleTapeFileSearchCriteria {
            disk_instance: Some("other".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert!(other_instance.is_empty());

    let e = catalogue
        .get_file_recycle_log_itor(&RecycleTapeFileSearchCriteria {
            disk_file_ids: Some(vec!["disk_file_1".to_string()]),
            ..Default::default()
        })
        .await
        .err()
        .unwrap();
    assert_eq!(ErrorKind::User, e.kind());

    let e = catalogue
        .get_file_recycle_log_itor(&RecycleTapeFileSearchCriteria {
            vid: Some("V99999".to_string()),
            ..Default::default()
        })
        .await
        .err()
        .unwrap();
    assert!(matches!(
        e,
        CatalogueError::NotFound {
            entity: EntityType::Tape,
            ..
        }
    ));

    let e = catalogue
        .get_file_recycle_log_itor(&copy_of(1, 0))
        .await
        .err()
        .unwrap();
    assert!(matches!(e, CatalogueError::ZeroField { field: "copy_nb" }));
}

#[tokio::test]
async fn test_purging() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    archive_both_copies(&catalogue, 1, 1).await;
    archive_both_copies(&catalogue, 2, 2).await;
    catalogue.delete_archive_file(DISK_INSTANCE, 1).await.unwrap();
    catalogue.delete_archive_file(DISK_INSTANCE, 2).await.unwrap();

    // Entries keep an emptied tape from being deleted
    let e = catalogue.delete_tape(VID_1).await.unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::NotEmpty {
            entity: EntityType::Tape,
            ..
        }
    ));

    catalogue.delete_files_from_recycle_log(VID_1).await.unwrap();
    catalogue.delete_files_from_recycle_log(VID_1).await.unwrap();

    let left = recycled(&catalogue, &RecycleTapeFileSearchCriteria::default()).await;
    assert_eq!(2, left.len());
    assert!(left.iter().all(|entry| entry.vid == VID_2));

    catalogue.delete_tape(VID_1).await.unwrap();

    catalogue.delete_file_from_recycle_log(1).await.unwrap();
    catalogue.delete_file_from_recycle_log(1).await.unwrap();

    let left = recycled(&catalogue, &RecycleTapeFileSearchCriteria::default()).await;
    assert_eq!(1, left.len());
    assert_eq!(2, left[0].archive_file_id);

    let e = catalogue.delete_file_from_recycle_log(0).await.unwrap_err();
    assert_eq!(ErrorKind::Validation, e.kind());
}
