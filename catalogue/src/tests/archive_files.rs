use super::*;

use futures::TryStreamExt;

use crate::types::{ArchiveFileSummary, RecycleTapeFileSearchCriteria, TapeFileSearchCriteria};

async fn list(catalogue: &Catalogue, criteria: &TapeFileSearchCriteria) -> Vec<types::ArchiveFile> {
    catalogue
        .get_archive_files_itor(criteria)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap()
}

fn ids(files: &[types::ArchiveFile]) -> Vec<u64> {
    files.iter().map(|file| file.archive_file_id).collect()
}

/// Archives files 1 to `n`, file `i` at fSeq `i` on both tapes, and adds
/// an empty tape to repack to.
async fn populate_files(catalogue: &Catalogue, n: u64) {
    populate(catalogue).await;

    for i in 1..=n {
        archive_both_copies(catalogue, i, i).await;
    }

    catalogue
        .create_tape(&admin(), &create_tape("V00003", POOL_1))
        .await
        .unwrap();
    catalogue.tape_labelled("V00003", DRIVE).await.unwrap();
}

#[tokio::test]
async fn test_listing_pages() {
    // Pages smaller than the listing, with a partial last page
    let catalogue = catalogue_with_page_size(2).await;
    populate_files(&catalogue, 5).await;

    let files = list(&catalogue, &TapeFileSearchCriteria::default()).await;
    assert_eq!(vec![1, 2, 3, 4, 5], ids(&files));
    assert!(files.iter().all(|file| file.tape_files.len() == 2));

    // Exactly a multiple of the page size
    catalogue.delete_archive_file(DISK_INSTANCE, 5).await.unwrap();
    let files = list(&catalogue, &TapeFileSearchCriteria::default()).await;
    assert_eq!(vec![1, 2, 3, 4], ids(&files));
}

#[tokio::test]
async fn test_listing_criteria() {
    let catalogue = catalogue().await;
    populate_files(&catalogue, 3).await;

    catalogue
        .files_written_to_tape(&[file_written(1, "V00003", 1, 1).into()])
        .await
        .unwrap();

    let on_vid_1 = list(
        &catalogue,
        &TapeFileSearchCriteria {
            vid: Some(VID_1.to_string()),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(vec![1, 2, 3], ids(&on_vid_1));
    assert!(on_vid_1
        .iter()
        .all(|file| file.tape_files.len() == 1 && file.tape_files[0].vid == VID_1));
    assert!(on_vid_1[0].tape_files[0].is_superseded());

    let on_new_tape = list(
        &catalogue,
        &TapeFileSearchCriteria {
            vid: Some("V00003".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(vec![1], ids(&on_new_tape));

    let by_disk_file_id = list(
        &catalogue,
        &TapeFileSearchCriteria {
            disk_instance: Some(DISK_INSTANCE.to_string()),
            disk_file_ids: Some(vec!["disk_file_2".to_string(), "disk_file_3".to_string()]),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(vec![2, 3], ids(&by_disk_file_id));

    let by_id = list(
        &catalogue,
        &TapeFileSearchCriteria {
            archive_file_id: Some(1),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(vec![1], ids(&by_id));
    assert_eq!(3, by_id[0].tape_files.len());

    let other_instance = list(
        &catalogue,
        &TapeFileSearchCriteria {
            disk_instance: Some("other".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert!(other_instance.is_empty());
}

#[tokio::test]
async fn test_invalid_listing_criteria() {
    let catalogue = catalogue().await;
    populate_files(&catalogue, 1).await;

    let e = catalogue
        .get_archive_files_itor(&TapeFileSearchCriteria {
            disk_file_ids: Some(vec!["disk_file_1".to_string()]),
            ..Default::default()
        })
        .await
        .err()
        .unwrap();
    assert_eq!(ErrorKind::User, e.kind());

    let e = catalogue
        .get_archive_files_itor(&TapeFileSearchCriteria {
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
        .get_tape_file_summary(&TapeFileSearchCriteria {
            archive_file_id: Some(42),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::NotFound {
            entity: EntityType::ArchiveFile,
            ..
        }
    ));
}

#[tokio::test]
async fn test_repack_listing() {
    let catalogue = catalogue_with_page_size(2).await;
    populate_files(&catalogue, 5).await;

    catalogue
        .files_written_to_tape(&[file_written(2, "V00003", 1, 1).into()])
        .await
        .unwrap();

    let files: Vec<types::ArchiveFile> = catalogue
        .get_archive_files_for_repack_itor(VID_1, 1)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(vec![1, 3, 4, 5], ids(&files));
    assert!(files
        .iter()
        .all(|file| file.tape_files.len() == 1 && file.tape_files[0].vid == VID_1));

    let files: Vec<types::ArchiveFile> = catalogue
        .get_archive_files_for_repack_itor(VID_1, 4)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(vec![4, 5], ids(&files));

    let files = catalogue.get_files_for_repack(VID_1, 1, 2).await.unwrap();
    assert_eq!(vec![1, 3], ids(&files));
    assert_eq!(3, files[1].tape_files[0].fseq);

    assert!(catalogue
        .get_files_for_repack(VID_1, 1, 0)
        .await
        .unwrap()
        .is_empty());

    let e = catalogue
        .get_files_for_repack("V99999", 1, 10)
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Referential, e.kind());
}

#[tokio::test]
async fn test_repack_listing_two_copies_on_one_tape() {
    let catalogue = catalogue_with_page_size(2).await;
    populate(&catalogue).await;

    catalogue
        .files_written_to_tape(&[
            file_written(1, VID_1, 1, 1).into(),
            file_written(1, VID_1, 2, 2).into(),
            file_written(2, VID_1, 3, 1).into(),
        ])
        .await
        .unwrap();

    let files: Vec<types::ArchiveFile> = catalogue
        .get_archive_files_for_repack_itor(VID_1, 1)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    let fseqs: Vec<u64> = files.iter().map(|file| file.tape_files[0].fseq).collect();
    assert_eq!(vec![1, 2, 3], fseqs);
    assert_eq!(vec![1, 1, 2], ids(&files));
    assert_eq!(2, files[1].tape_files[0].copy_nb);

    let files = catalogue.get_files_for_repack(VID_1, 1, 10).await.unwrap();
    assert_eq!(3, files.len());
    assert_eq!(vec![1, 1, 2], ids(&files));

    // Starting between the two copies of a file
    let files = catalogue.get_files_for_repack(VID_1, 2, 10).await.unwrap();
    assert_eq!(vec![1, 2], ids(&files));
    assert_eq!(2, files[0].tape_files[0].fseq);
}

#[tokio::test]
async fn test_tape_file_summary() {
    let catalogue = catalogue().await;
    populate_files(&catalogue, 3).await;

    let summary = catalogue
        .get_tape_file_summary(&TapeFileSearchCriteria::default())
        .await
        .unwrap();
    assert_eq!(6, summary.total_files);
    assert_eq!(6000, summary.total_bytes);

    catalogue
        .files_written_to_tape(&[file_written(1, "V00003", 1, 1).into()])
        .await
        .unwrap();

    // Superseded copies are not counted
    let summary = catalogue
        .get_tape_file_summary(&TapeFileSearchCriteria {
            vid: Some(VID_1.to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(2, summary.total_files);
    assert_eq!(2000, summary.total_bytes);

    let summary = catalogue
        .get_tape_file_summary(&TapeFileSearchCriteria {
            disk_instance: Some(DISK_INSTANCE.to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(6, summary.total_files);

    let summary = catalogue
        .get_tape_file_summary(&TapeFileSearchCriteria {
            disk_instance: Some("other".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ArchiveFileSummary::default(), summary);
}

#[tokio::test]
async fn test_delete_archive_file() {
    let catalogue = catalogue().await;
    populate_files(&catalogue, 2).await;

    let e = catalogue
        .delete_archive_file("other", 1)
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::User, e.kind());
    assert!(catalogue.get_archive_file_by_id(1).await.is_ok());

    catalogue.delete_archive_file(DISK_INSTANCE, 1).await.unwrap();

    let e = catalogue.get_archive_file_by_id(1).await.unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::NotFound {
            entity: EntityType::ArchiveFile,
            ..
        }
    ));
    assert_eq!(1, catalogue.get_nb_files_on_tape(VID_1).await.unwrap());

    // Both copies went to the recycle log
    let recycled: Vec<types::FileRecycleLog> = catalogue
        .get_file_recycle_log_itor(&RecycleTapeFileSearchCriteria::default())
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(2, recycled.len());
    assert!(recycled.iter().all(|entry| entry.archive_file_id == 1));

    // Tape counters are left alone
    let tape = get_tape(&catalogue, VID_1).await;
    assert_eq!(2, tape.nb_physical_files);
    assert_eq!(2, tape.last_fseq);

    let e = catalogue
        .delete_archive_file(DISK_INSTANCE, 1)
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Referential, e.kind());
}
