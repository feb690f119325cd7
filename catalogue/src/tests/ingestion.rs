use super::*;

use tapecat::checksum::ChecksumType;

#[tokio::test]
async fn test_files_written_to_tape() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    archive_both_copies(&catalogue, 1, 1).await;

    let file = catalogue.get_archive_file_by_id(1).await.unwrap();
    assert_eq!(DISK_INSTANCE, file.disk_instance);
    assert_eq!("disk_file_1", file.disk_file_id);
    assert_eq!("/eos/dev/file_1", file.disk_file_info.path);
    assert_eq!(1000, file.file_size);
    assert_eq!(checksum(1), file.checksum_blob);
    assert_eq!(STORAGE_CLASS, file.storage_class);
    assert_eq!(2, file.tape_files.len());

    let copy = file.live_copy(2).unwrap();
    assert_eq!(VID_2, copy.vid);
    assert_eq!(1, copy.fseq);
    assert_eq!(100, copy.block_id);

    let tape = get_tape(&catalogue, VID_1).await;
    assert_eq!(1, tape.last_fseq);
    assert_eq!(1000, tape.data_on_tape_in_bytes);
    assert_eq!(1, tape.nb_physical_files);
    assert_eq!(Some(DRIVE), tape.last_write_log.as_ref().map(|log| log.drive.as_str()));

    // Drives do not count as administrators
    assert_eq!(tape.creation_log, tape.last_modification_log);
}

#[tokio::test]
async fn test_placeholders_consume_fseqs() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    catalogue
        .files_written_to_tape(&[
            file_written(1, VID_1, 3, 1).into(),
            placeholder(VID_1, 1),
            placeholder(VID_1, 2),
        ])
        .await
        .unwrap();

    let tape = get_tape(&catalogue, VID_1).await;
    assert_eq!(3, tape.last_fseq);
    assert_eq!(1, tape.nb_physical_files);
    assert_eq!(1000, tape.data_on_tape_in_bytes);

    let file = catalogue.get_archive_file_by_id(1).await.unwrap();
    assert_eq!(3, file.live_copy(1).unwrap().fseq);
}

#[tokio::test]
async fn test_fseq_gap() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    let e = catalogue
        .files_written_to_tape(&[file_written(1, VID_1, 2, 1).into()])
        .await
        .unwrap_err();

    assert!(matches!(
        e,
        CatalogueError::TapeFseqMismatch {
            expected: 1,
            actual: 2,
            ..
        }
    ));
    assert_eq!(ErrorKind::IngestionConsistency, e.kind());

    assert_eq!(0, get_tape(&catalogue, VID_1).await.last_fseq);
    assert_eq!(
        ErrorKind::Referential,
        catalogue.get_archive_file_by_id(1).await.unwrap_err().kind()
    );
}

#[tokio::test]
async fn test_repeated_fseq() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    catalogue
        .files_written_to_tape(&[file_written(1, VID_1, 1, 1).into()])
        .await
        .unwrap();

    let e = catalogue
        .files_written_to_tape(&[file_written(2, VID_1, 1, 1).into()])
        .await
        .unwrap_err();

    assert!(matches!(
        e,
        CatalogueError::TapeFseqMismatch {
            expected: 2,
            actual: 1,
            ..
        }
    ));
}

#[tokio::test]
async fn test_rejected_batch_leaves_no_trace() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    // The copy on the second tape skips an fSeq
    let e = catalogue
        .files_written_to_tape(&[
            file_written(1, VID_1, 1, 1).into(),
            file_written(1, VID_2, 2, 2).into(),
        ])
        .await
        .unwrap_err();
    assert_eq!("TapeFseqMismatch", e.name());

    let tape = get_tape(&catalogue, VID_1).await;
    assert_eq!(0, tape.last_fseq);
    assert_eq!(0, tape.nb_physical_files);
    assert!(catalogue.get_archive_file_by_id(1).await.is_err());

    // The batch can be retried in full
    archive_both_copies(&catalogue, 1, 1).await;
    assert_eq!(2, catalogue.get_archive_file_by_id(1).await.unwrap().tape_files.len());
}

#[tokio::test]
async fn test_file_size_mismatch() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    catalogue
        .files_written_to_tape(&[file_written(1, VID_1, 1, 1).into()])
        .await
        .unwrap();

    let mut second_copy = file_written(1, VID_2, 1, 2);
    second_copy.size = 2000;

    let e = catalogue
        .files_written_to_tape(&[second_copy.into()])
        .await
        .unwrap_err();

    assert!(matches!(
        e,
        CatalogueError::FileSizeMismatch {
            archive_file_id: 1,
            expected: 1000,
            actual: 2000,
            ..
        }
    ));
    assert_eq!(0, get_tape(&catalogue, VID_2).await.last_fseq);
}

#[tokio::test]
async fn test_checksum_mismatch() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    catalogue
        .files_written_to_tape(&[file_written(1, VID_1, 1, 1).into()])
        .await
        .unwrap();

    let mut wrong_value = file_written(1, VID_2, 1, 2);
    wrong_value.checksum_blob = checksum(0xdead);

    let e = catalogue
        .files_written_to_tape(&[wrong_value.into()])
        .await
        .unwrap_err();
    assert!(matches!(e, CatalogueError::ChecksumValueMismatch { .. }));

    let mut extra_type = file_written(1, VID_2, 1, 2);
    extra_type
        .checksum_blob
        .insert(ChecksumType::Crc32, vec![0, 0, 0, 1])
        .unwrap();

    let e = catalogue
        .files_written_to_tape(&[extra_type.into()])
        .await
        .unwrap_err();
    assert!(matches!(e, CatalogueError::ChecksumTypeMismatch { .. }));
    assert_eq!(ErrorKind::IngestionConsistency, e.kind());

    let file = catalogue.get_archive_file_by_id(1).await.unwrap();
    assert_eq!(1, file.tape_files.len());
}

#[tokio::test]
async fn test_unknown_references() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    let e = catalogue
        .files_written_to_tape(&[file_written(1, "V99999", 1, 1).into()])
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::NotFound {
            entity: EntityType::Tape,
            ..
        }
    ));

    let mut unknown_class = file_written(1, VID_1, 1, 1);
    unknown_class.storage_class_name = "missing".to_string();

    let e = catalogue
        .files_written_to_tape(&[unknown_class.into()])
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::ReferentialViolation {
            entity: EntityType::ArchiveFile,
            target: EntityType::StorageClass,
            ..
        }
    ));
    assert_eq!(0, get_tape(&catalogue, VID_1).await.last_fseq);
}

#[tokio::test]
async fn test_invalid_items() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    let mut no_checksum = file_written(1, VID_1, 1, 1);
    no_checksum.checksum_blob = ChecksumBlob::new();
    let e = catalogue
        .files_written_to_tape(&[no_checksum.into()])
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::EmptyField {
            field: "checksum_blob"
        }
    ));

    let e = catalogue
        .files_written_to_tape(&[file_written(1, VID_1, 1, 0).into()])
        .await
        .unwrap_err();
    assert!(matches!(e, CatalogueError::ZeroField { field: "copy_nb" }));

    let e = catalogue
        .files_written_to_tape(&[placeholder(VID_1, 0)])
        .await
        .unwrap_err();
    assert!(matches!(e, CatalogueError::ZeroField { field: "fseq" }));

    // Nothing to do
    catalogue.files_written_to_tape(&[]).await.unwrap();
}

#[tokio::test]
async fn test_new_copy_supersedes_old_one() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;
    let admin = admin();

    catalogue
        .create_tape(&admin, &create_tape("V00003", POOL_1))
        .await
        .unwrap();
    catalogue.tape_labelled("V00003", DRIVE).await.unwrap();

    archive_both_copies(&catalogue, 1, 1).await;

    // Repack copy 1 onto the new tape
    catalogue
        .files_written_to_tape(&[file_written(1, "V00003", 1, 1).into()])
        .await
        .unwrap();

    let file = catalogue.get_archive_file_by_id(1).await.unwrap();
    assert_eq!(3, file.tape_files.len());

    let old = file
        .tape_files
        .iter()
        .find(|tf| tf.vid == VID_1)
        .unwrap();
    assert!(old.is_superseded());
    assert_eq!(Some("V00003"), old.superseded_by_vid.as_deref());
    assert_eq!(Some(1), old.superseded_by_fseq);

    assert_eq!("V00003", file.live_copy(1).unwrap().vid);
    assert_eq!(VID_2, file.live_copy(2).unwrap().vid);

    assert_eq!(0, catalogue.get_nb_files_on_tape(VID_1).await.unwrap());
    assert_eq!(1, catalogue.get_nb_files_on_tape("V00003").await.unwrap());

    // The counters of a tape only ever grow
    assert_eq!(1, get_tape(&catalogue, VID_1).await.nb_physical_files);
}

#[tokio::test]
async fn test_rewrite_on_same_tape() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    catalogue
        .files_written_to_tape(&[file_written(1, VID_1, 1, 1).into()])
        .await
        .unwrap();

    // The same copy written again further down the same tape
    catalogue
        .files_written_to_tape(&[file_written(1, VID_1, 2, 1).into()])
        .await
        .unwrap();

    let file = catalogue.get_archive_file_by_id(1).await.unwrap();
    assert_eq!(2, file.tape_files.len());

    let live: Vec<&types::TapeFile> = file
        .tape_files
        .iter()
        .filter(|tf| !tf.is_superseded())
        .collect();
    assert_eq!(1, live.len());
    assert_eq!(2, live[0].fseq);
    assert_eq!(2, file.live_copy(1).unwrap().fseq);

    let old = file.tape_files.iter().find(|tf| tf.fseq == 1).unwrap();
    assert_eq!(Some(VID_1), old.superseded_by_vid.as_deref());
    assert_eq!(Some(2), old.superseded_by_fseq);

    assert_eq!(1, catalogue.get_nb_files_on_tape(VID_1).await.unwrap());
    assert_eq!(2, get_tape(&catalogue, VID_1).await.last_fseq);
}
