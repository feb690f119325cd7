use super::*;

use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test]
async fn test_archive_file_ids() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    let mut ids = Vec::new();
    for _ in 0..10 {
        let id = catalogue
            .check_and_get_next_archive_file_id(DISK_INSTANCE, STORAGE_CLASS, &requester())
            .await
            .unwrap();
        ids.push(id);
    }

    let unique: HashSet<u64> = ids.iter().copied().collect();
    assert_eq!(10, unique.len());
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(!ids.contains(&0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_archive_file_ids() {
    // Allocations race on separate connections to the same database
    let (catalogue, path) = catalogue_on_file("archive-file-ids", 4).await;
    let catalogue = Arc::new(catalogue);
    populate(&catalogue).await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let catalogue = catalogue.clone();
        handles.push(tokio::spawn(async move {
            let mut ids = Vec::new();
            for _ in 0..25 {
                let id = catalogue
                    .check_and_get_next_archive_file_id(
                        DISK_INSTANCE,
                        STORAGE_CLASS,
                        &requester(),
                    )
                    .await
                    .unwrap();
                ids.push(id);
            }
            ids
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        for id in handle.await.unwrap() {
            assert!(ids.insert(id), "ID {} was handed out twice", id);
        }
    }
    assert_eq!(100, ids.len());

    catalogue.database().await.unwrap().clone().close().await.unwrap();
    remove_database_file(&path);
}

#[tokio::test]
async fn test_no_archive_route() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    catalogue
        .create_storage_class(&admin(), DISK_INSTANCE, "unrouted", 1, "No routes")
        .await
        .unwrap();

    for storage_class in ["unrouted", "missing"] {
        let e = catalogue
            .check_and_get_next_archive_file_id(DISK_INSTANCE, storage_class, &requester())
            .await
            .unwrap_err();
        assert!(matches!(e, CatalogueError::NoArchiveRoute { .. }));
        assert_eq!(ErrorKind::PolicyResolution, e.kind());

        let e = catalogue
            .get_archive_file_queue_criteria(DISK_INSTANCE, storage_class, &requester())
            .await
            .unwrap_err();
        assert!(matches!(e, CatalogueError::NoArchiveRoute { .. }));
    }
}

#[tokio::test]
async fn test_archive_file_queue_criteria() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    let criteria = catalogue
        .get_archive_file_queue_criteria(DISK_INSTANCE, STORAGE_CLASS, &requester())
        .await
        .unwrap();

    assert_eq!(2, criteria.nb_copies);
    assert_eq!(Some(&POOL_1.to_string()), criteria.copy_to_pool_map.get(&1));
    assert_eq!(Some(&POOL_2.to_string()), criteria.copy_to_pool_map.get(&2));
    assert_eq!("group_policy", criteria.mount_policy.name);

    catalogue
        .delete_archive_route(DISK_INSTANCE, STORAGE_CLASS, 2)
        .await
        .unwrap();

    let e = catalogue
        .get_archive_file_queue_criteria(DISK_INSTANCE, STORAGE_CLASS, &requester())
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::WrongNumberOfArchiveRoutes {
            expected: 2,
            actual: 1,
            ..
        }
    ));

    // One route is enough to allocate an ID
    catalogue
        .check_and_get_next_archive_file_id(DISK_INSTANCE, STORAGE_CLASS, &requester())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_mount_rule_precedence() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;
    let admin = admin();

    catalogue
        .create_mount_policy(&admin, &create_mount_policy("requester_policy", 9))
        .await
        .unwrap();
    catalogue
        .create_requester_mount_rule(
            &admin,
            "requester_policy",
            DISK_INSTANCE,
            &requester().name,
            "Requester rule",
        )
        .await
        .unwrap();

    let resolve = |requester: RequesterIdentity| {
        let catalogue = &catalogue;
        async move {
            catalogue
                .get_archive_file_queue_criteria(DISK_INSTANCE, STORAGE_CLASS, &requester)
                .await
                .map(|criteria| criteria.mount_policy.name)
        }
    };

    // The requester rule wins over the group rule
    assert_eq!("requester_policy", resolve(requester()).await.unwrap());

    // Another member of the group
    assert_eq!(
        "group_policy",
        resolve(RequesterIdentity::new("bob", &requester().group))
            .await
            .unwrap()
    );

    // A requester rule never applies to a group of the same name
    let e = resolve(RequesterIdentity::new("carol", &requester().name))
        .await
        .unwrap_err();
    assert!(matches!(e, CatalogueError::NoMountRule { .. }));

    // Rules are scoped to their disk instance
    catalogue
        .create_storage_class(&admin, "other", STORAGE_CLASS, 1, "Other instance")
        .await
        .unwrap();
    catalogue
        .create_archive_route(&admin, "other", STORAGE_CLASS, 1, POOL_1, "Copy 1")
        .await
        .unwrap();
    let e = catalogue
        .check_and_get_next_archive_file_id("other", STORAGE_CLASS, &requester())
        .await
        .unwrap_err();
    assert!(matches!(e, CatalogueError::NoMountRule { .. }));

    catalogue
        .modify_requester_mount_rule_policy(&admin, DISK_INSTANCE, &requester().name, "group_policy")
        .await
        .unwrap();
    assert_eq!("group_policy", resolve(requester()).await.unwrap());
}

#[tokio::test]
async fn test_no_mount_rule_allocates_nothing() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    let stranger = RequesterIdentity::new("mallory", "outsiders");

    let e = catalogue
        .check_and_get_next_archive_file_id(DISK_INSTANCE, STORAGE_CLASS, &stranger)
        .await
        .unwrap_err();
    assert!(matches!(e, CatalogueError::NoMountRule { .. }));

    let first = catalogue
        .check_and_get_next_archive_file_id(DISK_INSTANCE, STORAGE_CLASS, &requester())
        .await
        .unwrap();
    assert_eq!(1, first);
}

#[tokio::test]
async fn test_prepare_to_retrieve_file() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;
    let admin = admin();

    archive_both_copies(&catalogue, 1, 1).await;

    catalogue
        .create_activities_fair_share_weight(&admin, DISK_INSTANCE, "Reprocessing", 0.5, "Heavy")
        .await
        .unwrap();

    let criteria = catalogue
        .prepare_to_retrieve_file(DISK_INSTANCE, 1, &requester(), Some("Reprocessing"))
        .await
        .unwrap();
    assert_eq!(2, criteria.archive_file.tape_files.len());
    assert_eq!("group_policy", criteria.mount_policy.name);
    assert_eq!(Some(("Reprocessing".to_string(), 0.5)), criteria.activity);

    let criteria = catalogue
        .prepare_to_retrieve_file(DISK_INSTANCE, 1, &requester(), Some("Unweighted"))
        .await
        .unwrap();
    assert_eq!(None, criteria.activity);

    catalogue
        .set_tape_disabled(&admin, VID_1, true)
        .await
        .unwrap();

    let criteria = catalogue
        .prepare_to_retrieve_file(DISK_INSTANCE, 1, &requester(), None)
        .await
        .unwrap();
    let vids: Vec<&str> = criteria
        .archive_file
        .tape_files
        .iter()
        .map(|tf| tf.vid.as_str())
        .collect();
    assert_eq!(vec![VID_2], vids);

    catalogue
        .set_tape_disabled(&admin, VID_2, true)
        .await
        .unwrap();

    let e = catalogue
        .prepare_to_retrieve_file(DISK_INSTANCE, 1, &requester(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::NoEligibleCopy { archive_file_id: 1 }
    ));

    let e = catalogue
        .prepare_to_retrieve_file("other", 1, &requester(), None)
        .await
        .unwrap_err();
    assert!(matches!(e, CatalogueError::DiskInstanceMismatch { .. }));

    let e = catalogue
        .prepare_to_retrieve_file(DISK_INSTANCE, 42, &requester(), None)
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Referential, e.kind());
}

#[tokio::test]
async fn test_retrieve_skips_superseded_copies() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;
    let admin = admin();

    catalogue
        .create_tape(&admin, &create_tape("V00003", POOL_1))
        .await
        .unwrap();
    catalogue.tape_labelled("V00003", DRIVE).await.unwrap();

    catalogue
        .files_written_to_tape(&[file_written(1, VID_1, 1, 1).into()])
        .await
        .unwrap();
    catalogue
        .files_written_to_tape(&[file_written(1, "V00003", 1, 1).into()])
        .await
        .unwrap();

    let criteria = catalogue
        .prepare_to_retrieve_file(DISK_INSTANCE, 1, &requester(), None)
        .await
        .unwrap();
    assert_eq!(1, criteria.archive_file.tape_files.len());
    assert_eq!("V00003", criteria.archive_file.tape_files[0].vid);
}
