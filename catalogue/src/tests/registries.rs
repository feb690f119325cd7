use super::*;

use std::collections::BTreeSet;

use sea_orm::DbErr;

use crate::database::exists;
use crate::types::{CreateDiskSystem, TapeSearchCriteria};

#[tokio::test]
async fn test_admin_users() {
    let catalogue = catalogue().await;
    let admin = admin();

    assert!(catalogue.get_admin_users().await.unwrap().is_empty());
    assert!(!catalogue.is_admin(&admin).await.unwrap());

    catalogue
        .create_admin_user(&admin, "admin", "The first admin")
        .await
        .unwrap();

    let users = catalogue.get_admin_users().await.unwrap();
    assert_eq!(1, users.len());

    let user = &users[0];
    assert_eq!("admin", user.name);
    assert_eq!("The first admin", user.comment);
    assert_eq!("admin", user.creation_log.username);
    assert_eq!("adminhost", user.creation_log.host);
    assert_eq!(user.creation_log, user.last_modification_log);

    assert!(catalogue.is_admin(&admin).await.unwrap());

    let e = catalogue
        .create_admin_user(&admin, "admin", "Again")
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::AlreadyExists {
            entity: EntityType::AdminUser,
            ..
        }
    ));

    let other = SecurityIdentity::new("other", "otherhost");
    catalogue
        .modify_admin_user_comment(&other, "admin", "Modified")
        .await
        .unwrap();

    let user = catalogue.get_admin_users().await.unwrap().remove(0);
    assert_eq!("Modified", user.comment);
    assert_eq!("admin", user.creation_log.username);
    assert_eq!("other", user.last_modification_log.username);
    assert_eq!("otherhost", user.last_modification_log.host);

    catalogue.delete_admin_user("admin").await.unwrap();
    assert!(catalogue.get_admin_users().await.unwrap().is_empty());

    let e = catalogue.delete_admin_user("admin").await.unwrap_err();
    assert_eq!(ErrorKind::Referential, e.kind());
}

#[tokio::test]
async fn test_rejected_create_leaves_no_trace() {
    let catalogue = catalogue().await;
    let admin = admin();

    let e = catalogue
        .create_admin_user(&admin, "admin", "")
        .await
        .unwrap_err();
    assert!(matches!(e, CatalogueError::EmptyField { field: "comment" }));
    assert_eq!(ErrorKind::Validation, e.kind());
    assert!(catalogue.get_admin_users().await.unwrap().is_empty());

    let e = catalogue
        .create_storage_class(&admin, DISK_INSTANCE, STORAGE_CLASS, 0, "No copies")
        .await
        .unwrap_err();
    assert!(matches!(e, CatalogueError::ZeroField { field: "nb_copies" }));
    assert!(catalogue.get_storage_classes().await.unwrap().is_empty());

    let e = catalogue
        .create_disk_system(
            &admin,
            &CreateDiskSystem {
                name: "disk".to_string(),
                file_regexp: "^(unclosed".to_string(),
                free_space_query_url: "eos:ctaeos:default".to_string(),
                refresh_interval: 60,
                targeted_free_space: 1_000_000,
                sleep_time: 10,
                comment: "Disk system".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::OutOfRange {
            field: "file_regexp",
            ..
        }
    ));
    assert!(catalogue.get_all_disk_systems().await.unwrap().is_empty());

    let e = catalogue
        .create_activities_fair_share_weight(&admin, DISK_INSTANCE, "Reprocessing", 1.5, "Heavy")
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Validation, e.kind());
    assert!(catalogue
        .get_activities_fair_share_weights()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_virtual_organizations() {
    let catalogue = catalogue().await;
    let admin = admin();

    catalogue
        .create_virtual_organization(&admin, &create_vo("atlas"))
        .await
        .unwrap();
    catalogue
        .create_virtual_organization(&admin, &create_vo("cms"))
        .await
        .unwrap();

    let mut names: Vec<String> = catalogue
        .get_virtual_organizations()
        .await
        .unwrap()
        .into_iter()
        .map(|vo| vo.name)
        .collect();
    names.sort();
    assert_eq!(vec!["atlas", "cms"], names);

    let e = catalogue
        .modify_virtual_organization_name(&admin, "cms", "atlas")
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Conflict, e.kind());

    catalogue
        .modify_virtual_organization_write_max_drives(&admin, "atlas", 4)
        .await
        .unwrap();

    catalogue
        .create_tape_pool(&admin, POOL_1, "atlas", 1, false, None, "Tape pool")
        .await
        .unwrap();

    let vo = catalogue
        .get_virtual_organization_of_tape_pool(POOL_1)
        .await
        .unwrap();
    assert_eq!("atlas", vo.name);
    assert_eq!(4, vo.write_max_drives);

    let e = catalogue
        .delete_virtual_organization("atlas")
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::InUse {
            entity: EntityType::VirtualOrganization,
            ..
        }
    ));

    catalogue.delete_virtual_organization("cms").await.unwrap();
    assert_eq!(1, catalogue.get_virtual_organizations().await.unwrap().len());
}

#[tokio::test]
async fn test_tape_pool_needs_existing_vo() {
    let catalogue = catalogue().await;

    let e = catalogue
        .create_tape_pool(&admin(), POOL_1, "missing", 1, false, None, "Tape pool")
        .await
        .unwrap_err();

    assert!(matches!(
        e,
        CatalogueError::ReferentialViolation {
            entity: EntityType::TapePool,
            target: EntityType::VirtualOrganization,
            ..
        }
    ));
    assert!(catalogue.get_tape_pool(POOL_1).await.unwrap().is_none());
    assert!(!catalogue.tape_pool_exists(POOL_1).await.unwrap());
}

#[tokio::test]
async fn test_tape_pool_occupancy() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    let pool = catalogue.get_tape_pool(POOL_1).await.unwrap().unwrap();
    assert_eq!(1, pool.nb_tapes);
    assert_eq!(12_000_000_000_000, pool.capacity_bytes);
    assert_eq!(0, pool.data_bytes);
    assert_eq!(0, pool.nb_physical_files);

    let mut second_tape = create_tape("V00003", POOL_1);
    second_tape.capacity_in_bytes = 1_000_000;
    catalogue
        .create_tape(&admin(), &second_tape)
        .await
        .unwrap();

    archive_both_copies(&catalogue, 1, 1).await;
    archive_both_copies(&catalogue, 2, 2).await;

    let pools = catalogue.get_tape_pools().await.unwrap();
    assert_eq!(2, pools.len());

    let pool = pools.iter().find(|pool| pool.name == POOL_1).unwrap();
    assert_eq!(VO, pool.vo);
    assert_eq!(2, pool.nb_tapes);
    assert_eq!(12_000_001_000_000, pool.capacity_bytes);
    assert_eq!(2000, pool.data_bytes);
    assert_eq!(2, pool.nb_physical_files);

    let e = catalogue.delete_tape_pool(POOL_1).await.unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::NotEmpty {
            entity: EntityType::TapePool,
            ..
        }
    ));
}

#[tokio::test]
async fn test_empty_tape_pool() {
    let catalogue = catalogue().await;
    let admin = admin();

    catalogue
        .create_virtual_organization(&admin, &create_vo(VO))
        .await
        .unwrap();
    catalogue
        .create_tape_pool(&admin, POOL_1, VO, 3, true, Some("supply"), "Tape pool")
        .await
        .unwrap();

    let pool = catalogue.get_tape_pool(POOL_1).await.unwrap().unwrap();
    assert_eq!(0, pool.nb_tapes);
    assert_eq!(0, pool.capacity_bytes);
    assert!(pool.encryption);
    assert_eq!(Some("supply".to_string()), pool.supply);

    catalogue
        .modify_tape_pool_supply(&admin, POOL_1, None)
        .await
        .unwrap();
    catalogue
        .modify_tape_pool_name(&admin, POOL_1, POOL_2)
        .await
        .unwrap();

    let pool = catalogue.get_tape_pool(POOL_2).await.unwrap().unwrap();
    assert_eq!(None, pool.supply);
    assert!(catalogue.get_tape_pool(POOL_1).await.unwrap().is_none());

    catalogue.delete_tape_pool(POOL_2).await.unwrap();
    assert!(catalogue.get_tape_pools().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_archive_routes() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;
    let admin = admin();

    catalogue
        .create_tape_pool(&admin, "pool_c", VO, 1, false, None, "Tape pool")
        .await
        .unwrap();

    // More copies than the storage class keeps
    let e = catalogue
        .create_archive_route(&admin, DISK_INSTANCE, STORAGE_CLASS, 3, "pool_c", "Copy 3")
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::User, e.kind());

    let e = catalogue
        .create_archive_route(&admin, DISK_INSTANCE, STORAGE_CLASS, 1, "pool_c", "Copy 1")
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::AlreadyExists {
            entity: EntityType::ArchiveRoute,
            ..
        }
    ));

    let e = catalogue
        .create_archive_route(&admin, DISK_INSTANCE, "missing", 1, "pool_c", "Copy 1")
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::ReferentialViolation {
            target: EntityType::StorageClass,
            ..
        }
    ));

    // One pool per copy
    let e = catalogue
        .modify_archive_route_tape_pool_name(&admin, DISK_INSTANCE, STORAGE_CLASS, 2, POOL_1)
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::User, e.kind());

    catalogue
        .modify_archive_route_tape_pool_name(&admin, DISK_INSTANCE, STORAGE_CLASS, 2, "pool_c")
        .await
        .unwrap();

    let mut routes = catalogue
        .get_archive_routes_of_storage_class(DISK_INSTANCE, STORAGE_CLASS)
        .await
        .unwrap();
    routes.sort_by_key(|route| route.copy_nb);
    let pools: Vec<&str> = routes
        .iter()
        .map(|route| route.tape_pool_name.as_str())
        .collect();
    assert_eq!(vec![POOL_1, "pool_c"], pools);

    let e = catalogue
        .delete_storage_class(DISK_INSTANCE, STORAGE_CLASS)
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Dependency, e.kind());

    catalogue
        .delete_archive_route(DISK_INSTANCE, STORAGE_CLASS, 1)
        .await
        .unwrap();
    catalogue
        .delete_archive_route(DISK_INSTANCE, STORAGE_CLASS, 2)
        .await
        .unwrap();
    assert!(catalogue.get_archive_routes().await.unwrap().is_empty());

    catalogue
        .delete_storage_class(DISK_INSTANCE, STORAGE_CLASS)
        .await
        .unwrap();
    assert!(catalogue.get_storage_classes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tapes() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;
    let admin = admin();

    let e = catalogue
        .create_tape(&admin, &create_tape(VID_1, POOL_1))
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Conflict, e.kind());

    let mut missing_library = create_tape("V00009", POOL_1);
    missing_library.logical_library_name = "missing".to_string();
    let e = catalogue
        .create_tape(&admin, &missing_library)
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::ReferentialViolation {
            target: EntityType::LogicalLibrary,
            ..
        }
    ));
    assert!(!catalogue.tape_exists("V00009").await.unwrap());

    let tapes = catalogue
        .get_tapes(&TapeSearchCriteria::default())
        .await
        .unwrap();
    let vids: Vec<&str> = tapes.iter().map(|tape| tape.vid.as_str()).collect();
    assert_eq!(vec![VID_1, VID_2], vids);

    let tape = &tapes[0];
    assert_eq!(POOL_1, tape.tape_pool_name);
    assert_eq!(VO, tape.vo);
    assert_eq!(LIBRARY, tape.logical_library_name);
    assert!(tape.is_labelled());
    assert_eq!(0, tape.last_fseq);
    assert_eq!(tape.creation_log, tape.last_modification_log);

    let in_pool_2 = catalogue
        .get_tapes(&TapeSearchCriteria {
            tape_pool: Some(POOL_2.to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(1, in_pool_2.len());
    assert_eq!(VID_2, in_pool_2[0].vid);

    let e = catalogue
        .get_tapes(&TapeSearchCriteria {
            tape_pool: Some("missing".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Referential, e.kind());

    catalogue
        .modify_tape_comment(&admin, VID_1, Some("Scratch"))
        .await
        .unwrap();
    catalogue
        .modify_tape_tape_pool_name(&admin, VID_1, POOL_2)
        .await
        .unwrap();

    let mut vids: BTreeSet<String> = [VID_1, VID_2].into_iter().map(String::from).collect();
    let by_vid = catalogue.get_tapes_by_vid(&vids).await.unwrap();
    assert_eq!(2, by_vid.len());
    assert_eq!(Some("Scratch".to_string()), by_vid[VID_1].comment);
    assert_eq!(POOL_2, by_vid[VID_1].tape_pool_name);

    let libraries = catalogue.get_vid_to_logical_library(&vids).await.unwrap();
    assert_eq!(Some(&LIBRARY.to_string()), libraries.get(VID_2));

    vids.insert("V00009".to_string());
    let e = catalogue.get_tapes_by_vid(&vids).await.unwrap_err();
    assert_eq!(ErrorKind::Referential, e.kind());

    let e = catalogue.delete_logical_library(LIBRARY).await.unwrap_err();
    assert_eq!(ErrorKind::Dependency, e.kind());

    catalogue.delete_tape(VID_1).await.unwrap();
    assert!(!catalogue.tape_exists(VID_1).await.unwrap());
}

#[tokio::test]
async fn test_delete_tape_with_files() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    archive_both_copies(&catalogue, 1, 1).await;

    let e = catalogue.delete_tape(VID_1).await.unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::NotEmpty {
            entity: EntityType::Tape,
            ..
        }
    ));
    assert_eq!(1, catalogue.get_nb_files_on_tape(VID_1).await.unwrap());
}

#[tokio::test]
async fn test_mount_policies() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;
    let admin = admin();

    let e = catalogue
        .create_mount_policy(&admin, &create_mount_policy("group_policy", 9))
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Conflict, e.kind());

    let e = catalogue
        .delete_mount_policy("group_policy")
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::InUse {
            entity: EntityType::MountPolicy,
            ..
        }
    ));

    catalogue
        .modify_mount_policy_archive_priority(&admin, "group_policy", 7)
        .await
        .unwrap();

    let policies = catalogue.get_mount_policies().await.unwrap();
    assert_eq!(1, policies.len());
    assert_eq!(7, policies[0].archive_priority);
    assert_eq!(5, policies[0].max_drives_allowed);

    let rules = catalogue.get_requester_group_mount_rules().await.unwrap();
    assert_eq!(1, rules.len());
    assert_eq!("group_policy", rules[0].mount_policy);
    assert_eq!(requester().group, rules[0].name);

    let e = catalogue
        .create_requester_group_mount_rule(
            &admin,
            "group_policy",
            DISK_INSTANCE,
            &requester().group,
            "Again",
        )
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Conflict, e.kind());

    catalogue
        .delete_requester_group_mount_rule(DISK_INSTANCE, &requester().group)
        .await
        .unwrap();
    catalogue.delete_mount_policy("group_policy").await.unwrap();
    assert!(catalogue.get_mount_policies().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_disk_systems() {
    let catalogue = catalogue().await;
    let admin = admin();

    let disk_system = CreateDiskSystem {
        name: "disk".to_string(),
        file_regexp: "^/eos/dev/".to_string(),
        free_space_query_url: "eos:ctaeos:default".to_string(),
        refresh_interval: 60,
        targeted_free_space: 1_000_000,
        sleep_time: 10,
        comment: "Disk system".to_string(),
    };

    catalogue
        .create_disk_system(&admin, &disk_system)
        .await
        .unwrap();
    assert!(catalogue.disk_system_exists("disk").await.unwrap());

    let e = catalogue
        .create_disk_system(&admin, &disk_system)
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Conflict, e.kind());

    catalogue
        .modify_disk_system_sleep_time(&admin, "disk", 20)
        .await
        .unwrap();

    let e = catalogue
        .modify_disk_system_sleep_time(&admin, "missing", 20)
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Referential, e.kind());

    let systems = catalogue.get_all_disk_systems().await.unwrap();
    assert_eq!(20, systems[0].sleep_time);

    catalogue.delete_disk_system("disk").await.unwrap();
    assert!(!catalogue.disk_system_exists("disk").await.unwrap());
}

#[tokio::test]
async fn test_activity_weights() {
    let catalogue = catalogue().await;
    let admin = admin();

    catalogue
        .create_activities_fair_share_weight(&admin, DISK_INSTANCE, "Reprocessing", 0.5, "Heavy")
        .await
        .unwrap();

    let e = catalogue
        .create_activities_fair_share_weight(&admin, DISK_INSTANCE, "Reprocessing", 0.2, "Again")
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Conflict, e.kind());

    catalogue
        .modify_activities_fair_share_weight(&admin, DISK_INSTANCE, "Reprocessing", 0.25, "Lighter")
        .await
        .unwrap();

    let weights = catalogue.get_activities_fair_share_weights().await.unwrap();
    assert_eq!(1, weights.len());
    assert_eq!(0.25, weights[0].weight);
    assert_eq!("Lighter", weights[0].comment);

    catalogue
        .delete_activities_fair_share_weight(DISK_INSTANCE, "Reprocessing")
        .await
        .unwrap();

    let e = catalogue
        .delete_activities_fair_share_weight(DISK_INSTANCE, "Reprocessing")
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Referential, e.kind());
}

#[tokio::test]
async fn test_storage_class_used_by_archive_files() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;

    archive_both_copies(&catalogue, 1, 1).await;

    for copy_nb in [1, 2] {
        catalogue
            .delete_archive_route(DISK_INSTANCE, STORAGE_CLASS, copy_nb)
            .await
            .unwrap();
    }

    let e = catalogue
        .delete_storage_class(DISK_INSTANCE, STORAGE_CLASS)
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::InUse {
            entity: EntityType::StorageClass,
            ..
        }
    ));
    assert_eq!(ErrorKind::Dependency, e.kind());

    // The deleted copies still refer to the storage class
    catalogue.delete_archive_file(DISK_INSTANCE, 1).await.unwrap();
    let e = catalogue
        .delete_storage_class(DISK_INSTANCE, STORAGE_CLASS)
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Dependency, e.kind());

    catalogue.delete_file_from_recycle_log(1).await.unwrap();
    catalogue
        .delete_storage_class(DISK_INSTANCE, STORAGE_CLASS)
        .await
        .unwrap();
    assert!(catalogue.get_storage_classes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_storage_class_rename() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;
    let admin = admin();

    catalogue
        .create_storage_class(&admin, DISK_INSTANCE, "single", 1, "One copy")
        .await
        .unwrap();

    let e = catalogue
        .modify_storage_class_name(&admin, DISK_INSTANCE, "single", STORAGE_CLASS)
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::AlreadyExists {
            entity: EntityType::StorageClass,
            ..
        }
    ));

    let e = catalogue
        .modify_storage_class_name(&admin, DISK_INSTANCE, "missing", "renamed")
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::NotFound {
            entity: EntityType::StorageClass,
            ..
        }
    ));

    // Names are scoped by disk instance
    catalogue
        .create_storage_class(&admin, "other", STORAGE_CLASS, 1, "Elsewhere")
        .await
        .unwrap();

    catalogue
        .modify_storage_class_name(&admin, DISK_INSTANCE, "single", "renamed")
        .await
        .unwrap();
    let renamed = catalogue
        .get_storage_class(DISK_INSTANCE, "renamed")
        .await
        .unwrap();
    assert_eq!(1, renamed.nb_copies);
    assert_eq!("admin", renamed.last_modification_log.username);

    let e = catalogue
        .get_storage_class(DISK_INSTANCE, "single")
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Referential, e.kind());

    // Routes follow the rename
    catalogue
        .modify_storage_class_name(&admin, DISK_INSTANCE, STORAGE_CLASS, "double")
        .await
        .unwrap();
    assert_eq!(
        2,
        catalogue
            .get_archive_routes_of_storage_class(DISK_INSTANCE, "double")
            .await
            .unwrap()
            .len()
    );
}

#[tokio::test]
async fn test_logical_library_rename() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;
    let admin = admin();

    catalogue
        .create_logical_library(&admin, "library_2", true, "Second library")
        .await
        .unwrap();

    let e = catalogue
        .modify_logical_library_name(&admin, "library_2", LIBRARY)
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::AlreadyExists {
            entity: EntityType::LogicalLibrary,
            ..
        }
    ));

    let e = catalogue
        .modify_logical_library_name(&admin, "missing", "renamed")
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::NotFound {
            entity: EntityType::LogicalLibrary,
            ..
        }
    ));

    // Tapes follow the rename
    catalogue
        .modify_logical_library_name(&admin, LIBRARY, "renamed")
        .await
        .unwrap();
    assert_eq!("renamed", get_tape(&catalogue, VID_1).await.logical_library_name);

    let mut names: Vec<String> = catalogue
        .get_logical_libraries()
        .await
        .unwrap()
        .into_iter()
        .map(|library| library.name)
        .collect();
    names.sort();
    assert_eq!(vec!["library_2", "renamed"], names);
}

#[tokio::test]
async fn test_media_types() {
    let catalogue = catalogue().await;
    populate(&catalogue).await;
    let admin = admin();

    let e = catalogue
        .create_media_type(&admin, &create_media_type(MEDIA_TYPE))
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::AlreadyExists {
            entity: EntityType::MediaType,
            ..
        }
    ));

    let mut no_capacity = create_media_type("LTO9");
    no_capacity.capacity_in_bytes = 0;
    let e = catalogue
        .create_media_type(&admin, &no_capacity)
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::ZeroField {
            field: "capacity_in_bytes"
        }
    ));

    let mut lto9 = create_media_type("LTO9");
    lto9.cartridge = "LTO-9".to_string();
    lto9.capacity_in_bytes = 18_000_000_000_000;
    catalogue.create_media_type(&admin, &lto9).await.unwrap();

    let media_types = catalogue.get_media_types().await.unwrap();
    let names: Vec<&str> = media_types.iter().map(|mt| mt.name.as_str()).collect();
    assert_eq!(vec![MEDIA_TYPE, "LTO9"], names);
    assert_eq!(Some(94), media_types[0].primary_density_code);
    assert_eq!(Some(208), media_types[0].nb_wraps);
    assert_eq!(None, media_types[0].min_lpos);

    let media_type = catalogue.get_media_type_by_vid(VID_1).await.unwrap();
    assert_eq!(MEDIA_TYPE, media_type.name);
    assert_eq!("LTO-8", media_type.cartridge);

    let e = catalogue.get_media_type_by_vid("V99999").await.unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::NotFound {
            entity: EntityType::Tape,
            ..
        }
    ));

    // Tapes must be of a known media type
    let mut unknown = create_tape("V00009", POOL_1);
    unknown.media_type = "LTO0".to_string();
    let e = catalogue.create_tape(&admin, &unknown).await.unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::ReferentialViolation {
            entity: EntityType::Tape,
            target: EntityType::MediaType,
            ..
        }
    ));
    assert!(!catalogue.tape_exists("V00009").await.unwrap());

    let e = catalogue
        .modify_tape_media_type(&admin, VID_1, "LTO0")
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::ReferentialViolation {
            target: EntityType::MediaType,
            ..
        }
    ));

    catalogue
        .modify_tape_media_type(&admin, VID_1, "LTO9")
        .await
        .unwrap();
    assert_eq!("LTO9", get_tape(&catalogue, VID_1).await.media_type);

    let lto9_tapes = catalogue
        .get_tapes(&TapeSearchCriteria {
            media_type: Some("LTO9".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(1, lto9_tapes.len());
    assert_eq!(VID_1, lto9_tapes[0].vid);

    let e = catalogue.delete_media_type("LTO9").await.unwrap_err();
    assert!(matches!(
        e,
        CatalogueError::InUse {
            entity: EntityType::MediaType,
            ..
        }
    ));

    // Renames
    let e = catalogue
        .modify_media_type_name(&admin, "LTO9", MEDIA_TYPE)
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Conflict, e.kind());

    let e = catalogue
        .modify_media_type_name(&admin, "missing", "renamed")
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Referential, e.kind());

    catalogue
        .modify_media_type_name(&admin, "LTO9", "LTO9_WORM")
        .await
        .unwrap();
    assert_eq!("LTO9_WORM", get_tape(&catalogue, VID_1).await.media_type);

    // Setters
    catalogue
        .modify_media_type_cartridge(&admin, "LTO9_WORM", "LTO-9 WORM")
        .await
        .unwrap();
    catalogue
        .modify_media_type_capacity_in_bytes(&admin, "LTO9_WORM", 1_000)
        .await
        .unwrap();
    catalogue
        .modify_media_type_primary_density_code(&admin, "LTO9_WORM", Some(96))
        .await
        .unwrap();
    catalogue
        .modify_media_type_secondary_density_code(&admin, "LTO9_WORM", Some(97))
        .await
        .unwrap();
    catalogue
        .modify_media_type_nb_wraps(&admin, "LTO9_WORM", None)
        .await
        .unwrap();
    catalogue
        .modify_media_type_min_lpos(&admin, "LTO9_WORM", Some(2_696))
        .await
        .unwrap();
    catalogue
        .modify_media_type_max_lpos(&admin, "LTO9_WORM", Some(171_097))
        .await
        .unwrap();
    catalogue
        .modify_media_type_comment(&admin, "LTO9_WORM", "Write once")
        .await
        .unwrap();

    let media_type = catalogue.get_media_type_by_vid(VID_1).await.unwrap();
    assert_eq!("LTO-9 WORM", media_type.cartridge);
    assert_eq!(1_000, media_type.capacity_in_bytes);
    assert_eq!(Some(96), media_type.primary_density_code);
    assert_eq!(Some(97), media_type.secondary_density_code);
    assert_eq!(None, media_type.nb_wraps);
    assert_eq!(Some(2_696), media_type.min_lpos);
    assert_eq!(Some(171_097), media_type.max_lpos);
    assert_eq!("Write once", media_type.comment);

    let e = catalogue
        .modify_media_type_capacity_in_bytes(&admin, "LTO9_WORM", 0)
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Validation, e.kind());

    let e = catalogue
        .modify_media_type_comment(&admin, "missing", "Comment")
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Referential, e.kind());

    catalogue
        .modify_tape_media_type(&admin, VID_1, MEDIA_TYPE)
        .await
        .unwrap();
    catalogue.delete_media_type("LTO9_WORM").await.unwrap();
    assert_eq!(1, catalogue.get_media_types().await.unwrap().len());

    let e = catalogue.delete_media_type("LTO9_WORM").await.unwrap_err();
    assert_eq!(ErrorKind::Referential, e.kind());
}

#[tokio::test]
async fn test_existence_checks_pass_on_store_errors() {
    assert!(exists(Ok::<_, CatalogueError>(())).unwrap());
    assert!(!exists::<()>(Err(CatalogueError::not_found(EntityType::Tape, VID_1))).unwrap());

    let e = exists::<()>(Err(CatalogueError::database_error(DbErr::Custom(
        "connection lost".to_string(),
    ))))
    .unwrap_err();
    assert_eq!(ErrorKind::Infrastructure, e.kind());

    // A lookup on a closed pool is not taken as an absent entry
    let catalogue = catalogue().await;
    populate(&catalogue).await;
    catalogue
        .database()
        .await
        .unwrap()
        .clone()
        .close()
        .await
        .unwrap();

    let e = catalogue
        .create_tape_pool(&admin(), "pool_c", VO, 1, false, None, "Tape pool")
        .await
        .unwrap_err();
    assert_eq!(ErrorKind::Infrastructure, e.kind());
}
