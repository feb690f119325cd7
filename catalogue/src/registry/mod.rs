//! Registries of the administrative entities.
//!
//! Each module adds the operations on one entity type to [`Catalogue`]:
//! creation, deletion, listing and one setter per modifiable field. They
//! all follow the same contract. Creation rejects duplicate keys and
//! dangling references, deletion rejects missing entries and entries that
//! are still depended upon, and setters reject missing entries and touch
//! only their field and the modification log.
//!
//! [`Catalogue`]: crate::Catalogue

mod activity;
mod admin_user;
mod archive_route;
mod disk_system;
mod logical_library;
mod media_type;
mod mount_policy;
mod mount_rule;
mod storage_class;
mod tape;
mod tape_pool;
mod virtual_organization;

pub(crate) use activity::find_weight;
pub(crate) use archive_route::routes_of_storage_class;
pub(crate) use mount_policy::mount_policy_from_model;
pub(crate) use mount_rule::{group_rule_policy, requester_rule_policy};
pub(crate) use tape::tapes_from_models;
