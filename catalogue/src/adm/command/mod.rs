pub mod check_config;
pub mod db_migrations;
pub mod list_tapes;
pub mod ping;
pub mod reclaim_tape;
pub mod schema_version;
pub mod tape_file_summary;
pub mod tapes_for_writing;
