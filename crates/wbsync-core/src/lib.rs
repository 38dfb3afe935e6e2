pub mod config;
pub mod logging;

pub mod archive;
pub mod capture;
pub mod capture_db;
pub mod catalog;
pub mod checksum;
pub mod control;
pub mod local_index;
pub mod metadata;
pub mod retry;
pub mod storage;
pub mod sync;
pub mod url_model;
