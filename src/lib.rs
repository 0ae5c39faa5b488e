//! Picfolio - personal photo-album library
//!
//! Albums own images; each image is an original file plus a derived
//! thumbnail, recorded in SQLite. The managers in [`library`] keep records
//! and files consistent across create, upload, rotate, and delete, and
//! [`reconcile`] repairs what a partial failure leaves behind.

pub mod config;
pub mod library;
pub mod media;
pub mod reconcile;
pub mod storage;
