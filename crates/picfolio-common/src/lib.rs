//! Picfolio-Common: Shared types and utilities.
//!
//! This crate provides functionality used by both the persistence layer and
//! the media lifecycle managers:
//!
//! - **Typed IDs**: Type-safe UUID wrappers for albums and images
//! - **Error Handling**: The unified error type and result alias
//! - **Path Utilities**: File-type derivation from uploaded file names
//!
//! # Examples
//!
//! ```
//! use picfolio_common::{AlbumId, Error, ErrorKind, Result};
//! use picfolio_common::paths::file_type_of;
//!
//! let album_id = AlbumId::new();
//! assert_eq!(file_type_of("Sunset.JPG"), "jpg");
//!
//! fn example(id: AlbumId) -> Result<()> {
//!     Err(Error::not_found(format!("album {id}")))
//! }
//! assert_eq!(example(album_id).unwrap_err().kind(), ErrorKind::NotFound);
//! ```

pub mod error;
pub mod ids;
pub mod paths;

pub use error::{Error, ErrorKind, Result};
pub use ids::*;
