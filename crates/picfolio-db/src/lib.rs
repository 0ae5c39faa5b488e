//! Picfolio-DB: Database schema, migrations, and query operations
//!
//! This crate is the persistence interface of picfolio: plain CRUD over album
//! and image records in SQLite, using rusqlite and r2d2 connection pooling.
//! It holds no business logic; consistency between records and files is the
//! job of the managers in the main crate.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use picfolio_common::AlbumId;
//! use picfolio_db::pool::{init_pool, get_conn};
//! use picfolio_db::queries::albums;
//!
//! let pool = init_pool("/var/lib/picfolio/picfolio.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let album = albums::create_album(&conn, AlbumId::new(), "Trip", None).unwrap();
//! println!("Created album: {}", album.title);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
