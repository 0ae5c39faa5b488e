use clap::{Parser, Subcommand};
use picfolio_common::{AlbumId, ImageId};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "picfolio")]
#[command(author, version, about = "Personal photo-album library")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create, inspect, edit, and delete albums
    Album {
        #[command(subcommand)]
        command: AlbumCommands,
    },

    /// Upload image files into an album
    Upload {
        /// Album to add the images to
        album_id: AlbumId,

        /// Image files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rotate, describe, and delete images
    Image {
        #[command(subcommand)]
        command: ImageCommands,
    },

    /// Remove orphaned files and repair thumbnails and cover photos
    Reconcile {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum AlbumCommands {
    /// Create a new album
    Create {
        title: String,

        #[arg(long)]
        description: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all albums
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show an album and its images
    Show {
        id: AlbumId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit an album; an empty title keeps the current one, an empty
    /// description or cover clears it
    Edit {
        id: AlbumId,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Image id to use as the cover photo
        #[arg(long)]
        cover: Option<String>,
    },

    /// Delete an album with all its images
    Delete { id: AlbumId },
}

#[derive(Subcommand)]
pub enum ImageCommands {
    /// Rotate an image 90 degrees counter-clockwise
    Rotate { id: ImageId },

    /// Set an image's description (empty clears it)
    Describe { id: ImageId, text: String },

    /// Delete an image
    Delete { id: ImageId },
}
