mod cli;

use picfolio::{config, library::MediaLibrary, reconcile::Reconciler};
use picfolio_common::{AlbumId, ImageId};
use picfolio_db::models::{Album, Image};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{AlbumCommands, Cli, Commands, ImageCommands};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "picfolio=trace,picfolio_db=debug,picfolio_common=debug".to_string()
        } else {
            "picfolio=debug,picfolio_db=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or_else(|| cli.config.clone());
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("picfolio {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        command => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_library_command(command, config_path))
        }
    }
}

async fn run_library_command(command: Commands, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let library = MediaLibrary::open(&config).context("Failed to open library")?;

    let result = match command {
        Commands::Album { command } => album_command(&library, command),
        Commands::Upload {
            album_id,
            files,
            json,
        } => upload(&library, album_id, &files, json).await,
        Commands::Image { command } => image_command(&library, command).await,
        Commands::Reconcile { json } => {
            let max_age = Duration::from_secs(config.storage.staging_max_age_hours * 3600);
            reconcile(&library, max_age, json).await
        }
        Commands::Validate { .. } | Commands::Version => Ok(()),
    };

    library.shutdown().await;
    result
}

fn album_command(library: &MediaLibrary, command: AlbumCommands) -> Result<()> {
    let albums = library.albums();

    match command {
        AlbumCommands::Create {
            title,
            description,
            json,
        } => {
            let album = albums.create_album(&title, non_empty(description.as_deref()))?;
            if json {
                print_json(&album)?;
            } else {
                println!("{}", album.id);
            }
        }
        AlbumCommands::List { json } => {
            let all = albums.get_all_albums()?;
            if json {
                print_json(&all)?;
            } else {
                for album in &all {
                    print_album_line(album);
                }
            }
        }
        AlbumCommands::Show { id, json } => {
            let album = albums
                .get_album(id)?
                .with_context(|| format!("Album not found: {}", id))?;
            let images = library.images().get_all_images_by_album(id)?;
            if json {
                print_json(&AlbumView {
                    album: &album,
                    images: &images,
                })?;
            } else {
                print_album_line(&album);
                if let Some(ref description) = album.description {
                    println!("  {}", description);
                }
                println!("  Directory: {}", albums.get_album_path(id).display());
                println!("\nImages: {}", images.len());
                for image in &images {
                    print_image_line(image, album.cover_photo_id == Some(image.id));
                }
            }
        }
        AlbumCommands::Edit {
            id,
            title,
            description,
            cover,
        } => {
            let current = albums
                .get_album(id)?
                .with_context(|| format!("Album not found: {}", id))?;

            let title = match title.as_deref() {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => current.title.clone(),
            };
            let description = match description.as_deref() {
                Some(d) => non_empty(Some(d)).map(str::to_string),
                None => current.description.clone(),
            };
            let cover = match cover.as_deref() {
                Some("") => None,
                Some(c) => Some(
                    c.parse::<ImageId>()
                        .with_context(|| format!("Invalid image id: {}", c))?,
                ),
                None => current.cover_photo_id,
            };

            albums.update_album(id, &title, description.as_deref(), cover)?;
            println!("Updated album {}", id);
        }
        AlbumCommands::Delete { id } => {
            if albums.delete_album(id)? {
                println!("Deleted album {}", id);
            } else {
                println!("Album {} does not exist", id);
            }
        }
    }

    Ok(())
}

async fn upload(library: &MediaLibrary, album_id: AlbumId, files: &[PathBuf], json: bool) -> Result<()> {
    library
        .albums()
        .get_album(album_id)?
        .with_context(|| format!("Album not found: {}", album_id))?;

    let mut parts = Vec::with_capacity(files.len());
    for path in files {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        parts.push((file_name, bytes));
    }

    let batch = library.images().upload_many(album_id, parts).await;

    if json {
        print_json(&batch.image_ids)?;
    } else {
        for id in &batch.image_ids {
            println!("{}", id);
        }
    }

    match batch.error {
        Some(e) => Err(e).context("Upload incomplete"),
        None => Ok(()),
    }
}

async fn image_command(library: &MediaLibrary, command: ImageCommands) -> Result<()> {
    let images = library.images();

    match command {
        ImageCommands::Rotate { id } => {
            if images.rotate_image(id).await? {
                let image = images
                    .get_image(id)?
                    .with_context(|| format!("Image not found: {}", id))?;
                println!("Rotated {} to {}x{}", id, image.width, image.height);
            } else {
                println!("Image {} does not exist", id);
            }
        }
        ImageCommands::Describe { id, text } => {
            images.update_image(id, non_empty(Some(&text)))?;
            println!("Updated image {}", id);
        }
        ImageCommands::Delete { id } => {
            if images.delete_image(id)? {
                println!("Deleted image {}", id);
            } else {
                println!("Image {} does not exist", id);
            }
        }
    }

    Ok(())
}

async fn reconcile(library: &MediaLibrary, staging_max_age: Duration, json: bool) -> Result<()> {
    let report = Reconciler::new(library.clone(), staging_max_age).run().await?;

    if json {
        print_json(&report)?;
    } else if report.is_clean() {
        println!("Library is consistent");
    } else {
        println!("Orphaned files removed:     {}", report.orphan_files_removed);
        println!("Album directories removed:  {}", report.album_dirs_removed);
        println!("Image records relocated:    {}", report.paths_relocated);
        println!("Thumbnails regenerated:     {}", report.thumbnails_regenerated);
        println!("Cover photos repaired:      {}", report.covers_repaired);
        println!("Staged files removed:       {}", report.staged_files_removed);
        println!("Missing originals:          {}", report.missing_originals);
        println!("Failed repairs:             {}", report.failures);
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("✓ Configuration is valid");
    println!("  Image directory: {}", config.storage.image_dir.display());
    println!("  Staging directory: {}", config.storage.staging_dir().display());
    println!("  Database: {}", config.storage.database_path.display());
    println!(
        "  Thumbnails: {}px, JPEG quality {}",
        config.thumbnail.max_dimension, config.thumbnail.jpeg_quality
    );

    Ok(())
}

#[derive(Serialize)]
struct AlbumView<'a> {
    album: &'a Album,
    images: &'a [Image],
}

/// Empty form values mean "no value".
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_album_line(album: &Album) {
    let cover = album
        .cover_photo_id
        .map(|c| c.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}  {}  (cover: {}, created {})",
        album.id,
        album.title,
        cover,
        album.created_at.format("%Y-%m-%d %H:%M")
    );
}

fn print_image_line(image: &Image, is_cover: bool) {
    print!(
        "  {}  {}x{}  {} bytes  {}",
        image.id,
        image.width,
        image.height,
        image.size_bytes,
        image.title.as_deref().unwrap_or("")
    );
    if is_cover {
        print!(" [cover]");
    }
    println!();
    if let Some(ref description) = image.description {
        println!("      {}", description);
    }
}
