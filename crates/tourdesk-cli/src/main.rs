//! Tourdesk CLI: operator tool for the customer media pipeline.
//!
//! Reads the MEDIA_* settings from the environment (or `.env`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tourdesk_cli::{content_type_from_path, init_tracing};
use tourdesk_core::{AssetCategory, AssetRequest, MediaDeliveryConfig};
use tourdesk_storage::{create_remover, create_uploader, StoredAssetName};

#[derive(Parser)]
#[command(name = "tourdesk", about = "Tourdesk customer media CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload an image for an entity
    Upload {
        /// Path to the image
        file: std::path::PathBuf,
        /// Entity (customer) id
        #[arg(long)]
        entity: String,
        /// Asset category: profile, id-front or id-back
        #[arg(long, default_value = "profile")]
        category: String,
        /// Content type; guessed from the extension when omitted
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Delete a stored asset by entity id and file name
    Delete {
        /// Entity (customer) id
        #[arg(long)]
        entity: String,
        /// Stored file name
        #[arg(long)]
        file: String,
    },
    /// Delete a stored asset by its public URL
    DeleteUrl {
        /// Public URL returned by upload
        url: String,
    },
    /// Print a freshly generated file name without uploading
    Name {
        /// Entity (customer) id
        #[arg(long)]
        entity: String,
        /// Asset category: profile, id-front or id-back
        #[arg(long, default_value = "profile")]
        category: String,
        /// Original file name
        original: String,
    },
}

#[derive(Serialize)]
struct DeleteResponse {
    deleted: bool,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn parse_category(category: &str) -> anyhow::Result<AssetCategory> {
    category.parse().context("Invalid --category")
}

fn load_config() -> anyhow::Result<MediaDeliveryConfig> {
    MediaDeliveryConfig::from_env().context("Failed to load media delivery configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            file,
            entity,
            category,
            content_type,
        } => {
            let category = parse_category(&category)?;
            let config = load_config()?;
            let uploader = create_uploader(&config)?;

            let payload = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read file: {}", file.display()))?;
            let original_file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload")
                .to_string();
            let content_type =
                content_type.unwrap_or_else(|| content_type_from_path(&file).to_string());

            let request =
                AssetRequest::new(payload, original_file_name, content_type, entity, category);
            let outcome = uploader.store(&request).await?;
            tracing::info!(transport = %outcome.transport, "Upload complete");
            print_json(&outcome)?;
        }
        Commands::Delete { entity, file } => {
            let remover = create_remover(&load_config()?);
            let deleted = remover.remove(&entity, &file).await;
            print_json(&DeleteResponse { deleted })?;
            if !deleted {
                std::process::exit(1);
            }
        }
        Commands::DeleteUrl { url } => {
            let remover = create_remover(&load_config()?);
            let deleted = remover.remove_by_url(&url).await;
            print_json(&DeleteResponse { deleted })?;
            if !deleted {
                std::process::exit(1);
            }
        }
        Commands::Name {
            entity,
            category,
            original,
        } => {
            let category = parse_category(&category)?;
            println!("{}", StoredAssetName::generate(&entity, category, &original));
        }
    }

    Ok(())
}
