//! The `image-share photos` command: print the display listing.

use clap::Args;
use image_share_core::{list_display_images, Config, DisplayImage, StorageLayout};

/// Arguments for the `photos` command.
#[derive(Args, Debug)]
pub struct PhotosArgs {
    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Execute the photos command.
pub async fn execute(args: PhotosArgs, config: Config) -> anyhow::Result<()> {
    let layout = StorageLayout::from_config(&config);
    let photos = list_display_images(&layout.display_dir, &config.processing);
    println!("{}", render(&photos, args.pretty)?);
    Ok(())
}

fn render(photos: &[DisplayImage], pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(photos)
    } else {
        serde_json::to_string(photos)
    }
}
