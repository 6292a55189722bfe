//! `wardrobe scan | list | remove` — Manage the stored wardrobe.

use std::path::{Path, PathBuf};
use wardrobe_core::error::ImageError;
use wardrobe_core::inference::ImagePayload;
use wardrobe_core::wardrobe::WardrobeItem;

pub async fn scan(paths: Vec<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let service = super::load_service(true)?;

    let images = paths
        .iter()
        .map(|p| load_image(p))
        .collect::<Result<Vec<_>, _>>()?;
    let refs = paths
        .iter()
        .map(|p| {
            std::fs::canonicalize(p)
                .unwrap_or_else(|_| p.clone())
                .display()
                .to_string()
        })
        .collect();

    let cancel = super::cancel_on_ctrl_c();
    eprint!("  Classifying {} photo(s)...", images.len());
    let result = service.scan(images, Some(refs), &cancel).await;
    eprint!("\r                                   \r");

    let items = result?;
    println!("Added {} item(s):", items.len());
    print_items(&items);
    Ok(())
}

pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let service = super::load_service(false)?;
    let items = service.items().await?;
    if items.is_empty() {
        println!("Wardrobe is empty. Run `wardrobe scan <photos...>` to add items.");
    } else {
        println!("{} item(s):", items.len());
        print_items(&items);
    }
    Ok(())
}

pub async fn remove(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let service = super::load_service(false)?;
    if service.remove_item(id).await? {
        println!("Removed {id}");
        Ok(())
    } else {
        Err(format!("No wardrobe item with id {id}").into())
    }
}

fn print_items(items: &[WardrobeItem]) {
    for item in items {
        let material = item
            .material
            .as_deref()
            .map(|m| format!(" [{m}]"))
            .unwrap_or_default();
        println!("  {}  {}{}", item.id, item.summary(), material);
    }
}

/// Read a photo from disk, inferring the MIME type from its extension.
pub fn load_image(path: &Path) -> Result<ImagePayload, ImageError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let mime = ImagePayload::mime_for_extension(extension)
        .ok_or_else(|| ImageError::UnsupportedMimeType(format!("{} ({extension:?})", path.display())))?;
    let data = std::fs::read(path).map_err(|e| ImageError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(ImagePayload::new(mime, data))
}
