//! Artwork browsing.

use miraki_console::Console;
use miraki_console::models::ArtworkQuery;

use super::{CliError, require_session};

/// Print one page of artworks.
pub async fn list_artworks(console: &Console, params: &ArtworkQuery) -> Result<(), CliError> {
    require_session(console)?;
    let page = console.artworks(params).fetch().await?;

    #[allow(clippy::print_stdout)]
    {
        for artwork in &page.items {
            let price = artwork
                .price
                .map_or_else(|| "-".to_string(), |p| format!("₹{p:.2}"));
            let featured = if artwork.featured { "*" } else { " " };
            println!(
                "{featured} {:<26} {:<32} {:<24} {price}",
                artwork.id, artwork.title, artwork.artist
            );
        }
        println!(
            "Page {} of {} ({} artworks)",
            page.pagination.page, page.pagination.pages, page.pagination.total
        );
    }
    Ok(())
}
