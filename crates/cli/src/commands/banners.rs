//! Banner ordering.

use miraki_console::Console;
use miraki_console::models::{Banner, BannerQuery};

use super::{CliError, require_session};

async fn current_order(console: &Console) -> Result<Vec<Banner>, CliError> {
    let page = console.banners(&BannerQuery::default()).fetch().await?;
    Ok(page.items)
}

#[allow(clippy::print_stdout)]
fn print_order(banners: &[Banner]) {
    for (position, banner) in banners.iter().enumerate() {
        let state = if banner.active { "active" } else { "hidden" };
        println!("{position:>2}. {:<26} {:<40} {state}", banner.id, banner.title);
    }
}

/// Print banners in display order.
pub async fn list(console: &Console) -> Result<(), CliError> {
    require_session(console)?;
    print_order(&current_order(console).await?);
    Ok(())
}

/// Move the banner at `from` to `to` and persist the new order.
pub async fn reorder(console: &Console, from: usize, to: usize) -> Result<(), CliError> {
    require_session(console)?;
    let mut banners = current_order(console).await?;
    console.move_banner(&mut banners, from, to).await?;
    print_order(&banners);
    Ok(())
}
