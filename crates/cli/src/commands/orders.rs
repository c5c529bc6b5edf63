//! Order reporting.

use miraki_console::Console;
use miraki_console::models::DateRange;

use super::{CliError, require_session};

/// Print dashboard statistics for `range`.
pub async fn stats(console: &Console, range: DateRange) -> Result<(), CliError> {
    require_session(console)?;
    let stats = console.order_stats(range).fetch().await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "Revenue: {} ({:+.1}%)",
            stats.total_revenue, stats.revenue_trend
        );
        println!("Orders:  {} ({:+.1}%)", stats.total_orders, stats.orders_trend);
        for (status, count) in &stats.orders_by_status {
            println!("  {status:<12} {count}");
        }
        if !stats.sales_by_month.is_empty() {
            println!("Monthly sales:");
            for month in &stats.sales_by_month {
                println!("  {:<10} {}", month.month, month.sales);
            }
        }
    }
    Ok(())
}
