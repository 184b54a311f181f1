//! Terminal formatting for prices, volumes and reports.

use crypto_analytics_core::AssetSnapshot;
use crypto_analytics_engine::{Direction, SessionChange, TrendReport};
use rust_decimal::{Decimal, RoundingStrategy};

/// Format a number with thousands separators
pub fn format_usd(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let formatted = format!("{:.*}", decimals as usize, rounded.abs());

    let (int_part, dec_part) = match formatted.split_once('.') {
        Some((int_part, dec_part)) => (int_part, Some(dec_part)),
        None => (formatted.as_str(), None),
    };

    let int_with_commas: String = int_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    match dec_part {
        Some(d) if decimals > 0 => format!("{sign}{int_with_commas}.{d}"),
        _ => format!("{sign}{int_with_commas}"),
    }
}

/// Sub-dollar prices keep four decimals; everything else gets two and separators.
pub fn format_price(price: Decimal) -> String {
    if price < Decimal::ONE {
        let rounded = price.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
        format!("${:.4}", rounded)
    } else {
        format!("${}", format_usd(price, 2))
    }
}

pub fn format_volume(volume: Decimal) -> String {
    format!("${}", format_usd(volume, 0))
}

pub fn format_pct(pct: Decimal) -> String {
    let rounded = pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("{:.2}%", rounded)
    } else {
        format!("+{:.2}%", rounded.abs())
    }
}

fn session_cell(change: Option<&SessionChange>) -> String {
    match change {
        Some(SessionChange {
            change_pct: Some(pct),
            direction,
            ..
        }) => {
            let arrow = match direction {
                Direction::Up => "▲",
                Direction::Down => "▼",
                Direction::Neutral => " ",
            };
            format!("{arrow} {}", format_pct(*pct))
        }
        _ => "  +0.00%".to_string(),
    }
}

/// Ranked table of one batch, with session moves alongside when available.
pub fn render_table(snapshots: &[AssetSnapshot], session: &[SessionChange]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>4}  {:<10} {:>16} {:>9} {:>10} {:>20}  {}\n",
        "RANK", "SYMBOL", "PRICE", "24H", "SESSION", "VOLUME (24H)", "CATEGORY"
    ));
    out.push_str(&"-".repeat(90));
    out.push('\n');

    for snapshot in snapshots {
        let change = session.iter().find(|c| c.symbol == snapshot.symbol());
        out.push_str(&format!(
            "{:>4}  {:<10} {:>16} {:>9} {:>10} {:>20}  {}\n",
            snapshot.rank(),
            snapshot.symbol(),
            format_price(snapshot.current_price()),
            format_pct(snapshot.price_change_pct_24h()),
            session_cell(change),
            format_volume(snapshot.total_volume()),
            snapshot.category()
        ));
    }
    out
}

pub fn render_trend(report: &TrendReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "MARKET TREND REPORT ({})\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("Total assets scanned: {}\n", report.total_assets));
    out.push_str(&format!(
        "Total 24h volume:     {}\n\n",
        format_volume(report.total_volume)
    ));

    for (title, entries) in [
        ("TOP GAINERS", &report.top_gainers),
        ("TOP LOSERS", &report.top_losers),
    ] {
        out.push_str(title);
        out.push('\n');
        if entries.is_empty() {
            out.push_str("  (none)\n");
        }
        for entry in entries {
            out.push_str(&format!(
                "  • {:<8} {:>9}  ({})\n",
                entry.symbol,
                format_pct(entry.change_pct),
                format_price(entry.price)
            ));
        }
        out.push('\n');
    }
    out
}
