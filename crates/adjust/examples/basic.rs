//! Basic example adjusting synthetic resale prices across three towns
//!
//! Run with: cargo run --example basic -p adjust-facade

use adjust_facade::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adjust_core=debug".into()),
        )
        .init();

    println!("=== Temporal Price Adjustment ===\n");

    let start = YearMonth::new(2017, 1)?;
    let towns = [
        ("ANG MO KIO", 380_000.0, 1_200.0),
        ("PUNGGOL", 450_000.0, 2_600.0),
        ("WOODLANDS", 330_000.0, -300.0),
    ];

    let mut records = Vec::new();
    for (town, base, slope) in towns {
        for t in 0..60 {
            let month = start.add_months(t);
            let seasonal = 4_000.0 * ((t % 12) as f64 - 5.5) / 5.5;
            for (i, spread) in [-15_000.0, 0.0, 22_000.0].iter().enumerate() {
                records.push(
                    TransactionRecord::new(town, month, base + slope * t as f64 + seasonal + spread)
                        .with_attribute("flat_type", format!("{} ROOM", 3 + i)),
                );
            }
        }
    }
    println!("{} records from {} to {}\n", records.len(), start, start.add_months(59));

    for (name, config) in [
        ("least squares", AdjustmentConfig::default()),
        ("l1 norm", AdjustmentConfig::robust()),
    ] {
        let outcome = adjust(&records, &config.with_target(TargetMonthPolicy::Next))?;
        println!("{} -> target {} (index {})", name, outcome.target_month, outcome.target_index);

        for (key, model) in &outcome.models {
            println!(
                "   {:<12} n={:<3} r2={:.3} coefficients={:?}",
                key.to_string(),
                model.n_observations,
                model.r_squared,
                model
                    .coefficients
                    .iter()
                    .map(|c| format!("{:.3e}", c))
                    .collect::<Vec<_>>()
            );
        }

        for adjusted in outcome.records.iter().step_by(60) {
            println!(
                "   {:<12} {} {:>9.0} x {:.4} = {:>9}",
                adjusted.record.location,
                adjusted.record.month,
                adjusted.record.price,
                adjusted.factor,
                adjusted.adjusted_price
            );
        }
        println!();
    }

    Ok(())
}
