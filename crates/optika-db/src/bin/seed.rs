//! # Seed Data Generator
//!
//! Populates the database with demo data for development: an optical
//! catalog, two card terminals, and an enabled loyalty program.
//!
//! ## Usage
//! ```bash
//! # Seed the default dev database
//! cargo run -p optika-db --bin seed
//!
//! # Specify database path
//! cargo run -p optika-db --bin seed -- --db ./data/optika.db
//! ```

use std::collections::BTreeMap;
use std::env;

use chrono::Utc;
use uuid::Uuid;

use optika_core::{ItemKind, LoyaltySettings, Product, Terminal, DEFAULT_BRANCH_ID};
use optika_db::{Database, DbConfig};

/// (sku prefix, kind, on_demand, names with price/cost/stock)
const CATALOG: &[(&str, ItemKind, bool, &[(&str, i64, i64, i64)])] = &[
    (
        "FR",
        ItemKind::Frames,
        false,
        &[
            ("Ray-Ban RX5154 Clubmaster", 289_900, 120_000, 4),
            ("Ray-Ban RX7047 Acetate", 219_900, 95_000, 6),
            ("Oakley OX8046 Airdrop", 249_900, 110_000, 3),
            ("Vogue VO5239 Cat-Eye", 159_900, 60_000, 8),
            ("Armani Exchange AX3029", 179_900, 70_000, 5),
            ("Economy Metal Frame", 69_900, 20_000, 15),
        ],
    ),
    (
        "LN",
        ItemKind::Lenses,
        true,
        &[
            ("Single Vision CR-39", 89_900, 25_000, 0),
            ("Single Vision Polycarbonate", 129_900, 40_000, 0),
            ("Progressive Standard", 249_900, 90_000, 0),
            ("Progressive Premium Digital", 449_900, 180_000, 0),
            ("Blue Light Filter Add-on", 49_900, 12_000, 0),
            ("Photochromic Gray", 199_900, 75_000, 0),
        ],
    ),
    (
        "CL",
        ItemKind::ContactLens,
        false,
        &[
            ("Acuvue Oasys Monthly (6pk)", 84_900, 45_000, 10),
            ("Biofinity Toric Monthly (3pk)", 94_900, 52_000, 6),
            ("Air Optix Colors (2pk)", 64_900, 32_000, 8),
        ],
    ),
    (
        "AC",
        ItemKind::Accessory,
        false,
        &[
            ("Lens Cleaner Spray 60ml", 8_900, 2_500, 30),
            ("Microfiber Cloth", 3_900, 900, 50),
            ("Contact Lens Solution 355ml", 15_900, 7_000, 20),
            ("Hard Shell Case", 9_900, 3_000, 25),
        ],
    ),
    (
        "SV",
        ItemKind::Consultation,
        true,
        &[
            ("Eye Exam", 45_000, 0, 0),
            ("Contact Lens Fitting", 60_000, 0, 0),
            ("Frame Adjustment", 0, 0, 0),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./optika_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Optika POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./optika_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Optika POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding catalog...");

    let now = Utc::now();
    let mut generated = 0;

    for (prefix, kind, on_demand, entries) in CATALOG {
        for (idx, (name, price, cost, stock)) in entries.iter().enumerate() {
            let product = Product {
                id: Uuid::new_v4().to_string(),
                branch_id: DEFAULT_BRANCH_ID.to_string(),
                sku: format!("{}-{:03}", prefix, idx + 1),
                name: name.to_string(),
                description: None,
                kind: *kind,
                price_cents: *price,
                cost_cents: if *cost > 0 { Some(*cost) } else { None },
                current_stock: *stock,
                is_on_demand: *on_demand,
                is_active: true,
                created_at: now,
                updated_at: now,
            };

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.sku, e);
                continue;
            }
            generated += 1;
        }
    }

    println!("✓ Seeded {} products", generated);

    println!();
    println!("Seeding terminals...");

    let terminals = [
        Terminal {
            id: Uuid::new_v4().to_string(),
            name: "BBVA".to_string(),
            fee_bps: 350,
            installment_rates: BTreeMap::from([(3, 400), (6, 450), (9, 500), (12, 600)]),
        },
        Terminal {
            id: Uuid::new_v4().to_string(),
            name: "Clip".to_string(),
            fee_bps: 360,
            installment_rates: BTreeMap::from([(3, 450), (6, 550), (12, 750)]),
        },
    ];
    for terminal in &terminals {
        db.settings().upsert_terminal(terminal).await?;
        println!("  + {} ({:.2}% base)", terminal.name, terminal.base_fee().percentage());
    }

    println!();
    println!("Enabling loyalty program...");

    db.settings()
        .update_loyalty_settings(&LoyaltySettings {
            enabled: true,
            global_bps: 100,        // 1% base earn rate
            cash_bps: Some(200),    // cash earns 2%
            card_bps: None,
            transfer_bps: None,
            referral_bps: 50,       // referrers earn 0.5%
        })
        .await?;

    println!("✓ Loyalty program enabled");
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
