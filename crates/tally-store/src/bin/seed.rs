//! # Seed Data Generator
//!
//! Populates the data directory with a demo catalog for development.
//!
//! ## Usage
//! ```bash
//! # Generate 50 products (default) into ./data
//! cargo run -p tally-store --bin seed
//!
//! # Generate custom amount
//! cargo run -p tally-store --bin seed -- --count 200
//!
//! # Specify data directory
//! cargo run -p tally-store --bin seed -- --data-dir ./demo/data
//! ```
//!
//! ## Generated Data
//! - Products across stationery, snacks, beverages and household goods
//! - Ids: `{CATEGORY}{INDEX:03}`, e.g. `STA001`
//! - Price: $0.99 - $19.99, stock: 0 - 40 (some land under the low-stock line)
//! - `admin.csv` with `admin` / `admin123` if no admin file exists yet

use std::env;
use std::time::Instant;

use tally_core::{Money, Product};
use tally_store::repository::admin::ADMIN_FIELDS;
use tally_store::table::record;
use tally_store::{ProductCatalog, Store, StoreConfig};

/// Product categories for realistic demo data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "STA",
        &[
            "Ballpoint Pen",
            "Gel Pen",
            "Pencil HB",
            "Eraser",
            "Sharpener",
            "Notebook A5",
            "Notebook A4",
            "Sticky Notes",
            "Stapler",
            "Paper Clips",
        ],
    ),
    (
        "SNK",
        &[
            "Potato Chips",
            "Salted Peanuts",
            "Chocolate Bar",
            "Biscuits",
            "Granola Bar",
            "Popcorn",
            "Trail Mix",
            "Crackers",
            "Gummy Bears",
            "Pretzels",
        ],
    ),
    (
        "BEV",
        &[
            "Mineral Water",
            "Orange Juice",
            "Apple Juice",
            "Cola",
            "Lemonade",
            "Iced Tea",
            "Ground Coffee",
            "Green Tea",
            "Energy Drink",
            "Sparkling Water",
        ],
    ),
    (
        "HOM",
        &[
            "Dish Soap",
            "Sponges",
            "Paper Towels",
            "Trash Bags",
            "Light Bulb",
            "AA Batteries",
            "Hand Soap",
            "Laundry Powder",
            "Matches",
            "Candles",
        ],
    ),
];

const DEFAULT_COUNT: usize = 50;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count = DEFAULT_COUNT;
    let mut config = StoreConfig::from_env();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(DEFAULT_COUNT);
                    i += 1;
                }
            }
            "--data-dir" | "-d" => {
                if i + 1 < args.len() {
                    config = config.data_dir(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>       Number of products to generate (default: 50)");
                println!("  -d, --data-dir <DIR>  Data directory (default: ./data or $TALLY_DATA_DIR)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally Seed Data Generator");
    println!("============================");
    println!("Data dir: {}", config.data_dir.display());
    println!("Products: {}", count);
    println!();

    let store = Store::open(config);
    let products = store.products();

    // Check existing products
    let existing = products.count()?;
    if existing > 0 {
        println!("⚠ Catalog already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete {} to regenerate.", products.path().display());
        return Ok(());
    }

    println!("Generating products...");

    let start = Instant::now();
    let mut generated = 0;

    // Each round walks every category once; later rounds become multi-packs.
    let mut round = 1;
    while generated < count {
        let before = generated;
        for (category_idx, (code, names)) in CATEGORIES.iter().enumerate() {
            for (name_idx, name) in names.iter().enumerate() {
                if generated >= count {
                    break;
                }

                let ordinal = (round - 1) * names.len() + name_idx + 1;
                let mut product = generate_product(code, name, ordinal, category_idx);
                if round > 1 {
                    product.name = format!("{} (Pack of {})", name, round);
                }

                if let Err(e) = products.add(product) {
                    eprintln!("Failed to insert product: {}", e);
                    continue;
                }
                generated += 1;
            }
        }
        if generated == before {
            break;
        }
        round += 1;
    }

    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    // Default admin account
    let admin_path = store.config().admin_path();
    if admin_path.exists() {
        println!("✓ Admin file already present, left untouched");
    } else {
        store.records().append_record(
            &admin_path,
            &ADMIN_FIELDS,
            &record([("username", "admin"), ("password", "admin123")]),
        )?;
        println!("✓ Created {} (admin / admin123)", admin_path.display());
    }

    let low = products
        .list()?
        .iter()
        .filter(|p| p.is_low_stock(store.config().low_stock_threshold))
        .count();
    println!();
    println!("  Low-stock products: {}", low);
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic demo data.
fn generate_product(category: &str, name: &str, ordinal: usize, category_idx: usize) -> Product {
    let product_id = format!("{}{:03}", category, ordinal);
    let seed = category_idx * 1000 + ordinal;

    // $0.99 - $19.99
    let price = Money::from_cents(99 + ((seed * 37) % 1901) as i64);

    // 0 - 40
    let stock = ((seed * 13) % 41) as i64;

    Product::new(product_id, name, price, stock)
}
