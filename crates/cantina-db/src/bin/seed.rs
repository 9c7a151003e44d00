//! # Seed Data Generator
//!
//! Populates a database with a small canteen catalog for local development.
//!
//! ## Usage
//! ```bash
//! # Seed ./cantina_dev.db
//! cargo run -p cantina-db --bin seed
//!
//! # Specify database path
//! cargo run -p cantina-db --bin seed -- --db ./data/cantina.db
//! ```
//!
//! ## Generated Data
//! - Tracked products (drinks, packaged snacks) with starting stock
//! - Untracked products (made-to-order food)
//! - A few customers, some with card codes

use std::env;

use cantina_db::{Database, DbConfig, NewCustomer, NewProduct};

/// (name, price in centavos, starting stock)
const TRACKED: &[(&str, i64, i64)] = &[
    ("Suco de Laranja", 500, 40),
    ("Suco de Uva", 550, 30),
    ("Água Mineral", 300, 60),
    ("Refrigerante Lata", 600, 48),
    ("Achocolatado", 450, 24),
    ("Biscoito Recheado", 350, 36),
    ("Barra de Cereal", 250, 50),
    ("Bala de Goma", 100, 120),
];

/// (name, price in centavos)
const MADE_TO_ORDER: &[(&str, i64)] = &[
    ("Coxinha", 650),
    ("Pão de Queijo", 400),
    ("Misto Quente", 800),
    ("Salada de Frutas", 700),
];

/// (name, card code)
const CUSTOMERS: &[(&str, Option<&str>)] = &[
    ("Ana Beatriz Costa", Some("A1001")),
    ("Bruno Henrique Dias", Some("A1002")),
    ("Carla Mendes", None),
    ("Prof. Daniel Rocha", Some("P2001")),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./cantina_dev.db");

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
                println!("Cantina POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./cantina_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Cantina POS Seed Data Generator");
    println!("==================================");
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

    let products = db.products();
    for &(name, price_cents, stock) in TRACKED {
        let mut product = NewProduct::tracked(name, price_cents, stock);
        // Cost around 55% of price
        product.cost_cents = price_cents * 55 / 100;
        products.insert(&product).await?;
    }
    for &(name, price_cents) in MADE_TO_ORDER {
        products.insert(&NewProduct::untracked(name, price_cents)).await?;
    }
    println!(
        "✓ Inserted {} products ({} tracked)",
        TRACKED.len() + MADE_TO_ORDER.len(),
        TRACKED.len()
    );

    let customers = db.customers();
    for &(name, card_code) in CUSTOMERS {
        let mut customer = NewCustomer::new(name);
        if let Some(code) = card_code {
            customer = customer.card_code(code);
        }
        customers.insert(&customer).await?;
    }
    println!("✓ Inserted {} customers", CUSTOMERS.len());

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
