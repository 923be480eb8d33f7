//! # Seed Data Generator
//!
//! Populates a development database with default accounts, a demo catalog
//! and a handful of sales.
//!
//! ## Usage
//! ```bash
//! cargo run -p apotheca-db --bin seed
//! cargo run -p apotheca-db --bin seed -- --db ./data/apotheca.db --sales 40
//! ```
//!
//! ## Generated Data
//! - `admin` (admin) and `pharm` (pharmacist), both with password `password`
//! - A catalog of common pharmacy products; `D001` is locked
//! - Sample sales spread over the first ten drugs

use anyhow::Context;
use apotheca_core::{CartLine, DrugAction, Identity, NewDrug, Role, SaleRequest};
use apotheca_db::password::hash_password;
use apotheca_db::{Database, DbConfig};
use chrono::NaiveDate;
use std::env;

const DEFAULT_PASSWORD: &str = "password";

/// (code, name, category, manufacturer, price_cents, stock, threshold, expiry, description)
type DrugSeed = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    i64,
    i64,
    i64,
    (i32, u32, u32),
    &'static str,
);

const DRUGS: &[DrugSeed] = &[
    ("D001", "Amoxicillin 500mg Capsules", "Antibiotic", "North China Pharma", 1250, 150, 50, (2027, 12, 31), "Broad-spectrum semi-synthetic penicillin."),
    ("D002", "Cefradine 250mg Capsules", "Antibiotic", "Baiyunshan Pharma", 2200, 80, 30, (2027, 6, 30), "For acute pharyngitis and tonsillitis caused by susceptible bacteria."),
    ("D003", "Roxithromycin Dispersible Tablets", "Antibiotic", "Yangtze River Pharma", 1850, 60, 20, (2026, 11, 20), "Macrolide antibiotic."),
    ("D004", "Norfloxacin Capsules", "Antibiotic", "Xiuzheng Pharma", 1000, 120, 40, (2027, 8, 15), "For urinary tract infections."),
    ("D005", "Cold Relief Granules", "Cold & Flu", "China Resources Sanjiu", 1550, 300, 50, (2027, 5, 20), "Relieves headache and fever caused by colds."),
    ("D006", "Lianhua Qingwen Capsules", "Cold & Flu", "Yiling Pharma", 2400, 45, 100, (2027, 9, 1), "Clears heat and detoxifies."),
    ("D007", "Ambroxol Oral Solution", "Cough", "Boehringer Ingelheim", 2850, 65, 15, (2027, 7, 20), "For thick sputum that is hard to cough up."),
    ("D008", "Ibuprofen Sustained-Release Capsules", "Pain Relief", "Fenbid", 1800, 45, 100, (2026, 11, 30), "Relieves mild to moderate pain."),
    ("D009", "Paracetamol 500mg Tablets", "Pain Relief", "Panadol", 1450, 180, 40, (2027, 10, 10), "Reduces fever from common cold and influenza."),
    ("D010", "Yunnan Baiyao Aerosol", "Sprains & Bruises", "Yunnan Baiyao", 4200, 55, 15, (2028, 2, 28), "Promotes circulation and reduces swelling."),
    ("D011", "Nifedipine Controlled-Release Tablets", "Cardiovascular", "Bayer", 3800, 100, 30, (2028, 5, 10), "Treats hypertension and coronary heart disease."),
    ("D012", "Amlodipine Besylate Tablets", "Cardiovascular", "Pfizer", 4500, 95, 25, (2028, 4, 20), "Hypertension and chronic stable angina."),
    ("D013", "Aspirin Enteric-Coated Tablets", "Cardiovascular", "Bayer", 1600, 150, 40, (2027, 11, 30), "Inhibits platelet aggregation."),
    ("D014", "Metformin Tablets", "Diabetes", "Glucophage", 2500, 130, 40, (2027, 10, 15), "First-line treatment for type 2 diabetes."),
    ("D015", "Omeprazole Enteric Capsules", "Digestive", "Xiuzheng Pharma", 1950, 110, 30, (2027, 9, 20), "For gastric and duodenal ulcers."),
    ("D016", "Montmorillonite Powder", "Digestive", "Smecta", 1500, 140, 40, (2028, 2, 15), "For acute and chronic diarrhoea."),
    ("D017", "Loratadine Tablets", "Allergy & Skin", "Claritin", 2600, 100, 30, (2028, 4, 10), "Relieves allergic rhinitis symptoms."),
    ("D018", "Erythromycin Ointment", "Allergy & Skin", "Baiyunshan Pharma", 350, 250, 60, (2028, 6, 6), "For impetigo and other pyogenic skin infections."),
    ("D019", "Vitamin C Tablets", "Vitamins", "Yangshengtang", 1990, 180, 50, (2027, 10, 30), "Supports immunity."),
    ("D020", "Calcium Zinc Gluconate Oral Solution", "Vitamins", "Sanjing Pharma", 4500, 60, 20, (2027, 9, 9), "For calcium and zinc deficiency."),
];

const CUSTOMERS: &[Option<&str>] = &[
    Some("Zhang Wei"),
    Some("Wang Fang"),
    Some("Li Na"),
    Some("Liu Qiang"),
    Some("Chen Jing"),
    None,
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./apotheca.db");
    let mut sale_count: usize = 20;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sale_count = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Apotheca POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: ./apotheca.db)");
                println!("  -s, --sales <N>     Number of sample sales (default: 20)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Apotheca POS Seed Data Generator");
    println!("===================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("failed to open database")?;
    println!("✓ Connected to database, migrations applied");

    let counts = db.stats().table_counts().await?;
    if counts.users > 0 || counts.drugs > 0 {
        println!(
            "⚠ Database already has {} users and {} drugs",
            counts.users, counts.drugs
        );
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Users
    let admin = create_user(&db, "admin", "System Administrator", Role::Admin).await?;
    let pharm = create_user(&db, "pharm", "Li Pharmacist", Role::Pharmacist).await?;
    println!("✓ Users created: {}, {}", admin.username, pharm.username);

    // Catalog
    let inputs = DRUGS
        .iter()
        .map(to_new_drug)
        .collect::<anyhow::Result<Vec<_>>>()?;
    let drugs = db.drugs().create_many(&inputs, &admin).await?;

    if let Some(first) = drugs.iter().find(|d| d.code == "D001") {
        db.drugs()
            .transition(&first.id, DrugAction::ToggleLock, &admin)
            .await?;
    }
    println!("✓ Drugs created: {} (D001 locked)", drugs.len());

    // Sales: deterministic spread over the first ten drugs
    let pool: Vec<_> = drugs.iter().take(10).collect();
    let mut recorded = 0;
    for n in 0..sale_count {
        let line_count = 1 + n % 3;
        let items = (0..line_count)
            .map(|k| {
                let drug = pool[(n * 7 + k * 3) % pool.len()];
                CartLine {
                    drug_id: drug.id.clone(),
                    quantity: 1 + ((n + k) % 3) as i64,
                }
            })
            .collect();
        let request = SaleRequest {
            items,
            customer_name: CUSTOMERS[n % CUSTOMERS.len()].map(str::to_string),
        };
        let cashier = if n % 2 == 0 { &pharm } else { &admin };

        match db.sales().create_sale(&request, cashier).await {
            Ok(_) => recorded += 1,
            Err(e) => eprintln!("Skipped sample sale {}: {}", n + 1, e),
        }
    }
    println!("✓ Sales recorded: {}", recorded);

    let stats = db.stats().dashboard().await?;
    println!();
    println!("Revenue:   {}", apotheca_core::Money::from_cents(stats.total_revenue_cents));
    println!("Low stock: {} of {} drugs", stats.low_stock_count, stats.total_products);
    println!();
    println!("✓ Seed complete! Log in with admin/{0} or pharm/{0}", DEFAULT_PASSWORD);

    db.close().await;
    Ok(())
}

async fn create_user(db: &Database, username: &str, name: &str, role: Role) -> anyhow::Result<Identity> {
    let hash = hash_password(DEFAULT_PASSWORD)?;
    let user = db
        .users()
        .insert(username, &hash, name, role)
        .await
        .with_context(|| format!("failed to create user {username}"))?;
    Ok(user.identity())
}

fn to_new_drug(seed: &DrugSeed) -> anyhow::Result<NewDrug> {
    let (code, name, category, manufacturer, price_cents, stock, threshold, (y, m, d), description) =
        *seed;
    let expiry_date = NaiveDate::from_ymd_opt(y, m, d)
        .with_context(|| format!("invalid expiry date for {code}"))?;

    Ok(NewDrug {
        code: code.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        manufacturer: manufacturer.to_string(),
        price_cents,
        stock,
        min_stock_threshold: Some(threshold),
        expiry_date,
        description: Some(description.to_string()),
        side_effects: None,
    })
}
