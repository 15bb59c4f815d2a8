use std::error::Error;

use chrono::{Days, NaiveDate};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use engine::{Engine, Granularity, Money, NewProduct, ReportFilter, VatRate};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "petalpos_admin")]
#[command(about = "Admin utilities for PetalPOS (bootstrap catalog, inspect stock and revenue)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./petalpos.db?mode=rwc"
    )]
    database_url: String,

    /// Shop time zone; report periods follow its calendar.
    #[arg(long, default_value = "Europe/Berlin", value_parser = parse_timezone)]
    timezone: Tz,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations and exit.
    Migrate,
    Category(Category),
    Product(Product),
    Inventory(Inventory),
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct Category {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Create {
        #[arg(long)]
        name: String,
    },
    List,
}

#[derive(Args, Debug)]
struct Product {
    #[command(subcommand)]
    command: ProductCommand,
}

#[derive(Subcommand, Debug)]
enum ProductCommand {
    Create(ProductCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct ProductCreateArgs {
    #[arg(long)]
    name: String,
    /// VAT rate in percent (7 or 19).
    #[arg(long, default_value_t = 19, value_parser = parse_vat_rate)]
    vat: u8,
    #[arg(long)]
    category_id: Option<uuid::Uuid>,
    /// Initial unit cost, e.g. `1,20`.
    #[arg(long, value_parser = parse_money)]
    unit_cost: Option<i64>,
}

#[derive(Args, Debug)]
struct Inventory {
    /// Only list products with fewer pieces than this.
    #[arg(long)]
    low_stock: Option<i64>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// `day`, `month` or `year`.
    #[arg(long, default_value = "month")]
    granularity: String,
    /// First day to include, e.g. `2026-10-01`.
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day to include.
    #[arg(long)]
    to: Option<NaiveDate>,
}

fn parse_timezone(raw: &str) -> Result<Tz, String> {
    raw.parse::<Tz>()
        .map_err(|_| format!("unknown time zone: {raw}"))
}

fn parse_vat_rate(raw: &str) -> Result<u8, String> {
    let rate: u8 = raw.parse().map_err(|_| format!("invalid VAT rate: {raw}"))?;
    VatRate::try_from(rate).map_err(|err| err.to_string())?;
    Ok(rate)
}

fn parse_money(raw: &str) -> Result<i64, String> {
    raw.parse::<Money>()
        .map(Money::cents)
        .map_err(|_| format!("invalid amount: {raw}"))
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder()
        .database(db)
        .timezone(cli.timezone)
        .build()
        .await?;

    match cli.command {
        Command::Migrate => println!("migrations applied"),
        Command::Category(Category {
            command: CategoryCommand::Create { name },
        }) => {
            let category = engine.create_category(&name).await?;
            println!("created category: {} ({})", category.name, category.id);
        }
        Command::Category(Category {
            command: CategoryCommand::List,
        }) => {
            for category in engine.categories().await? {
                println!("{}\t{}", category.id, category.name);
            }
        }
        Command::Product(Product {
            command: ProductCommand::Create(args),
        }) => {
            let mut cmd = NewProduct::new(args.name, VatRate::try_from(args.vat)?);
            cmd.category_id = args.category_id;
            cmd.initial_unit_cost_minor = args.unit_cost;
            let product = engine.create_product(cmd).await?;
            println!("created product: {} ({})", product.name, product.id);
        }
        Command::Product(Product {
            command: ProductCommand::List,
        }) => {
            for product in engine.products().await? {
                let marker = if product.is_composite { " [Strauß]" } else { "" };
                println!(
                    "{}\t{}{marker}\t{}",
                    product.id, product.name, product.vat_rate
                );
            }
        }
        Command::Inventory(Inventory { low_stock }) => {
            let items = match low_stock {
                Some(threshold) => engine.low_stock(threshold).await?,
                None => engine.inventory().await?,
            };
            for item in items {
                println!(
                    "{:>5}\t{}\t{}",
                    item.entry.quantity,
                    item.product.name,
                    Money::new(item.entry.unit_purchase_price_minor)
                );
            }
        }
        Command::Report(args) => {
            let granularity = Granularity::try_from(args.granularity.as_str())?;
            let settings = engine.settings();
            let to = match args.to {
                Some(day) => Some(
                    day.checked_add_days(Days::new(1))
                        .ok_or_else(|| format!("date out of range: {day}"))?,
                ),
                None => None,
            };
            let report = engine
                .sales_report(ReportFilter {
                    from: args.from.map(|day| settings.start_of_day(day)),
                    to: to.map(|day| settings.start_of_day(day)),
                    granularity,
                })
                .await?;
            for period in &report.periods {
                println!(
                    "{}\t{}\t({} rows)",
                    period.period,
                    Money::new(period.gross_minor),
                    period.transaction_count
                );
            }
            for bucket in &report.vat.buckets {
                println!(
                    "VAT {}\tnet {}\tvat {}",
                    bucket.rate,
                    Money::new(bucket.split.net_minor),
                    Money::new(bucket.split.vat_minor)
                );
            }
            println!(
                "total {}\tsales {}\tstornos {}",
                Money::new(report.vat.total.gross_minor),
                report.sale_count,
                report.storno_count
            );
        }
    }

    Ok(())
}
