mod cli;

use backpack::{config, models::Catalog};
use backpack_orm::pool::init_pool;
use backpack_orm::{sql, Dialect, Repository};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins, then the configured filter, then defaults for the verbose flag
    let configured = config::load_config_or_default(cli.config.as_deref())
        .ok()
        .and_then(|c| c.logging.filter);
    let env_filter = std::env::var("RUST_LOG")
        .ok()
        .or(configured)
        .unwrap_or_else(|| {
            if cli.verbose {
                "backpack=debug,backpack_orm=trace".to_string()
            } else {
                "backpack=info,backpack_orm=warn".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Schema { dialect } => {
            print_schema(cli.config.as_deref(), dialect.map(Dialect::from))
        }
        Commands::Init => init_database(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("backpack {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn print_schema(config_path: Option<&Path>, dialect: Option<Dialect>) -> Result<()> {
    let dialect = match dialect {
        Some(dialect) => dialect,
        None => config::load_config_or_default(config_path)?.database.dialect,
    };
    let catalog = Catalog::build()?;

    for entity in catalog.entities() {
        println!("{}", sql::create_table(entity, dialect));
    }

    Ok(())
}

fn init_database(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    if config.database.dialect != Dialect::Sqlite {
        anyhow::bail!(
            "init only supports sqlite databases (configured: {})",
            config.database.dialect
        );
    }

    tracing::info!("Initializing database at {}", config.database.path.display());
    let pool = init_pool(&config.database.path, config.database.pool_size)?;
    let catalog = Catalog::build()?;
    catalog.ensure_tables(&Repository::new(&pool))?;

    println!("✓ Database ready: {}", config.database.path.display());
    for entity in catalog.entities() {
        println!("  {} -> {}", entity.name(), entity.table_name());
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Database: {}", config.database.path.display());
            println!("  Pool size: {}", config.database.pool_size);
            println!("  Dialect: {}", config.database.dialect);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Database: {}", config.database.path.display());
        }
    }

    Ok(())
}
