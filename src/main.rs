use clap::{Parser, Subcommand};
use rango::{auth, config, db::Database, output, populate, server};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("RANGO_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("RANGO_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "rango")]
#[command(about = "Content directory of categories and pages")]
#[command(long_about = "\
Content directory of categories and pages

Visitors browse categories and the links filed under them, add new
categories and pages, and register or log in for the restricted area.

Routes (all under /rango/):

  /rango/                                index: top categories and pages
  /rango/about/                          about page with visit count
  /rango/category/<slug>/                pages in one category
  /rango/add_category/                   new category form
  /rango/category/<slug>/add_page/       new page form
  /rango/register/                       account registration
  /rango/login/                          login
  /rango/logout/                         logout (login required)
  /rango/restricted/                     restricted page (login required)

Run 'rango populate' to load sample data and 'rango gen-config' to
generate a documented rango.toml. 'rango deactivate <username>' disables
an account without deleting it. Set RUST_LOG to change log verbosity.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (stock defaults are used when it doesn't exist)
    #[arg(long, default_value = "rango.toml", global = true)]
    config: PathBuf,

    /// SQLite database file, overrides database.path
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web server
    Serve {
        /// Listen address, overrides server.bind
        #[arg(long)]
        bind: Option<String>,
    },
    /// Load the sample categories and pages
    Populate,
    /// Validate config and report what's in the database
    Check,
    /// Print a stock rango.toml with all options documented
    GenConfig,
    /// Disable an account; it can no longer log in and loses open sessions
    Deactivate {
        username: String,
    },
    /// Re-enable a disabled account
    Activate {
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind } => {
            let mut config = load_config(&cli.config, cli.database.as_deref())?;
            if let Some(bind) = bind {
                config.server.bind = bind;
                config.validate()?;
            }
            server::serve(config).await?;
        }
        Command::Populate => {
            let config = load_config(&cli.config, cli.database.as_deref())?;
            println!("==> Populating {}", config.database.path);
            let db = Database::open(Path::new(&config.database.path))?;
            let report = populate::populate(&db)?;
            output::print_populate_output(&report);
        }
        Command::Check => {
            let config = load_config(&cli.config, cli.database.as_deref())?;
            let db = Database::open(Path::new(&config.database.path))?;
            let counts = output::TableCounts {
                categories: db.count_categories()?,
                pages: db.count_pages()?,
                users: db.count_users()?,
            };
            let config_file = cli.config.exists().then_some(cli.config.as_path());
            output::print_check_output(config_file, &config, &counts);
            println!("==> Configuration is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Deactivate { username } => {
            set_active(&cli.config, cli.database.as_deref(), &username, false)?;
            println!("==> Deactivated {username}");
        }
        Command::Activate { username } => {
            set_active(&cli.config, cli.database.as_deref(), &username, true)?;
            println!("==> Activated {username}");
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rango=info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load `rango.toml` and apply the `--database` override.
fn load_config(
    path: &Path,
    database: Option<&Path>,
) -> Result<config::AppConfig, config::ConfigError> {
    let mut config = config::load_config(path)?;
    if let Some(db) = database {
        config.database.path = db.display().to_string();
    }
    Ok(config)
}

fn set_active(
    config_path: &Path,
    database: Option<&Path>,
    username: &str,
    active: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path, database)?;
    let db = Database::open(Path::new(&config.database.path))?;
    match auth::set_active(&db, username, active)? {
        Some(_) => Ok(()),
        None => Err(format!("no user named {username:?}").into()),
    }
}
