use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use tabled::{Table, Tabled};

use trutankless::config::{self, Config};
use trutankless::{ApiConfig, Session};

#[derive(Parser)]
#[command(name = "trutankless")]
#[command(about = "A CLI for reading TruTankless water heaters")]
#[command(version)]
struct Cli {
    /// Email address of the TruTankless account
    #[arg(long, env = "TRUTANKLESS_EMAIL")]
    email: Option<String>,

    /// Password for the TruTankless account (optional, will prompt if not provided)
    #[arg(long, env = "TRUTANKLESS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Override the service URL
    #[arg(long, env = "TRUTANKLESS_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify credentials and remember the account for future use
    Login,
    /// Forget the stored account
    Logout,
    /// List the locations of the account
    Locations,
    /// List all devices of the account
    Devices,
    /// Fetch the latest state of one device
    Refresh {
        /// Identifier of the device
        id: String,
    },
}

#[derive(Tabled)]
struct LocationRow {
    #[tabled(rename = "Index")]
    index: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Devices")]
    devices: usize,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Cli {
        email,
        password,
        base_url,
        command,
    } = Cli::parse();

    match command {
        Commands::Logout => {
            config::clear_config()?;
            println!("Logged out successfully.");
        }
        Commands::Login => {
            let session = connect(email, password, base_url.clone()).await?;
            config::save_config(&Config {
                email: session.email().to_string(),
                base_url,
            })?;
            println!("Logged in as {}.", session.email());
        }
        Commands::Locations => {
            let mut session = connect(email, password, base_url).await?;
            let locations = session.get_locations().await?;

            if locations.is_empty() {
                println!("No locations found for this account.");
                return Ok(());
            }

            let rows: Vec<LocationRow> = locations
                .iter()
                .map(|(index, location)| LocationRow {
                    index: *index,
                    id: location.id.clone().unwrap_or_else(|| "-".to_string()),
                    name: location.name().unwrap_or("Unnamed").to_string(),
                    customer: location.customer_id.clone(),
                    devices: location.devices.as_ref().map_or(0, Vec::len),
                })
                .collect();

            println!("{}", Table::new(&rows));
        }
        Commands::Devices => {
            let mut session = connect(email, password, base_url).await?;
            session.get_devices().await?;

            if session.devices().is_empty() {
                println!("No devices found for this account.");
                return Ok(());
            }

            let mut rows: Vec<DeviceRow> = session
                .devices()
                .values()
                .map(|device| DeviceRow {
                    id: device.device_id().to_string(),
                    name: device.name().unwrap_or("Unnamed").to_string(),
                    updated: device.last_updated().format("%Y-%m-%d %H:%M:%S").to_string(),
                })
                .collect();
            rows.sort_by(|a, b| a.id.cmp(&b.id));

            println!("{}", Table::new(&rows));
        }
        Commands::Refresh { id } => {
            let mut session = connect(email, password, base_url).await?;
            session.get_devices().await?;
            session.refresh_device(&id).await?;

            let device = session
                .device(&id)
                .with_context(|| format!("Device {} not found for this account.", id))?;
            println!("{}", serde_json::to_string_pretty(device.info())?);
        }
    }

    Ok(())
}

/// Resolve the account from flags, environment and the stored config, then log in
async fn connect(
    email: Option<String>,
    password: Option<String>,
    base_url: Option<String>,
) -> Result<Session> {
    let stored = if email.is_none() {
        Some(config::load_config()?)
    } else {
        None
    };

    let email = email
        .or_else(|| stored.as_ref().map(|c| c.email.clone()))
        .context("Not logged in. Provide --email or run 'trutankless login' first.")?;

    let api_config = match (base_url, &stored) {
        (Some(url), _) => ApiConfig::new(url),
        (None, Some(stored)) => stored.api_config(),
        (None, None) => ApiConfig::default(),
    };

    let password = match password {
        Some(password) => password,
        None => rpassword::prompt_password(format!("Password for {}: ", email))
            .context("Failed to read password")?,
    };

    info!("Authenticating with TruTankless...");
    let session = Session::login_with_config(email, password, api_config).await?;
    debug!("Authentication successful");
    Ok(session)
}
