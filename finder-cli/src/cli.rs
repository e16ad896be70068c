use anyhow::{Context, anyhow, bail};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use inquire::{Password, Select};
use tracing::debug;
use weather_finder_core::{ClientError, Config, Location, WeatherClient, WeatherReading};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-finder",
    version,
    about = "Find a place and show its current weather"
)]
pub struct Cli {
    /// OpenWeatherMap API key; prompted for when absent.
    #[arg(long, global = true, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List places matching a name.
    Search {
        /// City or place name.
        query: String,
    },

    /// Show current weather for a place.
    Show {
        /// City or place name.
        query: String,

        /// 1-based match to use when the name is ambiguous; asks interactively otherwise.
        #[arg(long)]
        pick: Option<usize>,
    },

    /// Print or change the stored settings.
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the config file location and effective settings (default).
    Show,

    /// Update settings and write them to the config file.
    Set(ConfigSet),
}

#[derive(Debug, Args)]
pub struct ConfigSet {
    /// Provider host override; an empty value restores the default.
    #[arg(long)]
    pub base_url: Option<String>,

    /// HTTP timeout in seconds; 0 restores the client default.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl ConfigSet {
    fn apply(self, config: &mut Config) {
        if let Some(url) = self.base_url {
            let url = url.trim();
            config.base_url = (!url.is_empty()).then(|| url.to_string());
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = (secs > 0).then_some(secs);
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Config { action } => {
                if let Some(ConfigAction::Set(update)) = action {
                    update.apply(&mut config);
                    config.save()?;
                    println!("Settings saved.");
                }
                print_config(&config)?;
            }
            Command::Search { query } => {
                let client = session(&config, self.api_key)?;
                let locations = search(&client, &query).await?;

                if locations.is_empty() {
                    println!("No locations found for '{}'.", query.trim());
                }
                for (idx, location) in locations.iter().enumerate() {
                    println!("{}", list_entry(idx, location));
                }
            }
            Command::Show { query, pick } => {
                let client = session(&config, self.api_key)?;
                let locations = search(&client, &query).await?;
                let location = choose_location(locations, pick, query.trim())?;

                let reading = client.get_current_weather(&location).await.map_err(report)?;
                println!("{}", format_reading(&reading));
            }
        }

        Ok(())
    }
}

fn print_config(config: &Config) -> anyhow::Result<()> {
    println!("Config file: {}", Config::config_file_path()?.display());
    println!(
        "base_url: {}",
        config
            .base_url
            .as_deref()
            .unwrap_or(weather_finder_core::DEFAULT_BASE_URL)
    );
    match config.timeout_secs {
        Some(secs) => println!("timeout_secs: {secs}"),
        None => println!("timeout_secs: (client default)"),
    }

    Ok(())
}

/// Build a client for this run and hand it the API key.
fn session(config: &Config, api_key: Option<String>) -> anyhow::Result<WeatherClient> {
    let mut client =
        WeatherClient::from_config(config).context("Failed to set up the HTTP client")?;

    let key = match api_key {
        Some(key) => key,
        None => Password::new("OpenWeatherMap API key:")
            .without_confirmation()
            .with_help_message("Get one for free at openweathermap.org")
            .prompt()
            .context("Failed to read API key")?,
    };

    client.set_credential(key.trim());
    Ok(client)
}

async fn search(client: &WeatherClient, query: &str) -> anyhow::Result<Vec<Location>> {
    let query = query.trim();
    if query.is_empty() {
        bail!("Please enter a location to search for.");
    }

    client.search_locations(query).await.map_err(report)
}

fn report(err: ClientError) -> anyhow::Error {
    debug!(error = ?err, "request failed");
    anyhow!(err.user_message())
}

fn choose_location(
    mut locations: Vec<Location>,
    pick: Option<usize>,
    query: &str,
) -> anyhow::Result<Location> {
    let idx = match resolve_pick(locations.len(), pick, query)? {
        Some(idx) => idx,
        None => {
            let options: Vec<String> =
                locations.iter().enumerate().map(|(i, l)| list_entry(i, l)).collect();

            Select::new("Several places match, pick one:", options)
                .raw_prompt()
                .context("Failed to read selection")?
                .index
        }
    };

    Ok(locations.swap_remove(idx))
}

/// Index to use without asking, or `None` when the user has to choose.
fn resolve_pick(
    count: usize,
    pick: Option<usize>,
    query: &str,
) -> anyhow::Result<Option<usize>> {
    match (count, pick) {
        (0, _) => bail!("No locations found for '{query}'."),
        (_, Some(n)) if n == 0 || n > count => {
            bail!("--pick must be between 1 and {count}, got {n}")
        }
        (_, Some(n)) => Ok(Some(n - 1)),
        (1, None) => Ok(Some(0)),
        _ => Ok(None),
    }
}

fn list_entry(idx: usize, location: &Location) -> String {
    format!(
        "{}. {} ({:.4}, {:.4})",
        idx + 1,
        location.label(),
        location.lat,
        location.lon
    )
}

fn format_reading(reading: &WeatherReading) -> String {
    let mut out = format!(
        "{}\n  {}°C, {}\n  Humidity: {}%\n  Wind: {} km/h\n  Visibility: {} km\n  Icon: {}",
        reading.location.label(),
        reading.temperature,
        reading.description,
        reading.humidity,
        reading.wind_speed,
        reading.visibility,
        reading.icon_url(),
    );

    if let Some(at) = reading.observed_at {
        let local = at.with_timezone(&Local);
        out.push_str(&format!("\n  Observed: {}", local.format("%Y-%m-%d %H:%M")));
    }

    out
}
