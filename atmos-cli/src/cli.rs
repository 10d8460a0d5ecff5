use anyhow::Context;
use atmos_core::{Config, WeatherClient, WeatherData};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use tracing::{debug, warn};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "atmos", version, about = "WeatherAPI.com client")]
pub struct Cli {
    /// API key to use instead of the stored one.
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Print the mapped response as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and default language.
    Configure,

    /// Show current conditions for a location.
    Current {
        /// City name, postcode, "lat,lon" or anything else WeatherAPI accepts.
        city: String,

        /// Language code for condition texts, e.g. "fr".
        #[arg(long)]
        lang: Option<String>,
    },

    /// Show a multi-day forecast for a location.
    Forecast {
        city: String,

        /// Number of days, 1 to 14.
        #[arg(long, default_value_t = 3)]
        days: u32,

        /// Restrict the forecast to one date (YYYY-MM-DD, within the next 14 days).
        #[arg(long)]
        date: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let data = match &self.command {
            Command::Configure => return configure(config_or_default(Config::load())),
            Command::Current { city, lang } => {
                let config = Config::load()?;
                let lang = lang.as_deref().or(config.language());
                self.client(&config)?.get_current_weather(city, lang).await?
            }
            Command::Forecast { city, days, date } => {
                let config = Config::load()?;
                self.client(&config)?.get_forecast(city, *days, date.as_deref()).await?
            }
        };

        self.print(&data)
    }

    fn client(&self, config: &Config) -> anyhow::Result<WeatherClient> {
        let mut config = config.clone();
        if let Some(key) = &self.api_key {
            config.set_api_key(key.clone());
        }

        WeatherClient::from_config(&config)
            .context("No API key configured.\nHint: run `atmos configure` or pass --api-key.")
    }

    fn print(&self, data: &WeatherData) -> anyhow::Result<()> {
        if self.json {
            let json = serde_json::to_string_pretty(data).context("Failed to serialize response")?;
            println!("{json}");
        } else {
            print!("{}", render::summary(data));
        }
        Ok(())
    }
}

/// `configure` must still run when the stored file is unreadable, since it
/// is what rewrites it.
fn config_or_default(loaded: anyhow::Result<Config>) -> Config {
    loaded.unwrap_or_else(|e| {
        warn!("Ignoring unreadable configuration: {e:#}");
        Config::default()
    })
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("WeatherAPI.com API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key.trim().to_string());

    let language = Text::new("Default language (leave empty for English):")
        .with_default(config.language().unwrap_or_default())
        .prompt()
        .context("Failed to read language")?;
    config.language = Some(language.trim().to_string()).filter(|lang| !lang.is_empty());

    let path = config.save()?;
    debug!(path = %path.display(), "Configuration saved");
    println!("Configuration saved to {}", path.display());

    Ok(())
}
