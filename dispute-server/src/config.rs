use {
    anyhow::Result,
    clap::{
        crate_authors,
        crate_description,
        crate_name,
        crate_version,
        Args,
        Parser,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    std::{
        fs,
        time::Duration,
    },
};

mod server;

#[derive(Parser, Debug)]
#[command(name = crate_name!())]
#[command(author = crate_authors!())]
#[command(about = crate_description!())]
#[command(version = crate_version!())]
pub enum Options {
    /// Run the dispute session server.
    Run(RunOptions),
}

#[derive(Args, Clone, Debug)]
pub struct RunOptions {
    /// Server Options
    #[command(flatten)]
    pub server: server::Options,

    #[command(flatten)]
    pub config: ConfigOptions,

    /// Bearer credential required for the auctioneer-role operations.
    #[arg(long = "operator-token")]
    #[arg(env = "OPERATOR_TOKEN")]
    pub operator_token: String,
}

#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "Config Options")]
#[group(id = "Config")]
pub struct ConfigOptions {
    /// Path to a configuration file containing the dispute timing defaults.
    #[arg(long = "config")]
    #[arg(env = "DISPUTE_CONFIG")]
    #[arg(default_value = "config.yaml")]
    pub config: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dispute: DisputeConfig,
}

/// Timing defaults for new sessions, per the procurement regulation: three
/// minutes of inactivity arm the closing, and the randomized window is drawn
/// between two and thirty minutes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisputeConfig {
    #[serde(with = "humantime_serde", default = "default_inactivity_timeout")]
    pub inactivity_timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_random_window_min")]
    pub random_window_min:  Duration,
    #[serde(with = "humantime_serde", default = "default_random_window_max")]
    pub random_window_max:  Duration,
    #[serde(with = "humantime_serde", default = "default_tick_interval")]
    pub tick_interval:      Duration,
}

fn default_inactivity_timeout() -> Duration {
    Duration::from_secs(180)
}

fn default_random_window_min() -> Duration {
    Duration::from_secs(120)
}

fn default_random_window_max() -> Duration {
    Duration::from_secs(1800)
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(1)
}

impl Default for DisputeConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout: default_inactivity_timeout(),
            random_window_min:  default_random_window_min(),
            random_window_max:  default_random_window_max(),
            tick_interval:      default_tick_interval(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Config> {
        let yaml_content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&yaml_content)?;
        Ok(config)
    }
}
