//! huemood - sets Philips Hue lights to a color that matches the coming weather
//!
//! Usage:
//!   huemood                      # Same as `huemood run`
//!   huemood run                  # Check lights, then update them on a schedule
//!   huemood once                 # Run a single weather check and exit
//!   huemood lights               # List lights on the bridge
//!   huemood pair                 # Register with the bridge (press its button first)
//!   huemood colors               # List the named colors usable in the mapping
//!   huemood -c my.json once      # Use a specific config file

use anyhow::Context;
use argh::FromArgs;
use std::path::PathBuf;

use huemood_lib::config::{get_config_path, load_config, save_config, AppConfig};
use huemood_lib::error::MoodError;
use huemood_lib::hue::{HueBridge, HueService};
use huemood_lib::weather::WeatherService;
use huemood_lib::{color, forward_shutdown, run_one_cycle, run_scheduler};

/// Weather mood lighting for Philips Hue
#[derive(FromArgs)]
struct Args {
    /// path to the JSON config file (default: <data dir>/HueMood/config.json)
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    #[argh(subcommand)]
    command: Option<Command>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Run(RunArgs),
    Once(OnceArgs),
    Lights(LightsArgs),
    Pair(PairArgs),
    Colors(ColorsArgs),
}

/// Check the lights, then update them on the configured schedule
#[derive(FromArgs)]
#[argh(subcommand, name = "run")]
struct RunArgs {}

/// Run a single weather check and exit
#[derive(FromArgs)]
#[argh(subcommand, name = "once")]
struct OnceArgs {}

/// List the lights on the bridge and the targeting configuration
#[derive(FromArgs)]
#[argh(subcommand, name = "lights")]
struct LightsArgs {}

/// Register with the bridge and save the API key
#[derive(FromArgs)]
#[argh(subcommand, name = "pair")]
struct PairArgs {}

/// List the named colors
#[derive(FromArgs)]
#[argh(subcommand, name = "colors")]
struct ColorsArgs {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let args: Args = argh::from_env();
    let config_path = args.config.unwrap_or_else(get_config_path);
    let config = load_config(&config_path);

    match args.command.unwrap_or(Command::Run(RunArgs {})) {
        Command::Run(_) => run(config).await,
        Command::Once(_) => once(config).await,
        Command::Lights(_) => {
            let hue = HueService::new(config.hue.clone());
            let lights = hue.list_lights().await.context("failed to list lights")?;
            for light in lights {
                println!("{}\t{}\t{}", light.id, light.name, if light.on { "on" } else { "off" });
            }
            Ok(())
        }
        Command::Pair(_) => pair(config, config_path).await,
        Command::Colors(_) => {
            for (name, rgb) in color::named_colors() {
                println!("{:<16} {}  {}", name, rgb.to_hex(), rgb);
            }
            Ok(())
        }
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let weather = WeatherService::new(config.weather.clone());
    let hue = HueService::new(config.hue.clone());

    log::info!("=== Checking for Philips Hue lights on startup ===");
    if let Err(e) = hue.list_lights().await {
        log::warn!("Hue lights not reachable yet: {}", e);
    }
    log::info!("=== Hue lights check completed ===");

    let shutdown_tx = tokio::sync::watch::Sender::new(());
    let shutdown_rx = shutdown_tx.subscribe();
    tokio::spawn(forward_shutdown(tokio::signal::ctrl_c(), shutdown_tx));

    run_scheduler(&weather, &hue, &config, shutdown_rx).await;
    log::info!("Scheduler stopped, exiting");
    Ok(())
}

async fn once(config: AppConfig) -> anyhow::Result<()> {
    let weather = WeatherService::new(config.weather.clone());
    let hue = HueService::new(config.hue.clone());

    let report = run_one_cycle(&weather, &hue, &config).await;
    println!("{} -> {} {}", report.analysis.condition, report.color_spec, report.color);
    println!("{}", report.analysis.summary);
    if !report.failed.is_empty() {
        anyhow::bail!("{} light(s) failed to update", report.failed.len());
    }
    Ok(())
}

async fn pair(mut config: AppConfig, path: PathBuf) -> anyhow::Result<()> {
    let hue = HueService::new(config.hue.clone());
    let ip = hue.bridge_ip().await.context("no Hue bridge to pair with")?;

    let api_key = match HueBridge::pair(&ip, &config.hue.app_name).await {
        Ok(key) => key,
        Err(MoodError::LinkButton) => {
            anyhow::bail!("Press the link button on the Hue bridge at {} and run `huemood pair` again", ip)
        }
        Err(e) => return Err(e).context("pairing failed"),
    };

    println!("Paired with bridge at {}. API key: {}", ip, api_key);
    config.hue.bridge_ip = ip;
    config.hue.api_key = api_key;
    save_config(&config, &path).with_context(|| format!("failed to save {}", path.display()))?;
    println!("Saved to {}", path.display());
    Ok(())
}
