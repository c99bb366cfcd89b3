use clap::{Parser, ValueEnum};
use color_eyre::{eyre::eyre, Result};
use openpad::config::{self, profiles, ConfigSelection};
use openpad::controller::gamepad::{GamepadSampler, GamepadSettings};
use openpad::controller::gpio::GpioSampler;
use openpad::controller::{IdleSampler, Sampler};
use openpad::feedback::TracingFeedback;
use openpad::hid::TracingTransport;
use openpad::runtime::{Device, DeviceError};
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SamplerKind {
    Gamepad,
    Gpio,
    Idle,
}

#[derive(Debug, Parser)]
#[command(name = "openpad")]
#[command(about = "Gesture and mode engine for small HID peripherals")]
struct Cli {
    /// Load the device config from a TOML file
    #[arg(long, value_name = "PATH", conflicts_with = "profile")]
    config: Option<PathBuf>,
    /// Run a built-in profile
    #[arg(long, value_name = "NAME")]
    profile: Option<String>,
    /// Print a built-in profile as TOML and exit
    #[arg(long, value_name = "NAME")]
    dump_config: Option<String>,
    /// Input source
    #[arg(long, value_enum, default_value_t = SamplerKind::Gamepad)]
    sampler: SamplerKind,
}

impl Cli {
    fn selection(&self) -> ConfigSelection {
        match (&self.config, &self.profile) {
            (Some(path), _) => ConfigSelection::Path(path.clone()),
            (None, Some(name)) => ConfigSelection::Profile(name.clone()),
            (None, None) => ConfigSelection::Auto,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let cli = Cli::parse();

    // Nur ausgeben, nichts starten
    if let Some(name) = &cli.dump_config {
        let profile = profiles::builtin(name)
            .ok_or_else(|| eyre!("Unknown profile {}, known: {:?}", name, profiles::BUILTIN_PROFILES))?;
        print!("{}", profile.to_toml()?);
        return Ok(());
    }

    // Konfiguration laden und prüfen
    let env_profile = std::env::var(config::PROFILE_ENV).ok();
    let default_path = config::default_config_path();
    let device_config =
        config::select_config(&cli.selection(), env_profile.as_deref(), default_path.as_deref())?;
    let setup = device_config.build()?;

    // Eingabequelle öffnen, bei Fehlern ohne Eingaben weiterlaufen
    let mut sampler = open_sampler(cli.sampler, &setup.gpio_pins).unwrap_or_else(|e| {
        warn!("Falling back to idle input: {}", e);
        Box::new(IdleSampler)
    });

    let mut hid = TracingTransport::new();
    let mut feedback = TracingFeedback::new();

    let mut device = Device::create(setup)
        .map_err(DeviceError::from)?
        .start(&mut hid, &mut feedback, Instant::now());

    // Ctrl+C beendet die Tick-Schleife sauber
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl+C received, shutting down"),
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
        shutdown.cancel();
    });

    let stats = device
        .run_until_cancelled(sampler.as_mut(), &mut hid, &mut feedback, cancel)
        .await;

    info!(
        "Stopped after {} cycles, {} HID reports",
        stats.cycles,
        hid.reports()
    );
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

fn open_sampler(kind: SamplerKind, gpio_pins: &[u8]) -> Result<Box<dyn Sampler>, DeviceError> {
    let sampler: Box<dyn Sampler> = match kind {
        SamplerKind::Gamepad => Box::new(GamepadSampler::create(GamepadSettings::default())?),
        SamplerKind::Gpio => Box::new(GpioSampler::create(gpio_pins)?),
        SamplerKind::Idle => Box::new(IdleSampler),
    };
    info!("Using {} input", sampler.name());
    Ok(sampler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_auto_lookup_with_gamepad() {
        let cli = Cli::try_parse_from(["openpad"]).expect("parses");
        assert_eq!(cli.selection(), ConfigSelection::Auto);
        assert_eq!(cli.sampler, SamplerKind::Gamepad);
        assert!(cli.dump_config.is_none());
    }

    #[test]
    fn config_profile_and_sampler_flags() {
        let cli = Cli::try_parse_from(["openpad", "--config", "pad.toml", "--sampler", "gpio"])
            .expect("parses");
        assert_eq!(cli.selection(), ConfigSelection::Path(PathBuf::from("pad.toml")));
        assert_eq!(cli.sampler, SamplerKind::Gpio);

        let cli = Cli::try_parse_from(["openpad", "--profile", "nunchuck", "--dump-config", "macropad"])
            .expect("parses");
        assert_eq!(cli.selection(), ConfigSelection::Profile("nunchuck".to_string()));
        assert_eq!(cli.dump_config.as_deref(), Some("macropad"));
    }

    #[test]
    fn rejects_conflicts_and_unknown_values() {
        assert!(Cli::try_parse_from(["openpad", "--config", "a.toml", "--profile", "macropad"]).is_err());
        assert!(Cli::try_parse_from(["openpad", "--sampler", "keyboard"]).is_err());
        assert!(Cli::try_parse_from(["openpad", "--verbose"]).is_err());
    }
}
