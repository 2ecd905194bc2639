use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use map_prompt::app::{MapController, Services, WorkerPool};
use map_prompt::config::{MapConfig, parse_coordinate};
use map_prompt::domain::Coordinate;
use map_prompt::net::{HttpSubmitter, NominatimClient};
use map_prompt::platform::{console, system_geolocator};

#[derive(Debug, Parser)]
#[command(name = "map-prompt", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Endpoint that receives {latitude, longitude, radius, prompt}
    #[arg(long)]
    submit_url: Option<String>,

    /// Nominatim-compatible search endpoint
    #[arg(long)]
    geocoder_url: Option<String>,

    /// Meters added or removed per radius step
    #[arg(long)]
    radius_step: Option<f64>,

    /// Use this device position ("lat,lon") instead of the location service
    #[arg(long, value_parser = parse_position)]
    position: Option<Coordinate>,

    /// TrueType font used for labels
    #[arg(long)]
    font: Option<PathBuf>,

    /// Run the line-oriented shell instead of the map window
    #[arg(long)]
    console: bool,
}

impl Cli {
    fn apply(&self, config: &mut MapConfig) {
        if let Some(url) = &self.submit_url {
            config.submit_url = url.clone();
        }
        if let Some(url) = &self.geocoder_url {
            config.geocoder_url = url.clone();
        }
        if let Some(step) = self.radius_step {
            config.radius_step = step;
        }
        if let Some(position) = self.position {
            config.device_position = Some(position);
        }
        if let Some(font) = &self.font {
            config.font_path = Some(font.clone());
        }
    }
}

fn parse_position(text: &str) -> Result<Coordinate, String> {
    parse_coordinate(text).ok_or_else(|| format!("expected \"lat,lon\", got {text:?}"))
}

fn build_services(config: &MapConfig) -> anyhow::Result<Services> {
    let geocoder = NominatimClient::new(
        config.geocoder_url.clone(),
        &config.user_agent,
        config.request_timeout(),
    )
    .context("Failed to build geocoding client")?;
    let submitter = HttpSubmitter::new(config.submit_url.clone(), config.request_timeout())
        .context("Failed to build submission client")?;

    Ok(Services {
        geocoder: Arc::new(geocoder),
        submitter: Arc::new(submitter),
        locator: Arc::from(system_geolocator(config.device_position)),
    })
}

fn run_console(config: &MapConfig, services: Services) -> anyhow::Result<()> {
    let pool = WorkerPool::start(services, config.workers, Arc::new(|| {}));
    let completions = pool.completions();
    let mut controller = MapController::new(config, Box::new(pool));
    controller.start();

    let mut stdout = io::stdout();
    console::run(&mut controller, completions, io::BufReader::new(io::stdin()), &mut stdout)
        .context("Console shell failed")
}

#[cfg(windows)]
fn run_window(config: &MapConfig, services: Services) -> anyhow::Result<()> {
    use map_prompt::platform::win32;
    use map_prompt::ui::ShellRenderer;

    let wake = win32::WakeTarget::default();
    let pool = WorkerPool::start(services, config.workers, wake.waker());
    let completions = pool.completions();
    let mut controller = MapController::new(config, Box::new(pool));
    controller.start();

    let renderer = ShellRenderer::with_font_file(config.font_path.as_deref());
    win32::run(
        controller,
        completions,
        renderer,
        wake,
        config.window_width as i32,
        config.window_height as i32,
    )
    .context("Map window failed")
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = MapConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    log::info!(
        "Submitting to {} and geocoding with {}",
        config.submit_url,
        config.geocoder_url
    );
    let services = build_services(&config)?;

    #[cfg(windows)]
    if !cli.console {
        return run_window(&config, services);
    }

    #[cfg(not(windows))]
    if !cli.console {
        log::info!("No map window on this platform, using the console shell");
    }

    run_console(&config, services)
}
