use anyhow::{Context, Result};
use clap::Parser;
use lifeworks::core::config::{SimulationConfig, SimulationConfigBuilder};
use lifeworks::engine::{ControlSource, IntervalTicker, Simulation, SimulationOutcome};
use lifeworks::grid::{random_soup, Cell, Pattern, PATTERNS};
use lifeworks::io::{stdin_controls, PgmIo};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Parallel Game of Life on a toroidal board
#[derive(Parser, Debug)]
#[command(name = "lifeworks", version, about)]
struct Cli {
    /// Board width
    #[arg(short = 'w', long)]
    width: Option<usize>,

    /// Board height
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Number of workers
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Number of turns to simulate
    #[arg(long)]
    turns: Option<usize>,

    /// YAML configuration file; flags override its values
    #[arg(long, conflicts_with = "dev")]
    config: Option<PathBuf>,

    /// Start from the small development preset instead of the defaults
    #[arg(long)]
    dev: bool,

    /// Seed the board with a named pattern at its centre instead of a PGM image
    #[arg(long, conflicts_with = "soup")]
    pattern: Option<String>,

    /// Seed the board with random cells alive at this density (0.0 to 1.0)
    #[arg(long)]
    soup: Option<f64>,

    /// Random seed for --soup; a fresh one is drawn when omitted
    #[arg(long, requires = "soup")]
    seed: Option<u64>,

    /// Directory holding `<w>x<h>.pgm` seed images
    #[arg(long, default_value = "images")]
    images: PathBuf,

    /// Directory output images are written to
    #[arg(long, default_value = "out")]
    out: PathBuf,

    /// Do not read p/s/q commands from stdin
    #[arg(long)]
    no_keys: bool,
}

impl Cli {
    fn simulation_config(&self) -> Result<SimulationConfig> {
        let mut builder = match &self.config {
            Some(path) => SimulationConfigBuilder::from_yaml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None if self.dev => SimulationConfigBuilder::development(),
            None => SimulationConfig::builder(),
        };
        if let Some(width) = self.width {
            builder = builder.width(width);
        }
        if let Some(height) = self.height {
            builder = builder.height(height);
        }
        if let Some(turns) = self.turns {
            builder = builder.turns(turns);
        }
        if let Some(threads) = self.threads {
            builder = builder.threads(threads);
        }
        Ok(builder.build()?)
    }

    /// Generated seed stream, if a pattern or soup was requested
    fn generated_seed(&self, config: &SimulationConfig) -> Result<Option<Vec<u8>>> {
        let (width, height) = (config.width, config.height);
        if let Some(name) = &self.pattern {
            let pattern = Pattern::find(name).with_context(|| {
                let known: Vec<&str> = PATTERNS.iter().map(|p| p.name).collect();
                format!("unknown pattern {:?}, expected one of {}", name, known.join(", "))
            })?;
            let origin = Cell::new(width / 2, height / 2);
            return Ok(Some(pattern.stamp(width, height, origin)));
        }
        if let Some(density) = self.soup {
            if !(0.0..=1.0).contains(&density) {
                anyhow::bail!("--soup density must be between 0 and 1, got {}", density);
            }
            let seed = self.seed.unwrap_or_else(|| fastrand::u64(..));
            info!(density, seed, "Generating random soup");
            return Ok(Some(random_soup(width, height, density, seed)));
        }
        Ok(None)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.simulation_config()?;
    info!(?config, "Configuration loaded");

    let controls = if cli.no_keys {
        ControlSource::disconnected()
    } else {
        stdin_controls()
    };

    let mut io = PgmIo::new(&cli.images, &cli.out);
    if let Some(seed) = cli.generated_seed(&config)? {
        io = io.with_seed(seed);
    }

    let simulation = Simulation::builder(config.clone())
        .with_io(Arc::new(io))
        .with_controls(controls)
        .with_ticker(Box::new(IntervalTicker::new(config.status_interval)))
        .build()?;

    match simulation.run().await {
        Ok(SimulationOutcome::Completed(state)) => {
            println!(
                "Completed {} turns: {} alive cells, written to {}",
                state.completed_turns,
                state.alive.len(),
                cli.out.join(format!("{}.pgm", state.filename)).display()
            );
            Ok(())
        }
        Ok(SimulationOutcome::Quit { filename, .. }) => {
            println!("Saved {}", cli.out.join(format!("{}.pgm", filename)).display());
            println!("Program Terminating");
            Ok(())
        }
        Err(e) => {
            error!(category = e.category(), "Simulation failed: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeworks::grid::patterns::GLIDER;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("lifeworks").chain(args.iter().copied())).unwrap()
    }

    fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn width_flag_keeps_yaml_height() {
        let file = yaml_file("width: 16\nheight: 24\nthreads: 2\n");
        let path = file.path().to_str().unwrap();

        let config = parse(&["--config", path, "-w", "64"]).simulation_config().unwrap();
        assert_eq!((config.width, config.height), (64, 24));
        assert_eq!(config.channel_capacity, 1);
    }

    #[test]
    fn thread_flag_recomputes_capacity_missing_from_yaml() {
        let file = yaml_file("width: 16\nheight: 16\nthreads: 2\n");
        let path = file.path().to_str().unwrap();

        let config = parse(&["--config", path, "-t", "8"]).simulation_config().unwrap();
        assert_eq!(config.threads, 8);
        assert_eq!(config.channel_capacity, 4);
    }

    #[test]
    fn dev_preset_with_overrides() {
        let config = parse(&["--dev", "--turns", "3"]).simulation_config().unwrap();
        assert_eq!((config.width, config.height, config.turns), (16, 16, 3));
        assert!(Cli::try_parse_from(["lifeworks", "--dev", "--config", "x.yaml"]).is_err());
    }

    #[test]
    fn pattern_seed_is_centred() {
        let cli = parse(&["--dev", "--pattern", "Glider"]);
        let config = cli.simulation_config().unwrap();
        let seed = cli.generated_seed(&config).unwrap();
        assert_eq!(seed, Some(GLIDER.stamp(16, 16, Cell::new(8, 8))));
    }

    #[test]
    fn unknown_pattern_lists_known_names() {
        let cli = parse(&["--dev", "--pattern", "gosper"]);
        let config = cli.simulation_config().unwrap();
        let err = cli.generated_seed(&config).unwrap_err().to_string();
        assert!(err.contains("glider"));
        assert!(err.contains("beacon"));
    }

    #[test]
    fn soup_is_reproducible_with_seed() {
        let cli = parse(&["--dev", "--soup", "0.4", "--seed", "11"]);
        let config = cli.simulation_config().unwrap();
        let seed = cli.generated_seed(&config).unwrap();
        assert_eq!(seed, Some(random_soup(16, 16, 0.4, 11)));

        let cli = parse(&["--dev", "--soup", "1.5"]);
        assert!(cli.generated_seed(&config).is_err());
        assert!(Cli::try_parse_from(["lifeworks", "--seed", "3"]).is_err());
        assert!(parse(&["--dev"]).generated_seed(&config).unwrap().is_none());
    }
}
