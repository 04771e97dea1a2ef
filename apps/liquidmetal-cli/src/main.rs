use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use liquidmetal_common::EntityId;
use liquidmetal_driver::{FrameDriver, Presenter, SceneConfig};
use liquidmetal_input::Viewport;
use liquidmetal_kernel::Scene;
use liquidmetal_render::{DebugTextRenderer, RenderError, Renderer, UniformModel};
use liquidmetal_tools::SceneInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "liquidmetal-cli", about = "Headless liquid metal scene runner")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration (YAML). Defaults to the stock scene.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the scene the configuration produces
    Info,
    /// Run the frame pipeline headless and print frames as text
    Simulate {
        /// Number of ticks to run
        #[arg(short, long, default_value = "120")]
        ticks: u64,
        /// Frame delta in seconds
        #[arg(long, default_value = "0.016666668")]
        dt: f32,
        /// Print every Nth frame
        #[arg(long, default_value = "30")]
        every: u64,
    },
    /// Dump entity state after running some ticks
    Inspect {
        #[arg(short, long, default_value = "0")]
        ticks: u64,
        /// Single entity id
        #[arg(long)]
        entity: Option<u32>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as YAML
    Config,
}

/// Prints the text rendering of selected frames to stdout.
struct TextPresenter {
    models: usize,
    every: u64,
    renderer: DebugTextRenderer,
}

impl Presenter for TextPresenter {
    fn model_count(&self) -> usize {
        self.models
    }

    fn present(&mut self, scene: &Scene, model: &UniformModel) -> Result<(), RenderError> {
        if self.every > 0 && scene.tick() % self.every == 0 {
            println!("{}", self.renderer.render(scene, model));
        }
        Ok(())
    }
}

/// Presenter that discards frames.
struct NullPresenter(usize);

impl Presenter for NullPresenter {
    fn model_count(&self) -> usize {
        self.0
    }

    fn present(&mut self, _scene: &Scene, _model: &UniformModel) -> Result<(), RenderError> {
        Ok(())
    }
}

const HEADLESS_VIEWPORT: (u32, u32) = (1280, 720);

fn driver_for(config: &SceneConfig) -> anyhow::Result<FrameDriver> {
    let (width, height) = HEADLESS_VIEWPORT;
    Ok(FrameDriver::new(config, Viewport::new(width, height))?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => SceneConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("liquidmetal-cli v{}", env!("CARGO_PKG_VERSION"));
            let driver = driver_for(&config)?;
            println!("{}", SceneInspector::summary(driver.scene()));
            println!(
                "models={} seed={} attractor=({}, gain={})",
                driver.model_capacity(),
                config.seed,
                config.attractor.center,
                config.attractor.gain
            );
        }
        Commands::Simulate { ticks, dt, every } => {
            if !(dt.is_finite() && dt >= 0.0) {
                bail!("dt must be a non-negative number, got {dt}");
            }
            let mut driver = driver_for(&config)?;
            let mut presenter = TextPresenter {
                models: driver.model_capacity(),
                every,
                renderer: DebugTextRenderer::new(),
            };
            for _ in 0..ticks {
                driver.tick(dt, &mut presenter)?;
            }
            tracing::info!(ticks, dt, "simulation finished");
            println!("{}", SceneInspector::summary(driver.scene()));
        }
        Commands::Inspect {
            ticks,
            entity,
            json,
        } => {
            let mut driver = driver_for(&config)?;
            let mut presenter = NullPresenter(driver.model_capacity());
            for _ in 0..ticks {
                driver.tick(1.0 / 60.0, &mut presenter)?;
            }

            let entities = match entity {
                Some(id) => match SceneInspector::inspect_entity(driver.scene(), EntityId(id)) {
                    Some(info) => vec![info],
                    None => bail!("no entity #{id}"),
                },
                None => SceneInspector::list_entities(driver.scene()),
            };

            if json {
                let summary = SceneInspector::summary(driver.scene());
                let doc = serde_json::json!({ "summary": summary, "entities": entities });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                println!("{}", SceneInspector::summary(driver.scene()));
                for info in &entities {
                    println!("  {info}");
                }
            }
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}
