use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::{error, info};

use trackpipe::stage::install_interrupt_handler;
use trackpipe::transport::{
    resolve_frame_sink, resolve_frame_source, resolve_position_sink, resolve_position_source,
};
use trackpipe::{
    CancellationToken, CombinerKind, CombinerStage, DebugConfig, DecorateOptions, Decorator,
    DecoratorStage, DetectorKind, DetectorStage, Endpoint, FilterKind, FilterStage, FrameFilter,
    PositionCombiner, PositionDetector, Stage, StageConfig,
};

#[derive(Parser)]
#[command(name = "trackpipe", version)]
#[command(
    about = "Video tracking pipeline stages: frame filters, position detectors, combiners and decorators"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Filter frames from SOURCE and publish them to SINK
    Filter {
        #[arg(value_enum, value_name = "TYPE")]
        kind: FilterKind,

        /// Frame source name (e.g. raw)
        source: String,

        /// Frame sink name (e.g. filt)
        sink: String,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Detect object positions in frames from SOURCE and publish them to SINK
    Detect {
        #[arg(value_enum, value_name = "TYPE")]
        kind: DetectorKind,

        /// Frame source name (e.g. raw)
        source: String,

        /// Position sink name (e.g. pos)
        sink: String,

        #[command(flatten)]
        config: ConfigArgs,

        /// Save tuning images to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,
    },

    /// Combine positions from two or more SOURCES and publish them to SINK
    Combine {
        #[arg(value_enum, value_name = "TYPE")]
        kind: CombinerKind,

        /// Position source names followed by the sink name (e.g. pos1 pos2 pos)
        #[arg(num_args = 3.., required = true, value_name = "SOURCES... SINK")]
        endpoints: Vec<String>,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Draw positions and sample information onto frames from SOURCE and publish them to SINK
    Decorate {
        /// Frame source name (e.g. raw)
        source: String,

        /// Frame sink name (e.g. dec)
        sink: String,

        /// Position source names whose positions are drawn on each frame
        #[arg(short = 'p', long = "position-sources", value_name = "SOURCE", num_args = 1..)]
        position_sources: Vec<String>,

        /// Write the current date and time on each frame
        #[arg(short = 't', long)]
        timestamp: bool,

        /// Write the frame sample number on each frame
        #[arg(short = 's', long)]
        sample: bool,

        /// Write the binary encoded sample number on each frame
        #[arg(short = 'S', long)]
        sample_code: bool,
    },
}

#[derive(Args)]
struct ConfigArgs {
    /// Configuration file
    #[arg(short = 'c', long, value_name = "FILE", requires = "config_key")]
    config_file: Option<PathBuf>,

    /// Configuration key
    #[arg(short = 'k', long, value_name = "KEY", requires = "config_file")]
    config_key: Option<String>,
}

impl ConfigArgs {
    fn load(&self) -> anyhow::Result<Option<(StageConfig, &str)>> {
        match (&self.config_file, &self.config_key) {
            (Some(file), Some(key)) => Ok(Some((StageConfig::load(file)?, key.as_str()))),
            _ => Ok(None),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    let token = CancellationToken::new();
    if let Err(e) = install_interrupt_handler(&token) {
        error!("Failed to install interrupt handler: {}", e);
        return ExitCode::FAILURE;
    }

    match execute(cli.command, &token) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Command, token: &CancellationToken) -> anyhow::Result<()> {
    match command {
        Command::Filter {
            kind,
            source,
            sink,
            config,
        } => {
            let mut filter = kind.build();
            let name = filter.name().to_string();
            if let Some((config, key)) = config.load().with_context(|| format!("[{}]", name))? {
                filter
                    .configure(&config, key)
                    .with_context(|| format!("[{}]", name))?;
            }

            let (source, sink) = (Endpoint::from(source), Endpoint::from(sink));
            let stage = FilterStage::new(
                filter,
                resolve_frame_source(&source).with_context(|| format!("[{}]", name))?,
                resolve_frame_sink(&sink).with_context(|| format!("[{}]", name))?,
            );
            serve(stage, &[source], &sink, token);
        }

        Command::Detect {
            kind,
            source,
            sink,
            config,
            debug_out,
        } => {
            let mut detector = kind.build();
            let name = detector.name().to_string();
            if let Some((config, key)) = config.load().with_context(|| format!("[{}]", name))? {
                detector
                    .configure(&config, key)
                    .with_context(|| format!("[{}]", name))?;
            }

            let (source, sink) = (Endpoint::from(source), Endpoint::from(sink));
            let mut stage = DetectorStage::new(
                detector,
                resolve_frame_source(&source).with_context(|| format!("[{}]", name))?,
                resolve_position_sink(&sink).with_context(|| format!("[{}]", name))?,
            );
            if let Some(dir) = debug_out {
                stage = stage.with_debug(DebugConfig::new(dir).with_context(|| format!("[{}]", name))?);
            }
            serve(stage, &[source], &sink, token);
        }

        Command::Combine {
            kind,
            mut endpoints,
            config,
        } => {
            let mut combiner = kind.build();
            let name = combiner.name().to_string();
            if let Some((config, key)) = config.load().with_context(|| format!("[{}]", name))? {
                combiner
                    .configure(&config, key)
                    .with_context(|| format!("[{}]", name))?;
            }

            // clap guarantees at least three names; the last is the sink
            let sink = Endpoint::from(endpoints.pop().unwrap_or_default());
            let sources: Vec<Endpoint> = endpoints.into_iter().map(Endpoint::from).collect();
            let resolved = sources
                .iter()
                .map(resolve_position_source)
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("[{}]", name))?;
            let stage = CombinerStage::new(
                combiner,
                resolved,
                resolve_position_sink(&sink).with_context(|| format!("[{}]", name))?,
            );
            serve(stage, &sources, &sink, token);
        }

        Command::Decorate {
            source,
            sink,
            position_sources,
            timestamp,
            sample,
            sample_code,
        } => {
            let decorator = Decorator::new(DecorateOptions {
                timestamp,
                sample_number: sample,
                sample_code,
            });
            let name = decorator.name().to_string();

            let (source, sink) = (Endpoint::from(source), Endpoint::from(sink));
            let position_endpoints: Vec<Endpoint> =
                position_sources.into_iter().map(Endpoint::from).collect();
            let resolved = position_endpoints
                .iter()
                .map(resolve_position_source)
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("[{}]", name))?;
            let stage = DecoratorStage::new(
                decorator,
                resolve_frame_source(&source).with_context(|| format!("[{}]", name))?,
                resolved,
                resolve_frame_sink(&sink).with_context(|| format!("[{}]", name))?,
            );

            let mut sources = vec![source];
            sources.extend(position_endpoints);
            serve(stage, &sources, &sink, token);
        }
    }

    Ok(())
}

fn serve<S: Stage>(mut stage: S, sources: &[Endpoint], sink: &Endpoint, token: &CancellationToken) {
    let names: Vec<&str> = sources.iter().map(Endpoint::as_str).collect();
    info!("[{}] Listening to source(s) {}.", stage.name(), names.join(" "));
    info!("[{}] Streaming to sink {}.", stage.name(), sink);
    info!("[{}] Press CTRL+C to exit.", stage.name());

    let iterations = trackpipe::run(&mut stage, token);

    info!("[{}] Exiting after {} iterations.", stage.name(), iterations);
}
