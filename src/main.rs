//! veux CLI
//!
//! Entry point for the `veux` command-line tool.

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::process;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use veux::{
    parse_override, render, render_mode, serve, CanvasRegistry, FrameArtist, RenderError,
    RenderRequest, ServeOptions, StagingViewer,
};

#[derive(Parser)]
#[command(name = "veux")]
#[command(about = "Render structural models", version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a model and write the result
    Render {
        #[command(flatten)]
        render: RenderArgs,

        /// Output file; the extension selects the export (.glb, .html)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Render a model and stage it for serving
    Serve {
        #[command(flatten)]
        render: RenderArgs,

        /// Directory the served files are written into
        #[arg(long, default_value = "veux-serve")]
        dir: PathBuf,

        /// Viewer for binary scenes (mv, none)
        #[arg(long, default_value = veux::serve::DEFAULT_VIEWER)]
        viewer: String,

        #[arg(long)]
        port: Option<u16>,
    },

    /// List available canvas backends
    Canvases,
}

#[derive(Args)]
struct RenderArgs {
    /// Model file (JSON)
    model: PathBuf,

    /// State file with nodal displacements
    #[arg(long, short = 's')]
    state: Option<PathBuf>,

    /// Canvas backend
    #[arg(long, short = 'c')]
    canvas: Option<String>,

    /// Reference attributes to show (alias for --reference)
    #[arg(long, value_delimiter = ',')]
    show: Option<Vec<String>>,

    /// Reference attributes to show exclusively
    #[arg(long, value_delimiter = ',')]
    reference: Option<Vec<String>>,

    /// Displaced attributes to show exclusively
    #[arg(long, value_delimiter = ',')]
    displaced: Option<Vec<String>>,

    /// Reference attributes to hide
    #[arg(long, value_delimiter = ',')]
    hide: Option<Vec<String>>,

    /// Vertical axis (2 or 3)
    #[arg(long)]
    vertical: Option<u8>,

    /// Mode shape to draw from a multi-case state (1-based)
    #[arg(long)]
    mode: Option<u64>,

    /// Displacement scale used with --mode; `--set scale=..` still wins
    #[arg(long)]
    scale: Option<f64>,

    /// TOML config file, repeatable
    #[arg(long = "config")]
    config: Vec<PathBuf>,

    /// Setting override, e.g. --set artist.vertical=3
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Print the resolved settings as JSON
    #[arg(long)]
    print_config: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error initializing logging: {}", e);
    }

    match cli.command {
        Commands::Render { render, output } => run_render(render, output),
        Commands::Serve {
            render,
            dir,
            viewer,
            port,
        } => run_serve(render, dir, viewer, port),
        Commands::Canvases => run_canvases(),
    }
}

fn run_canvases() {
    let registry = CanvasRegistry::builtin();
    for name in registry.names() {
        let Some(canvas) = registry.create(name, &Value::Null) else {
            continue;
        };
        let exports: Vec<&str> = canvas.capabilities().iter().map(|e| e.as_str()).collect();
        println!("{:<12} {}", name, exports.join(", "));
    }
}

fn run_render(args: RenderArgs, output: Option<PathBuf>) {
    let artist = render_or_exit(args);

    if let Some(path) = output {
        if let Err(e) = artist.save(&path) {
            eprintln!("Error saving rendering: {}", e);
            process::exit(1);
        }
    } else {
        info!(
            canvas = artist.canvas().name(),
            layers = artist.canvas().layers().len(),
            "rendered without output file"
        );
    }
}

fn run_serve(args: RenderArgs, dir: PathBuf, viewer: String, port: Option<u16>) {
    let artist = render_or_exit(args);
    let mut staging = StagingViewer::new(dir);
    let options = ServeOptions { viewer, port };

    if let Err(e) = serve(&artist, &mut staging, &options) {
        eprintln!("Error serving: {}", e);
        process::exit(1);
    }
    println!("Staged in {}", staging.dir().display());
    for path in staging.staged() {
        println!("  {}", path.display());
    }
}

fn render_or_exit(args: RenderArgs) -> FrameArtist {
    let print_config = args.print_config;
    let artist = match build_and_render(args) {
        Ok(artist) => artist,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if print_config {
        match artist.settings().to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing settings: {}", e);
                process::exit(1);
            }
        }
    }
    artist
}

fn build_and_render(args: RenderArgs) -> Result<FrameArtist, RenderError> {
    let mut request = RenderRequest::new(args.model);
    request.state = args.state.map(Into::into);
    request.canvas = args.canvas;
    request.visibility.show = args.show;
    request.visibility.reference = args.reference;
    request.visibility.displaced = args.displaced;
    request.visibility.hide = args.hide;
    request.vertical = args.vertical;
    request.config_files = args.config;
    for assignment in &args.set {
        request.overrides.push(parse_override(assignment)?);
    }

    let registry = CanvasRegistry::builtin();
    match args.mode {
        Some(mode) => render_mode(request, mode, args.scale, &registry),
        None => render(request, &registry),
    }
}
