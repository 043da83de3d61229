use clap::{Parser, Subcommand};
use enchant_glint::config::{self, ConfigOverrides, GlintConfig};
use enchant_glint::encode::OutputKind;
use enchant_glint::{inspect, output, process, scan};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "enchant-glint")]
#[command(about = "Overlay an animated enchantment glint onto item textures")]
#[command(long_about = "\
Overlay an animated enchantment glint onto item textures

Every source image is upscaled, then a translucent glint layer scrolls
diagonally across it, masked by the image's own transparency. The result is
written as an animated container or as a directory of numbered frames.

Outputs:

  out/boat.gif                    # --format gif
  out/boat.png                    # --format apng
  out/boat.webp                   # --format webp (default)
  out/boat/boat_0.png ...         # --format png-frames
  out/boat/boat_0.jpg ...         # --format jpg-frames
  out/boat (1)/boat_0.png ...     # frame directories are never overwritten

Settings come from glint.toml in the working directory (or --config), with
command-line flags taking precedence.

Run 'enchant-glint gen-config' to generate a documented glint.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: glint.toml in the working directory, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Flags shared by commands that render or validate a run.
#[derive(clap::Args, Clone)]
struct RenderArgs {
    /// Source images, or directories of source images
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory (must exist)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Output kind: gif, apng, webp, png-frames, jpg-frames
    #[arg(long, short)]
    format: Option<OutputKind>,

    /// Frames per source image (1-114514)
    #[arg(long)]
    frames: Option<u32>,

    /// Upscale factor of the glint layer (2-8)
    #[arg(long)]
    glint_scale: Option<u32>,

    /// Upscale factor applied to every source image (1-20)
    #[arg(long)]
    input_scale: Option<u32>,

    /// Glint source texture
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Report failing sources and continue with the rest
    #[arg(long)]
    keep_going: bool,
}

impl RenderArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            texture: self.texture.clone(),
            glint_scale: self.glint_scale,
            frames: self.frames,
            input_scale: self.input_scale,
            format: self.format,
            output_dir: self.output.clone(),
            continue_on_error: self.keep_going,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Render glint animations for the given sources
    Render(RenderArgs),
    /// Validate config, glint texture and sources without writing anything
    Check(RenderArgs),
    /// List rendered outputs in a directory with their frame counts
    Inspect {
        /// Directory to inspect
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Print a stock glint.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Render(args) => {
            let config = resolve_config(cli.config.as_deref(), &args)?;
            let inputs = scan::collect_inputs(&args.inputs)?;
            init_thread_pool(&config.processing);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                let mut throttle = output::ProgressThrottle::default();
                for event in rx {
                    if !throttle.should_print(&event) {
                        continue;
                    }
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::process(&inputs, &config, Some(tx));
            printer.join().ok();

            let summary = result?;
            if !summary.failed.is_empty() {
                output::print_batch_summary(&summary);
                return Err(format!("{} source(s) failed", summary.failed.len()).into());
            }
        }
        Command::Check(args) => {
            let config = resolve_config(cli.config.as_deref(), &args)?;
            let inputs = scan::collect_inputs(&args.inputs)?;
            let report = process::check(&inputs, &config)?;
            output::print_check_report(&report);
            println!("==> Run is valid");
        }
        Command::Inspect { dir } => {
            let entries = inspect::list_outputs(&dir)?;
            output::print_inspect_output(&dir, &entries);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config file (explicit or `glint.toml` in the working
/// directory) and apply command-line overrides.
fn resolve_config(
    path: Option<&Path>,
    args: &RenderArgs,
) -> Result<GlintConfig, config::ConfigError> {
    let base = match path {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(Path::new("."))?,
    };
    args.overrides().apply(base)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
