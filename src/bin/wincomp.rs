use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "wincomp", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a scene into a single PNG frame.
    Frame(FrameArgs),
    /// List the named blur kernel presets.
    Presets,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input scene JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Override the backend named in the scene options.
    #[arg(long, value_enum)]
    backend: Option<BackendChoice>,

    /// Print frame statistics as JSON.
    #[arg(long)]
    stats: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Xrender,
    Glx,
    Hybrid,
}

impl From<BackendChoice> for wincomp::BackendKind {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Xrender => wincomp::BackendKind::XRender,
            BackendChoice::Glx => wincomp::BackendKind::Glx,
            BackendChoice::Hybrid => wincomp::BackendKind::Hybrid,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let result = match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Presets => {
            for name in wincomp::effects::blur::preset_names() {
                println!("{name}");
            }
            Ok(())
        }
    };
    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let src = std::fs::read_to_string(&args.scene)
        .with_context(|| format!("read scene '{}'", args.scene.display()))?;
    let mut scene = wincomp::Scene::from_json(&src).with_context(|| "parse scene JSON")?;
    if let Some(choice) = args.backend {
        scene.opts.backend = choice.into();
    }

    let (pixels, stats) = scene.render().with_context(|| "compose frame")?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &pixels,
        u32::from(scene.width),
        u32::from(scene.height),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    if args.stats {
        println!("{}", serde_json::to_string(&stats)?);
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
