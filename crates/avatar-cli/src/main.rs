//! Avatar CLI - headless penguin simulator.
//!
//! - `avatar run` - tick the penguin's tree for a number of frames on a virtual clock
//! - `avatar export` - write the penguin tree as a JSON document
//! - `avatar validate` - check that a tree document builds

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use avatar_brain::{
    build_penguin_tree, penguin_registry, AvatarBrain, BrainConfig, BrainDeps, KeywordLlm,
    Role,
};
use avatar_bt::{walk, BehaviorTree, TreeDocument};
use avatar_core::{ManualClock, Scope};
use avatar_tools::{tick_summary, TraceEvent, TraceSink, TRACE_SINK};

#[derive(Parser)]
#[command(name = "avatar")]
#[command(about = "Stage penguin behavior tree simulator", version)]
struct Cli {
    /// Brain configuration (YAML). Defaults to ./avatar.yaml when present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Tick the penguin for a number of frames
    Run {
        /// Frames to simulate
        #[arg(long, default_value_t = 600)]
        frames: u64,

        /// Frames per simulated second
        #[arg(long, default_value_t = 60)]
        fps: u32,

        /// Chat message to send
        #[arg(long)]
        say: Option<String>,

        /// Frame at which the message is sent
        #[arg(long, default_value_t = 0)]
        say_at: u64,

        /// Frame at which the penguin is clicked
        #[arg(long)]
        click_at: Option<u64>,

        /// Starting energy (0-100)
        #[arg(long)]
        energy: Option<f64>,

        /// Starting boredom (0-100)
        #[arg(long)]
        boredom: Option<f64>,

        /// Tree document to run instead of the built-in penguin
        #[arg(long)]
        tree: Option<PathBuf>,

        /// Sleep between frames instead of running as fast as possible
        #[arg(long)]
        realtime: bool,

        /// Log every node open and close
        #[arg(long)]
        trace: bool,
    },

    /// Write the built-in penguin tree as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Check that a tree document builds with the penguin's nodes
    Validate {
        /// Tree document
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Run {
            frames,
            fps,
            say,
            say_at,
            click_at,
            energy,
            boredom,
            tree,
            realtime,
            trace,
        }) => {
            let options = RunOptions {
                frames,
                fps,
                say,
                say_at,
                click_at,
                energy,
                boredom,
                realtime,
                trace,
            };
            run(config, tree.as_deref(), options).await
        }
        Some(Commands::Export { out }) => export(config, out.as_deref()),
        Some(Commands::Validate { path }) => validate(config, &path),
        None => {
            println!("Avatar - stage penguin behavior tree");
            println!();
            println!("Usage: avatar <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run       Tick the penguin for a number of frames");
            println!("  export    Write the penguin tree as JSON");
            println!("  validate  Check that a tree document builds");
            println!();
            println!("Run 'avatar --help' for more information.");
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<BrainConfig> {
    match path {
        Some(path) => BrainConfig::load(path),
        None => {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            BrainConfig::load_from_dir(&cwd)
        }
    }
}

fn load_tree(path: &Path, deps: &BrainDeps) -> Result<BehaviorTree> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tree from {}", path.display()))?;
    let document = TreeDocument::from_json(&json)
        .with_context(|| format!("Failed to parse tree from {}", path.display()))?;
    let tree = BehaviorTree::from_document(&document, &penguin_registry(deps))
        .with_context(|| format!("Failed to build tree from {}", path.display()))?;
    Ok(tree)
}

struct RunOptions {
    frames: u64,
    fps: u32,
    say: Option<String>,
    say_at: u64,
    click_at: Option<u64>,
    energy: Option<f64>,
    boredom: Option<f64>,
    realtime: bool,
    trace: bool,
}

/// Forwards lifecycle events to the log.
struct LogSink;

impl TraceSink for LogSink {
    fn emit(&mut self, event: TraceEvent) {
        match event.status {
            Some(status) => tracing::debug!(
                tick = event.tick,
                tag = %event.tag,
                node = ?event.node,
                %status,
                "trace"
            ),
            None => tracing::debug!(tick = event.tick, tag = %event.tag, node = ?event.node, "trace"),
        }
    }
}

async fn run(config: BrainConfig, tree_path: Option<&Path>, options: RunOptions) -> Result<()> {
    let deps = BrainDeps::new(KeywordLlm::shared(), config.clone());
    let tree = match tree_path {
        Some(path) => load_tree(path, &deps)?,
        None => build_penguin_tree(&deps),
    };
    tracing::info!(tree = %tree.title, frames = options.frames, fps = options.fps, "Starting simulation");

    let clock = ManualClock::new(0.0);
    let origin = config.motion.origin;
    let mut brain = AvatarBrain::new(tree.with_clock(clock.clone()), config);
    brain.set_penguin_position(origin);
    if let Some(energy) = options.energy {
        brain
            .blackboard_mut()
            .set(avatar_brain::keys::ENERGY, energy, Scope::Global);
    }
    if let Some(boredom) = options.boredom {
        brain
            .blackboard_mut()
            .set(avatar_brain::keys::BOREDOM, boredom, Scope::Global);
    }
    if options.trace {
        let sink: Box<dyn TraceSink> = Box::new(LogSink);
        brain
            .blackboard_mut()
            .set_handle(TRACE_SINK, sink, Scope::Global);
    }

    let frame_ms = 1000.0 / f64::from(options.fps.max(1));
    let mut action: Option<String> = None;
    let mut expression: Option<String> = None;

    for frame in 0..options.frames {
        if frame == options.say_at {
            if let Some(text) = &options.say {
                println!("user> {text}");
                brain.submit_user_input(text.clone());
            }
        }
        brain.set_clicked(options.click_at == Some(frame));

        let output = brain.tick();

        if output.action != action {
            tracing::info!(frame, action = ?output.action, "action");
            action = output.action.clone();
        }
        if output.expression != expression {
            tracing::info!(frame, expression = ?output.expression, "expression");
            expression = output.expression.clone();
        }
        for message in &output.chat {
            let who = match message.role {
                Role::User => "user",
                Role::Model => "penguin",
                Role::System => "system",
                Role::Tool => continue,
            };
            println!("{who}> {}", message.content);
        }

        if let Some(position) = output.position {
            brain.set_penguin_position(position);
        }
        if let Some(current) = &output.action {
            brain.set_current_action(current);
        }

        clock.advance_ms(frame_ms);
        if options.realtime {
            tokio::time::sleep(Duration::from_secs_f64(frame_ms / 1000.0)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }

    println!();
    println!("Frames:  {}", brain.frames());
    println!("Energy:  {:.1}", brain.energy());
    println!("Boredom: {:.1}", brain.boredom());
    if let Some(summary) = tick_summary(brain.blackboard(), brain.tree().id()) {
        println!(
            "Last tick: {} nodes, {:.3} ms total, {:.3} ms average",
            summary.node_count, summary.total_ms, summary.average_ms
        );
        if let Some((id, ms)) = summary.slowest {
            let title = brain
                .tree()
                .find_node(id)
                .map(|n| n.meta().title.clone())
                .unwrap_or_else(|| id.to_string());
            println!("Slowest:   {title} ({ms:.3} ms)");
        }
    }
    Ok(())
}

fn export(config: BrainConfig, out: Option<&Path>) -> Result<()> {
    let deps = BrainDeps::new(KeywordLlm::shared(), config);
    let json = build_penguin_tree(&deps)
        .to_document()
        .to_json()
        .context("Failed to serialize penguin tree")?;

    match out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Exported penguin tree");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn validate(config: BrainConfig, path: &Path) -> Result<()> {
    let deps = BrainDeps::new(KeywordLlm::shared(), config);
    let tree = load_tree(path, &deps)?;
    let nodes = tree.root().map(|root| walk(root).len()).unwrap_or(0);
    println!("{}: ok ({} nodes)", tree.title, nodes);
    Ok(())
}
