use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use geoseq::{AppConfig, GeoseqError, GeoseqResult, IngestMode, Ingested, SequenceConfig, Workspace};

#[derive(Parser, Debug)]
#[command(name = "geoseq", version)]
struct Cli {
    /// Application config JSON. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Workspace root; overrides `root_dir` from the config.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Log at DEBUG instead of INFO (logs go to stderr).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print cameras, stock nadirs, integrations, workspace root and stored tokens.
    Config,
    /// Store a destination credential (an empty token clears it).
    SetToken {
        #[arg(long)]
        key: String,
        #[arg(long, default_value = "")]
        token: String,
    },
    /// Parse a GPX file and print its points.
    LoadTrack {
        #[arg(long)]
        path: PathBuf,
    },
    /// Ingest a video or photo directory as the originals of a sequence.
    Ingest {
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        mode: ModeChoice,
        /// Drop undecodable photos instead of failing.
        #[arg(long)]
        skip_corrupted: bool,
    },
    /// Render the nadir preview sweep over one sample frame.
    PreviewNadir {
        #[arg(long)]
        logo: PathBuf,
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Build and commit a sequence from ingest output.
    Commit {
        /// Sequence config JSON.
        #[arg(long)]
        sequence: PathBuf,
        /// Output of `ingest`, as JSON.
        #[arg(long)]
        captures: PathBuf,
    },
    /// List committed sequences, newest first.
    List,
    /// Remove a committed sequence with its assets.
    Remove {
        #[arg(long)]
        id: String,
    },
    /// Discard an in-progress sequence and the scratch area.
    Reset {
        #[arg(long)]
        name: String,
    },
    /// Record the destination key of a committed sequence.
    Link {
        #[arg(long)]
        id: String,
        #[arg(long)]
        key: String,
    },
    /// Clear scratch files, discarding the named in-progress sequence if given.
    Shutdown {
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeChoice {
    Video,
    Images,
}

impl From<ModeChoice> for IngestMode {
    fn from(m: ModeChoice) -> Self {
        match m {
            ModeChoice::Video => IngestMode::Video,
            ModeChoice::Images => IngestMode::Images,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(payload) => {
            println!("{payload}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let payload = serde_json::json!({
                "error": { "kind": e.kind(), "message": e.to_string() }
            });
            println!("{payload}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> GeoseqResult<serde_json::Value> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(root) = cli.root {
        config.root_dir = root;
    }
    let ws = Workspace::open(config)?;

    match cli.cmd {
        Command::Config => to_json(&ws.load_config()?),
        Command::SetToken { key, token } => {
            ws.set_token(&key, &token)?;
            Ok(serde_json::json!({ "ok": true }))
        }
        Command::LoadTrack { path } => to_json(&ws.load_track(&path)?),
        Command::Ingest {
            source,
            name,
            mode,
            skip_corrupted,
        } => to_json(&ws.ingest(&source, &name, mode.into(), skip_corrupted)?),
        Command::PreviewNadir {
            logo,
            image,
            width,
            height,
        } => to_json(&ws.preview_nadir(&logo, &image, width, height)?),
        Command::Commit { sequence, captures } => {
            let config: SequenceConfig = read_json(&sequence)?;
            let ingested: Ingested = read_json(&captures)?;
            to_json(&ws.commit_sequence(&config, &ingested.points)?)
        }
        Command::List => to_json(&ws.list_sequences()?),
        Command::Remove { id } => {
            let removed = ws.remove_sequence(&id)?;
            Ok(serde_json::json!({ "removed": removed }))
        }
        Command::Reset { name } => {
            ws.reset_sequence(&SequenceConfig::named(name))?;
            Ok(serde_json::json!({ "ok": true }))
        }
        Command::Link { id, key } => to_json(&ws.link_destination(&id, &key)?),
        Command::Shutdown { name } => {
            let config = name.map(SequenceConfig::named);
            ws.shutdown(config.as_ref())?;
            Ok(serde_json::json!({ "ok": true }))
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> GeoseqResult<T> {
    let f = File::open(path).with_context(|| format!("open '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .map_err(|e| GeoseqError::validation(format!("parse '{}': {e}", path.display())))
}

fn to_json<T: serde::Serialize>(value: &T) -> GeoseqResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| GeoseqError::Other(e.into()))
}
