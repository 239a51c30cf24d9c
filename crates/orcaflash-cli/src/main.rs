//! orcaflash CLI - OrcaSlicer post-processing script
//!
//! Rewrites the metadata of an OrcaSlicer G-code file for FlashForge firmware,
//! replacing the file in place unless `--output` is given.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use orcaflash::{MaterialTable, TranscodeOptions, Transcoder};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "orcaflash", version)]
#[command(about = "Convert OrcaSlicer G-code metadata for FlashForge printers", long_about = None)]
struct Cli {
    /// G-code file written by OrcaSlicer
    input: PathBuf,

    /// Write the result here instead of replacing the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Prepend a `; MD5:` checksum line
    #[arg(short = 'm', long)]
    add_md5: bool,

    /// TOML material table with densities and prices
    #[arg(long, value_name = "FILE.toml")]
    materials: Option<PathBuf>,

    /// Copy the input to `<INPUT>.backup` before writing
    #[arg(long)]
    backup: bool,

    /// Log more (-v info, -vv debug). `RUST_LOG` is honoured too.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// What a run did.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Written(PathBuf),
    AlreadyConverted,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(&cli)?;
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<Outcome> {
    let options = TranscodeOptions {
        materials: load_materials(cli.materials.as_deref())?,
        add_md5: cli.add_md5,
    };

    let input = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let converted = Transcoder::new(options)
        .transcode(&input)
        .with_context(|| format!("failed to convert {}", cli.input.display()))?;

    if converted.already_converted {
        info!(path = %cli.input.display(), "already converted, nothing written");
        return Ok(Outcome::AlreadyConverted);
    }

    if cli.backup {
        let backup = backup_path(&cli.input);
        fs::copy(&cli.input, &backup)
            .with_context(|| format!("failed to write backup {}", backup.display()))?;
        info!(path = %backup.display(), "saved backup");
    }

    let target = cli.output.clone().unwrap_or_else(|| cli.input.clone());
    write_atomic(&target, &converted.text)?;
    info!(
        path = %target.display(),
        layers = converted.layers,
        "wrote converted G-code"
    );
    Ok(Outcome::Written(target))
}

fn load_materials(path: Option<&Path>) -> Result<MaterialTable> {
    let Some(path) = path else {
        return Ok(MaterialTable::builtin());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read material table {}", path.display()))?;
    MaterialTable::from_toml_str(&text)
        .with_context(|| format!("invalid material table {}", path.display()))
}

fn backup_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".backup");
    PathBuf::from(name)
}

/// Write through a temporary file in the destination directory, then rename
/// it over `path`. A failed write leaves `path` untouched.
fn write_atomic(path: &Path, text: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create a temporary file in {}", dir.display()))?;
    file.write_all(text.as_bytes())
        .with_context(|| format!("failed to write {}", file.path().display()))?;
    file.as_file().sync_all()?;

    // Keep the permissions of the file being replaced.
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(file.path(), meta.permissions())?;
    }

    file.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
