use std::{
    io,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ownercheck::{validate, FileSource, ValidationError};

#[derive(Parser)]
#[command(version, about = "Check a CODEOWNERS-style manifest against the tracked trees")]
struct Cli {
    /// Root folders to validate, relative to the working directory
    #[arg(required = true)]
    folders: Vec<String>,

    #[clap(short = 'f', long = "file")]
    codeowners_file: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn codeowners_path(&self) -> PathBuf {
        self.codeowners_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("./CODEOWNERS"))
    }

    fn tracked_folders(&self) -> Vec<String> {
        self.folders.iter().map(|f| f.trim().to_owned()).collect()
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<ValidationError>() {
                Some(ValidationError::Inconsistent(report)) => eprint!("{}", report),
                _ => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    validate(
        &cli.codeowners_path(),
        &cli.tracked_folders(),
        &WalkSource,
    )?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with_writer(io::stderr)
        .init();
}

/// Recursive filesystem enumeration for the engine. Unreadable entries below
/// the root are skipped; a root that does not exist is an error, since the
/// engine must not mistake it for an empty tree.
struct WalkSource;

impl FileSource for WalkSource {
    fn files_under(&self, folder: &str) -> io::Result<Vec<String>> {
        if !Path::new(folder).is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", folder),
            ));
        }
        Ok(walkdir::WalkDir::new(folder)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| !entry.path().components().any(|c| c.as_os_str() == ".git"))
            .map(|entry| entry.path().to_string_lossy().into_owned())
            .collect())
    }
}
