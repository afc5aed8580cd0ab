use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tempfile::NamedTempFile;
use tracing::{debug, warn, Level};
use tracing_subscriber::FmtSubscriber;

use pngzip::cli::{self, Cli, Mode};
use pngzip::{validate_polyglot, PolyglotCreator, StdinPrompt, ValidationResult};

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.mode() {
        Mode::Info => {
            println!("{}", cli::INFO_TEXT);
            ExitCode::SUCCESS
        }
        Mode::Usage => {
            println!("{}", cli::USAGE);
            ExitCode::SUCCESS
        }
        Mode::Build { image, archive } => match run(image, archive) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("\n{err:#}\n");
                ExitCode::FAILURE
            }
        },
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        _ => Level::DEBUG,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).ok();
}

fn run(image: &Path, archive: &Path) -> Result<()> {
    cli::check_input_names(image, archive)?;

    println!("\nReading files. Please wait...");
    let mut creator = PolyglotCreator::from_files(image, archive)?;
    let polyglot = creator.create(&mut StdinPrompt::stdin())?;

    match validate_polyglot(&polyglot) {
        ValidationResult::Valid => debug!("output passed polyglot validation"),
        other => warn!(?other, "output failed polyglot validation"),
    }

    let name = cli::output_file_name(&mut rand::thread_rng());
    println!("\nWriting ZIP embedded PNG image out to disk.");
    write_output(Path::new(&name), &polyglot)
        .with_context(|| format!("Write File Error: Unable to write to file {name}"))?;

    println!(
        "\nSaved PNG image: {name} {} Bytes.\n\nComplete!\n\n\
         You can now share your PNG-ZIP polyglot image on the relevant supported platforms.\n",
        polyglot.len()
    );
    Ok(())
}

/// Write through a temporary file in the current directory so a failed run
/// never leaves a partial image, and never replace an existing file
fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = NamedTempFile::new_in(".")?;
    file.write_all(data)?;
    file.flush()?;
    file.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}
