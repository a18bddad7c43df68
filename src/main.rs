//! CLI entry point: `make_base` compiles a request document into a
//! persisted catalogue, `process_requests` answers a request document's
//! `stat_requests` against a previously persisted one. `clap::Parser`
//! dispatch, with a failed parse caught so an invalid invocation gets a
//! one-line usage string on stderr and exit code 1.

use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use transit_catalogue::catalogue::Catalogue;
use transit_catalogue::error::Error;
use transit_catalogue::persist;
use transit_catalogue::request::{self, RequestDocument};

#[derive(Parser)]
#[command(name = "transit-catalogue", about = "Compiles and queries a transit catalogue")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(name = "make_base")]
    MakeBase,
    #[command(name = "process_requests")]
    ProcessRequests,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(_) => {
            eprintln!("Usage: transit-catalogue <make_base|process_requests>");
            return ExitCode::from(1);
        }
    };

    let result = match cli.command {
        Command::MakeBase => run_make_base(),
        Command::ProcessRequests => run_process_requests(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn read_document() -> Result<RequestDocument, Error> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(serde_json::from_str(&input)?)
}

fn run_make_base() -> Result<(), Error> {
    let document = read_document()?;
    let mut catalogue = Catalogue::new();
    request::ingest_base_requests(&mut catalogue, &document.base_requests)?;
    persist::save(
        &document.serialization_settings.file,
        &catalogue,
        &document.render_settings,
        &document.routing_settings,
    )?;
    log::info!("make_base: wrote {}", document.serialization_settings.file.display());
    Ok(())
}

fn run_process_requests() -> Result<(), Error> {
    let document = read_document()?;
    let (catalogue, render_settings, routing_settings) = persist::load(&document.serialization_settings.file)?;
    let replies = request::answer_requests(&catalogue, &render_settings, &routing_settings, &document.stat_requests)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer(&mut handle, &replies)?;
    handle.write_all(b"\n")?;
    Ok(())
}
