use clap::{Parser as ClapParser, Subcommand};
use simulator::api::http::server;
use simulator::availability::SystemClock;
use simulator::cgi;
use simulator::config::Settings;
use simulator::error::SimulatorError;
use simulator::isobmff::reader::describe;
use simulator::simulator::Simulator;
use std::io::{self, Write};
use std::process;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

#[derive(ClapParser, Debug)]
#[command(version, about)]
struct Cli {
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer a single request read from stdin (default)
    Cgi,
    /// Run a long-lived HTTP/1.1 server
    Serve {
        #[arg(short, long)]
        addr: Option<String>,
    },
    /// Print a resource's contents, box by box for media
    Dump {
        #[command(subcommand)]
        resource: Resource,
    },
}

#[derive(Subcommand, Debug)]
enum Resource {
    Manifest,
    Init,
    Segment { number: u64 },
    Fragment { index: u64 },
}

fn main() {
    // stdout carries the HTTP response in CGI mode, so logs go to stderr
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::Layer::default()
                .with_writer(io::stderr)
                .with_target(false)
                .with_thread_names(false)
                .with_ansi(false)
                .with_line_number(false)
                .with_file(false)
                .with_thread_ids(false),
        );
    tracing::subscriber::set_global_default(subscriber)
        .expect("Unable to set a global logger instance");

    let cli = Cli::parse();
    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Command::Cgi) {
        Command::Cgi => run_cgi(&settings),
        Command::Serve { addr } => run_server(settings, addr),
        Command::Dump { resource } => run_dump(&settings, resource),
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}

fn run_cgi(settings: &Settings) -> Result<(), SimulatorError> {
    let simulator = Simulator::from_settings(settings, Arc::new(SystemClock))?;
    let mut stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    cgi::serve(&simulator, &mut stdin, stdout)
}

fn run_server(settings: Settings, addr: Option<String>) -> Result<(), SimulatorError> {
    let simulator = Arc::new(Simulator::from_settings(&settings, Arc::new(SystemClock))?);
    let addr = addr.unwrap_or(settings.http.addr);
    let timing = simulator.timing();
    info!(
        "segment duration {}ms, fragment duration {}ms",
        timing.segment_duration(),
        timing.fragment_duration()
    );

    let runtime = common::runtime::build(settings.runtime.threads)
        .map_err(|e| SimulatorError::ConfigError(format!("failed to create runtime: {}", e)))?;

    runtime.block_on(async move {
        let notifier = Arc::new(Notify::new());
        common::systemd::run(notifier.clone());
        server::start(notifier, &addr, simulator).await
    })?;

    info!("done");
    Ok(())
}

fn run_dump(settings: &Settings, resource: Resource) -> Result<(), SimulatorError> {
    let simulator = Simulator::from_settings(settings, Arc::new(SystemClock))?;
    let mut out = io::stdout().lock();
    let text = match resource {
        Resource::Manifest => String::from_utf8_lossy(&simulator.manifest()).into_owned(),
        Resource::Init => dump_boxes(&simulator.init_segment())?,
        Resource::Fragment { index } => {
            let fragment = simulator.encoder().encode_fragment(index).ok_or_else(|| {
                SimulatorError::RequestError(format!("fragment {} is out of range", index))
            })?;
            dump_boxes(&fragment)?
        }
        Resource::Segment { number } => {
            let fragments = simulator.encoder().encode_segment(number).ok_or_else(|| {
                SimulatorError::RequestError(format!("segment {} is out of range", number))
            })?;
            let mut text = String::new();
            let first = simulator.timing().first_fragment(number).unwrap_or_default();
            for (k, fragment) in fragments.enumerate() {
                text.push_str(&format!("# fragment {}\n", first + k as u64));
                text.push_str(&dump_boxes(&fragment)?);
            }
            text
        }
    };

    out.write_all(text.as_bytes())
        .map_err(|e| SimulatorError::OutputError(e.to_string()))
}

fn dump_boxes(data: &[u8]) -> Result<String, SimulatorError> {
    describe(data).map_err(|e| SimulatorError::RequestError(e.to_string()))
}
