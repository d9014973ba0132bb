mod dateparse;
mod download;
mod error;
mod file;
mod options;
mod pipeline;
mod portal;
mod resolver;
mod session;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::options::{Options, DEFAULT_BASE_URL, DEFAULT_OUTPUT_DIR};
use crate::portal::listing::ProflyerListing;
use crate::portal::PortalClient;

#[derive(Parser, Debug)]
#[command(version, about = "Download session videos from the Fööni media portal")]
struct Args {
    /// file containing the raw cookie header of a logged in browser session
    cookie_file: PathBuf,

    #[clap(long)]
    /// only download videos of this perspective, defaults to all perspectives
    perspective: Option<String>,

    #[clap(long)]
    /// first day to download sessions for, defaults to 30 days ago
    start: Option<String>,

    #[clap(long, default_value = DEFAULT_BASE_URL, value_parser = url_parser)]
    /// portal origin
    base_url: Url,

    #[clap(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    /// folder the dated session folders are created in
    output: PathBuf,

    #[clap(long)]
    /// keep sessions in listing order instead of oldest first
    keep_order: bool,

    #[clap(long)]
    /// resolve sessions and print them as json without downloading
    dry_run: bool,

    #[clap(short, long)]
    /// enable debug logging
    debug: bool,
}

fn url_parser(url: &str) -> Result<Url, String> {
    if !url.starts_with("http") {
        return Err("URL must start with http or https".to_string());
    }

    Url::parse(url).map_err(|err| err.to_string())
}

fn init_logging(debug: bool) {
    let default_level = if debug { "proflyer_dl=debug" } else { "proflyer_dl=info" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .init();
}

async fn run(args: Args) -> error::Result<()> {
    let now = chrono::Local::now().naive_local();

    // the start date is checked before anything touches the network
    let start = session::start_boundary(args.start.as_deref(), now)?;

    let options = Options {
        base_origin: args.base_url,
        debug: args.debug,
        perspective: args.perspective,
        start,
        output_dir: args.output,
        keep_order: args.keep_order,
        dry_run: args.dry_run,
    };

    init_logging(options.debug);

    let cookie = file::read_cookie(&args.cookie_file)?;
    let client = PortalClient::new(options.base_origin.clone(), &cookie)?;

    let sessions = pipeline::run(&client, &options, &ProflyerListing, now).await?;

    if options.dry_run {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
    } else {
        info!("Finished downloading {} sessions", sessions.len());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
