use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use env_logger::{Env, Target};
use log::debug;
use toplist_downloader::{config::DriverConfig, driver::Driver};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .init();
    let args = Args::parse();
    let mut config = match args.config {
        Some(path) => DriverConfig::from_toml_file(path)?,
        None => DriverConfig::default(),
    };
    if let Some(root_dir) = args.root_dir {
        config = config.root_dir(root_dir);
    }
    if let Some(base_url) = args.base_url {
        config = config.base_url(base_url);
    }
    if let Some(timeout) = args.connection_timeout {
        config = config.connection_timeout(Duration::from_millis(timeout));
    }
    if let Some(jobs) = args.jobs {
        config = config.jobs(jobs);
    }

    // One partition for the whole run.
    let date = Local::now().date_naive();
    let driver = Driver::new(config)?;
    debug!("Starting with {driver:#?}.");
    driver.prepare().await?;
    driver.run(date).await;
    Ok(())
}

#[derive(Debug, Parser)]
#[clap(
    author,
    version,
    about = "Downloads today's App Store toplist feeds for every country and list.\n\
Saves each feed to `<root>/<list>/<YYYY>/<MM>/<DD>/<country>.json`,\n\
skipping files that already exist."
)]
struct Args {
    #[clap(short, long, help = "TOML file overriding the built-in configuration.")]
    config: Option<PathBuf>,
    #[clap(short, long, help = "Directory to save the feeds under.")]
    root_dir: Option<PathBuf>,
    #[clap(short, long, help = "Scheme and host of the feed server.")]
    base_url: Option<String>,
    #[clap(
        short = 't',
        long,
        help = "Connection timeout for each request in integer milliseconds."
    )]
    connection_timeout: Option<u64>,
    #[clap(short, long, help = "Number of feeds to fetch at the same time.")]
    jobs: Option<usize>,
}
