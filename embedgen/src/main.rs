extern crate embedgen;

use embedgen::config::Config;
use embedgen::error::Result;
use log::info;

fn run() -> Result<()> {
    let matches = embedgen::cli::parse_flags();
    let config = Config::from_matches(&matches)?;

    let default_filter = if config.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut bundles = embedfs::partition(&config.includes)?;
    for (key, bundle) in bundles.iter_mut() {
        bundle.compress(config.compression)?;
        info!("embedgen: bundle {} encoded ({} entries)", key, bundle.len());
    }

    for path in embedgen::writer::write_bundles(&bundles, &config.output_dir, &config.name)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("embedgen: {}", err);
        std::process::exit(1);
    }
}
