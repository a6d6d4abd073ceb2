//! Run an integration time calculation from a JSON request

use anyhow::Context;
use clap::Parser;
use itc::{recipe, ItcRequest};
use log::info;
use shared::resource::ResourceLibrary;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Integration time calculator")]
struct Args {
    /// JSON calculation request
    #[arg(long)]
    request: PathBuf,

    /// Directory holding the tabulated resources
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Write the JSON result here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let request = ItcRequest::load_from_file(&args.request)
        .with_context(|| format!("reading request {}", args.request.display()))?;
    let library = ResourceLibrary::new(&args.data_dir);
    info!("Resources from {}", library.root().display());

    let result = recipe::run(&request, &library)?;
    let json = serde_json::to_string_pretty(&result)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("writing result {}", path.display()))?;
            info!("Result written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
