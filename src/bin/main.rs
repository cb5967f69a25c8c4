use clap::Parser;
use graph_wfc::cli::{self, Args};

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .compact()
        .init();

    std::process::exit(cli::run(&args));
}
