use clap::{Parser, Subcommand};
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(name = "lottobox")]
#[command(about = "Prediction API client and offline cache proxy", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the offline cache proxy
    Serve(ServeArgs),
    /// Request a prediction with duplicate detection
    Predict(PredictArgs),
    /// Query the prediction API health endpoint
    Health,
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the proxy to (defaults to server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[derive(clap::Args, Debug)]
pub struct PredictArgs {
    /// Six comma-separated numbers in 1..=45, e.g. 1,7,13,25,31,42
    #[arg(long, value_delimiter = ',')]
    pub numbers: Vec<u8>,
}
