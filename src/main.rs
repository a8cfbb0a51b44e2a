//! qcat binary.
//!
//! - `qcat listen` - accept one peer and relay stdio over the session
//! - `qcat connect` - dial a peer and relay stdio over the session

use clap::Parser;
use qcat::cli::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match cli::run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    // A pending stdin read holds a blocking thread that runtime shutdown
    // would wait on; exit directly instead.
    std::process::exit(code);
}
