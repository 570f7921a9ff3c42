//! openapi-from-annotations - Command-line tool for generating OpenAPI documentation.
//!
//! Reads the `@` annotation lines in the doc comments of a Rust project's
//! handlers and generates an OpenAPI 3 document from them.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-annotations [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! openapi-from-annotations ./my-api-project -o openapi.yaml
//! ```
//!
//! Generate JSON documentation with a custom title:
//! ```bash
//! openapi-from-annotations ./my-api-project -f json --title "Pet Store" -o openapi.json
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! openapi-from-annotations ./my-api-project -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_annotations::cli;

fn main() -> Result<()> {
    // Parse once to read the verbose flag before the logger exists
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("openapi-from-annotations starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
