//! segviz: serve or run segmentation-view composition from the command line.
//!
//! # Usage
//!
//! ```text
//! segviz [OPTIONS] serve [--bind 127.0.0.1] [--port 5000] [--workers 4]
//! segviz [OPTIONS] compose <ID>
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `info`).

#![allow(clippy::print_stdout)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::error;
use segviz::{App, Server};
use segviz_io::{Composer, FailurePolicy, HttpPredictor, ServiceConfig};

/// Visualization backend for semantic-segmentation datasets.
///
/// Composes the raw camera frame, the recolored ground-truth label map,
/// and the recolored model prediction for a dataset identifier.
#[derive(Parser)]
#[command(name = "segviz", version)]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,

        /// Port to listen on (0 picks a free port).
        #[arg(long, default_value_t = 5000)]
        port: u16,

        /// Number of request-handling threads.
        #[arg(long, default_value_t = 4, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        workers: usize,
    },

    /// Compose one identifier and print the JSON result to stdout.
    Compose {
        /// Dataset identifier, e.g. `frankfurt_000000_000294`.
        identifier: String,
    },
}

/// Service configuration flags shared by all subcommands.
#[derive(Args)]
struct ServiceArgs {
    /// Directory holding `*_leftImg8bit.*` and `*_gtFine_labelIds.*` files.
    #[arg(long, global = true, default_value = ServiceConfig::DEFAULT_IMAGES_DIR)]
    images_dir: PathBuf,

    /// Image file extension, without the dot.
    #[arg(long, global = true, default_value = ServiceConfig::DEFAULT_EXTENSION)]
    extension: String,

    /// JSON catalog of available identifiers.
    #[arg(long, global = true, default_value = ServiceConfig::DEFAULT_CATALOG_PATH)]
    catalog: PathBuf,

    /// Predictor endpoint.
    #[arg(long, global = true, default_value = HttpPredictor::DEFAULT_ENDPOINT)]
    predictor_url: String,

    /// Do not call a predictor; `image3` is always empty.
    #[arg(long, global = true)]
    no_predictor: bool,

    /// Predictor request timeout in seconds.
    #[arg(long, global = true, default_value_t = ServiceConfig::DEFAULT_PREDICTOR_TIMEOUT_SECS)]
    predictor_timeout: f64,

    /// Handling of a missing raw camera frame.
    #[arg(long, global = true, value_enum, default_value_t = Policy::Degrade)]
    raw_image_policy: Policy,

    /// Handling of an unavailable or unprocessable prediction.
    #[arg(long, global = true, value_enum, default_value_t = Policy::Degrade)]
    prediction_policy: Policy,

    /// Full service config as a JSON string.
    ///
    /// When provided, all other service flags are ignored.
    /// The JSON must be a valid `ServiceConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long, global = true)]
    config_json: Option<String>,
}

/// Failure policy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    /// Leave the view empty and answer the request.
    Degrade,
    /// Fail the request.
    Fail,
}

impl From<Policy> for FailurePolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Degrade => Self::Degrade,
            Policy::Fail => Self::Fail,
        }
    }
}

impl ServiceArgs {
    fn into_config(self) -> Result<ServiceConfig, String> {
        if let Some(json) = self.config_json {
            return serde_json::from_str(&json).map_err(|e| format!("--config-json: {e}"));
        }
        Ok(ServiceConfig {
            images_dir: self.images_dir,
            extension: self.extension,
            catalog_path: self.catalog,
            predictor_url: (!self.no_predictor).then_some(self.predictor_url),
            predictor_timeout_secs: self.predictor_timeout,
            raw_image_policy: self.raw_image_policy.into(),
            prediction_policy: self.prediction_policy.into(),
        })
    }
}

fn serve(config: &ServiceConfig, bind: &str, port: u16, workers: usize) -> Result<(), String> {
    let app = App::from_config(config).map_err(|e| e.to_string())?;
    let server = Server::new(bind, port, workers, app).map_err(|e| e.to_string())?;
    server.block();
    Ok(())
}

/// Print the composite result, or the error body on failure.
fn compose(config: &ServiceConfig, identifier: &str) -> Result<bool, String> {
    let composer = Composer::from_config(config).map_err(|e| e.to_string())?;
    match composer.compose(identifier) {
        Ok(result) => {
            let json = serde_json::to_string(&result).map_err(|e| e.to_string())?;
            println!("{json}");
            Ok(true)
        }
        Err(err) => {
            error!("{err}");
            println!("{}", serde_json::json!({ "error": err.public_message() }));
            Ok(false)
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match cli.service.into_config() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match cli.command {
        Command::Serve {
            bind,
            port,
            workers,
        } => serve(&config, &bind, port, workers).map(|()| true),
        Command::Compose { identifier } => compose(&config, &identifier),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
