//! Command-line entry point for the clinic record service.
//!
//! # Responsibility
//! - Resolve configuration from flags and environment.
//! - Issue one REST-shaped request against the store and print the response.
//! - Serve the REST routes over HTTP.
//! - Print the OpenAPI document or core linkage information.

use clap::{Parser, Subcommand};
use clinic_core::{docs, handle, init_logging, ApiRequest, ClinicConfig, Method, RecordService};
use log::info;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

/// Healthcare clinic record service.
#[derive(Parser, Debug)]
#[command(name = "clinic")]
#[command(version, about, long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "CLINIC_DB_PATH")]
    db: Option<PathBuf>,

    /// Use a throwaway in-memory database (overrides --db)
    #[arg(long, global = true)]
    memory: bool,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = "CLINIC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files
    #[arg(long, global = true, env = "CLINIC_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one request, e.g. `clinic request POST /doctors --body '{..}'`
    Request {
        /// GET, POST, PUT or DELETE
        method: Method,
        /// Resource path such as /doctors or /departments/3
        path: String,
        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },

    /// Serve the REST routes and `/api-docs` over HTTP
    Serve {
        /// Listen address
        #[arg(long, env = "CLINIC_ADDR", default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },

    /// Print the OpenAPI document
    Schema,

    /// Print core linkage information
    Ping,
}

impl Cli {
    fn config(&self) -> ClinicConfig {
        let mut config = ClinicConfig::from_env();
        if self.memory {
            config.db_path = None;
        } else if let Some(db) = &self.db {
            config.db_path = Some(db.clone());
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(dir) = &self.log_dir {
            config.log_dir = Some(dir.clone());
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Ping => {
            println!("clinic_core ping={}", clinic_core::ping());
            println!("clinic_core version={}", clinic_core::core_version());
            ExitCode::SUCCESS
        }
        Command::Schema => print_json(&docs::openapi_document()),
        Command::Serve { addr } => run_server(&cli.config(), addr),
        Command::Request {
            method,
            ref path,
            ref body,
        } => run_request(&cli.config(), method, path, body.as_deref()),
    }
}

fn start_logging(config: &ClinicConfig) -> Result<(), ExitCode> {
    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("error: {err}");
            return Err(ExitCode::from(2));
        }
    }
    Ok(())
}

fn open_service(config: &ClinicConfig) -> Result<RecordService, ExitCode> {
    RecordService::open(config).map_err(|err| {
        eprintln!("error: failed to open store: {err}");
        ExitCode::from(2)
    })
}

fn run_server(config: &ClinicConfig, addr: SocketAddr) -> ExitCode {
    if let Err(code) = start_logging(config) {
        return code;
    }
    let service = match open_service(config) {
        Ok(service) => service,
        Err(code) => return code,
    };
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start runtime: {err}");
            return ExitCode::from(2);
        }
    };

    eprintln!("listening on http://{addr}");
    match runtime.block_on(clinic_core::server::serve(addr, service)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: server stopped: {err}");
            ExitCode::from(2)
        }
    }
}

fn run_request(config: &ClinicConfig, method: Method, path: &str, body: Option<&str>) -> ExitCode {
    if let Err(code) = start_logging(config) {
        return code;
    }

    let mut request = ApiRequest::new(method, path);
    if let Some(raw) = body {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => request = request.with_body(value),
            Err(err) => {
                eprintln!("error: request body is not valid JSON: {err}");
                return ExitCode::from(2);
            }
        }
    }

    let service = match open_service(config) {
        Ok(service) => service,
        Err(code) => return code,
    };

    let response = handle(&service, &request);
    info!(
        "event=cli_request module=cli status={} method={method} path={path}",
        response.status
    );
    eprintln!("status={}", response.status);
    let printed = print_json(&response.body);

    if let Err(err) = service.close() {
        eprintln!("error: failed to close store: {err}");
        return ExitCode::from(2);
    }
    if response.is_success() {
        printed
    } else {
        ExitCode::from(1)
    }
}

fn print_json(value: &Value) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: failed to render JSON: {err}");
            ExitCode::from(2)
        }
    }
}
