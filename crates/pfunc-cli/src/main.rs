#[cfg(feature = "sample")]
extern crate pfunc_sample;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use pfunc_loader::common::error::render_args;
use pfunc_loader::{Config, FunctionRegistry, RemoteRepository};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use url::Url;

const EXIT_USAGE: u8 = 1;
const EXIT_FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "pfunc", version, about = "Invoke functions from pfunc modules by name")]
struct Args {
    /// Library descriptor loaded after the default one
    #[arg(long, value_name = "PATH")]
    libraries: Option<PathBuf>,

    /// Local repository used as the resolution cache
    #[arg(long, value_name = "PATH")]
    local_repository: Option<PathBuf>,

    /// Remote repository, tried in the order given
    #[arg(long = "repository", value_name = "URL")]
    repositories: Vec<String>,

    /// Print every registered function and exit
    #[arg(long)]
    list: bool,

    function: Option<String>,

    args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };
    if args.function.is_none() && !args.list {
        eprintln!("No function name supplied.\n\n{}", Args::command().render_usage());
        return ExitCode::from(EXIT_USAGE);
    }

    let registry = match load(&args).await {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Failed to initialise registry: {:?}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    if args.list {
        for function in registry.snapshot().values() {
            println!("{}", function.metadata().prototype());
        }
    }

    let Some(name) = &args.function else {
        return ExitCode::SUCCESS;
    };
    let values: Vec<Value> = args.args.iter().cloned().map(Value::String).collect();
    let rendered = render_args(&values);

    match registry.invoke(name, values) {
        Ok(result) => {
            println!("{}{} => {}", name, rendered, display(&result));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to invoke {}{} due to {:?}", name, rendered, anyhow::Error::from(e));
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn load(args: &Args) -> anyhow::Result<FunctionRegistry> {
    let mut config = Config::load()?;
    if let Some(libraries) = &args.libraries {
        config.override_libraries = Some(libraries.clone());
    }
    if let Some(repository) = &args.local_repository {
        config.resolver.local_repository = Some(repository.clone());
    }
    for (i, repository) in args.repositories.iter().enumerate() {
        let url = Url::parse(repository).with_context(|| format!("invalid repository URL {}", repository))?;
        config
            .resolver
            .remote_repositories
            .push(RemoteRepository::new(format!("cli-{}", i), url));
    }

    Ok(pfunc_loader::init(&config).await?)
}

/// Strings print bare, everything else as JSON
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
