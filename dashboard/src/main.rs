use std::io::Read;

use opclw_dashboard::cli::{self, CliError, DeriveTarget};
use opclw_dashboard::DashboardConfig;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let mut args = std::env::args();
    let _bin = args.next();

    let output = match args.next().as_deref() {
        Some("decode-task") => {
            let pubkey = cli::parse_key(&required_arg(args.next(), "PUBKEY")?)?;
            cli::decode_task_output(pubkey, &read_stdin()?)?
        }
        Some("decode-lesson") => {
            let pubkey = cli::parse_key(&required_arg(args.next(), "PUBKEY")?)?;
            cli::decode_lesson_output(pubkey, &read_stdin()?)?
        }
        Some("encode-create-task") => cli::encode_create_task_output(&read_stdin()?)?,
        Some("derive") => {
            let kind = args.next();
            let value = args.next();
            let target = DeriveTarget::parse(kind.as_deref(), value.as_deref())?;
            cli::derive_output(&config()?, target)
        }
        Some("programs") => cli::programs_output(&config()?),
        Some(other) => return Err(CliError::Usage(format!("unsupported command: {other}"))),
        None => return Err(CliError::Usage("missing command".to_string())),
    };
    println!("{output}");
    Ok(())
}

fn config() -> Result<DashboardConfig, CliError> {
    let config = DashboardConfig::from_env().map_err(opclw_dashboard::DashboardError::from)?;
    tracing::debug!(cluster = %config.cluster, "resolved deployment");
    Ok(config)
}

fn required_arg(value: Option<String>, name: &str) -> Result<String, CliError> {
    value.ok_or_else(|| CliError::Usage(format!("missing {name}")))
}

fn read_stdin() -> Result<String, CliError> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| CliError::Usage(format!("failed to read stdin: {e}")))?;
    Ok(input)
}
