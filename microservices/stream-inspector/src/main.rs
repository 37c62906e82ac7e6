//! rIOT Stream Inspector
//!
//! Command line tool for a running stream server:
//! - `info` prints the server identity and the metadata of every stream
//! - `download` prints the measurements of one stream for a time range

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use riot_client::{from_fn, ReaderError, RiotEndpoint};
use riot_core::{format_timestamp, parse_timestamp, DataSetMeasurement, Stream, TimeRange};

#[derive(Parser)]
#[command(name = "stream-inspector")]
#[command(about = "Inspect the streams of a rIOT server")]
struct Cli {
    /// Root URL of the server
    #[arg(long, env = "RIOT_SERVER_URL", default_value = "http://localhost:7468/")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print server information and stream metadata
    Info,

    /// Print the measurements of a stream
    Download {
        /// GUID of the stream
        #[arg(long)]
        guid: String,
        /// First timestamp to include, RFC3339
        #[arg(long)]
        start: Option<String>,
        /// Last timestamp to include, RFC3339
        #[arg(long)]
        end: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the results
    riot_telemetry::init_for_cli("stream-inspector")?;

    let cli = Cli::parse();
    let endpoint = RiotEndpoint::initialize(&cli.server)
        .await
        .with_context(|| format!("Connecting to rIOT server {}", cli.server))?;

    match cli.command {
        Command::Info => print_info(&endpoint).await,
        Command::Download { guid, start, end } => {
            let range = TimeRange {
                start: parse_bound(start.as_deref())?,
                end: parse_bound(end.as_deref())?,
            };
            download(&endpoint, &guid, range, std::io::stdout()).await
        }
    }
}

fn parse_bound(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| parse_timestamp(v).with_context(|| format!("Invalid timestamp {v}")))
        .transpose()
}

async fn print_info(endpoint: &RiotEndpoint) -> Result<()> {
    println!("Basic Server Information");
    println!("===========");
    println!("Server Name: {}", endpoint.name());
    println!("Server GUID: {}", endpoint.guid());
    println!("Server Description: {}", endpoint.description());
    println!();

    let mut guids = endpoint.resource_list();
    guids.sort();
    if guids.is_empty() {
        println!("No streams published");
        return Ok(());
    }

    println!("Server Resources Found");
    println!("===========");
    for (i, guid) in guids.iter().enumerate() {
        let stream = endpoint
            .get_resource(guid)
            .await
            .with_context(|| format!("Resolving stream {guid}"))?;
        print!("{}", describe_stream(&stream));
        if i != guids.len() - 1 {
            println!("\t\t---\t\t");
        }
    }
    Ok(())
}

fn describe_stream(stream: &Stream) -> String {
    let schema: Vec<String> = stream
        .schema
        .iter()
        .map(|f| format!("{} ({},{})", f.name, f.measurement_unit, f.storage_unit))
        .collect();

    format!(
        "Resource -- {} --\nResource Name: {}\nResource Description: {}\nResource Retention: {:?}\nResource Schema: {}\n",
        stream.guid,
        stream.name,
        stream.description,
        stream.retention_policy,
        schema.join(",")
    )
}

/// Write one line per measurement to `out` and nothing else
async fn download<W: Write + Send>(
    endpoint: &RiotEndpoint,
    guid: &str,
    range: TimeRange,
    mut out: W,
) -> Result<()> {
    let mut reader = from_fn(|m: DataSetMeasurement| -> Result<(), ReaderError> {
        writeln!(out, "{}", format_measurement(&m))?;
        Ok(())
    });

    endpoint
        .read_dataset(guid, &mut reader, range)
        .await
        .with_context(|| format!("Reading dataset of stream {guid}"))
}

fn format_measurement(m: &DataSetMeasurement) -> String {
    let values: Vec<String> = m
        .values
        .iter()
        .map(|v| format!("{}={}", v.name, v.value))
        .collect();
    format!("{} {}", format_timestamp(&m.time), values.join(" "))
}
