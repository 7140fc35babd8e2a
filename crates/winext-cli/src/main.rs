//! Command-line interface for the WinExt node codec.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use winext_codec::registry::{models::MODELS, tags::TAG_RULES};
use winext_codec::{
    AtCommand, AttributeValue, Channel, CodecConfig, ControlRequest, Decoder, Encoder, FrameKind,
    RegisterWrite,
};

/// WinExt codec - decode node telemetry and build control frames.
#[derive(Parser, Debug)]
#[command(name = "winext")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Codec configuration file (TOML).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a hex-encoded uplink frame.
    Decode {
        /// Frame bytes as hex, e.g. 001009c4.
        frame: String,
        /// Application port the frame arrived on.
        #[arg(short, long)]
        port: Option<u8>,
    },
    /// Encode attribute changes into a control frame.
    Encode {
        /// Changes as name=value pairs.
        #[arg(required = true)]
        changes: Vec<String>,
        /// Node identifier for multi-register frames.
        #[arg(long)]
        node_id: Option<u8>,
        /// Never consolidate registers into one frame.
        #[arg(long)]
        no_consolidate: bool,
    },
    /// List known model codes.
    Models,
    /// List known uplink tags.
    Tags,
    /// Build an AT command for the configuration channel.
    At {
        /// Command name, e.g. INTERVAL.
        name: String,
        /// Value to set.
        value: Option<String>,
        /// Query the current value instead.
        #[arg(short, long, conflicts_with = "value")]
        query: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => CodecConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => CodecConfig::from_env().context("Invalid environment configuration")?,
    };
    tracing::debug!("Using {:?}", config);

    match args.command {
        Command::Decode { frame, port } => run_decode(config, &frame, port),
        Command::Encode {
            changes,
            node_id,
            no_consolidate,
        } => run_encode(config, &changes, node_id, no_consolidate),
        Command::Models => {
            list_models();
            Ok(())
        }
        Command::Tags => {
            list_tags();
            Ok(())
        }
        Command::At { name, value, query } => run_at(name, value, query),
    }
}

fn init_logging(verbose: bool) {
    // JSON logs for log collectors
    let json_logging = std::env::var("WINEXT_LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let default_directive = if verbose { "winext=debug" } else { "winext=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    // Logs go to stderr; stdout carries the JSON result.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Parse hex, ignoring whitespace and an optional `0x` prefix.
fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(&compact);
    hex::decode(digits).with_context(|| format!("Invalid hex frame '{}'", text))
}

fn run_decode(config: CodecConfig, frame: &str, port: Option<u8>) -> Result<()> {
    let bytes = parse_hex(frame)?;
    let decoder = Decoder::new(config);
    let outcome = match port {
        Some(port) => decoder.decode_uplink(port, &bytes),
        None => decoder.decode(&bytes),
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.errors.is_empty() {
        bail!("Decode failed: {}", outcome.errors.join("; "));
    }
    Ok(())
}

/// `name=value` pairs into a control request.
fn parse_changes(changes: &[String]) -> Result<ControlRequest> {
    let mut request = ControlRequest::new();
    for change in changes {
        let Some((name, value)) = change.split_once('=') else {
            bail!("Expected name=value, got '{}'", change);
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("Missing attribute name in '{}'", change);
        }
        request.insert(name.to_string(), AttributeValue::parse_loose(value.trim()));
    }
    Ok(request)
}

#[derive(Serialize)]
struct EncodeReport<'a> {
    channel: Option<Channel>,
    kind: Option<FrameKind>,
    hex: Option<String>,
    writes: &'a [RegisterWrite],
    errors: &'a [String],
    warnings: &'a [String],
}

fn run_encode(
    mut config: CodecConfig,
    changes: &[String],
    node_id: Option<u8>,
    no_consolidate: bool,
) -> Result<()> {
    let request = parse_changes(changes)?;
    if let Some(node_id) = node_id {
        config.node_id = node_id;
    }
    if no_consolidate {
        config.consolidate_writes = false;
    }

    let outcome = Encoder::new(config).encode(&request);
    let frame = outcome.frame.as_ref();
    let report = EncodeReport {
        channel: frame.map(|f| f.channel),
        kind: frame.map(|f| f.kind),
        hex: frame.map(|f| hex::encode(&f.bytes)),
        writes: &outcome.writes,
        errors: &outcome.errors,
        warnings: &outcome.warnings,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !outcome.errors.is_empty() {
        bail!("Encode failed: {}", outcome.errors.join("; "));
    }
    Ok(())
}

fn list_models() {
    println!("{:<6} MODEL", "CODE");
    for (code, name) in MODELS {
        println!("0x{:02x}   {}", code, name);
    }
}

fn list_tags() {
    println!("{:<6} {:<26} {:<16} SCALE", "TAG", "ATTRIBUTE", "WIDTH");
    for rule in TAG_RULES {
        let width = match rule.width.fixed_width() {
            Some(n) if rule.signed => format!("i{}", n * 8),
            Some(n) => format!("u{}", n * 8),
            None => format!("{:?}", rule.width),
        };
        let scale = rule
            .scale
            .map(|d| format!("/{}", d))
            .unwrap_or_else(|| "-".to_string());
        println!("0x{:02x}   {:<26} {:<16} {}", rule.tag, rule.name, width, scale);
    }
}

fn run_at(name: String, value: Option<String>, query: bool) -> Result<()> {
    let command = match (value, query) {
        (Some(value), _) => AtCommand::set(name, value)?,
        (None, true) => AtCommand::query(name)?,
        (None, false) => AtCommand::execute(name)?,
    };
    print!("{}", command);
    Ok(())
}
