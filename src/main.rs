//! hlnet - high-level message transport
//!
//! Runs an in-process loopback session: fingerprint handshake, a burst of
//! reliable and unreliable messages, then prints per-kind statistics.

use clap::{Parser, Subcommand};
use hlnet_core::{Config, Connection, LocalConnection};
use hlnet_protocol::{CrcMessage, IntegerMessage, MsgKind, ProtocolFingerprint, StringMessage};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

const CHAT: MsgKind = MsgKind::User(100);
const TICK: MsgKind = MsgKind::User(101);

#[derive(Parser)]
#[command(name = "hlnet")]
#[command(about = "Loopback driver for the hlnet message transport")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "HLNET_CONFIG")]
    config: Option<PathBuf>,

    /// Log every frame with a hex dump of its payload
    #[arg(long)]
    log_messages: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange messages over an in-process connection pair (default)
    Loopback {
        /// Messages to send on each channel
        #[arg(short = 'n', long, default_value_t = 10)]
        messages: u32,

        /// Size of each reliable message body in bytes
        #[arg(short = 's', long, default_value_t = 64)]
        payload_size: usize,
    },

    /// Print the protocol fingerprint used by the loopback session
    Fingerprint,

    /// Write the effective configuration to a YAML file
    WriteConfig {
        /// Output path
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::from_file(path).map_err(|e| {
                tracing::error!("Failed to load config: {}", e);
                e
            })?;
            config.validate()?;
            tracing::info!("Loaded config from {}", path.display());
            config
        }
        None => Config::load()?,
    };
    if cli.log_messages {
        config.logging.log_network_messages = true;
    }

    match cli.command.unwrap_or(Commands::Loopback {
        messages: 10,
        payload_size: 64,
    }) {
        Commands::Loopback {
            messages,
            payload_size,
        } => run_loopback(&config, messages, payload_size)?,
        Commands::Fingerprint => {
            let fingerprint = fingerprint(&config);
            println!("digest: {:08x}", fingerprint.digest());
            for (name, channel) in fingerprint.entries() {
                println!("  {:<12} channel {}", name, channel);
            }
        }
        Commands::WriteConfig { output } => {
            config.save(&output)?;
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}

/// Message types checked at connect time, one per default channel.
fn fingerprint(config: &Config) -> ProtocolFingerprint {
    let mut fingerprint = ProtocolFingerprint::new();
    fingerprint.register("Chat", 0);
    if config.topology.channel_count() > 1 {
        fingerprint.register("Tick", 1);
    }
    fingerprint.set_check_enabled(config.fingerprint.script_crc_check);
    fingerprint
}

fn run_loopback(
    config: &Config,
    messages: u32,
    payload_size: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut server, mut client) = LocalConnection::pair(config)?;
    let fingerprint = Rc::new(fingerprint(config));
    let tick_channel = if config.topology.channel_count() > 1 { 1 } else { 0 };

    tracing::info!("Starting loopback session");
    tracing::info!("  Channels: {:?}", config.topology.channels);
    tracing::info!("  Messages per channel: {}", messages);

    let server_fp = fingerprint.clone();
    server.register_message(MsgKind::Crc, move |conn: &mut Connection, msg: CrcMessage| {
        conn.verify_fingerprint(&msg, &server_fp)?;
        conn.set_ready(true);
        tracing::info!("Client fingerprint accepted");
        Ok(())
    });
    server.register_handler(MsgKind::Connect, |net| {
        tracing::info!("Client connected: {}", net.conn);
        Ok(())
    });
    server.register_handler(MsgKind::Disconnect, |net| {
        tracing::info!("Client disconnected");
        net.conn.set_ready(false);
        Ok(())
    });

    let chat_bytes = Rc::new(Cell::new(0usize));
    let sink = chat_bytes.clone();
    server.register_message(CHAT, move |_, msg: StringMessage| {
        sink.set(sink.get() + msg.value.len());
        Ok(())
    });
    let tick_sum = Rc::new(Cell::new(0u64));
    let sink = tick_sum.clone();
    server.register_message(TICK, move |_, msg: IntegerMessage| {
        sink.set(sink.get() + u64::from(msg.value));
        Ok(())
    });

    server.post_internal(MsgKind::Connect);
    client.send_fingerprint(&fingerprint)?;
    let body = "x".repeat(payload_size);
    for i in 0..messages {
        client.send(CHAT, &StringMessage::new(body.as_str()))?;
        client.send_by_channel(TICK, &IntegerMessage::new(i), tick_channel)?;
    }

    let report = server.update();
    if server.is_incompatible() {
        return Err("peer fingerprint rejected".into());
    }

    println!("dispatched: {}", report.dispatched);
    println!("failed:     {}", report.failed);
    if let Some(reason) = &report.halted {
        println!("halted:     {:?}", reason);
    }
    println!("ready:      {}", server.is_ready());
    println!("chat bytes: {}", chat_bytes.get());
    println!("tick sum:   {}", tick_sum.get());

    let stats = server.stats_in();
    println!("in:         {} msgs, {} bytes", stats.msgs, stats.bytes);
    println!();
    println!("{:<24} {:>8} {:>10}", "kind", "count", "bytes");
    for (kind, stat) in server.packet_stats() {
        println!("{:<24} {:>8} {:>10}", kind.to_string(), stat.count, stat.bytes);
    }

    client.disconnect();
    server.update();
    Ok(())
}
