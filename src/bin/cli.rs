//! Commlink CLI - headless front-end for the message pipeline
//!
//! Opens one transport, feeds stdin lines through the send pipeline and
//! prints every traffic record to stdout.

use clap::{Parser, Subcommand, ValueEnum};
use commlink_core::{
    AppConfig, ByteCounters, Output, SerialConfig, SessionCoordinator, TrafficRecord,
    TransportKind, UdpConfig,
};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

/// CLI output format
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Rendered record blocks
    Text,
    /// JSON lines for scripting
    Json,
}

/// Commlink CLI
#[derive(Parser, Debug)]
#[command(
    name = "commlink",
    author = "Commlink Team",
    version,
    about = "Serial/UDP communication utility",
    long_about = None
)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Quiet mode (records only, no status lines)
    #[arg(short, long)]
    quiet: bool,

    /// Filter spec applied to every record (byte offsets, e.g. "0,2,5")
    #[arg(long)]
    filter: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available serial ports
    ListPorts {
        /// Show detailed info
        #[arg(short, long)]
        detailed: bool,
    },

    /// Open a serial port
    Serial {
        /// Serial port name (e.g., COM3, /dev/ttyUSB0)
        #[arg(short, long)]
        port: String,

        /// Baud rate
        #[arg(short, long, default_value = "115200")]
        baud: String,

        /// Data bits (5-8)
        #[arg(long, default_value = "8")]
        data_bits: u8,

        /// Parity (none, odd, even)
        #[arg(long, default_value = "none")]
        parity: String,

        /// Stop bits (1, 2)
        #[arg(long, default_value = "1")]
        stop_bits: u8,

        /// Flow control (none, hw, sw)
        #[arg(long, default_value = "none")]
        flow: String,
    },

    /// Open a UDP endpoint
    Udp {
        /// Local bind address
        #[arg(long, default_value = "0.0.0.0")]
        bind_ip: String,

        /// Local bind port (0 lets the OS pick)
        #[arg(long, default_value = "0")]
        bind_port: u16,

        /// Destination address
        #[arg(long, default_value = "127.0.0.1")]
        dest_ip: String,

        /// Destination port
        #[arg(long)]
        dest_port: u16,

        /// Fix the socket to the destination
        #[arg(long)]
        connected: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::ListPorts { detailed } => list_ports(*detailed),
        Commands::Serial {
            port,
            baud,
            data_bits,
            parity,
            stop_bits,
            flow,
        } => {
            // baud arrives as text; a non-number or zero is rejected here
            let baud: u32 = baud
                .parse()
                .ok()
                .filter(|b| *b > 0)
                .ok_or_else(|| anyhow::anyhow!("invalid baud rate: {baud}"))?;
            let config = SerialConfig::new(port, baud)
                .data_bits(*data_bits)
                .stop_bits(*stop_bits)
                .parity(parity.parse().unwrap_or_default())
                .flow_control(flow.parse().unwrap_or_default());
            run_session(&cli, TransportKind::Serial, Some(config), None).await
        }
        Commands::Udp {
            bind_ip,
            bind_port,
            dest_ip,
            dest_port,
            connected,
        } => {
            let config = UdpConfig::new(bind_ip, *bind_port)
                .destination(dest_ip, *dest_port)
                .connected(*connected);
            run_session(&cli, TransportKind::Udp, None, Some(config)).await
        }
    }
}

fn list_ports(detailed: bool) -> anyhow::Result<()> {
    let ports = commlink_core::list_ports()?;

    if ports.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }

    for port in &ports {
        if detailed {
            println!("{} [{:?}]", port.port_name, port.port_type);
        } else {
            println!("{}", port.port_name);
        }
    }
    Ok(())
}

async fn run_session(
    cli: &Cli,
    kind: TransportKind,
    serial: Option<SerialConfig>,
    udp: Option<UdpConfig>,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load().unwrap_or_default();
    if let Some(serial) = serial {
        config.serial = serial;
    }
    if let Some(udp) = udp {
        config.udp = udp;
    }

    let (mut coordinator, mut events) = SessionCoordinator::new(
        config.serial.clone(),
        config.udp.clone(),
        config.history.clone(),
    );
    coordinator.user_switches_active(kind);

    if let Some(ref filter) = cli.filter {
        coordinator.set_filter_text(filter);
        coordinator.set_filter_enabled(true);
    }

    let status = coordinator.user_opens(kind).await;
    if status.is_error() {
        anyhow::bail!("{status}");
    }
    if !cli.quiet {
        eprintln!("{status}");
        eprintln!("Type a line to send it; Ctrl+C to exit.");
    }

    // stdin feeds the send pipeline through its own task
    let (line_tx, mut line_rx) = mpsc::channel::<String>(16);
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            maybe_line = line_rx.recv() => match maybe_line {
                Some(line) => {
                    let status = coordinator.user_sends(kind, &line).await;
                    if status.is_error() {
                        eprintln!("{status}");
                    }
                }
                None => break,
            },

            maybe_event = events.next() => match maybe_event {
                Some(event) => match coordinator.process_event(event).await {
                    Some(Output::Record(record)) => {
                        print_record(cli, &record, coordinator.counters());
                    }
                    Some(Output::SessionClosed { status, .. }) => {
                        eprintln!("{status}");
                        break;
                    }
                    None => {}
                },
                None => break,
            },
        }
    }

    let status = coordinator.user_closes(kind).await;
    let counters = coordinator.counters();
    if !cli.quiet {
        eprintln!("{status}");
        eprintln!(
            "Recv all: {} Bytes / Send all: {} Bytes",
            counters.total_received, counters.total_sent
        );
    }

    config.history = coordinator.history().clone();
    let _ = commlink_core::config::init_directories();
    if let Err(e) = config.save() {
        tracing::warn!("failed to save config: {e}");
    }

    Ok(())
}

fn print_record(cli: &Cli, record: &TrafficRecord, counters: ByteCounters) {
    match cli.format {
        OutputFormat::Text => {
            println!("{}", record.render());
        }
        OutputFormat::Json => {
            let line = serde_json::json!({
                "record": record,
                "total_sent": counters.total_sent,
                "total_received": counters.total_received,
            });
            println!("{line}");
        }
    }
}
