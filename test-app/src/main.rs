// swarmlink test application -- CLI tool for exercising a Swarm M138 modem
// against real hardware or a mock transport.
//
// Usage:
//   swarmlink-test-app --port /dev/ttyUSB0 monitor
//   swarmlink-test-app --port /dev/ttyUSB0 send --to skipper --subject eta --body "thursday 0900"
//   swarmlink-test-app --port /dev/ttyUSB0 ping
//   swarmlink-test-app --port /dev/ttyUSB0 grib --model gfs
//   swarmlink-test-app --mock monitor

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};

use swarmlink::{
    GribModel, GribRequest, ModemBuilder, ModemEvent, SwarmModem, TextMessage, signal_band,
};
use swarmlink_test_harness::MockTransport;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// swarmlink test application -- exercises the M138 driver from the command line.
#[derive(Parser)]
#[command(name = "swarmlink-test-app", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3). Required unless --mock.
    #[arg(long)]
    port: Option<String>,

    /// Override the default 115200 baud rate.
    #[arg(long)]
    baud: Option<u32>,

    /// Use a mock transport instead of a real serial port. Useful for
    /// verifying CLI parsing and builder wiring without hardware.
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect, initialize, and print telemetry until interrupted.
    Monitor {
        /// Mailbox poll interval in seconds.
        #[arg(long, default_value_t = 5)]
        poll_secs: u64,
    },
    /// Queue a text message for transmission.
    Send {
        #[arg(long)]
        to: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body: String,
    },
    /// Queue a GPS position ping built from the current fix.
    Ping,
    /// Queue a GRIB weather-data request.
    Grib {
        /// Forecast model.
        #[arg(long, value_enum, default_value_t = ModelArg::Gfs)]
        model: ModelArg,
    },
    /// Delete every unsent message from the transmit queue.
    Flush,
    /// Restart the modem.
    Restart,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Gfs,
    Rtofs,
    Local,
    Ecmwf,
    Spire,
}

impl From<ModelArg> for GribModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Gfs => GribModel::Gfs,
            ModelArg::Rtofs => GribModel::Rtofs,
            ModelArg::Local => GribModel::Local,
            ModelArg::Ecmwf => GribModel::Ecmwf,
            ModelArg::Spire => GribModel::Spire,
        }
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

async fn connect(cli: &Cli) -> Result<SwarmModem> {
    let mut builder = ModemBuilder::new();
    if let Some(baud) = cli.baud {
        builder = builder.baud_rate(baud);
    }

    let modem = if cli.mock {
        builder
            .build_with_transport(Box::new(MockTransport::new()))
            .context("failed to build modem on mock transport")?
    } else {
        let port = cli
            .port
            .as_deref()
            .context("--port is required unless --mock is used")?;
        builder
            .serial_port(port)
            .build()
            .await
            .with_context(|| format!("failed to open {port}"))?
    };

    modem.init().await.context("modem init failed")?;
    Ok(modem)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn run_monitor(modem: &SwarmModem, poll_secs: u64) -> Result<()> {
    if poll_secs == 0 {
        bail!("--poll-secs must be at least 1");
    }
    let mut events = modem.subscribe();
    modem.start_polling();
    println!("monitoring (ctrl-c to stop)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(ModemEvent::SignalQuality { rssi }) => {
                    let band = signal_band(rssi).map(|b| b.label()).unwrap_or("-");
                    println!("rssi {rssi} dBm ({band})");
                }
                Ok(ModemEvent::QueueDepths { tx_waiting, rx_waiting }) => {
                    println!("queues: tx {tx_waiting}, rx {rx_waiting}");
                }
                Ok(ModemEvent::PositionUpdated(fix)) => println!("fix: {fix}"),
                Ok(ModemEvent::MessageReceived { message, .. }) => {
                    println!("{}", message.summary());
                }
                Ok(ModemEvent::MailboxDrained { retrieved, failed }) => {
                    println!("mailbox drained: {retrieved} retrieved, {failed} failed");
                }
                Ok(ModemEvent::CommandSent(frame)) => println!("> {frame}"),
                Ok(ModemEvent::RawLine(line)) => println!("< {line}"),
                Ok(other) => println!("{other:?}"),
                Err(_) => break,
            },
        }
    }

    modem.close().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let modem = connect(&cli).await?;

    match &cli.command {
        Command::Monitor { poll_secs } => run_monitor(&modem, *poll_secs).await?,
        Command::Send { to, subject, body } => {
            let message = TextMessage::new(to, subject, body);
            println!(
                "queueing {} chars in {} packet(s)",
                message.char_count(),
                message.packet_count()
            );
            modem.send_text_message(&message).await?;
            finish(&modem).await?;
        }
        Command::Ping => {
            modem.send_gps_ping().await?;
            println!("ping queued");
            finish(&modem).await?;
        }
        Command::Grib { model } => {
            let mut request = GribRequest::new((*model).into());
            request.set_box_from_fix(&modem.status().fix);
            println!("requesting: {}", request.payload());
            modem.send_grib_request(&request).await?;
            finish(&modem).await?;
        }
        Command::Flush => {
            modem.flush_tx_queue().await?;
            println!("transmit queue flushed");
            finish(&modem).await?;
        }
        Command::Restart => {
            modem.restart().await?;
            println!("restart sent");
            finish(&modem).await?;
        }
    }

    Ok(())
}

/// Give the transport a moment to drain, then close cleanly.
async fn finish(modem: &SwarmModem) -> Result<()> {
    tokio::time::sleep(Duration::from_millis(200)).await;
    modem.close().await?;
    Ok(())
}
