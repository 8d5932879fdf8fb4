use anyhow::{Context, Result};
use battlabel_core::config::SerialConfig;
use battlabel_core::{OperatorInputs, SessionEvent, SessionState, UiCommand};
use battlabel_label::{LabelComposer, PrinterHost};
use battlabel_serial::{FrameEvent, PortManager, ReaderError};
use battlabel_session::{spawn_report_forwarder, spawn_state_task, Connection, SessionController};
use clap::Parser;
use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

const LOG_CAPACITY: usize = 1000;
const CRASH_DUMP_FILE: &str = "stacktrace.txt";

#[derive(Parser)]
#[command(name = "battlabel", about = "Battery test station QR label printer")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "battlabel.toml")]
    config: PathBuf,

    /// Serial port to connect to at startup (overrides serial.port)
    #[arg(short, long)]
    port: Option<String>,
}

/// Writes panic details next to the config file. The terminal is restored by
/// the TUI's own hook, which wraps this one.
fn install_crash_dump(config_path: &Path) {
    let dump_path = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.join(CRASH_DUMP_FILE))
        .unwrap_or_else(|| PathBuf::from(CRASH_DUMP_FILE));

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        let written = std::fs::File::create(&dump_path).and_then(|mut f| {
            writeln!(f, "{}", chrono::Local::now().to_rfc3339())?;
            writeln!(f, "{}", info)?;
            writeln!(f, "{}", backtrace)
        });
        if written.is_ok() {
            eprintln!("crash details written to {}", dump_path.display());
        }
        previous(info);
    }));
}

// ── Command loop ───────────────────────────────────────────────

struct Station {
    ports: PortManager,
    serial: SerialConfig,
    connection: Option<Connection>,
    frame_tx: mpsc::UnboundedSender<FrameEvent>,
    error_tx: mpsc::UnboundedSender<ReaderError>,
    inputs_tx: watch::Sender<OperatorInputs>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl Station {
    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    fn refresh_ports(&self) {
        match self.ports.list_ports() {
            Ok(ports) => {
                tracing::debug!("found {} serial port(s)", ports.len());
                self.emit(SessionEvent::PortsListed(ports));
            }
            Err(e) => {
                tracing::error!("{e}");
                self.emit(SessionEvent::PortsListed(Vec::new()));
            }
        }
    }

    async fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close().await;
        }
    }

    async fn connect(&mut self, port: &str) {
        self.disconnect().await;
        match Connection::open(
            &self.ports,
            port,
            &self.serial,
            self.frame_tx.clone(),
            self.error_tx.clone(),
        ) {
            Ok(conn) => {
                self.connection = Some(conn);
                self.emit(SessionEvent::Connected(port.to_string()));
            }
            Err(e) => {
                tracing::error!(port = %port, "connect failed: {e}");
                self.emit(SessionEvent::TransportFailed(e));
            }
        }
    }

    async fn transport_failed(&mut self, failure: ReaderError) {
        if !self.connection.as_ref().is_some_and(|c| c.raised(&failure)) {
            tracing::debug!("ignoring error from closed connection: {}", failure.error);
            return;
        }
        self.disconnect().await;
        self.emit(SessionEvent::TransportFailed(failure.error));
    }

    /// Applies operator commands and transport failures until the TUI quits.
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<UiCommand>,
        mut error_rx: mpsc::UnboundedReceiver<ReaderError>,
    ) {
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(UiCommand::SetInputs(inputs)) => {
                        self.inputs_tx.send_replace(inputs);
                    }
                    Some(UiCommand::Connect { port }) => self.connect(&port).await,
                    Some(UiCommand::Disconnect) => {
                        self.disconnect().await;
                        self.emit(SessionEvent::Disconnected);
                    }
                    Some(UiCommand::RefreshPorts) => self.refresh_ports(),
                    Some(UiCommand::Quit) | None => break,
                },
                Some(err) = error_rx.recv() => self.transport_failed(err).await,
            }
        }
        self.disconnect().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = battlabel_core::AppConfig::load_from_file(&cli.config)
        .with_context(|| format!("failed to load config from {:?}", cli.config))?;

    install_crash_dump(&cli.config);

    // Set up TUI log buffer and layered tracing subscriber
    let log_buffer: battlabel_tui::LogBuffer = Arc::new(Mutex::new(VecDeque::new()));
    let tui_log_layer = battlabel_tui::TuiLogLayer::new(Arc::clone(&log_buffer), LOG_CAPACITY);

    let env_filter = EnvFilter::try_new(&config.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::Registry::default()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tui_log_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    tracing::info!("battlabel starting");

    // Session state folding
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(SessionState::default());
    let state_task = spawn_state_task(event_rx, state_tx);

    // Printers
    let (job_tx, job_rx) = mpsc::unbounded_channel();
    let (report_tx, report_rx) = mpsc::unbounded_channel();
    let mut printer_host = PrinterHost::new(job_rx, Some(report_tx));

    if config.printer.is_empty() {
        tracing::info!("no printers configured, spooling labels to the default directory");
        printer_host
            .add_printer("file", toml::Value::Table(Default::default()))
            .await
            .context("failed to set up default file printer")?;
    }
    for route in &config.printer {
        printer_host
            .add_printer(&route.plugin, route.extra.clone())
            .await
            .with_context(|| format!("failed to set up printer '{}'", route.plugin))?;
    }
    printer_host.start();
    let forwarder = spawn_report_forwarder(report_rx, event_tx.clone());

    // Controller
    let (inputs_tx, inputs_rx) = watch::channel(OperatorInputs::default());
    let (frame_tx, frame_rx) = mpsc::unbounded_channel();
    let controller = SessionController::new(
        config.validation.policy(),
        LabelComposer::new(config.label.clone()),
        inputs_rx,
        job_tx,
        event_tx.clone(),
    )
    .spawn(frame_rx);

    // Operator commands and connection lifecycle
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (error_tx, error_rx) = mpsc::unbounded_channel();
    let station = Station {
        ports: PortManager::new(),
        serial: config.serial.clone(),
        connection: None,
        frame_tx,
        error_tx,
        inputs_tx,
        event_tx,
    };
    let station_task = tokio::spawn(station.run(cmd_rx, error_rx));

    let _ = cmd_tx.send(UiCommand::RefreshPorts);
    if let Some(port) = cli.port.or_else(|| config.serial.port.clone()) {
        tracing::info!("auto-connecting to {}", port);
        let _ = cmd_tx.send(UiCommand::Connect { port });
    }

    tracing::info!("TUI active, press Esc to quit");

    // Run TUI (blocks until user quits)
    let tui_result = battlabel_tui::run(
        state_rx,
        cmd_tx.clone(),
        log_buffer,
        config.validation.product_types.clone(),
    )
    .await;

    tracing::info!("shutting down");
    let _ = cmd_tx.send(UiCommand::Quit);
    drop(cmd_tx);

    // Closing the connection ends the accumulator, which releases the frame
    // channel; each stage then drains and stops in turn.
    let _ = station_task.await;
    let _ = controller.await;
    printer_host.shutdown().await;
    let _ = forwarder.await;
    let _ = state_task.await;

    tui_result.context("TUI error")
}
