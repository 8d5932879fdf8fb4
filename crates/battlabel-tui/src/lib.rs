pub mod app;
pub mod log_layer;
pub mod ui;

use std::sync::Arc;
use std::time::Duration;

use battlabel_core::{SessionState, UiCommand};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use tokio::sync::{mpsc, watch};

pub use app::App;
pub use log_layer::{LogBuffer, TuiLogLayer};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Run the operator console until the user quits or the session state
/// channel closes.
pub async fn run(
    mut state_rx: watch::Receiver<SessionState>,
    cmd_tx: mpsc::UnboundedSender<UiCommand>,
    log_buffer: LogBuffer,
    product_types: Vec<String>,
) -> std::io::Result<()> {
    let mut terminal = ratatui::init();
    let mut app = App::new(Arc::clone(&log_buffer), product_types);
    let result = run_loop(&mut terminal, &mut app, &mut state_rx, &cmd_tx).await;
    ratatui::restore();
    result
}

async fn run_loop(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    state_rx: &mut watch::Receiver<SessionState>,
    cmd_tx: &mpsc::UnboundedSender<UiCommand>,
) -> std::io::Result<()> {
    loop {
        match state_rx.has_changed() {
            Ok(true) => app.update_state(state_rx.borrow_and_update().clone()),
            Ok(false) => {}
            Err(_) => break,
        }

        terminal.draw(|frame| ui::draw(frame, app))?;

        // Poll with a short timeout so state changes re-render promptly.
        if event::poll(FRAME_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match app.handle_key(key) {
                        app::AppAction::Quit => {
                            let _ = cmd_tx.send(UiCommand::Quit);
                            break;
                        }
                        app::AppAction::Command(cmd) => {
                            if cmd_tx.send(cmd).is_err() {
                                break;
                            }
                        }
                        app::AppAction::None => {}
                    }
                }
            }
        }
        tokio::task::yield_now().await;
    }

    Ok(())
}
