use battlabel_core::{PrintReport, SessionEvent, SessionState};
use tokio::sync::{mpsc, watch};

/// Folds session events into the shared state until every event sender is
/// dropped.
pub fn spawn_state_task(
    mut event_rx: mpsc::UnboundedReceiver<SessionEvent>,
    state_tx: watch::Sender<SessionState>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            state_tx.send_modify(|state| state.apply(event));
        }
    })
}

/// Forwards printer reports into the session event stream.
pub fn spawn_report_forwarder(
    mut report_rx: mpsc::UnboundedReceiver<PrintReport>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(report) = report_rx.recv().await {
            if event_tx.send(SessionEvent::Printed(report)).is_err() {
                break;
            }
        }
    })
}
