//! Notification Emitter
//!
//! Turns finalized kill reports into broadcast messages. Every message goes
//! to the live channel (dropped when nobody listens) and to the persisted
//! notification log.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::database::NotificationLog;
use crate::error::GameResult;
use crate::game::models::{KillClaim, Report};

pub struct NotificationEmitter<S> {
    log: Arc<S>,
    sender: broadcast::Sender<String>,
}

impl<S> Clone for NotificationEmitter<S> {
    fn clone(&self) -> Self {
        Self {
            log: self.log.clone(),
            sender: self.sender.clone(),
        }
    }
}

/// Broadcast text for a finalized claim
pub fn format_message(claim: &KillClaim) -> String {
    if claim.is_self_report() {
        format!("{} appears to be dead...", claim.victim)
    } else {
        format!("{} killed {}!", claim.killer_alias(), claim.victim)
    }
}

impl<S: NotificationLog> NotificationEmitter<S> {
    pub fn new(log: Arc<S>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { log, sender }
    }

    /// Live feed of broadcast messages
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }

    pub fn broadcast(&self, message: &str) {
        if self.sender.send(message.to_string()).is_err() {
            debug!("No live listeners for broadcast");
        }
    }

    /// Broadcast and persist the message for `report`
    pub async fn notify(&self, report: &Report<KillClaim>) -> GameResult<Report<String>> {
        let message = format_message(&report.data);
        info!(
            victim = %report.data.victim,
            reporter = %report.reporter,
            "Elimination confirmed"
        );

        self.broadcast(&message);
        self.log
            .persist_log(Report::new(message, &report.reporter, report.timestamp))
            .await
    }

    /// Persisted messages, oldest first
    pub async fn history(&self) -> GameResult<Vec<Report<String>>> {
        self.log.messages().await
    }
}
