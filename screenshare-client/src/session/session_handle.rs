use crate::error::SessionError;
use crate::session::{SessionCommand, SessionView};
use screenshare_core::ParticipantId;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};

/// Cloneable control surface of a running session.
#[derive(Clone)]
pub struct SessionHandle {
    participant_id: ParticipantId,
    commands: mpsc::Sender<SessionCommand>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    pub(crate) fn new(
        participant_id: ParticipantId,
        commands: mpsc::Sender<SessionCommand>,
        view: watch::Receiver<SessionView>,
    ) -> Self {
        Self {
            participant_id,
            commands,
            view,
        }
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    /// Starts a share. Resolves once the capture is live, or with the capture
    /// error. Calling it while already sharing is a no-op.
    pub async fn start_sharing(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::StartSharing { reply })
            .await
            .unwrap_or(Err(SessionError::Closed))
    }

    pub async fn stop_sharing(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::StopSharing { reply })
            .await
            .unwrap_or(Ok(()))
    }

    /// Returns once every link and track is released. Safe to repeat.
    pub async fn leave_room(&self) {
        let _ = self
            .request(|reply| SessionCommand::LeaveRoom { reply })
            .await;
    }

    pub fn view(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Waits until the view satisfies `predicate`.
    pub async fn wait_for_view<F>(&self, predicate: F, limit: Duration) -> Option<SessionView>
    where
        F: FnMut(&SessionView) -> bool,
    {
        let mut view = self.view.clone();
        let matched = tokio::time::timeout(limit, view.wait_for(predicate))
            .await
            .ok()?
            .ok()?
            .clone();
        Some(matched)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Option<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands.send(command(reply_tx)).await.ok()?;
        reply_rx.await.ok()
    }
}
