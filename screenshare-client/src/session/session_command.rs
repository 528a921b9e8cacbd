use crate::error::SessionError;
use tokio::sync::oneshot;

/// Команды UI-оболочки для цикла сессии.
#[derive(Debug)]
pub enum SessionCommand {
    StartSharing {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },

    StopSharing {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },

    /// Закрыть все линки, покинуть комнату и завершить сессию.
    LeaveRoom { reply: oneshot::Sender<()> },
}
