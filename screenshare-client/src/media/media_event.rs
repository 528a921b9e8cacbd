/// События локального захвата для цикла сессии.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// Захват остановлен извне (например, системным индикатором демонстрации экрана).
    EndedExternally { track_id: String },
}
