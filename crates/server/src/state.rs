use crate::service::TrayService;

/// Shared application state handed to every handler and the sweep task.
pub struct AppState {
    pub service: TrayService,
}
