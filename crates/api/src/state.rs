use auth::SessionService;

/// Application state shared across all handlers
pub struct AppState {
    pub sessions: SessionService,
}

impl AppState {
    pub fn new(sessions: SessionService) -> Self {
        Self { sessions }
    }
}
