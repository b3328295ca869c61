use silat_application::{AccessService, AssignmentService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub assignment_service: AssignmentService,
    pub access_service: AccessService,
}
