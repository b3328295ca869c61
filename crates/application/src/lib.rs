//! Application services and ports.

#![forbid(unsafe_code)]

mod access_service;
mod assignment_service;
mod conflict;
mod ports;

pub use access_service::AccessService;
pub use assignment_service::{
    AssignmentService, AssignmentUpdate, AssignmentWithStatus, NewAssignment,
};
pub use conflict::{ConflictDetector, LinearConflictDetector};
pub use ports::{
    AssignmentRepository, AuditAction, AuditEvent, AuditRepository, RoleRepository,
};
