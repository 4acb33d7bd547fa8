//! EstateFlow API - Real-estate CRM platform
//!
//! Authentication and access-control core: login with lockout, dual
//! session/bearer transports, role-based authorization, and privileged
//! impersonation with audit logging. Listings, leads, deals, and the CMS
//! consume this core through identity resolution and role checks only.

pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;
pub mod users;

pub use routes::create_router;
pub use state::{AppState, SharedState};
