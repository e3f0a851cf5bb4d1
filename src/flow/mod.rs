//! Diagnostic flow: view state machine, per-visitor sessions and the
//! HTTP/WebSocket surface that drives them.

pub mod controller;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;

pub use controller::{FlowController, FlowSnapshot};
pub use routes::flow_routes;
pub use session::{FlowDeps, FlowSession};
pub use state::ViewState;
pub use store::{SessionStore, spawn_idle_sweep};
