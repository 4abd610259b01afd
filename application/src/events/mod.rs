//! In-process publish/subscribe
//!
//! The [`EventBus`] is the leaf dependency of every other component: tools,
//! the manager, the registry, integrations and the UI façade all publish
//! and subscribe through one shared bus per editing session.

pub mod bus;
pub mod subscriptions;

pub use bus::{AsyncHandler, EventBus, HandlerError, Listener, SyncHandler};
pub use subscriptions::Subscriptions;
