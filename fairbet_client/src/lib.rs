//! Auto-bet controller driving a remote game service.

pub mod controller;
pub mod service;
pub mod table;

pub use controller::{spawn, ControllerSettings, Mailbox, RunSnapshot};
pub use service::{GameService, ServiceError};
pub use table::{LocalTable, COIN_FLIP_PAYOUT};
