//! Domain traits - Abstractions for infrastructure implementations

pub mod adapter;
pub mod clock;
pub mod sender;
pub mod store;

pub use adapter::{Adapter, AdapterInfo};
pub use clock::{Clock, SystemClock};
pub use sender::Sender;
pub use store::{Storage, ADMIN_KEY, PREFIX_KEY};
