// Adapters layer: concrete implementations for the OS facing ports.

pub mod clock;
pub mod identity;
pub mod lock;
pub mod process;

pub use clock::{FixedClock, SystemClock};
pub use lock::SingletonGuard;
pub use process::ProcessDumpRunner;
