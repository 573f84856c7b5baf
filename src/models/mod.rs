pub mod amazon;
pub mod auction;
pub mod notification;
pub mod tracked;

// Re-exports for convenience
pub use amazon::*;
pub use auction::*;
pub use notification::*;
pub use tracked::*;
