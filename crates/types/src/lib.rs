pub mod address;
pub mod cart;
pub mod order;
pub mod reserve;

pub use address::*;
pub use cart::*;
pub use order::*;
pub use reserve::*;

/// Timestamp layout used whenever a reservation window is shown to a human.
pub const WINDOW_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
