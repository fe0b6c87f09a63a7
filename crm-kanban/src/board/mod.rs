//! Board commands

mod get;
mod load;

pub use get::GetBoard;
pub use load::LoadBoard;
