mod operation;
mod wallet;

pub use operation::*;
pub use wallet::*;
