mod account;
mod expense;
mod money;
mod session;
mod summary;

pub use account::*;
pub use expense::*;
pub use money::*;
pub use session::*;
pub use summary::*;
