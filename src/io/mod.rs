// Export of ledger data to file formats.

mod export;

pub use export::*;
