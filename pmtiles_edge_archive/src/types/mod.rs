mod directory;
mod header;

pub use directory::{Directory, Entry};
pub use header::Header;
