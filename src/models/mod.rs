pub mod fingerprint;
pub mod submission;

pub use fingerprint::*;
pub use submission::*;
