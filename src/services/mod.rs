pub mod archive;
pub mod fingerprint;
pub mod submission;

pub use archive::ArchiveService;
pub use fingerprint::FingerprintService;
pub use submission::SubmissionService;
