pub mod job;
pub mod kit;
pub mod profile;

pub use job::{Job, JobSourceKind};
pub use kit::ApplicationKit;
pub use profile::Profile;
