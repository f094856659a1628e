pub mod profile_resolver;
pub mod session;

pub use profile_resolver::ProfileResolver;
pub use session::ChatSessionController;
