pub mod session;

pub use session::{SessionContext, SessionController, SessionControllerDeps};
