pub mod auth;
pub mod completion;
pub mod dispatcher;
pub mod eviction;
pub mod lru;

pub use auth::TokenRefresher;
pub use completion::Completion;
pub use dispatcher::LoadScheduler;
