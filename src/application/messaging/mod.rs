//! Message handling - resolve, authorize, execute, reply

pub mod dispatcher;
pub mod parser;
pub mod rate_limit;

pub use dispatcher::{CommandContext, Dispatcher, Outcome};
pub use parser::{tokenize, ArgValue, ArgumentParser, Arguments, ScalarParser};
pub use rate_limit::{Admission, RateLimitConfig, RateLimitScope, RateLimiter};
