pub mod record;
pub mod schema;
pub mod event;
pub mod trace;
pub mod addr;
pub mod request;
mod classify;
mod pool;
pub mod format;

pub mod sink;
pub mod stdout_sink;
pub mod noop_sink;
pub mod layer;
pub mod init;
pub mod env;
