pub mod config;
pub mod constants;
pub mod context;
pub mod errs;
pub mod frame;
pub mod log;
