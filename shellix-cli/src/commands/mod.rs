pub mod create;
pub mod exec;
pub mod restart;
pub mod rm;
pub mod serve;
