pub mod app;
pub mod config;
pub mod guard;
pub mod login;
pub mod notice;
pub mod wizard;

#[cfg(test)]
mod testing;

pub use app::AdminApp;
pub use config::Config;
