pub mod app;
pub mod output;

pub use app::Cli;
pub use output::ConsoleObserver;
