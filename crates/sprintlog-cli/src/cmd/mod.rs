pub mod burndown;
pub mod history;
pub mod show;
pub mod snapshot;
