pub mod ids;
pub mod stats;
pub mod task;
pub mod user;
