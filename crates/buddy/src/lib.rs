pub mod agent;
pub mod errors;
pub mod models;
pub mod notifier;
pub mod pdf;
pub mod persona;
pub mod prompt_template;
pub mod providers;
pub mod registry;
pub mod research;
