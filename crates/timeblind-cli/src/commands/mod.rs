pub mod config;
pub mod correct;
pub mod history;
pub mod record;
