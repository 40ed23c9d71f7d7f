pub mod email;
pub mod json_catalog;
pub mod pushover;
pub mod saved_store;
