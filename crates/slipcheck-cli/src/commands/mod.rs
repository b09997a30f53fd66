pub mod assess;
pub mod classify;
pub mod focus;
pub mod init;
pub mod list_models;
pub mod order;
pub mod validate;
