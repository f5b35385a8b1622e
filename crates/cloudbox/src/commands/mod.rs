pub mod build;
pub mod config;
pub mod down;
pub mod init;
pub mod up;
