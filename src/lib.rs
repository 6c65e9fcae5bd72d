pub mod chat;
pub mod commands;
pub mod compare;
pub mod config;
pub mod credentials;
pub mod git;
pub mod logging;
pub mod output;
pub mod reviewboard;
