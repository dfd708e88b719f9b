//! Integration tests

mod chat_test;
mod config_test;
mod ticker_test;
