#![allow(dead_code)]

pub mod server;

pub use server::{
    build_orchestrator, build_orchestrator_with_timeout, create_test_ledger, mock_mail_send,
    mock_manifest, mock_npm_page, mock_slow_npm_page, open_ledger,
};
