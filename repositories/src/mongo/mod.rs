pub mod issues;

pub use issues::{ConnectError, ConnectionDetails, IssueRepo};
