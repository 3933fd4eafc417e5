use crate::error::TriageError;
use error_stack::Report;

pub type ServiceResult<T> = Result<T, Report<TriageError>>;

pub mod auth;
pub mod error;
pub mod images;
mod metrics;
pub mod routes;
pub mod service;
pub mod state;

#[cfg(test)]
mod tests;
