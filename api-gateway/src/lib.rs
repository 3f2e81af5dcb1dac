//! HTTP surface of the AI integration gateway.
//!
//! The same [`router::handler`] serves both deployments: under the AWS Lambda
//! runtime via `lambda_http`, and as a standalone server via [`server`].

pub mod router;
pub mod server;

pub use router::handler;
