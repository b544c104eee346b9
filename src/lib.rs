//! Wisedu Core Library
//!
//! Signs in to the HEU academic portal through its CAS single-sign-on gateway
//! and queries grades with the resulting session.
//!
//! # Architecture
//!
//! - [`auth`] - Cookies, the flattened session cookie set, per-attempt jars
//! - [`http`] - Redirect-free transport and client policy
//! - [`sso`] - Captcha, login parameters, login POST, redirect walk, two-round login
//! - [`grades`] - Grades query and the grade-file writer
//! - [`app`] - Host-facing module surface
//! - [`config`] - Endpoints, timeouts, hop cap
//! - [`error`] - Shared error type

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod grades;
pub mod http;
pub mod sso;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use app::{AppContext, AppManager, AppModule, LoginApp};
pub use auth::{Cookie, SESSION_TOKEN_COOKIE, SessionCookieSet, SessionJar};
pub use config::{ConfigError, PortalConfig, PortalEndpoints};
pub use error::{LoginRound, PortalError};
pub use grades::{GradeReport, GradesClient, save_grade_to_file};
pub use http::{HopMethod, HopRequest, HopResponse, ReqwestTransport, Transport};
pub use sso::{Captcha, CaptchaAnswer, LoginParams, LoginRequest, RoundResult, SsoClient};
