//! Message normalization pipeline for the RCS business-messaging emulator.
//!
//! Inbound chat payloads arrive in several wire shapes: a single-message
//! object, a `messages` array, and legacy Google-RCS nestings. This crate
//! classifies a raw payload ([`format::detect`]), validates it with
//! accumulated user-presentable errors ([`validate::validate`]), fills
//! missing identity fields ([`ids::assign_defaults`]), and converts between
//! wire payloads and the canonical [`CanonicalMessage`] model ([`adapter`]).
//! [`report`] turns technical validation errors into categorized,
//! humanized entries for UI display.

pub mod adapter;
pub mod canonical;
pub mod error;
pub mod format;
pub mod ids;
pub mod report;
pub mod validate;

pub use {
    canonical::{
        Action, ActionVariant, CanonicalMessage, CardContent, MediaContent, MediaType,
        MessageEnvelope,
    },
    error::{Error, Result},
    format::PayloadFormat,
    ids::MessageDefaults,
    report::{ErrorCategory, ReportedError},
    validate::MessageValidation,
};
