//! RBM event pipeline for the RCS business-messaging emulator.
//!
//! Raw GSMA UP callback payloads pass through staged validation
//! ([`validate::validate`]), convert into the typed [`RbmEvent`] model
//! ([`validate::parse_event`]), and dispatch through the [`EventRouter`]
//! registry to produce a [`ProcessingResult`]. Postback classification
//! ([`intent`]) annotates suggestion responses with business intent.

pub mod error;
pub mod intent;
pub mod router;
pub mod types;
pub mod validate;

pub use {
    error::{Error, Result},
    intent::{ActionOutcome, classify_postback},
    router::{EventHandler, EventRouter, ProcessingResult},
    types::{
        ChatState, EventDetail, EventType, MediaPointer, MessageContent, RbmEvent, ResponseType,
        iso,
    },
    validate::{EventValidation, parse_event, validate},
};
