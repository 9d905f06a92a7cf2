//! Conversation state tracking for the emulated messaging channel.
//!
//! Every validated event lands here: the tracker opens and expires
//! conversations, keeps a per-conversation event log with rolled-up
//! context, and maintains participant records across conversations.
//! Storage is in-memory and infallible; the [`Clock`] seam keeps
//! idle-window behavior testable.

pub mod clock;
pub mod store;
pub mod tracker;
pub mod types;

pub use {
    clock::{Clock, ManualClock, SystemClock},
    store::{ConversationStore, MemoryStore},
    tracker::{ConversationTracker, EXPIRE_AFTER_HOURS, PURGE_AFTER_HOURS, UpdateOutcome},
    types::{
        Conversation, ConversationContext, ConversationState, ConversationStats,
        ConversationSummary, EventSummary, Participant, ReceiptStatus, SummaryDetail, UserAction,
    },
};
