//! Herald: condition-gated message delivery pipelines.
//!
//! A message submitted to a [`builder::MessagingService`] flows through a
//! fixed chain of decorators (filling, content translation, phone number
//! addressing) into an [`sender::ImplementationResolver`], which hands it to
//! the first transport whose [`condition::Condition`] holds.
//!
//! See `DESIGN.md` for the architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod environment;
pub mod logging;

pub mod addressing;
pub mod condition;
pub mod filler;
pub mod message;
pub mod translator;

pub mod builder;
pub mod sender;
pub mod transport;
