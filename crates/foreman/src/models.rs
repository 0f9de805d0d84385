//! The objects passed around by the agent loop.
//!
//! The conversation model deliberately mirrors Gemini's wire vocabulary
//! (`user`/`model` roles, plain text parts) since that is the only provider
//! dialect we speak; the step protocol is our own contract layered on top of
//! the model's free-form text replies.
pub mod message;
pub mod role;
pub mod step;
