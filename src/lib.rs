//! Decision logic behind the HAVI caregiver app: the family access guard,
//! server-side family resolution, child age staging, and the assistant
//! request builder with its chat-completion transport.

pub mod app;
pub mod assistant;
pub mod child_stage;
pub mod cli;
pub mod family_access;
pub mod family_guard;
pub mod model_request;
pub mod openai;
pub mod prompts;
pub mod time_util;

pub mod test_utils;

pub use family_guard::{decide, GuardDecision, GuardInput, GuardRoutes};
pub use model_request::{
    build_havi_model_request, build_havi_model_request_at, ChatMessage,
    ChildProfile, ModelRequest, ModelRequestInput, Role,
};
