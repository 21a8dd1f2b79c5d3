pub mod chat_relay;
pub mod connectivity;
pub mod livekit;
pub mod metrics_manager;
pub mod pipeline;
pub mod session_relay;
pub mod tavus;
