// Presentation layer - HTTP, SSE and WebSocket surface
pub mod app_state;
pub mod handlers;
pub mod router;
pub mod ws;
