pub const GREETING: &str = "Rust 🦀 vs Go 🐹 — Code or be coded!";

// Served on every path that isn't /metrics
pub async fn greeting_handler() -> &'static str {
    GREETING
}
