//! Structured logging setup, `RUST_LOG`-driven, compact format.
//!
//! ```bash
//! RUST_LOG=info cargo run -p jalse-demo
//! RUST_LOG=debug cargo run -p jalse-demo
//! ```

pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
