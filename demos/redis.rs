//! Example sharing counters across processes through Redis.
//!
//! 1. Start Redis:
//!    ```bash
//!    docker run -p 6379:6379 redis:7-alpine
//!    ```
//!
//! 2. Run the example (from project root), in two terminals at once:
//!    ```bash
//!    cargo run --example redis --features redis-storage
//!    ```
//!
//! Both instances draw from the same per-subject allowance, so together they
//! get 40 messages per 5 minute window, not 40 each.

use action_throttle::{
    ActionType, Admission, AdmissionGate, CircuitBreaker, DecisionEngine, RedisCounterStore,
    RedisCounterStoreConfig, Subject,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("action_throttle=info"))
        .init();

    let config = RedisCounterStoreConfig {
        key_prefix: "action-throttle-demo:".to_string(),
        operation_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let store = RedisCounterStore::connect_with_config("redis://127.0.0.1:6379", config).await?;

    let engine = DecisionEngine::builder()
        .with_standard_policies()
        .build_with_store(store)?;
    let gate = AdmissionGate::new(engine)
        .with_fail_open(ActionType::SEND_MESSAGE)
        .with_circuit_breaker(Arc::new(CircuitBreaker::new()));

    let subject = Subject::verified("chatty");
    let mut sent = 0;
    for _ in 0..50 {
        // Store calls block; keep them off the async worker threads
        let gate = gate.clone();
        let subject = subject.clone();
        let admission = tokio::task::spawn_blocking(move || {
            gate.admit(&subject, &ActionType::SEND_MESSAGE)
        })
        .await?;

        match admission {
            Admission::Proceed => sent += 1,
            Admission::RetryLater { retry_after } => {
                println!("throttled after {} messages, retry in {:?}", sent, retry_after);
                break;
            }
            other => println!("unexpected answer: {:?}", other),
        }
    }

    println!("sent {} messages in this process", sent);
    Ok(())
}
