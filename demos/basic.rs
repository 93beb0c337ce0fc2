//! Basic example: one unverified and one verified user posting reels.
//!
//! Run with `RUST_LOG=action_throttle=debug` to see every decision logged.

use action_throttle::{ActionType, Admission, AdmissionGate, DecisionEngine, Subject};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // create_reel: 5 per hour, 2 for unverified users
    let engine = DecisionEngine::builder().with_standard_policies().build()?;
    let gate = AdmissionGate::new(engine);

    println!("=== Admission Control Example ===\n");

    for subject in [Subject::unverified("new-user"), Subject::verified("trusted-user")] {
        println!("{} ({}) posting 7 reels:", subject.id, subject.tier);
        for attempt in 1..=7 {
            let answer = match gate.admit(&subject, &ActionType::CREATE_REEL) {
                Admission::Proceed => "posted".to_string(),
                Admission::VerifyIdentity => "asked to verify identity".to_string(),
                Admission::RetryLater { retry_after } => {
                    format!("rejected, retry in {}s", retry_after.as_secs())
                }
                Admission::Unavailable => "rejected, throttling unavailable".to_string(),
            };
            println!("  attempt {}: {}", attempt, answer);
        }
        println!();
    }

    let snapshot = gate.engine().metrics().snapshot();
    println!("=== Metrics ===");
    println!("allowed: {}", snapshot.allowed);
    println!("verification required: {}", snapshot.verification_required);
    println!("exceeded: {}", snapshot.exceeded);
    println!("denial rate: {:.1}%", snapshot.denial_rate() * 100.0);

    Ok(())
}
