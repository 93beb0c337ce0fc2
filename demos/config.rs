//! Example loading policies from TOML and layering an override on top.
//!
//! Pass a path to load policies from a file instead:
//! ```bash
//! cargo run --example config -- policies.toml
//! ```

use action_throttle::{ActionType, DecisionEngine, Policy, PolicyRegistry, Subject};
use std::time::Duration;

const POLICIES: &str = r#"
[actions.create_post]
window = "30m"
max_count = 6
unverified_max_count = 3

[actions.send_message]
window = "5m"
max_count = 40
unverified_max_count = 15
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let registry = match std::env::args().nth(1) {
        Some(path) => PolicyRegistry::load(path)?,
        None => PolicyRegistry::from_toml_str(POLICIES)?,
    };

    let engine = DecisionEngine::builder()
        .with_registry(registry)
        .with_policy("send_gift", Policy::new(Duration::from_secs(60), 3, 1)?)
        .build()?;

    println!("Configured actions:");
    let mut actions: Vec<_> = engine.registry().iter().collect();
    actions.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
    for (action, policy) in actions {
        println!(
            "  {:<14} window={:<8} max={:<3} unverified_max={}",
            action.as_str(),
            humantime::format_duration(policy.window()).to_string(),
            policy.max_count(),
            policy.unverified_max_count()
        );
    }

    let subject = Subject::unverified("gifter");
    let gift = ActionType::new("send_gift");
    println!("\n{} sending 4 gifts:", subject.id);
    for _ in 0..4 {
        let decision = engine.check(&subject, &gift)?;
        println!("  {}", decision.outcome());
    }

    Ok(())
}
