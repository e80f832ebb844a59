//! Minimal tour: cached generation, parsing and the direct fallback.
//!
//! Run with: `cargo run --example basic`

use uidring::{
    CachedUidGenerator, DirectUidGenerator, GeneratorConfig, LocalAssigner, UidGenerator,
};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let cached =
        CachedUidGenerator::with_assigner(GeneratorConfig::default(), &LocalAssigner)
            .expect("cached generator");
    println!("cached UIDs:");
    for _ in 0..5 {
        let uid = cached.must();
        println!("  {uid} -> {}", cached.parse(uid));
    }

    let direct = DirectUidGenerator::with_assigner(&GeneratorConfig::default(), &LocalAssigner)
        .expect("direct generator");
    println!("direct UIDs:");
    for _ in 0..5 {
        let uid = direct.must();
        println!("  {uid} -> {}", direct.parse(uid));
    }

    cached.destroy();
}
