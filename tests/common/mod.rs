#![allow(dead_code)]

use aissembly::{OracleDefinition, OracleRegistry};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Registry of echo oracles (no adapter) with the given names.
pub fn echo_registry(names: &[&str]) -> OracleRegistry {
    let mut registry = OracleRegistry::new();
    for name in names {
        registry.register(OracleDefinition::new(*name).with_model("test-model"));
    }
    registry
}

pub fn demo_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join(name)
}
