//! Default configuration values
//!
//! These mirror `AppConfig::default()` and document the file format.

/// Default configuration as TOML (for reference/documentation)
pub const DEFAULT_CONFIG_TOML: &str = r##"
# scenebridge configuration

[server]
# Address the WebSocket listener binds to
host = "0.0.0.0"
port = 8765

[engine]
# External engine endpoint (one short-lived connection per command)
host = "127.0.0.1"
port = 9877
# Connect/read bound for each engine call
timeout_ms = 5000

[dispatch]
# Maximum nesting of sequence-in-sequence batches
max_sequence_depth = 4

[simulation]
# Start the simulated engine with Cube_1 and Camera_1
seed_default_scene = true
"##;
