use crate::config;

/// Load settings, falling back to defaults. The second value explains a
/// fallback so it can be logged once tracing is up.
pub fn load_settings() -> (config::Settings, Option<String>) {
    match config::Settings::load() {
        Ok(s) => match s.validate() {
            Ok(()) => (s, None),
            Err(msg) => {
                let msg = format!("invalid config, using defaults: {msg}");
                eprintln!("cadenza: {msg}");
                (config::Settings::default(), Some(msg))
            }
        },
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            let msg = format!("failed to load config, using defaults: {e}");
            eprintln!("cadenza: {msg}");
            (config::Settings::default(), Some(msg))
        }
    }
}
