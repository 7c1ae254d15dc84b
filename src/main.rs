use std::process::ExitCode;

use editor_host::app::{AppRunner, EditorApp};
use editor_host::config::EditorConfig;
use editor_host::subsystems::FileSystem;

fn main() -> ExitCode {
    let mut config = EditorConfig::load_or_default();
    config.apply_env_overrides();
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    let file_system = match &config.paths.preferences_dir {
        Some(dir) => FileSystem::with_preferences_root(dir),
        None => FileSystem::new(),
    };
    let mut runner = AppRunner::new(file_system, config.runtime.clone());
    let mut app = EditorApp::new(config);
    let outcome = runner.run(&mut app);

    if let Some(diagnostic) = &outcome.diagnostic {
        eprintln!("{}", diagnostic);
    }
    if let Some(violation) = &outcome.teardown_error {
        if cfg!(debug_assertions) {
            panic!("Teardown invariant violated: {}", violation);
        }
    }
    outcome.exit_code
}
