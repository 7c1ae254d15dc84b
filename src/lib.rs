//! # Editor Host
//!
//! The host process of a script-driven editor: it brings up a headless engine,
//! embeds a QuickJS VM, binds native APIs into it and hands control to the
//! editor's entry script.
//!
//! ## Lifecycle
//!
//! - **Setup**: register leaf services (preferences, tool environment, tool
//!   system) and build the engine parameters
//! - **Start**: create the scripting host and VM, bind native APIs, execute
//!   `<editor-root>/main.js`
//! - **Stop**: release the VM and assert that no VM outlives the host
//!
//! Every fatal condition goes through a single exit point,
//! [`core::ExitController`].
//!
//! ### Example
//!
//! ```no_run
//! use editor_host::app::{AppRunner, EditorApp};
//! use editor_host::config::EditorConfig;
//! use editor_host::subsystems::FileSystem;
//!
//! let config = EditorConfig::load_or_default();
//! let mut runner = AppRunner::new(FileSystem::new(), config.runtime.clone());
//! let outcome = runner.run(&mut EditorApp::new(config));
//! println!("{:?}", outcome.diagnostic);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: registry, events, exit control, engine bring-up
//! - [`app`]: application trait, phase driver and the editor application
//! - [`scripting`]: QuickJS host and native bindings
//! - [`player`]: scene playback façade

/// Core host functionality: registry, events, exit control, engine bring-up
pub mod core;
/// Application lifecycle and the editor application
pub mod app;
/// Configuration system
pub mod config;
/// Engine subsystems used by the host
pub mod subsystems;
/// Leaf services registered during Setup
pub mod tools;
/// Embedded JavaScript host
pub mod scripting;
/// Scene description and loading
pub mod scene;
/// Scene playback façade
pub mod player;
