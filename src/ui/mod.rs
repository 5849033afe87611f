//! Terminal UI
//!
//! Uses `cliclack` for framed output and prompts with automatic fallback to
//! plain lines in CI/non-interactive environments. Also provides the
//! terminal status indicator and notification surface the CLI injects into
//! the shell.
//!
//! # Example
//!
//! ```rust,ignore
//! use hubshell::ui::{self, UiContext};
//!
//! let ctx = UiContext::detect();
//! ui::intro(&ctx, "hubshell install");
//! ui::step_ok_detail(&ctx, "Installed", "connecthub-v1");
//! ui::outro_success(&ctx, "Cache ready");
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod terminal;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, outro_success, remark, section,
    step_error_detail, step_info, step_ok, step_ok_detail, step_warn, step_warn_hint,
};
pub use progress::{InstallProgress, TaskSpinner};
pub use prompts::{confirm, permission};
pub use terminal::{TerminalIndicator, TerminalNotifier};
pub use theme::{init_theme, ShellTheme};
