//! Descriptor command - emit the application descriptor

use crate::cli::args::DescriptorArgs;
use crate::config::Config;
use crate::descriptor::AppDescriptor;
use crate::error::{ShellError, ShellResult};
use crate::ui::{self, UiContext};

/// Execute the descriptor command
pub async fn execute(args: DescriptorArgs, config: &Config) -> ShellResult<()> {
    let json = AppDescriptor::from_config(&config.app)?.to_json()?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, format!("{}\n", json))
                .await
                .map_err(|e| ShellError::io(format!("writing {}", path.display()), e))?;
            ui::step_ok_detail(
                &UiContext::detect(),
                "Descriptor written",
                &path.display().to_string(),
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
