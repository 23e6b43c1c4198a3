//! Embedded export

use cann_runtime::SchedulerConfig;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::config::CliConfig;
use crate::error::CliResult;

/// Export a network for embedded controllers
#[derive(Args, Debug)]
pub struct ExportCommand {
    /// Network `.pcn` file
    pub network: PathBuf,

    /// Output `.rnn` file
    pub output: PathBuf,
}

impl ExportCommand {
    /// Write the `.rnn` image
    pub fn execute(self, _config: &CliConfig) -> CliResult<()> {
        let net = cann_storage::load_from_path(&self.network, SchedulerConfig::default())?;
        cann_storage::export_embedded_to_path(&net, &self.output)?;
        info!(
            "Exported {} to {} ({} neurons)",
            self.network.display(),
            self.output.display(),
            net.size()
        );
        Ok(())
    }
}
