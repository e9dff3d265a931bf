// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Limits enforced by the builder while a transaction is assembled. The
/// defaults mirror the protocol limits of the network, so a transaction that
/// passes the builder is not rejected by the node for its shape alone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PtbConfig {
    /// Maximum number of entries in the input table.
    ///
    /// Defaults to `2048` if not specified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_inputs: Option<usize>,

    /// Maximum number of commands in one transaction.
    ///
    /// Defaults to `1024` if not specified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_commands: Option<usize>,

    /// Maximum size in bytes of a single pure input, applied by
    /// `ProgrammableTransactionBuilder::check_pure_sizes`.
    ///
    /// Defaults to `16KiB` if not specified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pure_argument_size: Option<usize>,

    /// Maximum number of arguments in a single command.
    ///
    /// Defaults to `512` if not specified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_arguments: Option<usize>,

    /// Maximum number of type arguments of a Move call.
    ///
    /// Defaults to `16` if not specified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_type_arguments: Option<usize>,
}

impl PtbConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        trace!("Reading builder config from {}", path.display());
        let reader = std::fs::File::open(path)
            .with_context(|| format!("Unable to load config from {}", path.display()))?;
        let config = serde_yaml::from_reader(reader)
            .with_context(|| format!("Unable to parse config from {}", path.display()))?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), anyhow::Error> {
        let path = path.as_ref();
        trace!("Writing builder config to {}", path.display());
        let config = serde_yaml::to_string(self)?;
        std::fs::write(path, config)
            .with_context(|| format!("Unable to save config to {}", path.display()))?;
        Ok(())
    }

    pub fn max_inputs(&self) -> usize {
        self.max_inputs.unwrap_or(2048)
    }

    pub fn max_commands(&self) -> usize {
        self.max_commands.unwrap_or(1024)
    }

    pub fn max_pure_argument_size(&self) -> usize {
        self.max_pure_argument_size.unwrap_or(16 * 1024)
    }

    pub fn max_arguments(&self) -> usize {
        self.max_arguments.unwrap_or(512)
    }

    pub fn max_type_arguments(&self) -> usize {
        self.max_type_arguments.unwrap_or(16)
    }
}
