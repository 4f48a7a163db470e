// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

pub mod create;

use anyhow::Result;

use argh::FromArgs;

pub fn handle_command() -> Result<()> {
    let execution_config: CreateRepoExecConfig = argh::from_env();

    match execution_config.subcommand {
        Subcommands::Create(c) => create::create(c),
    }
}

#[derive(FromArgs, PartialEq, Debug)]
/// Top-level command.
pub struct CreateRepoExecConfig {
    #[argh(subcommand)]
    subcommand: Subcommands,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
enum Subcommands {
    Create(CreateCommand),
}

#[derive(FromArgs, PartialEq, Debug)]
/// Scan a directory of RPMs and publish/update its repodata
#[argh(subcommand, name = "create")]
pub struct CreateCommand {
    /// directory containing RPMs
    #[argh(positional)]
    destination: std::path::PathBuf,
}
