// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

pub mod commands;

use anyhow::Result;
use commands::handle_command;

fn main() -> Result<()> {
    env_logger::init();
    handle_command()
}
