// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#[macro_use]
extern crate log;

mod cli;
mod cmd;
mod monitor;
mod trainer;
mod util;

use std::env;
use std::process;

use structopt::clap::ErrorKind;
use structopt::StructOpt;

use crate::cli::Opt;
use crate::util::Logger;

static NAME: &str = "a800mon";

fn main() {
    let opt = match Opt::from_iter_safe(env::args()) {
        Ok(opt) => opt,
        Err(err) => {
            // help and version are not argument errors
            if err.kind == ErrorKind::HelpDisplayed || err.kind == ErrorKind::VersionDisplayed {
                println!("{}", err.message);
                process::exit(0);
            }
            eprintln!("{}", err.message);
            process::exit(2);
        }
    };
    if let Err(err) = init_logging(&opt) {
        eprintln!("Error: {}", err);
        process::exit(2);
    }
    info!("Starting {}", NAME);
    process::exit(cmd::execute(opt));
}

fn init_logging(opt: &Opt) -> Result<(), String> {
    let mut logger = Logger::build(&opt.loglevel)?;
    for target_level in &opt.log {
        match target_level.find('=') {
            Some(equals) => {
                let (target, level) = target_level.split_at(equals);
                logger.add_target(target.to_string(), &level[1..])?;
            }
            None => return Err(format!("invalid log target pair {}", target_level)),
        }
    }
    Logger::enable(logger)
}
