// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#[macro_use]
extern crate lazy_static;

pub mod atascii;
pub mod bp;
pub mod disasm;
pub mod dlist;
pub mod hex;
pub mod symbols;
