// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Example of fork-join on borrowed data, mixing different closures.

use dncpool::exec_parallel;

fn main() {
    env_logger::init();

    let words = ["divide", "and", "conquer", "fork", "join"];
    let mut lengths = Vec::new();
    let mut longest = "";
    let mut joined = String::new();

    exec_parallel!(
        || lengths = words.iter().map(|w| w.len()).collect(),
        || longest = words.iter().copied().max_by_key(|w| w.len()).unwrap_or_default(),
        || joined = words.join("-"),
    )
    .unwrap();

    println!("lengths = {lengths:?}");
    println!("longest = {longest}");
    println!("joined = {joined}");
}
