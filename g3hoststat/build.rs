/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2024-2026 ByteDance and/or its affiliates.
 */

use std::env;

fn main() {
    let rustc = rustc_version::version_meta().unwrap();
    println!(
        "cargo:rustc-env=G3_BUILD_RUSTC_VERSION={}",
        rustc.short_version_string
    );
    println!("cargo:rustc-env=G3_BUILD_RUSTC_CHANNEL={:?}", rustc.channel);

    for (var, name) in [
        ("HOST", "G3_BUILD_HOST"),
        ("TARGET", "G3_BUILD_TARGET"),
        ("PROFILE", "G3_BUILD_PROFILE"),
        ("OPT_LEVEL", "G3_BUILD_OPT_LEVEL"),
        ("DEBUG", "G3_BUILD_DEBUG"),
    ] {
        println!("cargo:rustc-env={name}={}", env::var(var).unwrap());
    }

    if let Ok(v) = env::var("G3_PACKAGE_VERSION") {
        println!("cargo:rustc-env=G3_PACKAGE_VERSION={v}");
    }
    println!("cargo:rerun-if-env-changed=G3_PACKAGE_VERSION");
}
