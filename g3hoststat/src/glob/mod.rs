/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 ByteDance and/or its affiliates.
 */

mod pattern;
pub use pattern::Pattern;

mod acl;
pub use acl::Acl;
