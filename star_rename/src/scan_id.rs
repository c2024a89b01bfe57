/*
* Copyright 2022-2025 Crown Copyright
*
* Licensed under the Apache License, Version 2.0 (the "License");
* you may not use this file except in compliance with the License.
* You may obtain a copy of the License at
*
*     http://www.apache.org/licenses/LICENSE-2.0
*
* Unless required by applicable law or agreed to in writing, software
* distributed under the License is distributed on an "AS IS" BASIS,
* WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
* See the License for the specific language governing permissions and
* limitations under the License.
*/
use std::sync::atomic::{AtomicU64, Ordering};

/// Ids shared by every rewrite in this process.
static GLOBAL_SCAN_IDS: ScanIdGenerator = ScanIdGenerator::new();

/// Hands out the numbers used to prefix star columns of a scan.
///
/// Ids are never reused. Nothing relies on them being contiguous or ordered
/// between threads, so a relaxed atomic increment is enough.
#[derive(Debug, Default)]
pub struct ScanIdGenerator {
    next: AtomicU64,
}

impl ScanIdGenerator {
    /// A generator whose first id is 0.
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// The process wide generator.
    #[must_use]
    pub fn global() -> &'static ScanIdGenerator {
        &GLOBAL_SCAN_IDS
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
