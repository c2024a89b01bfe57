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
use std::collections::HashSet;

/// Make a list of field names pairwise distinct, keeping order and length.
///
/// The first occurrence of a name is kept as it is. Later occurrences get the
/// lowest integer suffix (`0`, `1`, ...) that clashes neither with a name already
/// emitted nor with any of the original names, so a renamed duplicate can't
/// collide with a name further down the list.
///
/// # Examples
/// ```
/// # use star_rename::make_unique_names;
/// assert_eq!(
///     make_unique_names(&["C1", "C1", "C10"]),
///     vec!["C1", "C11", "C10"]
/// );
/// ```
pub fn make_unique_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let original = names.iter().map(AsRef::as_ref).collect::<HashSet<_>>();
    let mut emitted = HashSet::with_capacity(names.len());
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            let mut unique = name.to_owned();
            let mut suffix = 0u64;
            while emitted.contains(&unique)
                || (unique != name && original.contains(unique.as_str()))
            {
                unique = format!("{name}{suffix}");
                suffix += 1;
            }
            emitted.insert(unique.clone());
            unique
        })
        .collect()
}
