// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Deduplicates and normalizes a package's raw dependency list, collapsing
//! any chain of `libc.so.6(GLIBC_x.y)(64bit)` entries down to the single
//! highest-versioned one.

use std::collections::HashSet;

use crate::model::Entry;
use crate::rpmver::compare_libc;

/// A dependency as read off an RPM header, before normalization.
#[derive(Debug, Clone)]
pub struct RawDependency {
    pub name: String,
    /// Raw version string, e.g. `"2.3.4-1"` or `"1:2.3.4-1"`.
    pub version: String,
    pub flag: Option<&'static str>,
    pub pre: bool,
}

/// Normalize a raw dependency list: drop `rpmlib(...)` entries, collapse
/// `libc.so.6(...)` chains, deduplicate, and exclude anything present in
/// `exclude` (typically the package's own `provides`).
///
/// Returns the normalized list along with the set of entries it produced,
/// so callers can thread that set in as the `exclude` set for the next list
/// (e.g. `provides` feeds into normalizing `requires`).
pub fn normalize(deps: &[RawDependency], exclude: &HashSet<Entry>) -> (Vec<Entry>, HashSet<Entry>) {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut libc_best: Option<&RawDependency> = None;

    for dep in deps {
        if dep.name.starts_with("libc.so.6") {
            match libc_best {
                None => {
                    libc_best = Some(dep);
                    continue;
                }
                Some(best) => {
                    let c = compare_libc(&best.name, &dep.name);
                    if c == 0 || c == 1 {
                        continue;
                    } else if c == 2 {
                        libc_best = Some(dep);
                        continue;
                    }
                    // c == -1: unparseable, fall through and treat as a normal entry.
                }
            }
        }

        if dep.name.starts_with("rpmlib(") {
            continue;
        }

        let entry = entry_from_raw(dep);
        if seen.contains(&entry) || exclude.contains(&entry) {
            continue;
        }
        seen.insert(entry.clone());
        out.push(entry);
    }

    if let Some(best) = libc_best {
        out.push(Entry {
            name: best.name.clone(),
            ..Default::default()
        });
    }

    (out, seen)
}

fn entry_from_raw(dep: &RawDependency) -> Entry {
    let (epoch_str, rest) = match dep.version.split_once(':') {
        Some((epoch, rest)) => (epoch.to_owned(), rest.to_owned()),
        None => (String::new(), dep.version.clone()),
    };
    let (version, release) = match rest.split_once('-') {
        Some((version, release)) => (version.to_owned(), release.to_owned()),
        None => (rest, String::new()),
    };

    Entry {
        name: dep.name.clone(),
        flags: dep.flag.unwrap_or("").to_owned(),
        epoch: epoch_str,
        version,
        release,
        pre: if dep.pre { "1".to_owned() } else { String::new() },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn dep(name: &str, version: &str) -> RawDependency {
        RawDependency {
            name: name.to_owned(),
            version: version.to_owned(),
            flag: Some("GE"),
            pre: false,
        }
    }

    #[test]
    fn collapses_libc_chain_to_highest_version() {
        let deps = vec![
            dep("libc.so.6(GLIBC_2.3)(64bit)", ""),
            dep("libc.so.6(GLIBC_2.14)(64bit)", ""),
            dep("libc.so.6(GLIBC_2.34)(64bit)", ""),
            dep("libc.so.6(GLIBC_2.7)(64bit)", ""),
            dep("bash", "4.0-1"),
        ];
        let (normalized, _) = normalize(&deps, &HashSet::new());
        let libc_entries: Vec<_> = normalized
            .iter()
            .filter(|e| e.name.starts_with("libc.so.6"))
            .collect();
        assert_eq!(libc_entries.len(), 1);
        assert_eq!(libc_entries[0].name, "libc.so.6(GLIBC_2.34)(64bit)");
        assert!(normalized.iter().any(|e| e.name == "bash"));
    }

    #[test]
    fn drops_rpmlib_and_excludes_provided() {
        let deps = vec![
            dep("rpmlib(CompressedFileNames)", "3.0.4-1"),
            dep("bash", "4.0-1"),
            dep("libfoo.so.1", ""),
        ];
        let mut exclude = HashSet::new();
        exclude.insert(Entry {
            name: "libfoo.so.1".to_owned(),
            flags: "GE".to_owned(),
            ..Default::default()
        });
        let (normalized, _) = normalize(&deps, &exclude);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].name, "bash");
    }

    #[test]
    fn splits_epoch_version_release() {
        let deps = vec![dep("bash", "1:4.0-1")];
        let (normalized, _) = normalize(&deps, &HashSet::new());
        assert_eq!(normalized[0].epoch, "1");
        assert_eq!(normalized[0].version, "4.0");
        assert_eq!(normalized[0].release, "1");
    }
}
