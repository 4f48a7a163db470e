// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A narrow, tokenized RPM version comparator and its supporting parenthesis
//! parser, used solely to collapse chains of `libc.so.6(GLIBC_x.y)(64bit)`
//! dependencies down to the single highest-versioned entry.
//!
//! This comparator has no `~`/`^` modifier handling, matching the narrower
//! algorithm historically used for libc symbol-version collapsing.

/// Tokenize a string into maximal runs of digits or letters, discarding any
/// other character as a separator.
fn tokenize(s: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            tokens.push(Token::Num(&s[start..i]));
        } else if c.is_ascii_alphabetic() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            tokens.push(Token::Alpha(&s[start..i]));
        } else {
            i += 1;
        }
    }
    tokens
}

enum Token<'a> {
    Num(&'a str),
    Alpha(&'a str),
}

/// Compare two version-like strings by tokenizing into runs of digits and
/// letters and comparing token by token. Numeric tokens compare numerically;
/// alphabetic tokens compare lexicographically; a numeric token always
/// outranks an alphabetic one; a shorter token list is less than a longer
/// one that shares its prefix.
pub fn rpmcmp(s1: &str, s2: &str) -> i32 {
    let t1 = tokenize(s1);
    let t2 = tokenize(s2);

    for (a, b) in t1.iter().zip(t2.iter()) {
        let ord = match (a, b) {
            (Token::Num(x), Token::Num(y)) => {
                let x: u64 = x.parse().unwrap_or(0);
                let y: u64 = y.parse().unwrap_or(0);
                x.cmp(&y)
            }
            (Token::Alpha(x), Token::Alpha(y)) => x.cmp(y),
            (Token::Num(_), Token::Alpha(_)) => std::cmp::Ordering::Greater,
            (Token::Alpha(_), Token::Num(_)) => std::cmp::Ordering::Less,
        };
        match ord {
            std::cmp::Ordering::Equal => continue,
            std::cmp::Ordering::Less => return -1,
            std::cmp::Ordering::Greater => return 1,
        }
    }

    match t1.len().cmp(&t2.len()) {
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Greater => 1,
    }
}

/// Parse a string of the form `(a)(b)...` into `["a", "b", ...]`.
///
/// Returns `None` if the string contains a `(` while already inside a group,
/// anything outside of a group, or an unterminated group.
pub fn read_parenthesis(s: &str) -> Option<Vec<String>> {
    let mut groups = Vec::new();
    let mut chars = s.chars();

    loop {
        match chars.next() {
            None => break,
            Some('(') => {
                let mut buf = String::new();
                loop {
                    match chars.next() {
                        None => return None,
                        Some('(') => return None,
                        Some(')') => break,
                        Some(c) => buf.push(c),
                    }
                }
                groups.push(buf);
            }
            Some(_) => return None,
        }
    }

    if groups.is_empty() { None } else { Some(groups) }
}

/// Compare two `libc.so.6(...)`-shaped dependency names.
///
/// Returns `0` if equal, `1` if `c1` is the larger requirement, `2` if `c2`
/// is, and `-1` if either side could not be parsed as a comparable symbol
/// version (in which case the caller must not collapse the pair).
///
/// A bare name with no parenthesized suffix at all is treated as larger than
/// any versioned one — this is an intentional, unintuitive quirk preserved
/// for bit-compatibility with existing repository output rather than a
/// "fix"; see DESIGN.md.
pub fn compare_libc(c1: &str, c2: &str) -> i32 {
    if c1 == c2 {
        return 0;
    }

    let p1 = c1.find('(');
    let p2 = c2.find('(');

    let (p1, p2) = match (p1, p2) {
        (None, None) => return 0,
        (None, Some(_)) => return 1,
        (Some(_), None) => return 2,
        (Some(p1), Some(p2)) => (p1, p2),
    };

    let groups1 = match read_parenthesis(&c1[p1..]) {
        Some(g) => g,
        None => return -1,
    };
    let groups2 = match read_parenthesis(&c2[p2..]) {
        Some(g) => g,
        None => return -1,
    };

    if groups1.is_empty() || groups1.len() > 2 || groups2.is_empty() || groups2.len() > 2 {
        return -1;
    }
    if groups1.len() == 2 && groups1[1] != "64bit" {
        return -1;
    }
    if groups2.len() == 2 && groups2[1] != "64bit" {
        return -1;
    }

    let v1 = groups1[0].as_str();
    let v2 = groups2[0].as_str();

    if v1 == v2 {
        return 0;
    }
    if !v1.is_empty() && !v1.starts_with("GLIBC_") {
        return -1;
    }
    if !v2.is_empty() && !v2.starts_with("GLIBC_") {
        return -1;
    }
    match (v1.is_empty(), v2.is_empty()) {
        (true, false) => return 2,
        (false, true) => return 1,
        _ => {}
    }

    let result = rpmcmp(v1.trim_start_matches("GLIBC_"), v2.trim_start_matches("GLIBC_"));
    if result == -1 { 2 } else { result }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rpmcmp_boundary_table() {
        let cases: &[(&str, &str, i32)] = &[
            ("2.3", "2.3", 0),
            ("2.3", "2.4", -1),
            ("2.10", "2.9", 1),
            ("2.3.4", "2.3", 1),
            ("2a", "2", 1),
            ("2", "2a", -1),
            ("2.a", "2.b", -1),
        ];
        for (s1, s2, expected) in cases {
            assert_eq!(rpmcmp(s1, s2), *expected, "rpmcmp({s1:?}, {s2:?})");
        }
    }

    #[test]
    fn read_parenthesis_table() {
        assert_eq!(
            read_parenthesis("(GLIBC_2.3.4)(64bit)"),
            Some(vec!["GLIBC_2.3.4".to_owned(), "64bit".to_owned()])
        );
        assert_eq!(read_parenthesis("(GLIBC_2.3.4(64bit)"), None);
        assert_eq!(read_parenthesis("(GLIBC_2.3.4)(64bit)a"), None);
        assert_eq!(read_parenthesis("(GLIBC_2.3.4(64bit))"), None);
        assert_eq!(read_parenthesis("()"), Some(vec!["".to_owned()]));
        assert_eq!(read_parenthesis("(64bit)"), Some(vec!["64bit".to_owned()]));
    }

    #[test]
    fn compare_libc_fold_picks_highest_version() {
        let names = [
            "libc.so.6(GLIBC_2.3)(64bit)",
            "libc.so.6()(64bit)",
            "libc.so.6(GLIBC_2.14)(64bit)",
            "libc.so.6(GLIBC_2.25)(64bit)",
            "libc.so.6(GLIBC_2.2.5)(64bit)",
            "libc.so.6(GLIBC_2.3.4)(64bit)",
            "libc.so.6(GLIBC_2.33)(64bit)",
            "libc.so.6(GLIBC_2.32)(64bit)",
            "libc.so.6(GLIBC_2.34)(64bit)",
            "libc.so.6(GLIBC_2.4)(64bit)",
            "libc.so.6(GLIBC_2.7)(64bit)",
        ];
        let mut best = names[0];
        for &candidate in &names[1..] {
            let c = compare_libc(best, candidate);
            assert_ne!(c, -1, "unexpected unparseable comparison for {candidate}");
            if c == 2 {
                best = candidate;
            }
        }
        assert_eq!(best, "libc.so.6(GLIBC_2.34)(64bit)");
    }

    #[test]
    fn compare_libc_bare_outranks_versioned() {
        assert_eq!(
            compare_libc("libc.so.6", "libc.so.6(GLIBC_2.34)(64bit)"),
            1
        );
        assert_eq!(
            compare_libc("libc.so.6(GLIBC_2.34)(64bit)", "libc.so.6"),
            2
        );
    }
}
