// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `Host` pattern matching.

/// Check an alias against the pattern list of one `Host` line.
///
/// The list matches when at least one plain pattern matches and no negated
/// (`!`) pattern does.
pub(super) fn matches_host_patterns(alias: &str, patterns: &[String]) -> bool {
    let mut matched = false;
    for pattern in patterns {
        if let Some(negated) = pattern.strip_prefix('!') {
            if wildcard_match(alias, negated) {
                return false;
            }
        } else if wildcard_match(alias, pattern) {
            matched = true;
        }
    }
    matched
}

/// Case-insensitive glob match supporting `*` and `?`.
pub(super) fn wildcard_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().map(|c| c.to_ascii_lowercase()).collect();
    let pattern: Vec<char> = pattern.chars().map(|c| c.to_ascii_lowercase()).collect();

    let (mut t, mut p) = (0, 0);
    // Position of the last '*' seen and the text index it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, star_t)) = backtrack {
            p = star + 1;
            t = star_t + 1;
            backtrack = Some((star, star_t + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_matching() {
        assert!(wildcard_match("web1.example.com", "web*.example.com"));
        assert!(wildcard_match("web123.example.com", "web*.example.com"));
        assert!(!wildcard_match("db1.example.com", "web*.example.com"));
        assert!(wildcard_match("test", "?est"));
        assert!(!wildcard_match("testing", "?est"));
        assert!(wildcard_match("anything", "*"));
        assert!(wildcard_match("WEB1", "web?"));
    }

    #[test]
    fn test_negated_pattern_excludes() {
        let patterns = vec!["web*".to_string(), "!web-canary".to_string()];
        assert!(matches_host_patterns("web1", &patterns));
        assert!(!matches_host_patterns("web-canary", &patterns));
        assert!(!matches_host_patterns("db1", &patterns));
    }

    #[test]
    fn test_only_negated_pattern_never_matches() {
        let patterns = vec!["!bastion".to_string()];
        assert!(!matches_host_patterns("web1", &patterns));
    }
}
