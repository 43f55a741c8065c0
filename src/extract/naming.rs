//! Basename derivation for extracted side files and entity files.

use super::manifest::SIDE_FILE_SUFFIXES;
use std::collections::{HashMap, HashSet};

/// Used when a node or entity has no usable name
pub const UNNAMED: &str = "unnamed";

const RESERVED: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Make a name safe to use as a file basename.
///
/// Reserved path characters become `-`, whitespace runs become `_`. Names
/// that would resolve to the current or parent directory (`.`, `..`) fall
/// back to the placeholder.
pub fn sanitize(name: Option<&str>) -> String {
    let trimmed = name.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return UNNAMED.to_string();
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut in_whitespace = false;
    for ch in trimmed.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if RESERVED.contains(&ch) {
            out.push('-');
        } else {
            out.push(ch);
        }
    }
    if out.chars().all(|c| c == '.') {
        return UNNAMED.to_string();
    }
    out
}

/// Resolved name for one item of a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedName {
    pub sanitized: String,
    pub file_name: String,
}

/// Hands out collision-free basenames within a single pass.
///
/// The n-th repeat of a sanitized name gets an `(n+1)` suffix. Results only
/// depend on the order names are requested in. A basename is taken once any
/// name derived from it is taken, compared case-insensitively so that the
/// tree stays valid on case-insensitive filesystems.
#[derive(Debug)]
pub struct NameAllocator {
    seen: HashMap<String, usize>,
    taken: HashSet<String>,
    suffixes: &'static [&'static str],
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl NameAllocator {
    /// Allocator for bare basenames (entity files and directories)
    pub fn new() -> Self {
        Self::with_suffixes(&[""])
    }

    /// Allocator for side files: reserves every suffixed name of a basename
    pub fn for_side_files() -> Self {
        Self::with_suffixes(&SIDE_FILE_SUFFIXES)
    }

    fn with_suffixes(suffixes: &'static [&'static str]) -> Self {
        Self {
            seen: HashMap::new(),
            taken: HashSet::new(),
            suffixes,
        }
    }

    pub fn allocate(&mut self, raw: Option<&str>) -> AllocatedName {
        let sanitized = sanitize(raw);
        let count = self.seen.entry(sanitized.to_lowercase()).or_insert(0);
        *count += 1;

        let mut ordinal = *count;
        let mut file_name = if ordinal == 1 {
            sanitized.clone()
        } else {
            format!("{}({})", sanitized, ordinal)
        };
        // A literal "Foo(2)" or "Foo.initialize" may already hold the slot.
        while !self.is_free(&file_name) {
            ordinal += 1;
            file_name = format!("{}({})", sanitized, ordinal);
        }
        let derived: Vec<String> = self.derived_names(&file_name).collect();
        self.taken.extend(derived);

        AllocatedName {
            sanitized,
            file_name,
        }
    }

    fn derived_names(&self, base: &str) -> impl Iterator<Item = String> {
        let lower = base.to_lowercase();
        let suffixes: &'static [&'static str] = self.suffixes;
        suffixes
            .iter()
            .map(move |suffix| format!("{}{}", lower, suffix))
    }

    fn is_free(&self, base: &str) -> bool {
        !self.derived_names(base).any(|name| self.taken.contains(&name))
    }
}
