//! Collision-free display names for entries of one archive.

use std::collections::HashMap;

use crate::util::sanitize_name;

/// Name used for entries whose name is blank.
pub const DEFAULT_ENTRY_NAME: &str = "file";

/// Return a name that has not been handed out yet for this table.
///
/// The first occurrence of a name is returned unchanged. Later occurrences
/// get a ` (n)` marker in front of the extension (`report (1).pdf`) or at the
/// end when there is no extension (`notes (1)`), with `n` starting at 1.
/// Generated names are recorded too, so a later literal `report (1).pdf`
/// cannot collide with one produced here.
pub fn ensure_unique_name(name: &str, used_counts: &mut HashMap<String, usize>) -> String {
    let base = sanitize_name(name, DEFAULT_ENTRY_NAME);

    let seen = used_counts.get(&base).copied().unwrap_or(0);
    if seen == 0 {
        used_counts.insert(base.clone(), 1);
        return base;
    }

    let (stem, extension) = split_extension(&base);
    let mut n = seen;
    loop {
        let candidate = match extension {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        n += 1;

        if !used_counts.contains_key(&candidate) {
            used_counts.insert(candidate.clone(), 1);
            used_counts.insert(base, n);
            return candidate;
        }
    }
}

/// Split `name` at its final `.`, ignoring leading dots (`.env`) and
/// trailing dots (`name.`).
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

/// Per-archive de-duplication table.
#[derive(Debug, Default)]
pub struct UniqueNames {
    used_counts: HashMap<String, usize>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`ensure_unique_name`].
    pub fn ensure_unique(&mut self, name: &str) -> String {
        ensure_unique_name(name, &mut self.used_counts)
    }
}
