//! Unique local names derived straight from URLs.
//!
//! Many feeds publish every episode as `media.mp3`, distinguished only by
//! its parent directory. Names derived here pull in just enough trailing
//! path context to tell the files apart.

use std::collections::HashSet;

/// The last `level + 1` path segments of `path`, joined with `/`.
///
/// Empty segments (doubled separators, the scheme's `//`) are ignored.
pub fn path_at_level(path: &str, level: usize) -> String {
    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();
    let start = segments.len().saturating_sub(level + 1);
    segments[start..].join("/")
}

/// True when no name appears twice
pub fn names_are_unique(names: &[String]) -> bool {
    let mut seen = HashSet::new();
    names.iter().all(|name| seen.insert(name))
}

/// Crop a trailing query string, if any
pub fn exclude_params(name: &str) -> &str {
    match name.find('?') {
        Some(index) => &name[..index],
        None => name,
    }
}

/// Pair each URL with a locally-unique, filesystem-safe name.
///
/// Starting at depth 0 (bare filename), the candidate names grow by one
/// trailing path segment until they are pairwise distinct; the winning
/// depth is the minimal one. Each name then loses its query string and has
/// path separators replaced with underscores and `%20` decoded to spaces.
/// Depth growth stops at the deepest URL, so identical inputs degenerate
/// to equal names instead of looping.
pub fn unique_names(urls: &[String]) -> Vec<(String, String)> {
    let max_level = urls
        .iter()
        .map(|url| url.split(['/', '\\']).filter(|s| !s.is_empty()).count())
        .max()
        .unwrap_or(0);

    let mut level = 0;
    let names = loop {
        let candidates: Vec<String> = urls
            .iter()
            .map(|url| path_at_level(url, level))
            .collect();
        if names_are_unique(&candidates) || level + 1 >= max_level {
            break candidates;
        }
        level += 1;
    };

    urls.iter()
        .cloned()
        .zip(names.into_iter().map(|name| {
            let flat = name.replace(['/', '\\'], "_").replace("%20", " ");
            exclude_params(&flat).to_string()
        }))
        .collect()
}
