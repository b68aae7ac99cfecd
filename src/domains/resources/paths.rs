//! String-level path helpers shared by the path-based resources.
//!
//! Locators are handled as `/`-separated strings rather than [`std::path::Path`]
//! so that a trailing `/` survives (it marks a directory base for relative
//! resolution) and so that file and embedded locators behave identically on
//! every platform.

/// Normalize a path: `\` becomes `/`, `.` segments are dropped and `..`
/// segments are folded into their predecessor.
///
/// A leading `scheme:`-style prefix (e.g. `C:` or `embedded:`) and a root `/`
/// are preserved. Unmatched `..` segments are kept on relative paths and
/// discarded on rooted paths, where they cannot climb any higher.
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }

    let normalized = path.replace('\\', "/");
    let mut rest = normalized.as_str();
    let mut prefix = String::new();

    if let Some(idx) = rest.find(':') {
        let candidate = &rest[..=idx];
        if !candidate.contains('/') {
            prefix.push_str(candidate);
            rest = &rest[idx + 1..];
        }
    }
    if let Some(stripped) = rest.strip_prefix('/') {
        prefix.push('/');
        rest = stripped;
    }
    let rooted = prefix.ends_with('/');

    let mut elements: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "." => {}
            ".." => match elements.last() {
                Some(&last) if last != ".." => {
                    elements.pop();
                }
                _ if rooted => {}
                _ => elements.push(".."),
            },
            other => elements.push(other),
        }
    }

    // "./" must not collapse into an empty relative path
    if elements.len() == 1 && elements[0].is_empty() && !rooted {
        elements.insert(0, ".");
    }

    prefix + &elements.join("/")
}

/// Resolve `relative` against `base` by replacing everything after the final
/// `/` of `base`. When `base` ends with `/` the relative path is appended.
///
/// The result is not cleaned; callers run it through [`clean_path`].
pub fn apply_relative_path(base: &str, relative: &str) -> String {
    match base.rfind('/') {
        Some(sep) => {
            let mut joined = base[..sep].to_string();
            if !relative.starts_with('/') {
                joined.push('/');
            }
            joined.push_str(relative);
            joined
        }
        None => relative.to_string(),
    }
}

/// Last `/`-separated segment of `path`, or `None` when it is empty.
pub fn filename(path: &str) -> Option<String> {
    let name = match path.rfind('/') {
        Some(sep) => &path[sep + 1..],
        None => path,
    };
    (!name.is_empty()).then(|| name.to_string())
}

/// Whether a cleaned relative path climbs above its starting directory.
pub fn escapes_root(cleaned: &str) -> bool {
    cleaned == ".." || cleaned.starts_with("../")
}
