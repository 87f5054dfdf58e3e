//! Virtual asset path helpers.
//!
//! Asset files are named `<name>[@<suffix>].<ext>`. The registry key of a
//! file is its path with the `@suffix` and `.ext` removed. Base names may not
//! themselves contain `.` or `@`.

/// Split a path into its directory (without trailing `/`) and file name.
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

/// Extension of the file name, without the dot. Empty if there is none.
pub fn extension(path: &str) -> &str {
    let (_, name) = split_parent(path);
    match name.rfind('.') {
        Some(i) if i > 0 => &name[i + 1..],
        _ => "",
    }
}

/// Path with its extension replaced by `ext`.
pub fn replace_extension(path: &str, ext: &str) -> String {
    let current = extension(path);
    let stem = if current.is_empty() {
        path
    } else {
        &path[..path.len() - current.len() - 1]
    };
    format!("{stem}.{ext}")
}

/// Resolution suffix of the file name (`"hd"` for `a/b@hd.png`), or empty.
pub fn suffix(path: &str) -> &str {
    let (_, name) = split_parent(path);
    let stem = match name.find('.') {
        Some(i) => &name[..i],
        None => name,
    };
    match stem.find('@') {
        Some(i) => &stem[i + 1..],
        None => "",
    }
}

/// Registry key of a file path: directory kept, `@suffix` and `.ext` dropped.
///
/// Idempotent: `normalize(normalize(p)) == normalize(p)`.
pub fn normalize(path: &str) -> String {
    let (dir, name) = split_parent(path);
    let end = name.find(['.', '@']).unwrap_or(name.len());
    let base = &name[..end];
    if dir.is_empty() {
        base.to_string()
    } else {
        format!("{dir}/{base}")
    }
}

/// Insert `@suffix` before the extension: `ui/a.png` → `ui/a@hd.png`.
pub fn append_suffix(path: &str, suffix: &str) -> String {
    let ext = extension(path);
    if ext.is_empty() {
        format!("{path}@{suffix}")
    } else {
        let stem = &path[..path.len() - ext.len() - 1];
        format!("{stem}@{suffix}.{ext}")
    }
}

/// Folder path as a key prefix: `"a/b"` and `"a/b/"` both become `"a/b/"`,
/// the root stays empty.
pub fn folder_prefix(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_suffix_and_extension() {
        assert_eq!(normalize("ui/button@tablet.png"), "ui/button");
        assert_eq!(normalize("ui/button.png"), "ui/button");
        assert_eq!(normalize("ui/button"), "ui/button");
        assert_eq!(normalize("sheet@hd.atlas"), "sheet");
        assert_eq!(normalize("levels.v2/map.json"), "levels.v2/map");
    }

    #[test]
    fn normalize_is_idempotent() {
        for p in [
            "a/b/c@hd.png",
            "a/b/c.png",
            "c",
            "x@y",
            "a.b.c",
            "dir.d/name@s.tar.gz",
            "",
        ] {
            let once = normalize(p);
            assert_eq!(normalize(&once), once, "path {p}");
        }
    }

    #[test]
    fn suffix_and_extension() {
        assert_eq!(suffix("ui/button@tablet.png"), "tablet");
        assert_eq!(suffix("ui/button.png"), "");
        assert_eq!(suffix("ui@hd/button.png"), "");
        assert_eq!(extension("ui/button@tablet.png"), "png");
        assert_eq!(extension("ui.v2/button"), "");
        assert_eq!(extension(".hidden"), "");
    }

    #[test]
    fn suffix_insertion_and_extension_swap() {
        assert_eq!(append_suffix("ui/button.png", "hd"), "ui/button@hd.png");
        assert_eq!(append_suffix("ui/button", "hd"), "ui/button@hd");
        assert_eq!(replace_extension("fonts/main@hd.png", "font"), "fonts/main@hd.font");
        assert_eq!(replace_extension("fonts/main", "font"), "fonts/main.font");
    }

    #[test]
    fn folder_prefix_adds_single_separator() {
        assert_eq!(folder_prefix("a/b"), "a/b/");
        assert_eq!(folder_prefix("a/b/"), "a/b/");
        assert_eq!(folder_prefix(""), "");
        assert_eq!(folder_prefix("/"), "");
    }
}
