use std::path::{Path, PathBuf};

/// Replace a trailing `suffix` (ASCII case-insensitive) with `replacement`.
/// Without the suffix, `replacement` is simply appended.
pub fn replace_suffix(path: &Path, suffix: &str, replacement: &str) -> PathBuf {
    let text = path.to_string_lossy();
    let cut = text
        .len()
        .checked_sub(suffix.len())
        .filter(|&at| text.is_char_boundary(at) && text[at..].eq_ignore_ascii_case(suffix))
        .unwrap_or(text.len());
    PathBuf::from(format!("{}{}", &text[..cut], replacement))
}

/// Declares the automatic derivation, and optionally the batch item mapper,
/// for an output path obtained by swapping the suffix of the input path.
macro_rules! suffix_mapping {
    ($automatic:ident, $source:literal, $suffix:literal => $replacement:literal) => {
        fn $automatic(
            args: &kiln_core::Arguments,
        ) -> ::std::result::Result<kiln_core::Value, kiln_core::AccessError> {
            Ok(kiln_core::Value::Path($crate::path::replace_suffix(
                args.path($source)?,
                $suffix,
                $replacement,
            )))
        }
    };
    ($automatic:ident, $item:ident, $source:literal, $suffix:literal => $replacement:literal) => {
        $crate::path::suffix_mapping!($automatic, $source, $suffix => $replacement);

        fn $item(
            _: &kiln_core::Arguments,
            item: &::std::path::Path,
        ) -> ::std::result::Result<kiln_core::Value, kiln_core::AccessError> {
            Ok(kiln_core::Value::Path($crate::path::replace_suffix(
                item,
                $suffix,
                $replacement,
            )))
        }
    };
}

pub(crate) use suffix_mapping;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_matching_suffix() {
        assert_eq!(
            replace_suffix(Path::new("x.pak.bundle"), ".pak.bundle", ".pak"),
            PathBuf::from("x.pak")
        );
        assert_eq!(
            replace_suffix(Path::new("dir/X.PAK"), ".pak", ".pak.bundle"),
            PathBuf::from("dir/X.pak.bundle")
        );
    }

    #[test]
    fn appends_when_suffix_is_absent() {
        assert_eq!(
            replace_suffix(Path::new("resources"), "", ".pak"),
            PathBuf::from("resources.pak")
        );
        assert_eq!(
            replace_suffix(Path::new("a.txt"), ".png", ".tex"),
            PathBuf::from("a.txt.tex")
        );
    }
}
