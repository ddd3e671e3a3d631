//! # Utility Functions Module
//!
//! Helpers to build argument lists for external tools.

/// Converts any iterable of string-like items to `Vec<String>`.
///
/// # Example
/// ```rust
/// use space_bundle_optimizer::utils::to_string_vec;
///
/// let bitrate = "96k";
/// let args = to_string_vec(["-c:a", "libvorbis", "-b:a", bitrate]);
/// assert_eq!(args[3], "96k");
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// Argument vector from heterogeneous values.
///
/// ```rust
/// use space_bundle_optimizer::args;
///
/// let codec = "libvorbis";
/// let args = args!["-c:a", codec, "-b:a", "64k"];
/// assert_eq!(args, vec!["-c:a", "libvorbis", "-b:a", "64k"]);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        $crate::utils::to_string_vec([$($item.to_string()),*])
    };
}
