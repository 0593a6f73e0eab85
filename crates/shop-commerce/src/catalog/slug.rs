//! URL slug derivation.

/// Lowercase ASCII alphanumerics, with every run of other characters
/// collapsed to a single `-` and no leading or trailing dash.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_matches('-').to_string()
}

/// Slugs to try for `name`, in order: the plain slug, then `-2`, `-3`, ...
///
/// A name with no usable characters slugs to `item`.
pub fn slug_candidates(name: &str) -> impl Iterator<Item = String> {
    let mut base = slugify(name);
    if base.is_empty() {
        base = "item".to_string();
    }
    let suffixed = base.clone();
    std::iter::once(base).chain((2u64..).map(move |n| format!("{}-{}", suffixed, n)))
}

/// Check that `slug` is already in slug form.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}
