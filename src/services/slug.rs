use slug::slugify;

pub const SLUG_MAX_LENGTH: usize = 200;

pub fn generate_slug(source: &str) -> String {
    let mut slug = slugify(source);
    if slug.len() > SLUG_MAX_LENGTH {
        slug.truncate(SLUG_MAX_LENGTH);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

pub fn validate_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.len() > SLUG_MAX_LENGTH {
        return false;
    }
    slug.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Uses the explicit slug when one was sent, otherwise derives it from `source`.
pub fn slug_or_derive(explicit: Option<&str>, source: &str) -> String {
    match explicit.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => generate_slug(source),
    }
}
