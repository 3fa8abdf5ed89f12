// src/utils/slug.rs

use std::future::Future;
use std::sync::LazyLock;

use regex::Regex;

/// Anything that is neither an ASCII lowercase letter, a digit, nor whitespace.
static STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]+").expect("slug strip pattern is valid"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("slug whitespace pattern is valid"));

/// Turns a title into a URL-safe candidate.
///
/// Lowercases, drops every character outside `[a-z0-9]` and whitespace,
/// joins the remaining words with single hyphens. May return an empty string.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = STRIP.replace_all(&lowered, "");
    let hyphenated = WHITESPACE.replace_all(stripped.trim(), "-");
    hyphenated.trim_matches('-').to_string()
}

/// `slugify`, falling back to `<prefix>-<unix millis>` for titles with no
/// usable characters.
pub fn base_slug(title: &str, fallback_prefix: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{}-{}", fallback_prefix, chrono::Utc::now().timestamp_millis())
    } else {
        slug
    }
}

/// Probes `base`, `base-1`, `base-2`, ... and returns the first candidate
/// that `taken` reports as free.
///
/// Not atomic: a concurrent writer can claim the returned slug before it is
/// stored. Callers rely on the store's unique index and retry on violation.
pub async fn resolve_unique<F, Fut, E>(base: &str, mut taken: F) -> Result<String, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let mut candidate = base.to_string();
    let mut counter: u64 = 1;
    while taken(candidate.clone()).await? {
        candidate = format!("{}-{}", base, counter);
        counter += 1;
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::convert::Infallible;

    fn is_clean(slug: &str) -> bool {
        slug.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !slug.starts_with('-')
            && !slug.ends_with('-')
    }

    #[test]
    fn slugify_basic_titles() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Rust   is  fun!  "), "rust-is-fun");
        assert_eq!(slugify("What's New in 2024?"), "whats-new-in-2024");
        assert_eq!(slugify("snake_case & co."), "snakecase-co");
        assert_eq!(slugify("Café au lait"), "caf-au-lait");
    }

    #[test]
    fn slugify_output_is_always_clean() {
        let titles = [
            "Hello World",
            "--leading and trailing--",
            " - - ",
            "Tabs\tand\nnewlines",
            "UPPER lower MiXeD",
            "emoji 🚀 launch",
            "a - b",
            "___",
            "x",
        ];
        for title in titles {
            let slug = slugify(title);
            assert!(is_clean(&slug), "{:?} -> {:?}", title, slug);
            assert!(!slug.contains("--"), "{:?} -> {:?}", title, slug);
        }
    }

    #[test]
    fn empty_titles_fall_back_to_placeholder() {
        for title in ["", "   ", "!!!", "日本語", "---"] {
            assert_eq!(slugify(title), "");
            let slug = base_slug(title, "post");
            assert!(slug.starts_with("post-"), "{:?} -> {:?}", title, slug);
            assert!(slug.len() > "post-".len());
            assert!(is_clean(&slug));
        }
    }

    #[tokio::test]
    async fn free_base_is_used_as_is() {
        let slug = resolve_unique("fresh", |_| async { Ok::<_, Infallible>(false) })
            .await
            .unwrap();
        assert_eq!(slug, "fresh");
    }

    #[tokio::test]
    async fn collisions_probe_numeric_suffixes_in_order() {
        let taken: HashSet<String> = ["hello-world", "hello-world-1"]
            .into_iter()
            .map(String::from)
            .collect();
        let mut probes = Vec::new();
        let slug = resolve_unique("hello-world", |candidate| {
            probes.push(candidate.clone());
            let hit = taken.contains(&candidate);
            async move { Ok::<_, Infallible>(hit) }
        })
        .await
        .unwrap();

        assert_eq!(slug, "hello-world-2");
        assert_eq!(probes, ["hello-world", "hello-world-1", "hello-world-2"]);
    }

    #[tokio::test]
    async fn first_gap_wins() {
        let taken: HashSet<String> = ["a", "a-1", "a-3"].into_iter().map(String::from).collect();
        let slug = resolve_unique("a", |candidate| {
            let hit = taken.contains(&candidate);
            async move { Ok::<_, Infallible>(hit) }
        })
        .await
        .unwrap();
        assert_eq!(slug, "a-2");
    }

    #[tokio::test]
    async fn lookup_errors_propagate() {
        let result = resolve_unique("a", |_| async { Err::<bool, &str>("store down") }).await;
        assert_eq!(result, Err("store down"));
    }
}
