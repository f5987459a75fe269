//! Turns arbitrary text into an ASCII slug suitable for output file names and
//! URL path segments.

/// The characters on which text is split into words before transliteration.
const SEPARATORS: &[char] = &[
    '\t', ' ', '!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '-', '/', '<',
    '=', '>', '?', '@', '[', '\\', ']', '^', '_', '`', '{', '|', '}', ',', '.',
];

/// The delimiter used by [`slugify`].
pub const DEFAULT_DELIMITER: char = '-';

/// Slugifies `text` using [`DEFAULT_DELIMITER`], e.g. `"Hello, World!"`
/// becomes `"hello-world"`.
pub fn slugify(text: &str) -> String {
    slugify_with(text, DEFAULT_DELIMITER)
}

/// Slugifies `text`, joining the surviving words with `delimiter`. The text is
/// lower-cased and split on [`SEPARATORS`]; each piece is transliterated to
/// ASCII (`é` becomes `e`) and anything that still isn't alphanumeric splits
/// it further. Empty words are dropped.
///
/// The output only ever contains ASCII alphanumerics and `delimiter`, so it is
/// safe as a path segment. Slugifying a slug is a no-op as long as
/// `delimiter` isn't alphanumeric.
pub fn slugify_with(text: &str, delimiter: char) -> String {
    let mut words: Vec<String> = Vec::new();
    for token in text.to_lowercase().split(SEPARATORS) {
        // `slug::slugify` handles the transliteration and replaces leftover
        // symbols with dashes, which we split back out into words.
        words.extend(
            slug::slugify(token)
                .split('-')
                .filter(|word| !word.is_empty())
                .map(str::to_owned),
        );
    }
    words.join(&delimiter.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_punctuation() {
        assert_eq!("hello-world", slugify("Hello, World!"));
    }

    #[test]
    fn test_collapses_runs_of_separators() {
        assert_eq!("a-b-c", slugify("  a -- b\t(c) "));
    }

    #[test]
    fn test_transliterates() {
        assert_eq!("creme-brulee-a-la-francaise", slugify("Crème Brûlée à la Française"));
    }

    #[test]
    fn test_custom_delimiter() {
        assert_eq!("my_first_post", slugify_with("My First Post", '_'));
    }

    #[test]
    fn test_never_emits_path_separators() {
        let slug = slugify("C://test/test/anime. Site.md");
        assert_eq!("c-test-test-anime-site-md", slug);
        assert!(!slug.contains('/'));
        assert!(!slug.contains('\\'));
    }

    #[test]
    fn test_empty() {
        assert_eq!("", slugify(""));
        assert_eq!("", slugify("?!..."));
    }

    #[test]
    fn test_idempotent() {
        for input in &[
            "Hello, World!",
            "Crème Brûlée",
            "2020-01-02 release notes: v1.2",
            "snake_case and kebab-case",
            "¿Qué tal?",
        ] {
            let once = slugify(input);
            assert_eq!(once, slugify(&once), "input: {:?}", input);
            let once = slugify_with(input, '_');
            assert_eq!(once, slugify_with(&once, '_'), "input: {:?}", input);
        }
    }
}
