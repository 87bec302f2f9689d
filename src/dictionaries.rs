//! In-memory word lists used by the word generator.

use std::collections::HashMap;

const BUNDLED: &[(&str, &str)] = &[
    ("animals", include_str!("../dictionaries/animals.txt")),
    ("words", include_str!("../dictionaries/words.txt")),
    ("cities", include_str!("../dictionaries/cities.txt")),
    ("countries", include_str!("../dictionaries/countries.txt")),
    ("fruits", include_str!("../dictionaries/fruits.txt")),
    ("vegetables", include_str!("../dictionaries/vegetables.txt")),
    ("lorem-ipsum", include_str!("../dictionaries/lorem-ipsum.txt")),
    ("nouns", include_str!("../dictionaries/nouns.txt")),
];

/// Read-only table of word lists keyed by category name.
#[derive(Debug, Clone, Default)]
pub struct Dictionaries {
    lists: HashMap<String, Vec<String>>,
    categories: Vec<String>,
}

impl Dictionaries {
    /// Build the store from the word lists compiled into the binary.
    pub fn bundled() -> Self {
        Self::from_lists(
            BUNDLED
                .iter()
                .map(|(name, raw)| (name.to_string(), raw.lines().map(str::to_string).collect())),
        )
    }

    /// Build a store from arbitrary lists. Blank entries are dropped and
    /// categories left empty are skipped, so every lookup that succeeds
    /// returns at least one word.
    pub fn from_lists<I>(lists: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut store = Self::default();

        for (name, words) in lists {
            let words: Vec<String> = words
                .into_iter()
                .map(|word| word.trim().to_string())
                .filter(|word| !word.is_empty())
                .collect();

            if words.is_empty() {
                tracing::warn!(category = %name, "Skipping empty dictionary");
                continue;
            }

            if store.lists.insert(name.clone(), words).is_none() {
                store.categories.push(name);
            }
        }

        store
    }

    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.lists.get(category).map(Vec::as_slice)
    }

    /// Category names in the order they were loaded.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_categories() {
        let dictionaries = Dictionaries::bundled();
        assert_eq!(
            dictionaries.categories(),
            &[
                "animals",
                "words",
                "cities",
                "countries",
                "fruits",
                "vegetables",
                "lorem-ipsum",
                "nouns"
            ]
        );

        for category in dictionaries.categories() {
            let words = dictionaries.get(category).unwrap();
            assert!(!words.is_empty());
            assert!(words.iter().all(|word| !word.trim().is_empty()));
        }
    }

    #[test]
    fn test_unknown_category() {
        let dictionaries = Dictionaries::bundled();
        assert!(dictionaries.get("spaceships").is_none());
    }

    #[test]
    fn test_from_lists_drops_blank_entries() {
        let dictionaries = Dictionaries::from_lists(vec![
            (
                "colors".to_string(),
                vec!["red".to_string(), "".to_string(), "  ".to_string(), "blue".to_string()],
            ),
            ("empty".to_string(), vec!["".to_string()]),
        ]);

        assert_eq!(dictionaries.len(), 1);
        assert_eq!(dictionaries.get("colors").unwrap(), &["red", "blue"]);
        assert!(dictionaries.get("empty").is_none());
    }
}
