//! Persistent deck storage
//!
//! Decks live in a single JSON file mapping deck name to item list.
//! Six built-in decks seed the file on first use; they can be
//! overwritten but never deleted. A missing or unreadable file falls
//! back to the built-ins so the game always has something to play.

use anyhow::Context;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Built-in decks shipped with the game
pub fn default_decks() -> HashMap<String, Vec<String>> {
    fn deck(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    let mut decks = HashMap::new();
    decks.insert(
        "animals".to_string(),
        deck(&[
            "Lion", "Elephant", "Giraffe", "Penguin", "Kangaroo", "Dolphin", "Tiger", "Panda",
            "Koala", "Zebra",
        ]),
    );
    decks.insert(
        "countries".to_string(),
        deck(&[
            "United States",
            "China",
            "France",
            "Brazil",
            "Japan",
            "Italy",
            "Australia",
            "India",
            "Canada",
            "Mexico",
        ]),
    );
    decks.insert(
        "historical figures".to_string(),
        deck(&[
            "Albert Einstein",
            "Leonardo da Vinci",
            "Marie Curie",
            "Martin Luther King Jr.",
            "Gandhi",
            "Nelson Mandela",
            "William Shakespeare",
            "Cleopatra",
            "Mozart",
            "Isaac Newton",
        ]),
    );
    decks.insert(
        "cars".to_string(),
        deck(&[
            "Ferrari",
            "Lamborghini",
            "Tesla",
            "Porsche",
            "BMW",
            "Mercedes-Benz",
            "Toyota",
            "Honda",
            "Ford Mustang",
            "Audi",
        ]),
    );
    decks.insert(
        "celebrities".to_string(),
        deck(&[
            "Tom Hanks",
            "Jennifer Lawrence",
            "Brad Pitt",
            "Meryl Streep",
            "Leonardo DiCaprio",
            "Beyoncé",
            "Morgan Freeman",
            "Julia Roberts",
            "Will Smith",
            "Emma Stone",
        ]),
    );
    decks.insert(
        "movies".to_string(),
        deck(&[
            "The Godfather",
            "Star Wars",
            "Titanic",
            "Avatar",
            "Jurassic Park",
            "The Matrix",
            "Forrest Gump",
            "The Lion King",
            "Harry Potter",
            "Inception",
        ]),
    );
    decks
}

/// Deck persistence over a single JSON file
pub struct DeckStore {
    file_path: String,
}

impl DeckStore {
    pub fn new(file_path: &str) -> Self {
        Self { file_path: file_path.to_string() }
    }

    /// Seed the file with the built-in decks if it does not exist yet
    pub fn init_defaults(&self) -> anyhow::Result<()> {
        if Path::new(&self.file_path).exists() {
            return Ok(());
        }
        self.write_all(&default_decks())?;
        info!(file = %self.file_path, "deck_store_seeded");
        Ok(())
    }

    /// Load every deck. Falls back to the built-ins when the file is
    /// missing or unreadable; the game must always have decks.
    pub fn load(&self) -> HashMap<String, Vec<String>> {
        match self.read_all() {
            Ok(decks) if !decks.is_empty() => decks,
            Ok(_) => {
                warn!(file = %self.file_path, "deck_store_empty_using_defaults");
                default_decks()
            }
            Err(e) => {
                warn!(file = %self.file_path, error = %e, "deck_store_load_failed_using_defaults");
                default_decks()
            }
        }
    }

    /// Fetch one deck by name (case-insensitive)
    pub fn deck(&self, name: &str) -> Option<Vec<String>> {
        self.load().remove(&name.to_lowercase())
    }

    /// Save a deck under a lower-cased key, overwriting any existing one
    pub fn save_deck(&self, name: &str, items: &[String]) -> anyhow::Result<()> {
        let mut decks = self.load();
        decks.insert(name.to_lowercase(), items.to_vec());
        self.write_all(&decks)?;
        info!(deck = %name.to_lowercase(), items = %items.len(), "deck_saved");
        Ok(())
    }

    /// Delete a custom deck. Built-in decks are refused (returns false).
    pub fn delete_deck(&self, name: &str) -> anyhow::Result<bool> {
        let key = name.to_lowercase();
        if default_decks().contains_key(&key) {
            warn!(deck = %key, "deck_delete_refused_builtin");
            return Ok(false);
        }

        let mut decks = self.load();
        let removed = decks.remove(&key).is_some();
        if removed {
            self.write_all(&decks)?;
            info!(deck = %key, "deck_deleted");
        }
        Ok(removed)
    }

    fn read_all(&self) -> anyhow::Result<HashMap<String, Vec<String>>> {
        let content = std::fs::read_to_string(&self.file_path)
            .with_context(|| format!("Failed to read deck file {}", self.file_path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse deck file {}", self.file_path))
    }

    fn write_all(&self, decks: &HashMap<String, Vec<String>>) -> anyhow::Result<()> {
        let path = Path::new(&self.file_path);
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create deck dir for {}", self.file_path))?;
            }
        }
        let json = serde_json::to_string_pretty(decks)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write deck file {}", self.file_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> DeckStore {
        DeckStore::new(dir.path().join("decks.json").to_str().unwrap())
    }

    #[test]
    fn test_init_defaults_seeds_once() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        store.init_defaults().unwrap();
        let decks = store.load();
        assert_eq!(decks.len(), 6);
        assert!(decks.contains_key("animals"));

        // A second init must not clobber custom decks
        store.save_deck("My Party", &["One".to_string()]).unwrap();
        store.init_defaults().unwrap();
        assert!(store.deck("my party").is_some());
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        let decks = store.load();
        assert_eq!(decks.len(), 6);
        assert_eq!(decks["animals"].len(), 10);
    }

    #[test]
    fn test_load_corrupt_file_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("decks.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = DeckStore::new(path.to_str().unwrap());
        let decks = store.load();
        assert!(decks.contains_key("movies"));
    }

    #[test]
    fn test_save_deck_lowercases_key() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        store.save_deck("Board Games", &["Chess".to_string(), "Go".to_string()]).unwrap();

        let deck = store.deck("board games").unwrap();
        assert_eq!(deck, vec!["Chess".to_string(), "Go".to_string()]);
        // Lookup is case-insensitive too
        assert!(store.deck("BOARD GAMES").is_some());
    }

    #[test]
    fn test_save_deck_overwrites() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        store.save_deck("animals", &["Axolotl".to_string()]).unwrap();
        assert_eq!(store.deck("animals").unwrap(), vec!["Axolotl".to_string()]);
    }

    #[test]
    fn test_delete_custom_deck() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        store.save_deck("custom", &["X".to_string()]).unwrap();
        assert!(store.delete_deck("custom").unwrap());
        assert!(store.deck("custom").is_none());

        // Deleting again reports nothing removed
        assert!(!store.delete_deck("custom").unwrap());
    }

    #[test]
    fn test_delete_builtin_refused() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.init_defaults().unwrap();

        assert!(!store.delete_deck("animals").unwrap());
        assert!(!store.delete_deck("Animals").unwrap());
        assert!(store.deck("animals").is_some());
    }
}
