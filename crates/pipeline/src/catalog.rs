//! Id lookup over a caller-supplied catalog snapshot.

use data_loader::MovieRecord;
use std::collections::HashMap;

/// Borrowing index from movie id to record.
///
/// When the snapshot repeats an id, the first record wins and later ones are
/// ignored everywhere the lookup is used.
#[derive(Debug, Clone)]
pub struct CatalogLookup<'a> {
    movies: Vec<&'a MovieRecord>,
    by_id: HashMap<&'a str, &'a MovieRecord>,
}

impl<'a> CatalogLookup<'a> {
    pub fn new(catalog: &'a [MovieRecord]) -> Self {
        let mut by_id = HashMap::with_capacity(catalog.len());
        let mut movies = Vec::with_capacity(catalog.len());
        for movie in catalog {
            if !by_id.contains_key(movie.id.as_str()) {
                by_id.insert(movie.id.as_str(), movie);
                movies.push(movie);
            }
        }
        Self { movies, by_id }
    }

    pub fn get(&self, id: &str) -> Option<&'a MovieRecord> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Unique records in snapshot order
    pub fn movies(&self) -> impl Iterator<Item = &'a MovieRecord> + Clone + '_ {
        self.movies.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_duplicate_wins() {
        let catalog = vec![
            MovieRecord::new("a", "First", ["Drama"]),
            MovieRecord::new("b", "Other", ["Comedy"]),
            MovieRecord::new("a", "Second", ["Horror"]),
        ];
        let lookup = CatalogLookup::new(&catalog);

        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get("a").map(|m| m.title.as_str()), Some("First"));
        assert!(lookup.contains("b"));
        assert!(!lookup.contains("c"));
        let ids: Vec<&str> = lookup.movies().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
