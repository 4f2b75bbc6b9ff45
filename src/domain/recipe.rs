//! Crafting recipes: static reference data consumed by the crafting engine.
//!
//! Recipes are depth-1 only — ingredients are always raw bazaar items,
//! never other crafted results.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use super::id::ItemId;
use crate::error::{Error, Result};

/// A single craft: a set of ingredient quantities producing `result_count`
/// units of `result`.
#[derive(Debug, Clone, Deserialize)]
pub struct Recipe {
    pub result: ItemId,
    pub result_count: u32,
    pub ingredients: HashMap<ItemId, u32>,
}

/// Lookup table from result item to its recipe.
#[derive(Debug, Clone, Default)]
pub struct RecipeBook {
    recipes: HashMap<ItemId, Recipe>,
}

impl RecipeBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load recipes from a JSON array file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(Error::RecipeFile)?;
        let recipes: Vec<Recipe> = serde_json::from_str(&content)?;
        let mut book = Self::new();
        for recipe in recipes {
            book.insert(recipe);
        }
        Ok(book)
    }

    /// Register a recipe, replacing any previous recipe for the same result.
    pub fn insert(&mut self, recipe: Recipe) {
        self.recipes.insert(recipe.result.clone(), recipe);
    }

    #[must_use]
    pub fn get(&self, result: &ItemId) -> Option<&Recipe> {
        self.recipes.get(result)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    /// Every item id referenced by any recipe, ingredients and results both.
    ///
    /// The crafting bulk scan prices this set in one batch.
    #[must_use]
    pub fn referenced_items(&self) -> HashSet<ItemId> {
        let mut items = HashSet::new();
        for recipe in self.recipes.values() {
            items.insert(recipe.result.clone());
            items.extend(recipe.ingredients.keys().cloned());
        }
        items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referenced_items_covers_ingredients_and_results() {
        let mut book = RecipeBook::new();
        book.insert(Recipe {
            result: ItemId::from("ENCHANTED_IRON"),
            result_count: 1,
            ingredients: HashMap::from([(ItemId::from("IRON_INGOT"), 160)]),
        });

        let items = book.referenced_items();
        assert!(items.contains(&ItemId::from("ENCHANTED_IRON")));
        assert!(items.contains(&ItemId::from("IRON_INGOT")));
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn insert_replaces_existing_recipe() {
        let mut book = RecipeBook::new();
        for count in [1, 2] {
            book.insert(Recipe {
                result: ItemId::from("X"),
                result_count: count,
                ingredients: HashMap::new(),
            });
        }
        assert_eq!(book.len(), 1);
        assert_eq!(book.get(&ItemId::from("X")).unwrap().result_count, 2);
    }
}
