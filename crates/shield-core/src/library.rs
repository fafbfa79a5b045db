//! Recipe-directory and landscape-file loading (spec §6 `recipeDirectory`/
//! `landscapeFile`), grounded in `original_source/cybertop/parsing.py::Parser::getLandscape`'s
//! file-existence check and the recipe-set-per-file layout spec.md implies.

use std::path::Path;

use shield_policy::{Landscape, Recipe, RecipeSet};

use crate::error::Result;

/// Loads every `*.xml` file in `directory` as a `<recipe-set>` and flattens
/// their `<recipe>` children into one list, in directory-listing order
/// (declaration order drives the tie-break in recipe selection, spec §4.2
/// step 6).
pub fn load_recipe_directory(directory: &Path) -> Result<Vec<Recipe>> {
    let mut entries: Vec<_> = std::fs::read_dir(directory)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("xml"))
        .collect();
    entries.sort();

    let mut recipes = Vec::new();
    for path in entries {
        let xml = std::fs::read_to_string(&path)?;
        let set = RecipeSet::from_xml_str(&xml)?;
        recipes.extend(set.recipes);
    }
    Ok(recipes)
}

pub fn load_landscape(path: &Path) -> Result<Landscape> {
    let xml = std::fs::read_to_string(path)?;
    Ok(Landscape::from_xml_str(&xml)?)
}
