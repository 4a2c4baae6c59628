use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::RecipeError;
use crate::record::{DishRecord, IngredientRecord};

/// Immutable dish and ingredient tables, validated at load.
///
/// Dish order is the file order; the dish matcher relies on it for ties.
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    dishes: Vec<DishRecord>,
    dish_index: HashMap<String, usize>,
    ingredients: BTreeMap<String, IngredientRecord>,
}

impl RecipeCatalog {
    /// `dishes_path` holds a JSON array of dishes, `ingredients_path` a JSON
    /// object keyed by ingredient id.
    pub fn load(dishes_path: &Path, ingredients_path: &Path) -> Result<Self, RecipeError> {
        let dishes: Vec<DishRecord> = read_json(dishes_path)?;
        let ingredients: BTreeMap<String, IngredientRecord> = read_json(ingredients_path)?;
        let catalog = Self::from_parts(dishes, ingredients)?;
        tracing::info!(
            dishes = catalog.dishes.len(),
            ingredients = catalog.ingredients.len(),
            "recipe catalog loaded"
        );
        Ok(catalog)
    }

    pub fn from_parts(
        dishes: Vec<DishRecord>,
        ingredients: BTreeMap<String, IngredientRecord>,
    ) -> Result<Self, RecipeError> {
        let mut table = BTreeMap::new();
        for (key, mut record) in ingredients {
            if record.id.is_empty() {
                record.id = key.clone();
            } else if record.id != key {
                return Err(RecipeError::InvalidRecord {
                    id: key,
                    reason: format!("record id {:?} differs from its key", record.id),
                });
            }
            record.validate()?;
            table.insert(key, record);
        }

        let mut dish_index = HashMap::with_capacity(dishes.len());
        for (pos, dish) in dishes.iter().enumerate() {
            dish.validate()?;
            if dish_index.insert(dish.id.clone(), pos).is_some() {
                return Err(RecipeError::InvalidRecord {
                    id: dish.id.clone(),
                    reason: "duplicate dish id".into(),
                });
            }
            for ingredient in dish.ingredients.keys() {
                if !table.contains_key(ingredient) && !dish.is_non_caloric(ingredient) {
                    tracing::warn!(dish = %dish.id, ingredient = %ingredient, "dish references unknown ingredient");
                }
            }
        }

        Ok(Self {
            dishes,
            dish_index,
            ingredients: table,
        })
    }

    pub fn dishes(&self) -> &[DishRecord] {
        &self.dishes
    }

    pub fn dish(&self, id: &str) -> Option<&DishRecord> {
        self.dish_index.get(id).and_then(|&pos| self.dishes.get(pos))
    }

    pub fn ingredient(&self, id: &str) -> Option<&IngredientRecord> {
        self.ingredients.get(id)
    }

    pub fn ingredients(&self) -> &BTreeMap<String, IngredientRecord> {
        &self.ingredients
    }

    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, RecipeError> {
    let bytes = std::fs::read(path).map_err(|e| RecipeError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|e| RecipeError::InvalidData(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const INGREDIENTS: &str = r#"{
        "rice":    { "unit": "per 100g", "calories": [110, 130] },
        "chicken": { "unit": "per 100g", "calories": [165, 239] }
    }"#;

    const DISHES: &str = r#"[
        { "id": "com ga", "aliases": ["chicken rice"],
          "ingredients": { "rice": [150, 250], "chicken": [80, 150] } },
        { "id": "chao", "ingredients": { "rice": [50, 80], "water": [300, 400] },
          "non_caloric": ["water"] }
    ]"#;

    fn write_tmp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_and_indexes_catalog() {
        let dishes = write_tmp(DISHES);
        let ingredients = write_tmp(INGREDIENTS);
        let catalog = RecipeCatalog::load(dishes.path(), ingredients.path()).unwrap();

        assert_eq!(catalog.dishes().len(), 2);
        assert_eq!(catalog.dishes()[0].id, "com ga");
        assert_eq!(catalog.dish("chao").unwrap().ingredients.len(), 2);
        assert!(catalog.dish("bun cha").is_none());
        assert_eq!(catalog.ingredient("rice").unwrap().id, "rice");
        assert_eq!(catalog.ingredient("rice").unwrap().effective_unit_size(), 100.0);
        assert!(catalog.ingredient("water").is_none());
    }

    #[test]
    fn duplicate_dish_ids_rejected() {
        let dishes: Vec<DishRecord> = serde_json::from_str(
            r#"[{"id": "a", "ingredients": {"rice": [1, 2]}},
                {"id": "a", "ingredients": {"rice": [1, 2]}}]"#,
        )
        .unwrap();
        let err = RecipeCatalog::from_parts(dishes, BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn mismatched_ingredient_id_rejected() {
        let ingredients: BTreeMap<String, IngredientRecord> = serde_json::from_str(
            r#"{"rice": {"id": "noodles", "unit": "per 100g", "calories": [1, 2]}}"#,
        )
        .unwrap();
        assert!(RecipeCatalog::from_parts(Vec::new(), ingredients).is_err());
    }

    #[test]
    fn zero_unit_size_rejected() {
        let ingredients: BTreeMap<String, IngredientRecord> = serde_json::from_str(
            r#"{"salt": {"unit": "per 0g", "calories": [0, 0]}}"#,
        )
        .unwrap();
        assert!(matches!(
            RecipeCatalog::from_parts(Vec::new(), ingredients),
            Err(RecipeError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn missing_files_and_bad_json_are_errors() {
        let bad = write_tmp("{ not json");
        let good = write_tmp(INGREDIENTS);
        assert!(matches!(
            RecipeCatalog::load(Path::new("/no/such/dishes.json"), good.path()),
            Err(RecipeError::Io { .. })
        ));
        assert!(matches!(
            RecipeCatalog::load(bad.path(), good.path()),
            Err(RecipeError::InvalidData(_))
        ));
    }
}
