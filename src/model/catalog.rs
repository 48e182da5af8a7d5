use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// (discipline id, display name, [(category id, display name, platform filter)])
const BUILTIN_DISCIPLINES: &[(&str, &str, &[(&str, &str, &str)])] = &[
    (
        "architecture",
        "Architecture",
        &[
            ("walls", "Walls", "'property.name.category'=='Walls'"),
            ("doors", "Doors", "'property.name.category'=='Doors'"),
            ("windows", "Windows", "'property.name.category'=='Windows'"),
            ("floors", "Floors", "'property.name.category'=='Floors'"),
            ("roofs", "Roofs", "'property.name.category'=='Roofs'"),
            ("ceilings", "Ceilings", "'property.name.category'=='Ceilings'"),
            ("stairs", "Stairs", "'property.name.category'=='Stairs'"),
            ("railings", "Railings", "'property.name.category'=='Railings'"),
            ("curtain-panels", "Curtain Panels", "'property.name.category'=='Curtain Panels'"),
            ("furniture", "Furniture", "'property.name.category'=='Furniture'"),
        ],
    ),
    (
        "structural",
        "Structural",
        &[
            ("structural-columns", "Structural Columns", "'property.name.category'=='Structural Columns'"),
            ("structural-framing", "Structural Framing", "'property.name.category'=='Structural Framing'"),
            ("structural-foundations", "Structural Foundations", "'property.name.category'=='Structural Foundations'"),
            ("structural-connections", "Structural Connections", "'property.name.category'=='Structural Connections'"),
        ],
    ),
    (
        "mechanical",
        "Mechanical",
        &[
            ("mechanical-equipment", "Mechanical Equipment", "'property.name.category'=='Mechanical Equipment'"),
            ("ducts", "Ducts", "'property.name.category'=='Ducts'"),
            ("duct-fittings", "Duct Fittings", "'property.name.category'=='Duct Fittings'"),
            ("air-terminals", "Air Terminals", "'property.name.category'=='Air Terminals'"),
        ],
    ),
    (
        "electrical",
        "Electrical",
        &[
            ("electrical-equipment", "Electrical Equipment", "'property.name.category'=='Electrical Equipment'"),
            ("electrical-fixtures", "Electrical Fixtures", "'property.name.category'=='Electrical Fixtures'"),
            ("lighting-fixtures", "Lighting Fixtures", "'property.name.category'=='Lighting Fixtures'"),
            ("cable-trays", "Cable Trays", "'property.name.category'=='Cable Trays'"),
            ("conduits", "Conduits", "'property.name.category'=='Conduits'"),
        ],
    ),
    (
        "plumbing",
        "Plumbing",
        &[
            ("plumbing-fixtures", "Plumbing Fixtures", "'property.name.category'=='Plumbing Fixtures'"),
            ("pipes", "Pipes", "'property.name.category'=='Pipes'"),
            ("pipe-fittings", "Pipe Fittings", "'property.name.category'=='Pipe Fittings'"),
            ("pipe-accessories", "Pipe Accessories", "'property.name.category'=='Pipe Accessories'"),
        ],
    ),
];

/// One category of a discipline and the platform filter that selects it.
///
/// The filter is opaque configuration; different categories may need
/// different filter syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryQuery {
    pub id: String,
    pub display_name: String,
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discipline {
    pub id: String,
    pub name: String,
    pub categories: Vec<CategoryQuery>,
}

/// Static discipline → category table, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    disciplines: Vec<Discipline>,
}

impl Catalog {
    #[must_use]
    pub fn builtin() -> Self {
        let disciplines = BUILTIN_DISCIPLINES
            .iter()
            .map(|(id, name, categories)| Discipline {
                id: (*id).to_string(),
                name: (*name).to_string(),
                categories: categories
                    .iter()
                    .map(|(id, display_name, filter)| CategoryQuery {
                        id: (*id).to_string(),
                        display_name: (*display_name).to_string(),
                        filter: (*filter).to_string(),
                    })
                    .collect(),
            })
            .collect();
        Self { disciplines }
    }

    /// Builds a catalog from configuration, rejecting inconsistent tables.
    pub fn from_disciplines(disciplines: Vec<Discipline>) -> Result<Self, ConfigError> {
        let mut discipline_ids = HashSet::new();
        for discipline in &disciplines {
            if !discipline_ids.insert(discipline.id.as_str()) {
                return Err(ConfigError::InvalidCatalog {
                    message: format!("duplicate discipline '{}'", discipline.id),
                });
            }
            if discipline.categories.is_empty() {
                return Err(ConfigError::InvalidCatalog {
                    message: format!("discipline '{}' has no categories", discipline.id),
                });
            }
            let mut category_ids = HashSet::new();
            for category in &discipline.categories {
                if !category_ids.insert(category.id.as_str()) {
                    return Err(ConfigError::InvalidCatalog {
                        message: format!(
                            "duplicate category '{}' in discipline '{}'",
                            category.id, discipline.id
                        ),
                    });
                }
            }
        }
        Ok(Self { disciplines })
    }

    #[must_use]
    pub fn discipline(&self, id: &str) -> Option<&Discipline> {
        self.disciplines.iter().find(|d| d.id == id)
    }

    #[must_use]
    pub fn disciplines(&self) -> &[Discipline] {
        &self.disciplines
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let builtin = Catalog::builtin();
        let rebuilt = Catalog::from_disciplines(builtin.disciplines().to_vec()).unwrap();
        assert_eq!(rebuilt, builtin);
    }

    #[test]
    fn architecture_keeps_declaration_order() {
        let catalog = Catalog::builtin();
        let architecture = catalog.discipline("architecture").unwrap();
        let names: Vec<&str> = architecture
            .categories
            .iter()
            .take(3)
            .map(|c| c.display_name.as_str())
            .collect();
        assert_eq!(names, ["Walls", "Doors", "Windows"]);
    }

    #[test]
    fn rejects_empty_discipline() {
        let result = Catalog::from_disciplines(vec![Discipline {
            id: "landscape".into(),
            name: "Landscape".into(),
            categories: Vec::new(),
        }]);
        assert!(matches!(result, Err(ConfigError::InvalidCatalog { .. })));
    }

    #[test]
    fn rejects_duplicate_disciplines() {
        let architecture = Catalog::builtin()
            .discipline("architecture")
            .cloned()
            .unwrap();
        let result = Catalog::from_disciplines(vec![architecture.clone(), architecture]);
        match result {
            Err(ConfigError::InvalidCatalog { message }) => {
                assert_eq!(message, "duplicate discipline 'architecture'");
            }
            other => panic!("expected a duplicate discipline error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_categories() {
        let walls = CategoryQuery {
            id: "walls".into(),
            display_name: "Walls".into(),
            filter: "Walls".into(),
        };
        let result = Catalog::from_disciplines(vec![Discipline {
            id: "architecture".into(),
            name: "Architecture".into(),
            categories: vec![walls.clone(), walls],
        }]);
        assert!(matches!(result, Err(ConfigError::InvalidCatalog { .. })));
    }
}
