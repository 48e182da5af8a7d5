use super::scorer::ComplianceScorer;
use crate::config::RequiredParameters;
use crate::error::RemoteFetchError;
use crate::model::{CategoryQuery, CategorySummary, ElementRow, PropertyEntry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// Canonical property name -> normalized spellings seen on the platform
const PROPERTY_ALIASES: &[(&str, &[&str])] = &[
    ("Category", &["category", "revitcategory", "categoryname"]),
    ("Family Name", &["familyname", "family", "revitfamilyname"]),
    ("Type Mark", &["typemark", "typemarkvalue"]),
    ("Assembly Code", &["assemblycode", "uniformatcode"]),
    ("Assembly Description", &["assemblydescription", "uniformatdescription"]),
    ("Manufacturer", &["manufacturer", "mfr", "manufacturername"]),
    ("Model", &["model", "modelnumber"]),
    ("ElementId", &["elementid", "revitelementid", "revitid"]),
    ("External Id", &["externalid", "externalelementid", "uniqueid"]),
];

/// Element as returned by the platform's category query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawElement {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub revit_element_id: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyEntry>,
}

/// Remote model/category query collaborator.
#[async_trait]
pub trait ElementQueryService: Send + Sync {
    /// Fetch the raw elements matched by `filter` in one model.
    ///
    /// An empty list is a valid, empty dataset.
    async fn query(
        &self,
        project_id: &str,
        model_id: &str,
        filter: &str,
    ) -> Result<Vec<RawElement>, RemoteFetchError>;
}

/// Rows and summary of one analyzed category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAnalysis {
    pub rows: Vec<ElementRow>,
    pub summary: CategorySummary,
}

/// Fetches one category and scores every element in it.
#[derive(Clone)]
pub struct CategoryAnalyzer {
    query: Arc<dyn ElementQueryService>,
    scorer: ComplianceScorer,
    required: RequiredParameters,
}

impl CategoryAnalyzer {
    #[must_use]
    pub fn new(
        query: Arc<dyn ElementQueryService>,
        scorer: ComplianceScorer,
        required: RequiredParameters,
    ) -> Self {
        Self {
            query,
            scorer,
            required,
        }
    }

    pub async fn analyze(
        &self,
        project_id: &str,
        model_id: &str,
        category: &CategoryQuery,
    ) -> Result<CategoryAnalysis, RemoteFetchError> {
        let raw = self
            .query
            .query(project_id, model_id, &category.filter)
            .await?;

        let required = self.required.for_category(&category.id);
        let rows = raw
            .into_iter()
            .map(|element| self.normalize(element, category, required))
            .collect::<Result<Vec<_>, _>>()?;
        let summary = CategorySummary::from_rows(&rows);

        tracing::debug!(
            category = %category.display_name,
            elements = summary.total_elements,
            average_pct = summary.average_compliance_pct,
            "category analyzed"
        );

        Ok(CategoryAnalysis { rows, summary })
    }

    fn normalize(
        &self,
        element: RawElement,
        category: &CategoryQuery,
        required: &[String],
    ) -> Result<ElementRow, RemoteFetchError> {
        let element_id = element.id.trim().to_string();
        if element_id.is_empty() {
            return Err(RemoteFetchError::Malformed {
                filter: category.filter.clone(),
                message: "element without id".to_string(),
            });
        }

        let properties: Vec<PropertyEntry> = element
            .properties
            .into_iter()
            .map(|p| PropertyEntry {
                name: canonical_name(&p.name),
                value: p.value,
            })
            .collect();
        let compliance = self.scorer.score(&properties, required);
        let field = |name: &str| first_filled(&properties, name).unwrap_or_default();

        Ok(ElementRow {
            element_id,
            external_element_id: non_blank(element.external_id)
                .or_else(|| first_filled(&properties, "External Id")),
            revit_element_id: non_blank(element.revit_element_id)
                .or_else(|| first_filled(&properties, "ElementId")),
            viewer_db_id: None,
            category: category.display_name.clone(),
            family_name: field("Family Name"),
            type_mark: field("Type Mark"),
            assembly_code: field("Assembly Code"),
            assembly_description: field("Assembly Description"),
            manufacturer: field("Manufacturer"),
            model: field("Model"),
            compliance,
        })
    }
}

/// Maps a platform property name onto its canonical spelling.
///
/// Group prefixes ("Identity Data.Manufacturer"), case, spaces and
/// underscores are ignored. Unknown names are returned unchanged.
#[must_use]
pub fn canonical_name(name: &str) -> String {
    let key = spelling_key(name);
    PROPERTY_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&key.as_str()))
        .map_or_else(|| name.to_string(), |(canonical, _)| (*canonical).to_string())
}

/// Comparison key for a property name: aliases collapse onto their
/// canonical name and unknown names compare case, space and underscore
/// insensitively.
pub(crate) fn property_key(name: &str) -> String {
    spelling_key(&canonical_name(name))
}

fn spelling_key(name: &str) -> String {
    let leaf = name.rsplit(['.', '/']).next().unwrap_or(name);
    leaf.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn first_filled(properties: &[PropertyEntry], name: &str) -> Option<String> {
    properties
        .iter()
        .find(|p| p.name == name && p.is_filled())
        .map(PropertyEntry::display_value)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Compliance;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::collections::HashMap;

    /// Query service answering from a fixed filter -> response table.
    #[derive(Default)]
    struct StubQuery {
        responses: HashMap<String, Result<Vec<RawElement>, RemoteFetchError>>,
    }

    #[async_trait]
    impl ElementQueryService for StubQuery {
        async fn query(
            &self,
            _project_id: &str,
            _model_id: &str,
            filter: &str,
        ) -> Result<Vec<RawElement>, RemoteFetchError> {
            self.responses
                .get(filter)
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn walls() -> CategoryQuery {
        CategoryQuery {
            id: "walls".into(),
            display_name: "Walls".into(),
            filter: "walls".into(),
        }
    }

    fn analyzer(stub: StubQuery) -> CategoryAnalyzer {
        CategoryAnalyzer::new(
            Arc::new(stub),
            ComplianceScorer::default(),
            RequiredParameters::default(),
        )
    }

    #[test]
    fn canonical_names_ignore_spelling() {
        assert_eq!(canonical_name("Identity Data.Manufacturer"), "Manufacturer");
        assert_eq!(canonical_name("assembly_code"), "Assembly Code");
        assert_eq!(canonical_name("Family"), "Family Name");
        assert_eq!(canonical_name("Type Mark"), "Type Mark");
        assert_eq!(canonical_name("Fire Rating"), "Fire Rating");
    }

    #[tokio::test]
    async fn normalizes_and_scores_rows() {
        let mut stub = StubQuery::default();
        stub.responses.insert(
            "walls".into(),
            Ok(vec![RawElement {
                id: "urn:el:1".into(),
                external_id: None,
                revit_element_id: Some("316054".into()),
                properties: vec![
                    PropertyEntry::new("Identity Data.Manufacturer", "Xella"),
                    PropertyEntry::new("assembly_code", "B2010"),
                    PropertyEntry::new("Assembly Description", Value::Null),
                    PropertyEntry::new("Family", "Basic Wall"),
                    PropertyEntry::new("External ID", "0a1b-22"),
                ],
            }]),
        );

        let analysis = analyzer(stub)
            .analyze("p1", "m1", &walls())
            .await
            .unwrap();

        assert_eq!(analysis.rows.len(), 1);
        let row = &analysis.rows[0];
        assert_eq!(row.element_id, "urn:el:1");
        assert_eq!(row.revit_element_id.as_deref(), Some("316054"));
        assert_eq!(row.external_element_id.as_deref(), Some("0a1b-22"));
        assert_eq!(row.category, "Walls");
        assert_eq!(row.family_name, "Basic Wall");
        assert_eq!(row.manufacturer, "Xella");
        assert_eq!(row.compliance.filled, 2);
        assert_eq!(row.compliance.total, 4);
        assert_eq!(row.compliance.pct, 50);
        assert_eq!(analysis.summary.total_elements, 1);
        assert_eq!(analysis.summary.average_compliance_pct, 50);
    }

    #[test]
    fn property_keys_collapse_spellings() {
        assert_eq!(property_key("mfr"), property_key("Manufacturer"));
        assert_eq!(property_key("Fire_Rating"), property_key("fire rating"));
        assert_ne!(property_key("Fire Rating"), property_key("Fire Resistance"));
    }

    #[tokio::test]
    async fn required_overrides_match_any_spelling() {
        let mut stub = StubQuery::default();
        stub.responses.insert(
            "doors".into(),
            Ok(vec![RawElement {
                id: "urn:el:7".into(),
                external_id: None,
                revit_element_id: None,
                properties: vec![
                    PropertyEntry::new("Manufacturer", "Velux"),
                    PropertyEntry::new("Fire_Rating", "60"),
                ],
            }]),
        );
        let mut required = RequiredParameters::default();
        required.overrides.insert(
            "doors".into(),
            vec!["manufacturer".into(), "Fire Rating".into()],
        );
        let doors = CategoryQuery {
            id: "doors".into(),
            display_name: "Doors".into(),
            filter: "doors".into(),
        };

        let analysis = CategoryAnalyzer::new(Arc::new(stub), ComplianceScorer::default(), required)
            .analyze("p1", "m1", &doors)
            .await
            .unwrap();

        assert_eq!(
            analysis.rows[0].compliance,
            Compliance {
                filled: 2,
                total: 2,
                pct: 100,
            }
        );
    }

    #[tokio::test]
    async fn empty_dataset_is_not_an_error() {
        let analysis = analyzer(StubQuery::default())
            .analyze("p1", "m1", &walls())
            .await
            .unwrap();
        assert!(analysis.rows.is_empty());
        assert_eq!(analysis.summary, CategorySummary::zero());
    }

    #[tokio::test]
    async fn element_without_id_is_malformed() {
        let mut stub = StubQuery::default();
        stub.responses.insert(
            "walls".into(),
            Ok(vec![RawElement {
                id: " ".into(),
                external_id: None,
                revit_element_id: None,
                properties: Vec::new(),
            }]),
        );

        let err = analyzer(stub)
            .analyze("p1", "m1", &walls())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteFetchError::Malformed { .. }));
    }

    #[tokio::test]
    async fn upstream_failure_propagates() {
        let mut stub = StubQuery::default();
        stub.responses.insert(
            "walls".into(),
            Err(RemoteFetchError::Unavailable {
                filter: "walls".into(),
                message: "502".into(),
            }),
        );

        let err = analyzer(stub)
            .analyze("p1", "m1", &walls())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteFetchError::Unavailable { .. }));
    }
}
