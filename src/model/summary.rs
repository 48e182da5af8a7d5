use super::ElementRow;
use serde::{Deserialize, Serialize};

/// Aggregate over one category's element rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub total_elements: usize,
    pub average_compliance_pct: u8,
    pub fully_compliant: usize,
}

impl CategorySummary {
    /// Summary substituted for a category whose fetch failed.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_rows(rows: &[ElementRow]) -> Self {
        Self {
            total_elements: rows.len(),
            average_compliance_pct: rounded_mean(rows.iter().map(|r| r.compliance.pct)),
            fully_compliant: rows.iter().filter(|r| r.compliance.is_full()).count(),
        }
    }
}

/// Aggregate over all categories of a discipline.
///
/// The average weights every category equally, regardless of how many
/// elements it holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisciplineSummary {
    pub total_elements: usize,
    pub average_compliance_pct: u8,
    pub fully_compliant: usize,
}

impl DisciplineSummary {
    #[must_use]
    pub fn from_categories<'a, I>(categories: I) -> Self
    where
        I: IntoIterator<Item = &'a CategorySummary>,
    {
        let categories: Vec<&CategorySummary> = categories.into_iter().collect();
        Self {
            total_elements: categories.iter().map(|c| c.total_elements).sum(),
            average_compliance_pct: rounded_mean(
                categories.iter().map(|c| c.average_compliance_pct),
            ),
            fully_compliant: categories.iter().map(|c| c.fully_compliant).sum(),
        }
    }
}

/// Mean of percentages rounded half away from zero; 0 for no values.
pub(crate) fn rounded_mean(values: impl Iterator<Item = u8>) -> u8 {
    let (sum, count) = values.fold((0u64, 0u64), |(sum, count), v| {
        (sum + u64::from(v), count + 1)
    });
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64).round().min(100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Compliance;
    use pretty_assertions::assert_eq;

    fn row(pct: u8) -> ElementRow {
        ElementRow {
            element_id: format!("e{pct}"),
            external_element_id: None,
            revit_element_id: None,
            viewer_db_id: None,
            category: "Walls".into(),
            family_name: String::new(),
            type_mark: String::new(),
            assembly_code: String::new(),
            assembly_description: String::new(),
            manufacturer: String::new(),
            model: String::new(),
            compliance: Compliance {
                filled: 0,
                total: 4,
                pct,
            },
        }
    }

    #[test]
    fn category_summary_from_rows() {
        let summary = CategorySummary::from_rows(&[row(100), row(50)]);
        assert_eq!(
            summary,
            CategorySummary {
                total_elements: 2,
                average_compliance_pct: 75,
                fully_compliant: 1,
            }
        );
    }

    #[test]
    fn empty_category_is_zero() {
        assert_eq!(CategorySummary::from_rows(&[]), CategorySummary::zero());
    }

    #[test]
    fn fully_compliant_never_exceeds_total() {
        let rows: Vec<ElementRow> = [0, 25, 100, 100, 75, 100].into_iter().map(row).collect();
        let summary = CategorySummary::from_rows(&rows);
        assert!(summary.fully_compliant <= summary.total_elements);
        assert_eq!(summary.fully_compliant, 3);
        // (0 + 25 + 100 + 100 + 75 + 100) / 6 = 66.67
        assert_eq!(summary.average_compliance_pct, 67);
    }

    #[test]
    fn discipline_average_weights_categories_equally() {
        let walls = CategorySummary {
            total_elements: 100,
            average_compliance_pct: 90,
            fully_compliant: 80,
        };
        let doors = CategorySummary {
            total_elements: 2,
            average_compliance_pct: 10,
            fully_compliant: 0,
        };
        let summary = DisciplineSummary::from_categories([&walls, &doors]);
        assert_eq!(summary.total_elements, 102);
        assert_eq!(summary.fully_compliant, 80);
        assert_eq!(summary.average_compliance_pct, 50);
    }

    #[test]
    fn half_rounds_up() {
        let walls = CategorySummary {
            total_elements: 2,
            average_compliance_pct: 75,
            fully_compliant: 1,
        };
        let summary = DisciplineSummary::from_categories([&walls, &CategorySummary::zero()]);
        assert_eq!(summary.average_compliance_pct, 38);
    }
}
