use crate::analysis::DisciplineAnalysisResult;
use crate::error::ExportError;
use std::fs::File;
use std::path::Path;

pub fn export_rows_csv<P: AsRef<Path>>(
    result: &DisciplineAnalysisResult,
    path: P,
) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    write_rows(result, csv::Writer::from_writer(file))
}

fn write_rows<W: std::io::Write>(
    result: &DisciplineAnalysisResult,
    mut writer: csv::Writer<W>,
) -> Result<(), ExportError> {
    writer.write_record([
        "Category",
        "Element ID",
        "Revit Element ID",
        "External ID",
        "Family Name",
        "Type Mark",
        "Assembly Code",
        "Assembly Description",
        "Manufacturer",
        "Model",
        "Filled",
        "Total",
        "Compliance %",
    ])?;

    for row in &result.rows {
        let filled = row.compliance.filled.to_string();
        let total = row.compliance.total.to_string();
        let pct = row.compliance.pct.to_string();
        let record: [&str; 13] = [
            &row.category,
            &row.element_id,
            row.revit_element_id.as_deref().unwrap_or_default(),
            row.external_element_id.as_deref().unwrap_or_default(),
            &row.family_name,
            &row.type_mark,
            &row.assembly_code,
            &row.assembly_description,
            &row.manufacturer,
            &row.model,
            &filled,
            &total,
            &pct,
        ];
        writer.write_record(record)?;
    }

    writer.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::RunState;
    use crate::model::{Compliance, DisciplineSummary, ElementRow};

    #[test]
    fn writes_one_line_per_row() {
        let result = DisciplineAnalysisResult {
            project_id: "p1".into(),
            model_id: "m1".into(),
            discipline_id: "architecture".into(),
            discipline_name: "Architecture".into(),
            state: RunState::Completed,
            rows: vec![ElementRow {
                element_id: "w1".into(),
                external_element_id: None,
                revit_element_id: Some("1001".into()),
                viewer_db_id: None,
                category: "Walls".into(),
                family_name: "Basic Wall, 200mm".into(),
                type_mark: "W1".into(),
                assembly_code: "B2010".into(),
                assembly_description: "Exterior Walls".into(),
                manufacturer: String::new(),
                model: String::new(),
                compliance: Compliance {
                    filled: 2,
                    total: 4,
                    pct: 50,
                },
            }],
            categories: Vec::new(),
            failed_categories: Vec::new(),
            summary: DisciplineSummary::default(),
        };

        let mut buffer = Vec::new();
        write_rows(&result, csv::Writer::from_writer(&mut buffer)).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Category,Element ID"));
        assert_eq!(
            lines[1],
            "Walls,w1,1001,,\"Basic Wall, 200mm\",W1,B2010,Exterior Walls,,,2,4,50"
        );
    }
}
