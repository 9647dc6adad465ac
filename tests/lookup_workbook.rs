#![cfg(feature = "excel_test_writer")]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use listing_pipeline::ingestion::IngestionOptions;
use listing_pipeline::lookup::LocationLookup;
use rust_xlsxwriter::Workbook;

fn tmp_xlsx(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("listing-pipeline-{name}-{nanos}.xlsx"))
}

#[test]
fn workbook_lookup_reads_area_column_from_named_sheet() {
    let path = tmp_xlsx("areas");
    let mut wb = Workbook::new();
    let first = wb.add_worksheet();
    first.set_name("Notes").unwrap();
    first.write_string(0, 0, "ignored").unwrap();

    let sheet = wb.add_worksheet();
    sheet.set_name("Areas").unwrap();
    sheet.write_string(0, 0, "Id").unwrap();
    sheet.write_string(0, 1, "Area").unwrap();
    for (i, area) in ["Banashankari", "BTM", "HSR"].iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_number(row, 0, row as f64).unwrap();
        sheet.write_string(row, 1, *area).unwrap();
    }
    wb.save(&path).unwrap();

    let options = IngestionOptions {
        format: None,
        sheet: Some("Areas".to_string()),
    };
    let lookup = LocationLookup::load(&path, &options).unwrap();
    assert_eq!(lookup.len(), 3);
    assert!(lookup.contains(Some("HSR")));
    assert!(!lookup.contains(Some("Id")));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn workbook_lookup_defaults_to_first_sheet() {
    let path = tmp_xlsx("first-sheet");
    let mut wb = Workbook::new();
    let sheet = wb.add_worksheet();
    sheet.write_string(0, 0, "Area").unwrap();
    sheet.write_string(1, 0, "Jayanagar").unwrap();
    wb.save(&path).unwrap();

    let lookup = LocationLookup::load(&path, &IngestionOptions::default()).unwrap();
    assert!(lookup.contains(Some("Jayanagar")));

    let _ = std::fs::remove_file(&path);
}
