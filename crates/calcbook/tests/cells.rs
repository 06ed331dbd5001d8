//! Cell-level contract: values, formulas, typed getters, dates and the
//! behavior of handles whose sheet has been deleted.

use calcbook::{initialize, CellInput, CellValue, Sheet, Workbook};
use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;

async fn workbook() -> Workbook {
    initialize().await.new_workbook()
}

async fn sheet() -> (Workbook, Sheet) {
    let workbook = workbook().await;
    let sheet = workbook.sheets().get(0).unwrap();
    (workbook, sheet)
}

fn utc(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

#[tokio::test]
async fn empty_cell_reads_as_empty() {
    let (_wb, sheet) = sheet().await;
    let cell = sheet.cell("A1").unwrap();
    assert_eq!(cell.value().unwrap(), CellValue::Empty);
    assert_eq!(cell.formula().unwrap(), None);
}

#[tokio::test]
async fn formula_is_none_for_value_cells() {
    let (_wb, sheet) = sheet().await;
    let cell = sheet.cell("A1").unwrap();
    cell.set_value(3.0).unwrap();
    assert_eq!(cell.formula().unwrap(), None);
}

#[tokio::test]
async fn set_formula_evaluates_and_reports_the_formula() {
    let (_wb, sheet) = sheet().await;
    sheet.cell("A1").unwrap().set_value(2.0).unwrap();
    let cell = sheet.cell("B1").unwrap();
    cell.set_formula("=A1*3").unwrap();
    assert_eq!(cell.formula().unwrap(), Some("=A1*3".to_string()));
    assert_eq!(cell.number_value().unwrap(), 6.0);
}

#[tokio::test]
async fn formula_cells_recalculate_after_dependency_changes() {
    let (_wb, sheet) = sheet().await;
    let a1 = sheet.cell("A1").unwrap();
    let b1 = sheet.cell("B1").unwrap();
    a1.set_value(2.0).unwrap();
    b1.set_formula("=A1*3").unwrap();
    a1.set_value(10.0).unwrap();
    assert_eq!(b1.number_value().unwrap(), 30.0);
}

#[tokio::test]
async fn formula_looking_string_set_as_value_stays_a_string() {
    let (_wb, sheet) = sheet().await;
    let cell = sheet.cell("A1").unwrap();
    cell.set_value("=1 + 1").unwrap();
    assert_eq!(
        cell.value().unwrap(),
        CellValue::String("=1 + 1".to_string())
    );
    assert_eq!(cell.formula().unwrap(), None);
}

#[tokio::test]
async fn typed_getters_succeed_on_matching_types() {
    let (_wb, sheet) = sheet().await;
    let cell = sheet.cell("A1").unwrap();

    cell.set_value(3.5).unwrap();
    assert_eq!(cell.number_value().unwrap(), 3.5);

    cell.set_value("hello").unwrap();
    assert_eq!(cell.string_value().unwrap(), "hello");

    cell.set_value(true).unwrap();
    assert!(cell.boolean_value().unwrap());
}

#[tokio::test]
async fn typed_getters_report_the_stored_literal_on_mismatch() {
    let (_wb, sheet) = sheet().await;
    let cell = sheet.cell("A1").unwrap();

    cell.set_value("3").unwrap();
    assert_eq!(
        cell.number_value().unwrap_err().to_string(),
        "Type of cell's value is not number, cell value: \"3\""
    );

    cell.set_value(3.0).unwrap();
    assert_eq!(
        cell.string_value().unwrap_err().to_string(),
        "Type of cell's value is not string, cell value: 3"
    );

    cell.set_value(true).unwrap();
    assert_eq!(
        cell.string_value().unwrap_err().to_string(),
        "Type of cell's value is not string, cell value: true"
    );
    assert_eq!(
        cell.number_value().unwrap_err().to_string(),
        "Type of cell's value is not number, cell value: true"
    );

    cell.delete().unwrap();
    assert_eq!(
        cell.boolean_value().unwrap_err().to_string(),
        "Type of cell's value is not boolean, cell value: empty"
    );
}

#[tokio::test]
async fn formatted_value_applies_the_number_format() {
    let (_wb, sheet) = sheet().await;
    let cell = sheet.cell("A1").unwrap();

    cell.set_value(0.1).unwrap();
    assert_eq!(cell.formatted_value().unwrap(), "0.1");
    cell.style().set_number_format("0.00%").unwrap();
    assert_eq!(cell.formatted_value().unwrap(), "10.00%");

    cell.set_value("plain text").unwrap();
    assert_eq!(cell.formatted_value().unwrap(), "plain text");

    assert_eq!(sheet.cell("B9").unwrap().formatted_value().unwrap(), "");
}

#[tokio::test]
async fn dates_are_stored_as_day_serials() {
    let (_wb, sheet) = sheet().await;
    let cell = sheet.cell("A1").unwrap();

    cell.set_value(utc("2015-02-14T00:00:00Z")).unwrap();
    assert_eq!(cell.number_value().unwrap(), 42049.0);

    cell.set_value(utc("2015-02-14T13:30:00Z")).unwrap();
    assert_eq!(cell.number_value().unwrap(), 42049.5625);
    assert_eq!(cell.date_value().unwrap(), utc("2015-02-14T13:30:00Z"));

    cell.set_value(utc("2020-01-01T00:00:00Z")).unwrap();
    assert_eq!(cell.number_value().unwrap(), 43831.0);
}

#[tokio::test]
async fn out_of_range_date_fails_without_mutating_the_cell() {
    let (_wb, sheet) = sheet().await;
    let cell = sheet.cell("A1").unwrap();
    cell.set_value(7.0).unwrap();

    let err = cell.set_value(utc("1815-02-14T00:00:00Z")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Date \"1815-02-14T00:00:00.000Z\" is not representable in workbook."
    );
    assert_eq!(cell.number_value().unwrap(), 7.0);
}

#[tokio::test]
async fn date_getter_rejects_negative_serials_and_non_numbers() {
    let (_wb, sheet) = sheet().await;
    let cell = sheet.cell("A1").unwrap();

    cell.set_value(-1.0).unwrap();
    assert_eq!(
        cell.date_value().unwrap_err().to_string(),
        "Number \"-1\" cannot be converted to date."
    );

    // Serials past the end of the calendar fail the same way.
    cell.set_value(1.0e12).unwrap();
    assert_eq!(
        cell.date_value().unwrap_err().to_string(),
        "Number \"1000000000000\" cannot be converted to date."
    );

    cell.set_value("not a date").unwrap();
    assert_eq!(
        cell.date_value().unwrap_err().to_string(),
        "Type of cell's value is not number, cell value: \"not a date\""
    );
}

#[tokio::test]
async fn delete_clears_value_and_formula_but_not_style() {
    let (_wb, sheet) = sheet().await;
    let cell = sheet.cell("A1").unwrap();
    cell.set_formula("=1+1").unwrap();
    cell.style().font().set_bold(true).unwrap();

    cell.delete().unwrap();
    assert_eq!(cell.value().unwrap(), CellValue::Empty);
    assert_eq!(cell.formula().unwrap(), None);
    assert!(cell.style().font().bold().unwrap());
}

#[tokio::test]
async fn setting_empty_input_clears_the_cell() {
    let (_wb, sheet) = sheet().await;
    let cell = sheet.cell("A1").unwrap();
    cell.set_value("something").unwrap();
    cell.set_value(CellInput::Empty).unwrap();
    assert_eq!(cell.value().unwrap(), CellValue::Empty);
}

#[tokio::test]
async fn text_reference_is_sheet_qualified() {
    let (_wb, sheet) = sheet().await;
    assert_eq!(
        sheet.cell("C7").unwrap().text_reference().unwrap(),
        "Sheet1!C7"
    );
}

#[tokio::test]
async fn operations_on_a_deleted_sheet_report_its_id() {
    let workbook = workbook().await;
    let sheet = workbook.sheets().add().unwrap();
    assert_eq!(sheet.id(), 2);
    let cell = sheet.cell("A1").unwrap();
    cell.set_value(1.0).unwrap();
    sheet.delete().unwrap();

    let expected = "Could not find sheet with sheetId=2";
    assert_eq!(cell.value().unwrap_err().to_string(), expected);
    assert_eq!(cell.set_value(2.0).unwrap_err().to_string(), expected);
    assert_eq!(cell.formula().unwrap_err().to_string(), expected);
    assert_eq!(cell.set_formula("=1+1").unwrap_err().to_string(), expected);
    assert_eq!(
        cell.style().font().bold().unwrap_err().to_string(),
        expected
    );
}

#[tokio::test]
async fn engine_coordinate_errors_pass_through_verbatim() {
    let (_wb, sheet) = sheet().await;
    let cell = sheet.cell_at(0, 1);
    assert_eq!(cell.value().unwrap_err().to_string(), "Invalid row: 0");
}
