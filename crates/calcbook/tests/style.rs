//! Style contract: live views, detached snapshots, color validation,
//! atomic bulk updates and the derived quote prefix.

use calcbook::{
    initialize, AlignmentUpdate, FillPattern, FillUpdate, FontUpdate, HorizontalAlignment, Sheet,
    Style, StyleUpdate, VerticalAlignment, Workbook,
};
use pretty_assertions::assert_eq;

async fn sheet() -> (Workbook, Sheet) {
    let workbook = initialize().await.new_workbook();
    let sheet = workbook.sheets().get(0).unwrap();
    (workbook, sheet)
}

#[tokio::test]
async fn default_record() {
    let (_wb, sheet) = sheet().await;
    let style = sheet.cell("A1").unwrap().style();
    assert_eq!(style.number_format().unwrap(), "general");
    assert!(!style.font().bold().unwrap());
    assert_eq!(style.font().color().unwrap().to_string(), "#000000");
    assert_eq!(style.fill().pattern_type().unwrap(), FillPattern::None);
    assert_eq!(
        style.fill().foreground_color().unwrap().to_string(),
        "#FFFFFF"
    );
    assert_eq!(
        style.alignment().horizontal().unwrap(),
        HorizontalAlignment::General
    );
    assert_eq!(
        style.alignment().vertical().unwrap(),
        VerticalAlignment::Top
    );
    assert!(!style.alignment().wrap_text().unwrap());
    assert_eq!(style.snapshot().unwrap(), Style::new());
}

#[tokio::test]
async fn number_format_round_trips_verbatim() {
    let (_wb, sheet) = sheet().await;
    let style = sheet.cell("A1").unwrap().style();
    style.set_number_format("#,##0.00").unwrap();
    assert_eq!(style.number_format().unwrap(), "#,##0.00");
}

#[tokio::test]
async fn font_toggles() {
    let (_wb, sheet) = sheet().await;
    let font = sheet.cell("A1").unwrap().style().font();
    font.set_bold(true).unwrap();
    font.set_italics(true).unwrap();
    font.set_underline(true).unwrap();
    font.set_strikethrough(true).unwrap();
    assert!(font.bold().unwrap());
    assert!(font.italics().unwrap());
    assert!(font.underline().unwrap());
    assert!(font.strikethrough().unwrap());
    font.set_bold(false).unwrap();
    assert!(!font.bold().unwrap());
    assert!(font.italics().unwrap());
}

#[tokio::test]
async fn colors_read_back_canonical_uppercase() {
    let (_wb, sheet) = sheet().await;
    let style = sheet.cell("A1").unwrap().style();
    style.font().set_color("#ff0000").unwrap();
    assert_eq!(style.font().color().unwrap().to_string(), "#FF0000");
}

#[tokio::test]
async fn invalid_color_fails_and_keeps_the_stored_color() {
    let (_wb, sheet) = sheet().await;
    let font = sheet.cell("A1").unwrap().style().font();
    font.set_color("#FF0000").unwrap();

    for bad in ["#fff", "red", "FF0000", "#FF00FF00", "#ff00fg"] {
        let err = font.set_color(bad).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Color \"{bad}\" is not valid 3-channel hex color.")
        );
    }
    assert_eq!(font.color().unwrap().to_string(), "#FF0000");
}

#[tokio::test]
async fn solid_fill() {
    let (_wb, sheet) = sheet().await;
    let fill = sheet.cell("A1").unwrap().style().fill();
    fill.set_pattern_type(FillPattern::Solid).unwrap();
    fill.set_foreground_color("#00FF00").unwrap();
    fill.set_background_color("#0000FF").unwrap();
    assert_eq!(fill.pattern_type().unwrap(), FillPattern::Solid);
    assert_eq!(fill.foreground_color().unwrap().to_string(), "#00FF00");
    assert_eq!(fill.background_color().unwrap().to_string(), "#0000FF");
}

#[tokio::test]
async fn pattern_none_keeps_color_fields() {
    let (_wb, sheet) = sheet().await;
    let fill = sheet.cell("A1").unwrap().style().fill();
    fill.set_pattern_type(FillPattern::Solid).unwrap();
    fill.set_foreground_color("#FF00FF").unwrap();
    fill.set_pattern_type(FillPattern::None).unwrap();
    assert_eq!(fill.pattern_type().unwrap(), FillPattern::None);
    assert_eq!(fill.foreground_color().unwrap().to_string(), "#FF00FF");
}

#[tokio::test]
async fn alignment() {
    let (_wb, sheet) = sheet().await;
    let alignment = sheet.cell("A1").unwrap().style().alignment();
    alignment
        .set_horizontal(HorizontalAlignment::Center)
        .unwrap();
    alignment.set_vertical(VerticalAlignment::Bottom).unwrap();
    alignment.set_wrap_text(true).unwrap();
    assert_eq!(alignment.horizontal().unwrap(), HorizontalAlignment::Center);
    assert_eq!(alignment.vertical().unwrap(), VerticalAlignment::Bottom);
    assert!(alignment.wrap_text().unwrap());
}

#[tokio::test]
async fn bulk_update_merges_only_present_leaves() {
    let (_wb, sheet) = sheet().await;
    let style = sheet.cell("A1").unwrap().style();
    style.font().set_italics(true).unwrap();

    style
        .bulk_update(&StyleUpdate {
            number_format: Some("0.00%".to_string()),
            font: Some(FontUpdate {
                bold: Some(true),
                color: Some("#00ff00".to_string()),
                ..Default::default()
            }),
            fill: Some(FillUpdate {
                pattern_type: Some(FillPattern::Solid),
                foreground_color: Some("#123456".to_string()),
                background_color: None,
            }),
            alignment: Some(AlignmentUpdate {
                horizontal: Some(HorizontalAlignment::Right),
                vertical: None,
                wrap_text: Some(true),
            }),
        })
        .unwrap();

    let record = style.snapshot().unwrap();
    assert_eq!(record.number_format, "0.00%");
    assert!(record.font.bold);
    // Untouched leaves keep their prior values.
    assert!(record.font.italics);
    assert_eq!(record.font.color.to_string(), "#00FF00");
    assert_eq!(record.fill.pattern_type, FillPattern::Solid);
    assert_eq!(record.fill.foreground_color.to_string(), "#123456");
    assert_eq!(record.fill.background_color.to_string(), "#FFFFFF");
    assert_eq!(record.alignment.horizontal, HorizontalAlignment::Right);
    assert_eq!(record.alignment.vertical, VerticalAlignment::Top);
    assert!(record.alignment.wrap_text);
}

#[tokio::test]
async fn bulk_update_is_atomic_on_a_bad_color() {
    let (_wb, sheet) = sheet().await;
    let style = sheet.cell("A1").unwrap().style();
    let before = style.snapshot().unwrap();

    let err = style
        .bulk_update(&StyleUpdate {
            number_format: Some("0.00".to_string()),
            font: Some(FontUpdate {
                bold: Some(true),
                color: Some("#badhex".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Color \"#badhex\" is not valid 3-channel hex color."
    );

    // Nothing committed, including the leaves listed before the bad one.
    assert_eq!(style.snapshot().unwrap(), before);
}

#[tokio::test]
async fn style_copies_are_by_value() {
    let (_wb, sheet) = sheet().await;
    let a1 = sheet.cell("A1").unwrap();
    let b1 = sheet.cell("B1").unwrap();
    a1.set_value(0.1).unwrap();
    b1.set_value(0.1).unwrap();
    a1.style().font().set_bold(true).unwrap();
    a1.style().set_number_format("0.00%").unwrap();
    assert_eq!(b1.formatted_value().unwrap(), "0.1");

    b1.set_style(&a1.style()).unwrap();
    assert!(b1.style().font().bold().unwrap());
    // The copied number format drives the formatted value.
    assert_eq!(b1.formatted_value().unwrap(), "10.00%");

    // Later mutations do not propagate in either direction.
    a1.style().font().set_bold(false).unwrap();
    assert!(b1.style().font().bold().unwrap());
    b1.style().font().set_italics(true).unwrap();
    assert!(!a1.style().font().italics().unwrap());
}

#[tokio::test]
async fn snapshots_are_detached() {
    let (_wb, sheet) = sheet().await;
    let cell = sheet.cell("A1").unwrap();
    cell.style().font().set_bold(true).unwrap();
    let snapshot = cell.style().snapshot().unwrap();

    cell.style().font().set_bold(false).unwrap();
    assert!(snapshot.font.bold);

    cell.set_style_snapshot(&snapshot).unwrap();
    assert!(cell.style().font().bold().unwrap());
}

#[tokio::test]
async fn full_update_from_a_snapshot_covers_every_leaf() {
    let (_wb, sheet) = sheet().await;
    let a1 = sheet.cell("A1").unwrap();
    a1.style().set_number_format("mm/dd/yyyy").unwrap();
    a1.style().font().set_color("#112233").unwrap();
    a1.style()
        .alignment()
        .set_vertical(VerticalAlignment::Center)
        .unwrap();
    let snapshot = a1.style().snapshot().unwrap();

    let b1 = sheet.cell("B1").unwrap();
    b1.style().bulk_update(&StyleUpdate::from(&snapshot)).unwrap();
    assert_eq!(b1.style().snapshot().unwrap(), snapshot);
}

#[tokio::test]
async fn quote_prefix_is_derived_from_the_stored_value() {
    let (_wb, sheet) = sheet().await;
    let cell = sheet.cell("A1").unwrap();

    for needs in ["0", "1", "=3", "=1 + 1", "true", "FALSE"] {
        cell.set_value(needs).unwrap();
        assert!(
            cell.style().has_quote_prefix().unwrap(),
            "{needs:?} should need a quote prefix"
        );
    }
    for plain in ["", "text", "1 + 1", "A1"] {
        cell.set_value(plain).unwrap();
        assert!(
            !cell.style().has_quote_prefix().unwrap(),
            "{plain:?} should not need a quote prefix"
        );
    }

    // Non-string values never carry a prefix.
    cell.set_value(1.0).unwrap();
    assert!(!cell.style().has_quote_prefix().unwrap());
    cell.set_value(true).unwrap();
    assert!(!cell.style().has_quote_prefix().unwrap());
    cell.delete().unwrap();
    assert!(!cell.style().has_quote_prefix().unwrap());
}
