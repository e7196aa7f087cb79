use super::*;

const URL: &str = "https://service.berlin.de/terminvereinbarung/termin/tag.php?termin=1&dienstleister=1&anliegen[]=10";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Renders a month widget the way the booking site does: bookable days are
/// linked `td.buchbar` cells, everything else is plain text.
fn month_widget(bookable: &[u32], closed: &[u32]) -> String {
    let mut cells = String::new();
    for day in closed {
        cells.push_str(&format!("<td class=\"nichtbuchbar\">{day}</td>\n"));
    }
    for day in bookable {
        cells.push_str(&format!(
            "<td class=\"buchbar\">\n  <a href=\"/terminvereinbarung/termin/time/{day}/\" title=\"An diesem Tag einen Termin buchen\">{day}</a>\n</td>\n"
        ));
    }
    format!(
        "<div class=\"calendar-month-table\"><table><tbody><tr>\n{cells}</tr></tbody></table></div>\n"
    )
}

fn page(widgets: &[String]) -> String {
    format!(
        "<html><body><div class=\"calendar-table\">{}</div></body></html>",
        widgets.concat()
    )
}

#[test]
fn extracts_bookable_days_of_current_month() {
    let body = page(&[month_widget(&[3, 17], &[1, 2])]);
    let slots = CalendarExtractor::new()
        .extract_on(&body, URL, date(2024, 6, 1))
        .unwrap();
    assert_eq!(
        slots,
        vec![
            SlotCandidate::new(date(2024, 6, 3), URL),
            SlotCandidate::new(date(2024, 6, 17), URL),
        ]
    );
}

#[test]
fn second_widget_is_next_month() {
    let body = page(&[month_widget(&[], &[5]), month_widget(&[2], &[])]);
    let slots = CalendarExtractor::new()
        .extract_on(&body, URL, date(2024, 6, 20))
        .unwrap();
    assert_eq!(slots, vec![SlotCandidate::new(date(2024, 7, 2), URL)]);
}

#[test]
fn month_rolls_over_into_next_year() {
    let body = page(&[month_widget(&[30], &[]), month_widget(&[4], &[])]);
    let slots = CalendarExtractor::new()
        .extract_on(&body, URL, date(2024, 12, 10))
        .unwrap();
    assert_eq!(
        slots,
        vec![
            SlotCandidate::new(date(2024, 12, 30), URL),
            SlotCandidate::new(date(2025, 1, 4), URL),
        ]
    );
}

#[test]
fn calendar_without_bookable_days_yields_nothing() {
    let body = page(&[month_widget(&[], &[1, 2, 3]), month_widget(&[], &[4])]);
    let slots = CalendarExtractor::new()
        .extract_on(&body, URL, date(2024, 6, 1))
        .unwrap();
    assert!(slots.is_empty());
}

#[test]
fn nichtbuchbar_cells_are_not_bookable_even_with_links() {
    let body = page(&[
        "<div class=\"calendar-month-table\"><table><tr><td class=\"nichtbuchbar\"><a href=\"/x\">9</a></td></tr></table></div>"
            .to_string(),
    ]);
    let slots = CalendarExtractor::new()
        .extract_on(&body, URL, date(2024, 6, 1))
        .unwrap();
    assert!(slots.is_empty());
}

#[test]
fn buchbar_cell_without_href_is_skipped() {
    let body = page(&[
        "<div class=\"calendar-month-table\"><table><tr><td class=\"buchbar\"><a>9</a></td><td class=\"buchbar\"><a href=\"\">10</a></td></tr></table></div>"
            .to_string(),
    ]);
    let slots = CalendarExtractor::new()
        .extract_on(&body, URL, date(2024, 6, 1))
        .unwrap();
    assert!(slots.is_empty());
}

#[test]
fn buchbar_among_multiple_classes_is_recognised() {
    let body = page(&[
        "<div class='calendar-month-table first'><table><tr><td class='today buchbar'><a href='/t/1'><span>12</span></a></td></tr></table></div>"
            .to_string(),
    ]);
    let slots = CalendarExtractor::new()
        .extract_on(&body, URL, date(2024, 6, 1))
        .unwrap();
    assert_eq!(slots, vec![SlotCandidate::new(date(2024, 6, 12), URL)]);
}

#[test]
fn page_without_calendar_is_an_error() {
    let body = "<html><body><h1>Zu viele Zugriffe</h1></body></html>";
    let err = CalendarExtractor::new()
        .extract_on(body, URL, date(2024, 6, 1))
        .unwrap_err();
    assert!(
        matches!(err, ExtractionError::MissingCalendar { .. }),
        "expected MissingCalendar, got: {err:?}"
    );
}

#[test]
fn non_numeric_day_is_an_error() {
    let body = page(&[
        "<div class=\"calendar-month-table\"><td class=\"buchbar\"><a href=\"/t\">heute</a></td></div>"
            .to_string(),
    ]);
    let err = CalendarExtractor::new()
        .extract_on(&body, URL, date(2024, 6, 1))
        .unwrap_err();
    assert!(
        matches!(err, ExtractionError::UnparsableDay { ref text, .. } if text == "heute"),
        "expected UnparsableDay, got: {err:?}"
    );
}

#[test]
fn day_outside_month_is_an_error() {
    let body = page(&[month_widget(&[31], &[])]);
    let err = CalendarExtractor::new()
        .extract_on(&body, URL, date(2024, 6, 1))
        .unwrap_err();
    assert!(
        matches!(
            err,
            ExtractionError::InvalidDay {
                year: 2024,
                month: 6,
                day: 31,
                ..
            }
        ),
        "expected InvalidDay, got: {err:?}"
    );
}

#[test]
fn every_slot_carries_the_source_url() {
    let body = page(&[month_widget(&[1, 2, 3], &[])]);
    let slots = CalendarExtractor::new()
        .extract_on(&body, URL, date(2024, 6, 1))
        .unwrap();
    assert_eq!(slots.len(), 3);
    assert!(slots.iter().all(|s| s.source_url == URL));
}
