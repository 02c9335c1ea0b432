/// Filters Example
///
/// This example demonstrates:
/// - Column filter popups (checkbox options per column)
/// - Unchecking values and searching text
/// - Why unchecking everything empties the view
/// - How blank values disappear once a column is narrowed

use program_report::{
    aggregate_values, AggregationConfig, RankTable, ReportLayout, ReportRow, ReportSession, UserDirectory,
};
use serde_json::json;

fn main() {
    println!("=== Program Report Filters Example ===\n");

    let rows = aggregate_values(
        &[
            json!({"id": "1", "overview": {"category": "평생교육강좌", "title": "수채화 교실", "place": "문화교실"},
                   "performances": [{"adultF": 9}]}),
            json!({"id": "2", "overview": {"category": "평생교육강좌", "title": "캘리그라피", "place": ""},
                   "performances": [{"adultF": 6, "adultM": 2}]}),
            json!({"id": "3", "overview": {"category": "독서문화행사", "title": "작가와의 만남", "place": "시청각실"},
                   "performances": [{"adultF": 20, "teenM": 3}]}),
            json!({"id": "4", "overview": {"category": "전시", "title": "그림책 원화展", "place": "로비"},
                   "performances": [{"childF": 11}]}),
        ],
        &UserDirectory::new(),
        &AggregationConfig::default(),
    )
    .unwrap();

    let mut session = ReportSession::new(ReportLayout::status());
    session.reload(rows, RankTable::from_labels(["평생교육강좌", "독서문화행사", "전시"]));

    // 1. Filter options
    println!("1. Options for the place filter:");
    for option in session.filter_options("place").unwrap() {
        println!("   [x] {}", option);
    }
    print_titles("   all rows", &session);

    // 2. Uncheck a value
    println!("2. Unchecking '전시'...");
    session.toggle_value("category", "전시", false).unwrap();
    print_titles("   visible", &session);

    // 3. Narrowing a column hides its blank rows
    println!("3. Unchecking '로비' in the place filter...");
    session.toggle_value("place", "로비", false).unwrap();
    print_titles("   visible (blank place hidden)", &session);

    // 4. Search text
    println!("4. Searching titles for '작가'...");
    session.set_all("place", true).unwrap();
    session.set_search("title", "작가").unwrap();
    print_titles("   visible", &session);

    // 5. Uncheck everything
    println!("5. Unchecking every category...");
    session.set_search("title", "").unwrap();
    session.set_all("category", false).unwrap();
    let view = session.view();
    println!("   {} rows, totals all zero: {}\n", view.len(), view.totals.is_zero());

    println!("=== Example Complete ===");
}

fn print_titles(label: &str, session: &ReportSession<program_report::DerivedRow>) {
    let view = session.view();
    let titles: Vec<String> = view.rows.iter().map(|r| r.cell("title").to_filter_string()).collect();
    println!("{}: {:?} (attendance {})\n", label, titles, view.totals.get("grandTotal").unwrap_or(0));
}
