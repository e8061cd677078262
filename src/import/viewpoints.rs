/// Viewpoint list parser
///
/// Reads the HTML view report: one `<h2>` heading per saved view, each
/// usually followed by the `<img>` snapshot of that view. Issue headings
/// are underscore-delimited:
///
/// `ID_DATE_MAINZONE_SUBZONE_LEVEL_DISCIPLINE_DESCRIPTION_ISSUETYPE`
///
/// Every heading is classified before it becomes a record, so headings
/// that look like issues but do not fit the schema are reported instead
/// of silently vanishing.
use chrono::Local;
use scraper::{Html, Selector};
use std::fmt;

use super::date::parse_date;
use crate::error::{Error, Result};
use crate::state::data::{Record, Usage, UNASSIGNED};

/// Number of underscore-delimited fields in an issue heading
pub const HEADING_FIELDS: usize = 8;

/// Headings splitting into this many tokens or fewer are navigation
const NAVIGATION_MAX_TOKENS: usize = 3;

/// One `<h2>` with the image that follows it
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub text: String,
    /// Last path segment of the next image's `src`
    pub image: Option<String>,
}

/// Why a structural heading was not turned into a record
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    FieldCount(usize),
    EmptyId,
    BadDate(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::FieldCount(n) => {
                write!(f, "expected {} fields, found {}", HEADING_FIELDS, n)
            }
            Rejection::EmptyId => f.write_str("empty clash ID"),
            Rejection::BadDate(d) => write!(f, "unparseable date '{}'", d),
        }
    }
}

/// Outcome of validating one heading
#[derive(Debug, Clone, PartialEq)]
pub enum HeadingKind {
    /// Too few underscore fields to be an issue (section titles etc.)
    Navigation,
    /// Marked with `*` by the author
    Excluded,
    Rejected(Rejection),
    Record(Box<Record>),
}

/// Records plus the headings that failed validation
#[derive(Debug, Clone, Default)]
pub struct ViewList {
    pub records: Vec<Record>,
    pub rejected: Vec<(String, Rejection)>,
    pub navigation: usize,
    pub excluded: usize,
}

/// Parse an HTML view report into issue records
pub fn parse_view_list(html: &str) -> Result<ViewList> {
    let headings = extract_headings(html)?;
    let mut list = ViewList::default();

    for heading in headings {
        match classify(&heading) {
            HeadingKind::Navigation => list.navigation += 1,
            HeadingKind::Excluded => list.excluded += 1,
            HeadingKind::Rejected(reason) => {
                tracing::debug!(heading = %heading.text, %reason, "heading rejected");
                list.rejected.push((heading.text, reason));
            }
            HeadingKind::Record(record) => list.records.push(*record),
        }
    }

    tracing::info!(
        records = list.records.len(),
        rejected = list.rejected.len(),
        excluded = list.excluded,
        navigation = list.navigation,
        "parsed view list"
    );

    Ok(list)
}

/// Pair every `<h2>` with the first `<img>` after it in document order
pub fn extract_headings(html: &str) -> Result<Vec<Heading>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("h2, img")
        .map_err(|e| Error::Malformed(format!("selector: {:?}", e)))?;

    // (is_heading, payload) in document order
    let mut sequence: Vec<(bool, Option<String>)> = Vec::new();
    for element in document.select(&selector) {
        if element.value().name() == "h2" {
            let text = element.text().collect::<String>().trim().to_string();
            sequence.push((true, Some(text)));
        } else {
            let file = element
                .value()
                .attr("src")
                .and_then(|src| src.rsplit('/').next())
                .map(|s| s.to_string());
            sequence.push((false, file));
        }
    }

    let headings = sequence
        .iter()
        .enumerate()
        .filter(|(_, (is_heading, _))| *is_heading)
        .map(|(i, (_, text))| {
            let image = sequence[i + 1..]
                .iter()
                .find(|(is_heading, _)| !is_heading)
                .and_then(|(_, file)| file.clone());
            Heading {
                text: text.clone().unwrap_or_default(),
                image,
            }
        })
        .collect();

    Ok(headings)
}

/// Validate a heading against the issue schema
pub fn classify(heading: &Heading) -> HeadingKind {
    let fields: Vec<&str> = heading.text.split('_').collect();

    if fields.len() <= NAVIGATION_MAX_TOKENS {
        return HeadingKind::Navigation;
    }
    if heading.text.contains('*') {
        return HeadingKind::Excluded;
    }
    if fields.len() != HEADING_FIELDS {
        return HeadingKind::Rejected(Rejection::FieldCount(fields.len()));
    }
    if fields[0].trim().is_empty() {
        return HeadingKind::Rejected(Rejection::EmptyId);
    }

    let date_found = match parse_date(fields[1]) {
        Some(date) => date,
        None => return HeadingKind::Rejected(Rejection::BadDate(fields[1].to_string())),
    };

    HeadingKind::Record(Box::new(Record {
        clash_id: fields[0].to_string(),
        view_name: heading.text.clone(),
        date_found,
        main_zone: fields[2].to_string(),
        sub_zone: fields[3].to_string(),
        level: fields[4].to_string(),
        discipline: fields[5].to_string(),
        description: fields[6].to_string(),
        issue_type: fields[7].to_string(),
        status: None,
        image: heading.image.clone(),
        notes: String::new(),
        usage: Usage::default(),
        assign_to: UNASSIGNED.to_string(),
        due_date: Local::now().date_naive(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const REPORT: &str = r#"
        <html><body>
        <h2>Clash Report</h2>
        <h2>C001_240115_ZoneA_Sub1_L2_MEP_Leak at pipe_Clash</h2>
        <img src="images/vp/c001.jpg">
        <h2>C002_2024-02-01_ZoneB_Sub2_L3_STR_Beam cut_Hard</h2>
        <img src="c002.png">
        <h2>*C003_240301_ZoneA_Sub1_L1_ARC_Draft_Soft</h2>
        <img src="c003.png">
        <h2>C004_notadate_ZoneA_Sub1_L1_ARC_Door_Soft</h2>
        <h2>C005_240301_ZoneA_Sub1_L1_ARC_Door</h2>
        </body></html>
    "#;

    fn heading(text: &str) -> Heading {
        Heading {
            text: text.to_string(),
            image: None,
        }
    }

    #[test]
    fn test_scenario_heading() {
        let list = parse_view_list(REPORT).unwrap();
        let first = &list.records[0];
        assert_eq!(first.clash_id, "C001");
        assert_eq!(first.date_found, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(first.main_zone, "ZoneA");
        assert_eq!(first.sub_zone, "Sub1");
        assert_eq!(first.level, "L2");
        assert_eq!(first.discipline, "MEP");
        assert_eq!(first.description, "Leak at pipe");
        assert_eq!(first.issue_type, "Clash");
        assert_eq!(first.image.as_deref(), Some("c001.jpg"));
        assert_eq!(first.view_name, "C001_240115_ZoneA_Sub1_L2_MEP_Leak at pipe_Clash");
        assert_eq!(first.status, None);
    }

    #[test]
    fn test_report_classification() {
        let list = parse_view_list(REPORT).unwrap();
        let ids: Vec<&str> = list.records.iter().map(|r| r.clash_id.as_str()).collect();
        assert_eq!(ids, vec!["C001", "C002"]);
        assert_eq!(list.navigation, 1);
        assert_eq!(list.excluded, 1);
        assert_eq!(list.rejected.len(), 2);
        assert_eq!(list.rejected[0].1, Rejection::BadDate("notadate".to_string()));
        assert_eq!(list.rejected[1].1, Rejection::FieldCount(7));
    }

    #[test]
    fn test_heading_takes_next_image_even_past_other_headings() {
        let headings = extract_headings(
            r#"<h2>A_1_2_3</h2><h2>B_1_2_3</h2><img src="a/b/x.png"><h2>C_1_2_3</h2>"#,
        )
        .unwrap();
        assert_eq!(headings.len(), 3);
        assert_eq!(headings[0].image.as_deref(), Some("x.png"));
        assert_eq!(headings[1].image.as_deref(), Some("x.png"));
        assert_eq!(headings[2].image, None);
    }

    #[test]
    fn test_eight_fields_map_in_order() {
        let text = "ID9_240229_M_S_L_D_Desc_T";
        match classify(&heading(text)) {
            HeadingKind::Record(r) => {
                let fields: [&str; HEADING_FIELDS] = [
                    r.clash_id.as_str(),
                    "240229",
                    &r.main_zone,
                    &r.sub_zone,
                    &r.level,
                    &r.discipline,
                    &r.description,
                    &r.issue_type,
                ];
                let split: Vec<&str> = text.split('_').collect();
                assert_eq!(fields.to_vec(), split);
                assert_eq!(r.date_found, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_asterisk_always_excluded() {
        assert_eq!(classify(&heading("C1_240101_A_B_C_D_E*_F")), HeadingKind::Excluded);
        assert_eq!(classify(&heading("C1_240101_A_B_*")), HeadingKind::Excluded);
        assert_eq!(
            classify(&heading("C1_240101_A_B_C_D_E_F_G_*")),
            HeadingKind::Excluded
        );
    }

    #[test]
    fn test_navigation_headings() {
        assert_eq!(classify(&heading("Overview")), HeadingKind::Navigation);
        assert_eq!(classify(&heading("A_B_C")), HeadingKind::Navigation);
        // Asterisks in navigation headings are irrelevant
        assert_eq!(classify(&heading("*_B")), HeadingKind::Navigation);
    }

    #[test]
    fn test_empty_id_rejected() {
        assert_eq!(
            classify(&heading("_240101_A_B_C_D_E_F")),
            HeadingKind::Rejected(Rejection::EmptyId)
        );
    }

    #[test]
    fn test_too_many_fields_rejected() {
        assert_eq!(
            classify(&heading("C1_240101_A_B_C_D_E_F_G")),
            HeadingKind::Rejected(Rejection::FieldCount(9))
        );
    }
}
