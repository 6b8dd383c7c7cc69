//! Text report generation.
//!
//! This module turns normalized records into the statistics reports for
//! each listing kind, composed from fixed-width tables.

use super::table::{format_average, format_decimal, Column, Table};
use crate::analysis::{aggregate, extreme_by, global_stats, partition, sort_chronological, top_by, total};
use crate::models::{GroupSummary, Measure, NormalizedRecord, YearMonth, NOT_SPECIFIED};

/// Conference report: every talk, then talks per company.
///
/// Talks without a named speaker are left out.
pub fn generate_talks_report(source: &str, records: &[NormalizedRecord]) -> String {
    let mut talks: Vec<&NormalizedRecord> = records
        .iter()
        .filter(|r| r.author != NOT_SPECIFIED)
        .collect();
    talks.sort_by(|a, b| {
        a.company
            .cmp(&b.company)
            .then_with(|| a.author.cmp(&b.author))
            .then_with(|| a.title.cmp(&b.title))
    });

    let mut output = String::new();
    output.push_str(&format!("Conference statistics: {}\n\n", source));

    let list = Table::new(vec![
        Column::new("Company", 40, |r: &&NormalizedRecord| r.company.clone()),
        Column::new("Speaker", 35, |r: &&NormalizedRecord| r.author.clone()),
        Column::new("Talk", 98, |r: &&NormalizedRecord| r.title.clone()),
    ]);
    output.push_str(&list.render(&talks, "talks"));
    output.push('\n');

    let owned: Vec<NormalizedRecord> = talks.into_iter().cloned().collect();
    let companies = aggregate(&owned, |r| r.company.clone(), &[]);

    let summary = Table::new(vec![
        Column::new("Company", 40, |g: &GroupSummary<String>| g.key.clone()),
        Column::new("Talks", 20, |g: &GroupSummary<String>| g.count.to_string()),
    ]);
    output.push_str(&summary.render(&companies, "companies"));

    output
}

/// Vacancy report: salary overview, top employers, top cities.
pub fn generate_vacancies_report(records: &[NormalizedRecord], top: usize) -> String {
    let mut output = String::new();
    let salary = global_stats(records, Measure::Salary);

    output.push_str("Vacancy statistics\n\n");
    output.push_str(&format!("Total vacancies: {}\n", records.len()));
    output.push_str(&format!("Vacancies with salary: {}\n", salary.present));
    output.push_str(&format!("Average salary: {:.0}\n", salary.average));
    output.push_str(&format!("Minimum salary: {:.0}\n", salary.min));
    output.push_str(&format!("Maximum salary: {:.0}\n\n", salary.max));

    let employers = aggregate(records, |r| r.company.clone(), &[Measure::Salary]);
    output.push_str(&format!("Top {} employers:\n", top));
    output.push_str(&salary_table("Employer", 40).render(head(&employers, top), "employers"));
    output.push('\n');

    // Vacancies without a city are not attributed to any city.
    let located: Vec<NormalizedRecord> = records
        .iter()
        .filter(|r| r.city != NOT_SPECIFIED)
        .cloned()
        .collect();
    let cities = aggregate(&located, |r| r.city.clone(), &[Measure::Salary]);
    output.push_str(&format!("Top {} cities:\n", top));
    output.push_str(&salary_table("City", 30).render(head(&cities, top), "cities"));

    output
}

fn salary_table<'a>(label: &str, width: usize) -> Table<'a, GroupSummary<String>> {
    Table::new(vec![
        Column::new(label, width, |g: &GroupSummary<String>| g.key.clone()),
        Column::new("Vacancies", 19, |g: &GroupSummary<String>| g.count.to_string()),
        Column::new("Average salary", 16, |g: &GroupSummary<String>| {
            format_average(g.average(Measure::Salary))
        }),
    ])
}

fn head<T>(items: &[T], n: usize) -> &[T] {
    &items[..items.len().min(n)]
}

/// Article report for one hub.
pub fn generate_articles_report(hub: &str, records: &[NormalizedRecord], top: usize) -> String {
    let mut output = String::new();
    output.push_str(&format!("Hub statistics: {}\n\n", hub));
    output.push_str(&format!("Total articles: {}\n\n", records.len()));

    if records.is_empty() {
        output.push_str("No articles were collected.\n");
        return output;
    }

    for (title, measure) in [
        ("rating", Measure::Rating),
        ("comments", Measure::Comments),
        ("views", Measure::Views),
    ] {
        output.push_str(&format!("Top 5 articles by {}:\n", title));
        output.push_str(&ranked_table(measure).render(&top_by(records, measure, 5), "articles"));
        output.push('\n');
    }

    let authors = aggregate(records, |r| r.author.clone(), &[Measure::Rating, Measure::Views]);
    let author_table = Table::new(vec![
        Column::new("Author", 30, |g: &GroupSummary<String>| g.key.clone()),
        Column::new("Articles", 10, |g: &GroupSummary<String>| g.count.to_string()),
        Column::new("Avg rating", 12, |g: &GroupSummary<String>| {
            format_decimal(g.average(Measure::Rating))
        }),
        Column::new("Avg views", 12, |g: &GroupSummary<String>| {
            format_average(g.average(Measure::Views))
        }),
    ]);
    output.push_str(&format!("Top {} authors:\n", top));
    output.push_str(&author_table.render(head(&authors, top), "authors"));
    output.push('\n');

    let dated: Vec<NormalizedRecord> = records.iter().filter(|r| r.published.is_some()).cloned().collect();
    let mut months = aggregate(
        &dated,
        |r| r.year_month().unwrap_or(YearMonth { year: 0, month: 0 }),
        &[],
    );
    sort_chronological(&mut months);
    let month_table = Table::new(vec![
        Column::new("Month", 10, |g: &GroupSummary<YearMonth>| g.key.to_string()),
        Column::new("Articles", 10, |g: &GroupSummary<YearMonth>| g.count.to_string()),
    ]);
    output.push_str("Articles per month:\n");
    output.push_str(&month_table.render(&months, "months"));
    output.push('\n');

    let average = |m| global_stats(records, m).average;
    output.push_str("Averages:\n");
    output.push_str(&format!("  Rating: {:.2}\n", average(Measure::Rating)));
    output.push_str(&format!("  Views: {:.0}\n", average(Measure::Views)));
    output.push_str(&format!("  Comments: {:.0}\n\n", average(Measure::Comments)));

    output.push_str("Totals:\n");
    output.push_str(&format!("  Views: {:.0}\n", total(records, Measure::Views)));
    output.push_str(&format!("  Comments: {:.0}\n\n", total(records, Measure::Comments)));

    for (label, highest) in [("Highest", true), ("Lowest", false)] {
        if let Some(article) = extreme_by(records, Measure::Rating, highest) {
            output.push_str(&format!("{} rated article:\n", label));
            output.push_str(&format!("  Title: {}\n", article.title));
            output.push_str(&format!("  Author: {}\n", article.author));
            output.push_str(&format!("  Rating: {}\n", article.rating));
            output.push_str(&format!("  Link: {}\n\n", article.link.as_deref().unwrap_or("")));
        }
    }

    output
}

fn ranked_table<'a>(measure: Measure) -> Table<'a, &'a NormalizedRecord> {
    Table::new(vec![
        Column::new("Title", 80, |r: &&NormalizedRecord| r.title.clone()),
        Column::new(&measure.to_string(), 10, move |r: &&NormalizedRecord| {
            measure.value(r).map(|v| format!("{:.0}", v)).unwrap_or_default()
        })
        .right(),
    ])
}

/// Comparison of two hubs by article identifier.
pub fn generate_compare_report(
    first_hub: &str,
    first: &[NormalizedRecord],
    second_hub: &str,
    second: &[NormalizedRecord],
) -> String {
    let parts = partition(first, second);
    let mut output = String::new();

    output.push_str(&format!("Hub comparison: {} vs {}\n\n", first_hub, second_hub));
    output.push_str(&format!("Articles in {}: {}\n", first_hub, first.len()));
    output.push_str(&format!("Articles in {}: {}\n", second_hub, second.len()));
    output.push_str(&format!("Only in {}: {}\n", first_hub, parts.only_a.len()));
    output.push_str(&format!("In both: {}\n", parts.common.len()));
    output.push_str(&format!("Only in {}: {}\n", second_hub, parts.only_b.len()));
    output.push_str(&format!("Distinct articles: {}\n\n", parts.union_len()));

    let table = Table::new(vec![
        Column::new("Title", 80, |r: &NormalizedRecord| r.title.clone()),
        Column::new("Author", 30, |r: &NormalizedRecord| r.author.clone()),
    ]);

    for (heading, records) in [
        (format!("Only in {}:", first_hub), &parts.only_a),
        ("In both hubs:".to_string(), &parts.common),
        (format!("Only in {}:", second_hub), &parts.only_b),
    ] {
        output.push_str(&heading);
        output.push('\n');
        output.push_str(&table.render(records, "articles"));
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SalaryRange, NO_TITLE};
    use chrono::NaiveDate;

    fn talk(company: &str, speaker: &str, title: &str) -> NormalizedRecord {
        NormalizedRecord {
            company: company.to_string(),
            author: speaker.to_string(),
            title: title.to_string(),
            ..NormalizedRecord::default()
        }
    }

    fn vacancy(company: &str, city: &str, from: Option<f64>, to: Option<f64>) -> NormalizedRecord {
        let salary = SalaryRange { from, to };
        NormalizedRecord {
            company: company.to_string(),
            city: city.to_string(),
            salary: salary.midpoint().map(|_| salary),
            ..NormalizedRecord::default()
        }
    }

    fn article(id: &str, author: &str, rating: i64, views: i64, month: u32) -> NormalizedRecord {
        NormalizedRecord {
            id: Some(id.to_string()),
            title: format!("Article {}", id),
            author: author.to_string(),
            rating,
            views,
            published: NaiveDate::from_ymd_opt(2024, month, 1),
            ..NormalizedRecord::default()
        }
    }

    #[test]
    fn test_talks_report() {
        let records = vec![
            talk("Beta", "Bob", "Zero-cost"),
            talk("Acme", "Ann", "Spans"),
            talk("Beta", "Bea", "Channels"),
            talk("Gamma", NOT_SPECIFIED, "Anonymous"),
        ];

        let report = generate_talks_report("https://conf.example/schedule", &records);

        assert!(report.contains("Conference statistics: https://conf.example/schedule"));
        assert!(report.contains("Total: 3 talks"));
        assert!(report.contains("Total: 2 companies"));
        assert!(!report.contains("Anonymous"));

        let acme = report.find("|Acme").unwrap();
        let bea = report.find("Bea").unwrap();
        let bob = report.find("Bob").unwrap();
        assert!(acme < bea && bea < bob);

        let summary = report.rfind(&format!("|{:<40}|{:<20}|", "Beta", 2)).unwrap();
        let acme_summary = report.rfind(&format!("|{:<40}|{:<20}|", "Acme", 1)).unwrap();
        assert!(summary < acme_summary);
    }

    #[test]
    fn test_talks_report_keeps_untitled_talks() {
        let records = vec![talk("Acme", "Ann", "Spans"), talk("Acme", "Bob", NO_TITLE)];

        let report = generate_talks_report("https://conf.example/schedule", &records);

        assert!(report.contains("Total: 2 talks"));
        assert!(report.contains(NO_TITLE));
        assert!(report.contains(&format!("|{:<40}|{:<20}|", "Acme", 2)));
    }

    #[test]
    fn test_vacancies_report() {
        let records = vec![
            vacancy("Acme", "Moscow", Some(100.0), Some(200.0)),
            vacancy("Acme", "Moscow", None, None),
            vacancy("Globex", NOT_SPECIFIED, Some(300.0), None),
        ];

        let report = generate_vacancies_report(&records, 10);

        assert!(report.contains("Total vacancies: 3"));
        assert!(report.contains("Vacancies with salary: 2"));
        assert!(report.contains("Average salary: 225"));
        assert!(report.contains("Minimum salary: 100"));
        assert!(report.contains("Maximum salary: 300"));
        assert!(report.contains(&format!("|{:<40}|{:<19}|{:<16}|", "Acme", 2, 150)));
        assert!(report.contains("Total: 1 cities"));
        assert!(!report.contains(&format!("|{:<30}|", NOT_SPECIFIED)));
    }

    #[test]
    fn test_vacancies_report_without_salaries() {
        let records = vec![vacancy("Acme", "Moscow", None, None)];

        let report = generate_vacancies_report(&records, 10);

        assert!(report.contains("Average salary: 0"));
        assert!(report.contains(&format!("|{:<40}|{:<19}|{:<16}|", "Acme", 1, "")));
    }

    #[test]
    fn test_vacancies_report_respects_top() {
        let records: Vec<NormalizedRecord> = (0..5)
            .map(|i| vacancy(&format!("Company {}", i), "Moscow", None, None))
            .collect();

        let report = generate_vacancies_report(&records, 2);

        assert!(report.contains("Total: 2 employers"));
    }

    #[test]
    fn test_articles_report() {
        let records = vec![
            article("1", "ann", 10, 1000, 3),
            article("2", "ann", -2, 500, 1),
            article("3", "bob", 7, 12000, 3),
        ];

        let report = generate_articles_report("ru/hub/net", &records, 10);

        assert!(report.contains("Total articles: 3"));
        assert!(report.contains("Top 5 articles by rating:"));
        assert!(report.contains(&format!("|{:<10}|{:<10}|", "2024-01", 1)));
        assert!(report.contains(&format!("|{:<10}|{:<10}|", "2024-03", 2)));
        assert!(report.find("2024-01").unwrap() < report.find("2024-03").unwrap());
        assert!(report.contains("Views: 13500"));
        assert!(report.contains("Highest rated article:\n  Title: Article 1"));
        assert!(report.contains("Lowest rated article:\n  Title: Article 2"));
    }

    #[test]
    fn test_articles_report_empty() {
        let report = generate_articles_report("ru/hub/net", &[], 10);
        assert!(report.contains("No articles were collected."));
    }

    #[test]
    fn test_compare_report() {
        let first = vec![article("1", "a", 0, 0, 1), article("2", "a", 0, 0, 1), article("3", "a", 0, 0, 1)];
        let second = vec![article("2", "a", 0, 0, 1), article("3", "a", 0, 0, 1), article("4", "a", 0, 0, 1)];

        let report = generate_compare_report("net", &first, "csharp", &second);

        assert!(report.contains("Only in net: 1"));
        assert!(report.contains("In both: 2"));
        assert!(report.contains("Only in csharp: 1"));
        assert!(report.contains("Distinct articles: 4"));
    }
}
