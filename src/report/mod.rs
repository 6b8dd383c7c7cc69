//! Report rendering.

pub mod generator;
pub mod table;

pub use generator::{
    generate_articles_report, generate_compare_report, generate_talks_report,
    generate_vacancies_report,
};
