//! tequmsa — CLI support: the demonstration run and its report

pub mod report;
