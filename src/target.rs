use std::path::{Path, PathBuf};

use chrono::NaiveDate;

pub const DEFAULT_LIMIT: u32 = 200;

pub const COUNTRIES: [&str; 10] = ["us", "gb", "au", "ca", "hk", "kr", "cn", "jp", "in", "fr"];

pub const TOPLISTS: [&str; 9] = [
    "topfreeapplications",
    "toppaidapplications",
    "topgrossingapplications",
    "topfreeipadapplications",
    "toppaidipadapplications",
    "topgrossingipadapplications",
    "newapplications",
    "newfreeapplications",
    "newpaidapplications",
];

/// One (country, list) pair inside a date partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceTarget {
    pub country_code: String,
    pub list_name: String,
    pub date: NaiveDate,
    pub limit: u32,
}

impl ResourceTarget {
    pub fn new(country_code: &str, list_name: &str, date: NaiveDate, limit: u32) -> Self {
        Self {
            country_code: country_code.to_owned(),
            list_name: list_name.to_owned(),
            date,
            limit,
        }
    }

    /// `<base_url>/<country>/rss/<list>/limit=<limit>/json`
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/{}/rss/{}/limit={}/json",
            base_url.trim_end_matches('/'),
            self.country_code,
            self.list_name,
            self.limit
        )
    }

    /// `<root>/<list>/<YYYY>/<MM>/<DD>/<country>.json`
    pub fn path(&self, root: &Path) -> PathBuf {
        root.join(&self.list_name)
            .join(self.date.format("%Y").to_string())
            .join(self.date.format("%m").to_string())
            .join(self.date.format("%d").to_string())
            .join(format!("{}.json", self.country_code))
    }
}

/// Country-major product of `countries` and `lists`.
pub fn targets(
    countries: &[String],
    lists: &[String],
    date: NaiveDate,
    limit: u32,
) -> Vec<ResourceTarget> {
    countries
        .iter()
        .flat_map(|country| {
            lists
                .iter()
                .map(move |list| ResourceTarget::new(country, list, date, limit))
        })
        .collect()
}
