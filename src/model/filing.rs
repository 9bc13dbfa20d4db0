use std::fmt;

/// SEC filer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cik(pub u64);

impl fmt::Display for Cik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:010}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filing {
    pub form: String,
    pub filing_date: String,
    pub accession_number: String,
}

impl Filing {
    pub fn archive_url(&self, archives_base_url: &str, cik: Cik) -> String {
        format!(
            "{}/Archives/edgar/data/{}/{}/index.html",
            archives_base_url.trim_end_matches('/'),
            cik,
            self.accession_number.replace('-', "")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cik_is_zero_padded() {
        assert_eq!(Cik(320193).to_string(), "0000320193");
    }

    #[test]
    fn archive_url_strips_accession_dashes() {
        let filing = Filing {
            form: "10-K".to_string(),
            filing_date: "2024-11-01".to_string(),
            accession_number: "0000320193-24-000123".to_string(),
        };
        assert_eq!(
            filing.archive_url("https://www.sec.gov/", Cik(320193)),
            "https://www.sec.gov/Archives/edgar/data/0000320193/000032019324000123/index.html"
        );
    }
}
