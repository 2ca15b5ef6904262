// providers/bis.rs
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

use crate::address::BisKey;
use crate::providers::{BisSummary, BuildingStatusProvider, ProviderError};

const BIS_URL: &str = "https://a810-bisweb.nyc.gov/bisweb/PropertyProfileOverviewServlet";

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct BisClient {
    client: Client,
}

impl BisClient {
    pub fn new(proxy: Option<&str>) -> Result<Self, ProviderError> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT);

        if let Some(proxy_url) = proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| ProviderError::Network(format!("bad proxy url: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self { client })
    }

    fn fetch_page(&self, key: &BisKey) -> Result<String, ProviderError> {
        let resp = self
            .client
            .get(BIS_URL)
            .query(&[
                ("boro", key.boro_code),
                ("houseno", key.house_no.as_str()),
                ("street", key.street.as_str()),
            ])
            .send()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited(format!(
                "BIS returned 429 for {} {}",
                key.house_no, key.street
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::Http(status.as_u16()));
        }

        resp.text().map_err(|e| ProviderError::Network(e.to_string()))
    }
}

/// All visible text of the page, one line per text node, so the count
/// labels can be matched without caring about the table markup.
fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// First run of digits following `label`. The BIS page renders each summary
/// count as "<label> <n>" somewhere in its overview table.
fn extract_count(text: &str, label: &str) -> Option<i64> {
    let mut search = text;
    while let Some(pos) = search.find(label) {
        let rest = search[pos + label.len()..].trim_start();
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            return digits.parse().ok();
        }
        search = &search[pos + label.len()..];
    }
    None
}

fn extract_bin(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("td.maininfo").ok()?;

    for cell in document.select(&selector) {
        let text = cell.text().collect::<String>();
        if let Some(pos) = text.find("BIN#") {
            let digits: String = text[pos + 4..]
                .trim_start()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if !digits.is_empty() {
                return Some(digits);
            }
        }
    }
    None
}

impl BuildingStatusProvider for BisClient {
    fn fetch_summary(&self, key: &BisKey) -> Result<BisSummary, ProviderError> {
        debug!(house_no = %key.house_no, street = %key.street, boro = key.boro_code, "fetching BIS summary");
        let text = page_text(&self.fetch_page(key)?);

        let complaints = extract_count(&text, "Complaints");
        let violations_dob = extract_count(&text, "Violations-DOB");
        let violations_ecb = extract_count(&text, "Violations-OATH/ECB");

        match (complaints, violations_dob, violations_ecb) {
            (Some(complaints), Some(violations_dob), Some(violations_ecb)) => Ok(BisSummary {
                complaints,
                violations_dob,
                violations_ecb,
            }),
            _ => Err(ProviderError::MalformedPage(format!(
                "missing summary counts for {} {}, boro {}",
                key.house_no, key.street, key.boro_code
            ))),
        }
    }

    fn fetch_bin(&self, key: &BisKey) -> Result<Option<String>, ProviderError> {
        debug!(house_no = %key.house_no, street = %key.street, "fetching BIN");
        Ok(extract_bin(&self.fetch_page(key)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"
        <html><body>
        <table>
            <tr><td class="maininfo">952A GREENE AVENUE&nbsp;BIN# 3049577</td></tr>
            <tr><td>Complaints</td><td>4</td></tr>
            <tr><td>Violations-DOB</td><td>2</td></tr>
            <tr><td>Violations-OATH/ECB</td><td>0</td></tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn extracts_counts_from_page_text() {
        let text = page_text(SAMPLE_PAGE);
        assert_eq!(extract_count(&text, "Complaints"), Some(4));
        assert_eq!(extract_count(&text, "Violations-DOB"), Some(2));
        assert_eq!(extract_count(&text, "Violations-OATH/ECB"), Some(0));
    }

    #[test]
    fn missing_label_yields_none() {
        let text = page_text("<html><body>Property not found</body></html>");
        assert_eq!(extract_count(&text, "Violations-DOB"), None);
    }

    #[test]
    fn skips_label_hit_without_a_count() {
        // "Violations-DOB" appears once as a bare heading, then with a count.
        let text = "Violations-DOB\nsee below\nViolations-DOB 7";
        assert_eq!(extract_count(text, "Violations-DOB"), Some(7));
    }

    #[test]
    fn extracts_bin_from_maininfo_cell() {
        assert_eq!(extract_bin(SAMPLE_PAGE), Some("3049577".to_string()));
    }

    #[test]
    fn bin_absent_when_cell_missing() {
        assert_eq!(extract_bin("<html><body><td>no bin here</td></body></html>"), None);
    }
}
