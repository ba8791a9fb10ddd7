//! Yahoo Finance market-data source
//!
//! Talks to the public JSON endpoints (`quoteSummary`, `chart`, `search`).
//! The base URL comes from configuration so tests can point it at a mock.
//!
//! `quoteSummary` only answers requests that carry a session cookie and the
//! matching `crumb` query parameter. The client fetches both on first use and
//! keeps them for its lifetime.

use crate::tools::market::{Financials, MarketData, NewsItem, PriceBar, Quote, StatementPeriod};
use crate::tools::registry::ToolError;
use crate::utils::toml_config::MarketDataConfig;
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::OnceCell;

const USER_AGENT: &str = concat!("tickerwise/", env!("CARGO_PKG_VERSION"));

const QUOTE_MODULES: &str = "financialData,summaryDetail,defaultKeyStatistics";
const STATEMENT_MODULES: &str =
    "incomeStatementHistory,balanceSheetHistory,cashflowStatementHistory";

pub struct YahooFinanceClient {
    client: reqwest::Client,
    base_url: Url,
    session_url: String,
    crumb: OnceCell<String>,
}

impl YahooFinanceClient {
    pub fn new(config: &MarketDataConfig) -> Result<Self, ToolError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ToolError::InvalidArgument(format!("base url {}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ToolError::InvalidArgument(format!(
                "base url {} cannot hold a path",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url,
            session_url: config.session_url.clone(),
            crumb: OnceCell::new(),
        })
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json(&self, url: Url, query: &[(&str, &str)]) -> Result<Value, ToolError> {
        tracing::debug!(url = %url, "market data request");

        let path = url.path().to_string();
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Request(format!("{} returned {}: {}", path, status, body)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ToolError::Parse(e.to_string()))
    }

    async fn crumb(&self) -> Result<&str, ToolError> {
        self.crumb
            .get_or_try_init(|| self.fetch_crumb())
            .await
            .map(String::as_str)
    }

    async fn fetch_crumb(&self) -> Result<String, ToolError> {
        // Only the Set-Cookie header matters, the status is usually 404
        self.client.get(&self.session_url).send().await?;

        let response = self
            .client
            .get(self.endpoint(&["v1", "test", "getcrumb"]))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let crumb = body.trim();
        if !status.is_success() || crumb.is_empty() {
            return Err(ToolError::Request(format!(
                "crumb request returned {}: {}",
                status, crumb
            )));
        }

        tracing::debug!("market data session established");
        Ok(crumb.to_string())
    }

    /// First element of `quoteSummary.result`
    async fn quote_summary(&self, ticker: &str, modules: &str) -> Result<Value, ToolError> {
        let crumb = self.crumb().await?;
        let url = self.endpoint(&["v10", "finance", "quoteSummary", ticker]);
        let body = self
            .get_json(url, &[("modules", modules), ("crumb", crumb)])
            .await?;

        if let Some(description) = body["quoteSummary"]["error"]["description"].as_str() {
            return Err(ToolError::Request(description.to_string()));
        }

        body["quoteSummary"]["result"]
            .get(0)
            .cloned()
            .ok_or_else(|| ToolError::NoData(ticker.to_string()))
    }
}

/// Numeric value of a `{"raw": .., "fmt": ..}` field, or of a bare number
fn raw(value: &Value) -> Option<f64> {
    value.get("raw").and_then(Value::as_f64).or_else(|| value.as_f64())
}

fn statement_periods(entries: &Value) -> Vec<StatementPeriod> {
    let Some(entries) = entries.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let fields = entry.as_object()?;
            let end_date = fields
                .get("endDate")
                .and_then(|d| d.get("fmt"))
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();

            let items = fields
                .iter()
                .filter(|(name, _)| name.as_str() != "endDate" && name.as_str() != "maxAge")
                .filter_map(|(name, value)| raw(value).map(|v| (name.clone(), v)))
                .collect();

            Some(StatementPeriod { end_date, items })
        })
        .collect()
}

fn parse_history(body: &Value) -> Result<Vec<PriceBar>, ToolError> {
    if let Some(description) = body["chart"]["error"]["description"].as_str() {
        return Err(ToolError::Request(description.to_string()));
    }

    let result = &body["chart"]["result"][0];
    let Some(timestamps) = result["timestamp"].as_array() else {
        return Ok(Vec::new());
    };
    let quote = &result["indicators"]["quote"][0];

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let field = |name: &str| quote[name].get(i).and_then(Value::as_f64);

        // Trading halts leave null entries in every series
        let (Some(open), Some(high), Some(low), Some(close)) =
            (field("open"), field("high"), field("low"), field("close"))
        else {
            continue;
        };

        let date = ts
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.date_naive())
            .ok_or_else(|| ToolError::Parse(format!("invalid timestamp {}", ts)))?;

        bars.push(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume: quote["volume"].get(i).and_then(Value::as_u64).unwrap_or(0),
        });
    }

    Ok(bars)
}

#[async_trait]
impl MarketData for YahooFinanceClient {
    async fn quote(&self, ticker: &str) -> Result<Quote, ToolError> {
        let summary = self.quote_summary(ticker, QUOTE_MODULES).await?;
        let financial = &summary["financialData"];
        let detail = &summary["summaryDetail"];
        let stats = &summary["defaultKeyStatistics"];

        Ok(Quote {
            current_price: raw(&financial["currentPrice"]),
            forward_pe: raw(&detail["forwardPE"]),
            trailing_eps: raw(&stats["trailingEps"]),
            total_revenue: raw(&financial["totalRevenue"]),
            debt_to_equity: raw(&financial["debtToEquity"]),
            market_cap: raw(&detail["marketCap"]),
            dividend_yield: raw(&detail["dividendYield"]),
            open: raw(&detail["open"]),
            previous_close: raw(&detail["previousClose"]),
            day_high: raw(&detail["dayHigh"]),
            day_low: raw(&detail["dayLow"]),
            volume: raw(&detail["volume"]),
        })
    }

    async fn history(&self, ticker: &str, range: &str) -> Result<Vec<PriceBar>, ToolError> {
        let url = self.endpoint(&["v8", "finance", "chart", ticker]);
        let body = self
            .get_json(url, &[("range", range), ("interval", "1d")])
            .await?;
        parse_history(&body)
    }

    async fn financials(&self, ticker: &str) -> Result<Financials, ToolError> {
        let summary = self.quote_summary(ticker, STATEMENT_MODULES).await?;

        Ok(Financials {
            income_statement: statement_periods(
                &summary["incomeStatementHistory"]["incomeStatementHistory"],
            ),
            balance_sheet: statement_periods(
                &summary["balanceSheetHistory"]["balanceSheetStatements"],
            ),
            cash_flow: statement_periods(&summary["cashflowStatementHistory"]["cashflowStatements"]),
        })
    }

    async fn news(&self, ticker: &str, limit: usize) -> Result<Vec<NewsItem>, ToolError> {
        let count = limit.to_string();
        let body = self
            .get_json(
                self.endpoint(&["v1", "finance", "search"]),
                &[("q", ticker), ("newsCount", &count), ("quotesCount", "0")],
            )
            .await?;

        let items = body["news"]
            .as_array()
            .map(|news| {
                news.iter()
                    .take(limit)
                    .map(|item| NewsItem {
                        title: item["title"].as_str().map(str::to_string),
                        publisher: item["publisher"].as_str().map(str::to_string),
                        link: item["link"].as_str().map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(items)
    }
}
