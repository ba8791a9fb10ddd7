//! Market-data tools
//!
//! Four tools over a [`MarketData`] source: current price, quote metrics with
//! recent price history, annual financial statements, and recent news. Each
//! flattens the structured response into plain text for the model.

use crate::tools::registry::{Tool, ToolError};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Snapshot of quote-level metrics; `None` where the source has no value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub current_price: Option<f64>,
    pub forward_pe: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub total_revenue: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub market_cap: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub open: Option<f64>,
    pub previous_close: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub volume: Option<f64>,
}

/// One daily candle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Line items of one reporting period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub end_date: String,
    pub items: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    pub income_statement: Vec<StatementPeriod>,
    pub balance_sheet: Vec<StatementPeriod>,
    pub cash_flow: Vec<StatementPeriod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub link: Option<String>,
}

/// Source of market data for a ticker symbol
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn quote(&self, ticker: &str) -> Result<Quote, ToolError>;

    /// Daily bars over `range` (e.g. "1mo")
    async fn history(&self, ticker: &str, range: &str) -> Result<Vec<PriceBar>, ToolError>;

    async fn financials(&self, ticker: &str) -> Result<Financials, ToolError>;

    async fn news(&self, ticker: &str, limit: usize) -> Result<Vec<NewsItem>, ToolError>;
}

fn ticker_arg(argument: &str) -> Result<&str, ToolError> {
    let ticker = argument.trim();
    if ticker.is_empty() {
        return Err(ToolError::InvalidArgument("ticker must not be empty".to_string()));
    }
    Ok(ticker)
}

fn or_na(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

// ============= Current price =============

pub struct CurrentStockPriceTool {
    source: Arc<dyn MarketData>,
}

impl CurrentStockPriceTool {
    pub fn new(source: Arc<dyn MarketData>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for CurrentStockPriceTool {
    fn name(&self) -> &str {
        "current_stock_price"
    }

    fn description(&self) -> &str {
        "Get the current stock price for a given ticker."
    }

    fn failure_context(&self, argument: &str) -> String {
        format!("fetching stock price for {}", argument.trim())
    }

    async fn invoke(&self, argument: &str) -> Result<String, ToolError> {
        let ticker = ticker_arg(argument)?;
        let quote = self.source.quote(ticker).await?;

        Ok(format!(
            "Current Stock Price for {}:\nPrice: {}\n",
            ticker,
            or_na(quote.current_price)
        ))
    }
}

// ============= Quote metrics and history =============

pub struct StockDataTool {
    source: Arc<dyn MarketData>,
    history_range: String,
}

impl StockDataTool {
    pub fn new(source: Arc<dyn MarketData>, history_range: impl Into<String>) -> Self {
        Self {
            source,
            history_range: history_range.into(),
        }
    }
}

#[async_trait]
impl Tool for StockDataTool {
    fn name(&self) -> &str {
        "stock_data"
    }

    fn description(&self) -> &str {
        "Fetch stock data and historical market data."
    }

    fn failure_context(&self, _argument: &str) -> String {
        "fetching stock data".to_string()
    }

    async fn invoke(&self, argument: &str) -> Result<String, ToolError> {
        let ticker = ticker_arg(argument)?;
        let quote = self.source.quote(ticker).await?;
        let history = self.source.history(ticker, &self.history_range).await?;

        let mut output = format!(
            "Stock Data for {ticker}:\n\
             Current Stock Price: {}\n\
             P/E Ratio: {}\n\
             EPS: {}\n\
             Revenue: {}\n\
             Debt to Equity: {}\n\
             Market Cap: {}\n\
             Dividend Yield: {}\n\
             Open Price: {}\n\
             Close Price: {}\n\
             Day High: {}\n\
             Day Low: {}\n\
             Volume: {}\n\n",
            or_na(quote.current_price),
            or_na(quote.forward_pe),
            or_na(quote.trailing_eps),
            or_na(quote.total_revenue),
            or_na(quote.debt_to_equity),
            or_na(quote.market_cap),
            or_na(quote.dividend_yield),
            or_na(quote.open),
            or_na(quote.previous_close),
            or_na(quote.day_high),
            or_na(quote.day_low),
            or_na(quote.volume),
        );

        output.push_str(&format!("Historical Stock Prices ({}):\n", self.history_range));
        for bar in &history {
            output.push_str(&format!(
                "Date: {}, Open: {}, High: {}, Low: {}, Close: {}, Volume: {}\n",
                bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
            ));
        }

        Ok(output)
    }
}

// ============= Financial statements =============

pub struct StockFinancialsTool {
    source: Arc<dyn MarketData>,
}

impl StockFinancialsTool {
    pub fn new(source: Arc<dyn MarketData>) -> Self {
        Self { source }
    }
}

/// Render periods as a table: one row per line item, one column per period
fn render_statement(title: &str, periods: &[StatementPeriod]) -> String {
    let mut out = format!("{}:\n", title);
    if periods.is_empty() {
        out.push_str("No data available\n");
        return out;
    }

    let mut items: Vec<&str> = Vec::new();
    for period in periods {
        for (name, _) in &period.items {
            if !items.contains(&name.as_str()) {
                items.push(name);
            }
        }
    }

    out.push_str("Item");
    for period in periods {
        out.push_str(&format!(" | {}", period.end_date));
    }
    out.push('\n');

    for item in items {
        out.push_str(item);
        for period in periods {
            let value = period
                .items
                .iter()
                .find(|(name, _)| name == item)
                .map(|(_, v)| v.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            out.push_str(&format!(" | {}", value));
        }
        out.push('\n');
    }

    out
}

#[async_trait]
impl Tool for StockFinancialsTool {
    fn name(&self) -> &str {
        "stock_financials"
    }

    fn description(&self) -> &str {
        "Fetch financial statements for the stock."
    }

    fn failure_context(&self, _argument: &str) -> String {
        "fetching financial statements".to_string()
    }

    async fn invoke(&self, argument: &str) -> Result<String, ToolError> {
        let ticker = ticker_arg(argument)?;
        let financials = self.source.financials(ticker).await?;

        Ok(format!(
            "Financial Statements for {}:\n\n{}\n{}\n{}",
            ticker,
            render_statement("Income Statement (Annual)", &financials.income_statement),
            render_statement("Balance Sheet (Annual)", &financials.balance_sheet),
            render_statement("Cash Flow Statement (Annual)", &financials.cash_flow),
        ))
    }
}

// ============= News =============

pub struct StockNewsTool {
    source: Arc<dyn MarketData>,
    limit: usize,
}

impl StockNewsTool {
    pub fn new(source: Arc<dyn MarketData>, limit: usize) -> Self {
        Self { source, limit }
    }
}

#[async_trait]
impl Tool for StockNewsTool {
    fn name(&self) -> &str {
        "stock_news"
    }

    fn description(&self) -> &str {
        "Fetch recent news articles related to the company stock of a given ticker."
    }

    fn failure_context(&self, _argument: &str) -> String {
        "fetching news".to_string()
    }

    async fn invoke(&self, argument: &str) -> Result<String, ToolError> {
        let ticker = ticker_arg(argument)?;
        let items = self.source.news(ticker, self.limit).await?;

        let summaries: Vec<String> = items
            .iter()
            .take(self.limit)
            .map(|item| {
                format!(
                    "{} - Published by {}. Read more: {}",
                    item.title.as_deref().unwrap_or("No title available"),
                    item.publisher.as_deref().unwrap_or("Unknown publisher"),
                    item.link.as_deref().unwrap_or("No link available"),
                )
            })
            .collect();

        Ok(format!("Recent News:\n{}", summaries.join("\n\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::registry::{ToolRegistry, ERROR_MARKER};

    struct FixedSource;

    #[async_trait]
    impl MarketData for FixedSource {
        async fn quote(&self, ticker: &str) -> Result<Quote, ToolError> {
            if ticker == "FAIL" {
                return Err(ToolError::Request("connection refused".to_string()));
            }
            Ok(Quote {
                current_price: Some(101.5),
                market_cap: Some(2.5e9),
                ..Default::default()
            })
        }

        async fn history(&self, _ticker: &str, _range: &str) -> Result<Vec<PriceBar>, ToolError> {
            Ok(vec![PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                open: 100.0,
                high: 102.0,
                low: 99.5,
                close: 101.5,
                volume: 1200,
            }])
        }

        async fn financials(&self, _ticker: &str) -> Result<Financials, ToolError> {
            Ok(Financials {
                income_statement: vec![
                    StatementPeriod {
                        end_date: "2023-12-31".to_string(),
                        items: vec![("totalRevenue".to_string(), 500.0)],
                    },
                    StatementPeriod {
                        end_date: "2022-12-31".to_string(),
                        items: vec![
                            ("totalRevenue".to_string(), 400.0),
                            ("netIncome".to_string(), 40.0),
                        ],
                    },
                ],
                ..Default::default()
            })
        }

        async fn news(&self, _ticker: &str, _limit: usize) -> Result<Vec<NewsItem>, ToolError> {
            Ok(vec![
                NewsItem {
                    title: Some("ACME beats estimates".to_string()),
                    publisher: Some("Wire".to_string()),
                    link: Some("https://news.example/1".to_string()),
                },
                NewsItem {
                    title: None,
                    publisher: None,
                    link: None,
                },
            ])
        }
    }

    fn source() -> Arc<dyn MarketData> {
        Arc::new(FixedSource)
    }

    #[tokio::test]
    async fn test_current_price_format() {
        let tool = CurrentStockPriceTool::new(source());
        let out = tool.invoke(" ACME ").await.unwrap();
        assert_eq!(out, "Current Stock Price for ACME:\nPrice: 101.5\n");
    }

    #[tokio::test]
    async fn test_stock_data_marks_missing_fields() {
        let tool = StockDataTool::new(source(), "1mo");
        let out = tool.invoke("ACME").await.unwrap();
        assert!(out.starts_with("Stock Data for ACME:"));
        assert!(out.contains("Market Cap: 2500000000"));
        assert!(out.contains("P/E Ratio: N/A"));
        assert!(out.contains("Date: 2024-03-01, Open: 100, High: 102, Low: 99.5, Close: 101.5"));
    }

    #[tokio::test]
    async fn test_financials_table() {
        let tool = StockFinancialsTool::new(source());
        let out = tool.invoke("ACME").await.unwrap();
        assert!(out.contains("Item | 2023-12-31 | 2022-12-31"));
        assert!(out.contains("totalRevenue | 500 | 400"));
        assert!(out.contains("netIncome | N/A | 40"));
        assert!(out.contains("Balance Sheet (Annual):\nNo data available"));
    }

    #[test]
    fn test_render_statement_layout() {
        let periods = vec![
            StatementPeriod {
                end_date: "2023-12-31".to_string(),
                items: vec![("totalRevenue".to_string(), 500.0)],
            },
            StatementPeriod {
                end_date: "2022-12-31".to_string(),
                items: vec![
                    ("totalRevenue".to_string(), 400.0),
                    ("netIncome".to_string(), 40.0),
                ],
            },
        ];

        assert_eq!(
            render_statement("Income Statement (Annual)", &periods),
            "Income Statement (Annual):\n\
             Item | 2023-12-31 | 2022-12-31\n\
             totalRevenue | 500 | 400\n\
             netIncome | N/A | 40\n"
        );
    }

    #[tokio::test]
    async fn test_news_placeholders() {
        let tool = StockNewsTool::new(source(), 5);
        let out = tool.invoke("ACME").await.unwrap();
        assert!(out.starts_with("Recent News:\n"));
        assert!(out.contains("ACME beats estimates - Published by Wire. Read more: https://news.example/1"));
        assert!(out.contains("No title available - Published by Unknown publisher."));
    }

    #[tokio::test]
    async fn test_empty_ticker_rejected() {
        let tool = CurrentStockPriceTool::new(source());
        assert!(matches!(
            tool.invoke("   ").await,
            Err(ToolError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_failure_through_registry_is_text() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CurrentStockPriceTool::new(source())));

        let out = registry.invoke("current_stock_price", "FAIL").await;
        assert!(out.starts_with(ERROR_MARKER));
        assert_eq!(
            out,
            "Error fetching stock price for FAIL: request failed: connection refused"
        );
    }
}
