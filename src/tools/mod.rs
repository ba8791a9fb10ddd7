//! Tools bound to pipeline steps
//!
//! Every tool takes one string argument and returns one string. Failures never
//! escape the [`ToolRegistry`](crate::tools::registry::ToolRegistry) wrapper:
//! they come back as text starting with `Error`, which the model reads like
//! any other observation.
//!
//! # Module Structure
//!
//! - [`registry`](crate::tools::registry) - `Tool` trait, registration and the invoke wrapper
//! - [`market`](crate::tools::market) - Price, quote, financials and news tools over `MarketData`
//! - [`yahoo`](crate::tools::yahoo) - `MarketData` over the Yahoo Finance JSON API
//! - [`search`](crate::tools::search) - DuckDuckGo web search via daedra
//!
//! # Example
//!
//! ```ignore
//! let registry = tools::stock_tools(Arc::new(yahoo), &settings.config);
//! let text = registry.invoke("current_stock_price", "AAPL").await;
//! ```

/// Market-data tools.
pub mod market;
/// Tool registry for managing available tools.
pub mod registry;
/// Web search tool using DuckDuckGo.
pub mod search;
/// Yahoo Finance market-data source.
pub mod yahoo;

use crate::tools::market::{
    CurrentStockPriceTool, MarketData, StockDataTool, StockFinancialsTool, StockNewsTool,
};
use crate::tools::registry::ToolRegistry;
use crate::tools::search::SearchTool;
use crate::utils::toml_config::TickerwiseConfig;
use std::sync::Arc;

/// Registry with the five tools the stock analysis pipeline binds
pub fn stock_tools(source: Arc<dyn MarketData>, config: &TickerwiseConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(CurrentStockPriceTool::new(source.clone())));
    registry.register(Arc::new(StockDataTool::new(
        source.clone(),
        config.market_data.history_range.clone(),
    )));
    registry.register(Arc::new(StockFinancialsTool::new(source.clone())));
    registry.register(Arc::new(StockNewsTool::new(
        source,
        config.market_data.news_limit,
    )));
    registry.register(Arc::new(SearchTool::new(config.search.num_results)));

    registry
}
