//! The four-step stock analysis pipeline
//!
//! collect_data and collect_news run independently; analyze reads both;
//! advise reads only the analysis.

use crate::agents::Persona;
use crate::types::Result;
use crate::workflows::pipeline::{Pipeline, Step};

pub const PIPELINE_NAME: &str = "stock_analysis";

fn data_collector() -> Persona {
    Persona::new(
        "Stock Data Collector",
        "Efficiently gather stock market data for financial analysis.",
        "A reliable financial data collector who has access to stock data APIs and tools.",
    )
}

fn news_reader() -> Persona {
    Persona::new(
        "News and Info Researcher",
        "Gather and provide the latest news and information about the company from the internet",
        "You are an expert researcher who can gather detailed information about a company. \
         Consider you are on: {today}",
    )
}

fn financial_analyst() -> Persona {
    Persona::new(
        "Financial Analyst",
        "Analyze financial stock data and use stock information to write a comprehensive stock analysis report.",
        "You are an expert in analyzing financial data, stock/company-related current information and \
         making a comprehensive stock analysis report. Use Indian units for numbers (lakh,crore). \
         Consider you are on: {today}",
    )
}

fn financial_expert() -> Persona {
    Persona::new(
        "Financial Expert",
        "Coordinate financial analysis of a stock, make investment recommendations",
        "You are an expert financial advisor who can provide investment recommendations. \
         Consider the financial analysis, current information about the company, current stock price, \
         and make recommendations about whether to buy/hold/sell a stock along with reasons. \
         When using tools, try with and without the suffix '.NS' to the stock symbol and see what works. \
         Consider you are on: {today}",
    )
}

/// Build the stock analysis pipeline
pub fn stock_analysis_pipeline() -> Result<Pipeline> {
    let steps = vec![
        Step::new(
            "collect_data",
            data_collector(),
            "Collect key stock data metrics for {company} using its ticker format. \
             Use only the data provided and do not request for more metrics.",
            "Data about most relevant financial metrics, income statement for stock analysis. \
             Indicate also about current financial status and trend over the period",
        )
        .with_tools(["stock_data", "stock_financials"]),
        Step::new(
            "collect_news",
            news_reader(),
            "Find the latest financial news and business information about company: {company} \
             and summarize the key points from recent articles.",
            "A summary of the latest news and business information about {company}.",
        )
        .with_tools(["web_search"]),
        Step::new(
            "analyze",
            financial_analyst(),
            "Analyze the research on {company} and write a comprehensive stock analysis report.",
            "A detailed report that includes analysis of the stock data, financial insights, \
             recent news and market information followed by the conclusion.",
        )
        .with_tools(["stock_data", "stock_financials", "stock_news"])
        .with_context(["collect_data", "collect_news"]),
        Step::new(
            "advise",
            financial_expert(),
            "Make a recommendation about investing in a stock, based on the financial analysis \
             and current stock price. First, get the current stock price using the \
             current_stock_price tool. Then, analyze the financial data and make a recommendation. \
             Explain the reasons for your recommendation.",
            "A recommendation about whether to buy/hold/sell a stock along with elaborated reasons, \
             including current price analysis and financial metrics.",
        )
        .with_tools(["current_stock_price", "stock_data"])
        .with_context(["analyze"]),
    ];

    Pipeline::new(PIPELINE_NAME, steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_order_and_context() {
        let pipeline = stock_analysis_pipeline().unwrap();
        let names: Vec<&str> = pipeline.steps().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["collect_data", "collect_news", "analyze", "advise"]);

        assert_eq!(pipeline.steps()[2].context, vec!["collect_data", "collect_news"]);
        assert_eq!(pipeline.steps()[3].context, vec!["analyze"]);
        assert!(pipeline.steps()[0].context.is_empty());
    }

    #[test]
    fn test_every_template_mentions_company_but_advise() {
        let pipeline = stock_analysis_pipeline().unwrap();
        for step in &pipeline.steps()[..3] {
            assert!(step.instruction.contains("{company}"), "{}", step.name);
        }
    }
}
