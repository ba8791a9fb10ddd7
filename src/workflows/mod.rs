//! Sequential Task Pipeline
//!
//! Steps run strictly left to right. A step's instruction is its template
//! with `{company}` substituted, followed by the verbatim outputs of the
//! earlier steps it lists as context.
//!
//! # Usage
//!
//! ```ignore
//! let pipeline = stock_analysis_pipeline()?;
//! pipeline.validate_tools(&registry)?;
//!
//! let runner = PipelineRunner::new(agent, settings.config.pipeline.context_warn_chars);
//! let result = runner.run(&pipeline, &RunContext::new("ACME")?).await?;
//! println!("{}", result.report);
//! ```

pub mod engine;
pub mod pipeline;
pub mod stock_analysis;

pub use engine::{PipelineRunner, RunContext, RunResult, StepResult, StepStatus};
pub use pipeline::{Pipeline, Step};
pub use stock_analysis::stock_analysis_pipeline;
