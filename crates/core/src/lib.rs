pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod generate;
pub mod pacing;
pub mod record;
pub mod store;

pub use batch::{BatchConfig, BatchObserver, BatchReport, BatchRunner, RecordOutcome};
pub use crate::config::{DatabaseSettings, GeneratorSettings, Settings, parse_delay, parse_limit};
pub use error::{GenerationError, MetagenError, Result};
pub use extract::{HtmlTextExtractor, TextExtractor, body_text, clean_html};
pub use generate::{DeepSeekGenerator, MetaGenerator, build_prompt, parse_completion, parse_payload, strip_code_fences};
pub use pacing::{NoopPacer, Pacer, TokioPacer};
pub use record::{ContentRecord, GeneratedMeta};
pub use store::{ContentSelector, ContentStore, MetaWriter, MySqlContentStore, TableName};
