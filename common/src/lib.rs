//! Device Twin Common Library
//!
//! 解析契約（型・スキーマ・プロンプト・レスポンス検証）と表示用グループ化

pub mod types;
pub mod error;
pub mod schema;
pub mod prompts;
pub mod parser;
pub mod controls;

pub use types::{ControlCategory, ControlType, DeviceAnalysis, DeviceControl};
pub use error::{Error, Result};
pub use schema::analysis_schema;
pub use prompts::{build_analysis_prompt, PROMPT_VERSION};
pub use parser::{extract_json, parse_analysis_response, validate_analysis};
pub use controls::ControlGroups;
