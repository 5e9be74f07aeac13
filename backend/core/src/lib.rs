pub mod error;
pub mod traits;
pub mod types;

pub use error::CalcError;
pub use traits::{VisionModel, VisionRequest, VisionResponse};
pub use types::{
    value_to_text, AnalysisRequest, DecodedImage, ExpressionRecord, ParsedRecord, VarValue,
    Variables, PLACEHOLDER_EXPR, PLACEHOLDER_RESULT,
};
