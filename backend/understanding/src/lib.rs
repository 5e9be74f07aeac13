//! Turning caller payloads into images and images into model replies.

pub mod mock;
pub mod payload;
pub mod vision;

pub use mock::MockVisionModel;
pub use payload::{decode_base64_payload, decode_image_bytes, decode_image_payload, split_data_uri};
pub use vision::GeminiVision;
