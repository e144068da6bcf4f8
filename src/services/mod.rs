//! Service clients and capability seams
//!
//! Object storage, work queue, and image transform are narrow traits so the
//! enhancement pipeline can be exercised against fakes; the production
//! implementations wrap S3, SQS, and the Gemini API.

pub mod prompts;
pub mod queue;
pub mod storage;
pub mod transform;

pub use queue::{EnhancementQueue, QueueMessage, SqsQueue};
pub use storage::{ObjectStorage, PresignedUpload, S3ObjectStorage};
pub use transform::{GeminiClient, GeneratedImage, ImageTransform};
