// TrueLens Core Services

pub mod text_processor;
pub mod config_store;
pub mod gateway;
pub mod prompts;
pub mod detection;
pub mod text_analyzer;
pub mod image_analyzer;
pub mod proxy;

pub use text_processor::*;
pub use config_store::*;
pub use gateway::{Gateway, GatewayClient, GatewayError, GATEWAY_DEFAULT_URL};
pub use text_analyzer::{analyze_text, TextAnalysisRequest};
pub use image_analyzer::{analyze_image, ImageAnalysisRequest, ImageInput};

pub use detection::{
    aggregate,
    breakdown_rows,
    classify,
    count_signals,
    reconcile_sentences,
    score_from_remote,
    score_sentence,
    score_sentences,
    text_verdict_label,
    AuthenticityBand,
    DetectionError,
    SignalCounts,
};
