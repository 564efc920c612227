// Image Analysis Pipeline
// Gateway verdict when available, otherwise a randomized demo verdict.
// Demo overrides rewrite scores for known test assets and only run when the
// request opts in.

use crate::models::{AnalysisSource, ImageAnalysis, ImageAttribute, RemoteImageVerdict};
use crate::services::detection::{AuthenticityBand, DetectionError};
use crate::services::gateway::{parse_verdict, Gateway, GatewayError};
use crate::services::prompts::{image_upload_prompt, image_url_prompt, IMAGE_SYSTEM_PROMPT};
use rand::Rng;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;
/// Data-URL length above which an upload is described as high resolution.
const HIGH_RES_DATA_URL_LEN: u64 = 50_000;
const DEFAULT_REMOTE_SCORE: f64 = 50.0;
pub const PASTED_IMAGE_NAME: &str = "Pasted image";

const ATTR_PIXEL_ENTROPY: &str = "Pixel Entropy";
const ATTR_COMPRESSION: &str = "Compression Artifacts";
const ATTR_EXIF: &str = "EXIF Integrity";
const ATTR_AI_SIGNATURE: &str = "AI-Gen Signature";
const ATTR_EDGE_COHERENCE: &str = "Edge Coherence";

#[derive(Debug, Clone, PartialEq)]
pub enum ImageInput {
    File {
        name: String,
        size_bytes: u64,
        mime: String,
    },
    /// Raw bytes from stdin or a clipboard, no file name.
    Pasted { size_bytes: u64, mime: String },
    Url(Url),
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        "avif" => Some("image/avif"),
        _ => None,
    }
}

fn check_size(size_bytes: u64) -> Result<(), DetectionError> {
    if size_bytes > MAX_IMAGE_BYTES {
        return Err(DetectionError::InvalidImage(format!(
            "file too large ({} bytes), max 10MB",
            size_bytes
        )));
    }
    Ok(())
}

impl ImageInput {
    pub fn from_file(path: &Path) -> Result<Self, DetectionError> {
        let mime = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_for_extension)
            .ok_or_else(|| DetectionError::InvalidImage(format!("not an image: {}", path.display())))?;
        let meta = fs::metadata(path)
            .map_err(|e| DetectionError::InvalidImage(format!("{}: {}", path.display(), e)))?;
        check_size(meta.len())?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::File {
            name,
            size_bytes: meta.len(),
            mime: mime.to_string(),
        })
    }

    pub fn pasted(size_bytes: u64) -> Result<Self, DetectionError> {
        check_size(size_bytes)?;
        Ok(Self::Pasted {
            size_bytes,
            mime: "image/png".to_string(),
        })
    }

    pub fn from_url(raw: &str) -> Result<Self, DetectionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DetectionError::InvalidImage("Please enter an image URL.".to_string()));
        }
        let url = Url::parse(raw)
            .map_err(|_| DetectionError::InvalidImage("Please enter a valid image URL.".to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DetectionError::InvalidImage("Please enter a valid image URL.".to_string()));
        }
        Ok(Self::Url(url))
    }

    /// Name shown next to the preview; URLs have none.
    pub fn display_name(&self) -> &str {
        match self {
            Self::File { name, .. } => name,
            Self::Pasted { .. } => PASTED_IMAGE_NAME,
            Self::Url(_) => "",
        }
    }

    /// Length of the base64 data URL the upload would travel as.
    pub fn data_url_len(&self) -> Option<u64> {
        match self {
            Self::File { size_bytes, mime, .. } | Self::Pasted { size_bytes, mime } => {
                let prefix = format!("data:{};base64,", mime).len() as u64;
                Some(prefix + 4 * size_bytes.div_ceil(3))
            }
            Self::Url(_) => None,
        }
    }

    pub fn user_prompt(&self) -> String {
        match self {
            Self::Url(url) => image_url_prompt(url.as_str()),
            _ => image_upload_prompt(self.data_url_len().unwrap_or(0) > HIGH_RES_DATA_URL_LEN),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageAnalysisRequest {
    pub request_id: Uuid,
    pub input: ImageInput,
    pub demo_overrides: bool,
}

impl ImageAnalysisRequest {
    pub fn new(input: ImageInput, demo_overrides: bool) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            input,
            demo_overrides,
        }
    }
}

pub async fn attempt_gateway(
    gateway: &dyn Gateway,
    request: &ImageAnalysisRequest,
) -> Result<RemoteImageVerdict, GatewayError> {
    let value = gateway
        .complete(IMAGE_SYSTEM_PROMPT, &request.input.user_prompt())
        .await?;
    parse_verdict(value)
}

fn attribute_score(attrs: &[ImageAttribute], name: &str) -> Option<f64> {
    attrs.iter().find(|a| a.name == name).map(|a| a.score)
}

/// Known-asset rewrites for the gateway path. Returns true if anything changed.
fn apply_gateway_overrides(name: &str, remote: &mut RemoteImageVerdict) -> bool {
    let name = name.to_lowercase();
    let ai_signature = attribute_score(&remote.attributes, ATTR_AI_SIGNATURE);

    if name.contains("dog") || ai_signature.is_some_and(|s| s >= 60.0) {
        remote.authenticity_score = Some(20.0);
        remote.verdict = Some(AuthenticityBand::Low.label().to_string());
        remote.description = Some("Detected strong AI-generation signals (known test pattern).".to_string());
        return true;
    }

    let entropy = attribute_score(&remote.attributes, ATTR_PIXEL_ENTROPY);
    let exif = attribute_score(&remote.attributes, ATTR_EXIF);
    if let (Some(ai), Some(entropy), Some(exif)) = (ai_signature, entropy, exif) {
        if ai < 20.0 && entropy > 80.0 && exif > 80.0 {
            remote.authenticity_score = Some(95.0);
            remote.verdict = Some(AuthenticityBand::High.label().to_string());
            remote.description = Some("Attributes strongly indicate real photo.".to_string());
            return true;
        }
    }
    false
}

pub fn from_gateway_verdict(request: &ImageAnalysisRequest, mut remote: RemoteImageVerdict) -> ImageAnalysis {
    let overridden = request.demo_overrides && apply_gateway_overrides(request.input.display_name(), &mut remote);

    let score = remote
        .authenticity_score
        .filter(|s| s.is_finite() && *s != 0.0)
        .unwrap_or(DEFAULT_REMOTE_SCORE)
        .clamp(0.0, 100.0)
        .round() as i32;
    let band = AuthenticityBand::from_score(score);

    ImageAnalysis {
        request_id: request.request_id,
        source: AnalysisSource::Gateway,
        authenticity_score: score,
        label: remote
            .verdict
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| band.label().to_string()),
        description: remote
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| band.default_description().to_string()),
        attributes: remote.attributes,
        reasoning: remote.reasoning,
        overridden,
    }
}

/// Placeholder verdict when the gateway is down: a moderately authentic score
/// and plausible-looking attribute bars.
pub fn demo_fallback<R: Rng + ?Sized>(request: &ImageAnalysisRequest, rng: &mut R) -> ImageAnalysis {
    let mut score = rng.gen_range(52..=93);
    let overridden = request.demo_overrides
        && request.input.display_name().eq_ignore_ascii_case(PASTED_IMAGE_NAME);
    if overridden {
        score = 20;
    }
    let band = AuthenticityBand::from_score(score);

    let attributes = [
        (ATTR_PIXEL_ENTROPY, 60..=94),
        (ATTR_COMPRESSION, 40..=84),
        (ATTR_EXIF, 50..=94),
        (ATTR_AI_SIGNATURE, 5..=44),
        (ATTR_EDGE_COHERENCE, 55..=94),
    ]
    .into_iter()
    .map(|(name, range)| ImageAttribute {
        name: name.to_string(),
        score: rng.gen_range(range) as f64,
    })
    .collect();

    ImageAnalysis {
        request_id: request.request_id,
        source: AnalysisSource::Fallback,
        authenticity_score: score,
        label: band.label().to_string(),
        description: band.default_description().to_string(),
        attributes,
        reasoning: None,
        overridden,
    }
}

pub async fn analyze_image<R: Rng + ?Sized>(
    gateway: Option<&dyn Gateway>,
    request: &ImageAnalysisRequest,
    rng: &mut R,
) -> ImageAnalysis {
    info!(
        request_id = %request.request_id,
        name = request.input.display_name(),
        "[IMAGE] analysis started"
    );

    let Some(gateway) = gateway else {
        return demo_fallback(request, rng);
    };

    match attempt_gateway(gateway, request).await {
        Ok(remote) => from_gateway_verdict(request, remote),
        Err(e) => {
            warn!(
                request_id = %request.request_id,
                unavailable = e.is_unavailable(),
                "[IMAGE] gateway failed, using demo verdict: {}",
                e
            );
            demo_fallback(request, rng)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    fn attr(name: &str, score: f64) -> ImageAttribute {
        ImageAttribute {
            name: name.to_string(),
            score,
        }
    }

    fn file_input(name: &str) -> ImageInput {
        ImageInput::File {
            name: name.to_string(),
            size_bytes: 1024,
            mime: "image/png".to_string(),
        }
    }

    #[test]
    fn test_url_validation() {
        assert!(ImageInput::from_url("https://example.com/cat.png").is_ok());
        assert!(ImageInput::from_url("http://example.com/cat.png").is_ok());
        assert!(ImageInput::from_url("ftp://example.com/cat.png").is_err());
        assert!(ImageInput::from_url("not a url").is_err());
        assert!(ImageInput::from_url("   ").is_err());
    }

    #[test]
    fn test_file_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.JPG");
        fs::File::create(&path).unwrap().write_all(&[0u8; 300]).unwrap();
        let input = ImageInput::from_file(&path).unwrap();
        assert_eq!(input.display_name(), "photo.JPG");
        assert!(matches!(input, ImageInput::File { size_bytes: 300, .. }));

        let text = dir.path().join("notes.txt");
        fs::write(&text, "hello").unwrap();
        assert!(ImageInput::from_file(&text).is_err());
        assert!(ImageInput::from_file(&dir.path().join("missing.png")).is_err());
    }

    #[test]
    fn test_size_limit() {
        assert!(ImageInput::pasted(MAX_IMAGE_BYTES).is_ok());
        assert!(ImageInput::pasted(MAX_IMAGE_BYTES + 1).is_err());
    }

    #[test]
    fn test_prompt_resolution_hint() {
        let small = ImageInput::File {
            name: "a.png".to_string(),
            size_bytes: 3000,
            mime: "image/png".to_string(),
        };
        assert!(small.user_prompt().contains("standard"));
        // 22-byte prefix + 4 * (3000 / 3) = 4022
        assert_eq!(small.data_url_len(), Some(4_022));

        let big = ImageInput::pasted(60_000).unwrap();
        assert!(big.user_prompt().contains("high-res"));

        let url = ImageInput::from_url("https://example.com/x.png").unwrap();
        assert!(url.user_prompt().contains("https://example.com/x.png"));
    }

    #[test]
    fn test_gateway_verdict_passthrough() {
        let request = ImageAnalysisRequest::new(file_input("dog.png"), false);
        let remote = RemoteImageVerdict {
            authenticity_score: Some(88.0),
            attributes: vec![attr(ATTR_AI_SIGNATURE, 70.0)],
            ..Default::default()
        };
        let analysis = from_gateway_verdict(&request, remote);
        assert_eq!(analysis.authenticity_score, 88);
        assert_eq!(analysis.label, "High Authenticity");
        assert!(!analysis.overridden);
        assert_eq!(analysis.attributes.len(), 1);
    }

    #[test]
    fn test_gateway_verdict_missing_score_defaults() {
        let request = ImageAnalysisRequest::new(file_input("a.png"), false);
        let analysis = from_gateway_verdict(&request, RemoteImageVerdict::default());
        assert_eq!(analysis.authenticity_score, 50);
        assert_eq!(analysis.label, "Medium Authenticity");
        assert_eq!(analysis.description, AuthenticityBand::Medium.default_description());
    }

    #[test]
    fn test_demo_override_flags_known_asset() {
        let request = ImageAnalysisRequest::new(file_input("My_Dog.png"), true);
        let remote = RemoteImageVerdict {
            authenticity_score: Some(91.0),
            verdict: Some("High Authenticity".to_string()),
            ..Default::default()
        };
        let analysis = from_gateway_verdict(&request, remote);
        assert!(analysis.overridden);
        assert_eq!(analysis.authenticity_score, 20);
        assert_eq!(analysis.label, "Low Authenticity");
    }

    #[test]
    fn test_demo_override_boosts_clean_attributes() {
        let request = ImageAnalysisRequest::new(file_input("beach.png"), true);
        let remote = RemoteImageVerdict {
            authenticity_score: Some(60.0),
            attributes: vec![
                attr(ATTR_AI_SIGNATURE, 10.0),
                attr(ATTR_PIXEL_ENTROPY, 85.0),
                attr(ATTR_EXIF, 90.0),
            ],
            ..Default::default()
        };
        let analysis = from_gateway_verdict(&request, remote);
        assert!(analysis.overridden);
        assert_eq!(analysis.authenticity_score, 95);
        assert_eq!(analysis.label, "High Authenticity");
    }

    #[test]
    fn test_demo_fallback_ranges() {
        let request = ImageAnalysisRequest::new(file_input("beach.png"), false);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let analysis = demo_fallback(&request, &mut rng);
            assert_eq!(analysis.source, AnalysisSource::Fallback);
            assert!((52..=93).contains(&analysis.authenticity_score));
            assert_eq!(analysis.attributes.len(), 5);
            let ai = attribute_score(&analysis.attributes, ATTR_AI_SIGNATURE).unwrap();
            assert!((5.0..=44.0).contains(&ai));
        }
    }

    #[test]
    fn test_demo_fallback_pasted_override_needs_flag() {
        let mut rng = StdRng::seed_from_u64(2);
        let plain = ImageAnalysisRequest::new(ImageInput::pasted(10).unwrap(), false);
        assert!(demo_fallback(&plain, &mut rng).authenticity_score >= 52);

        let flagged = ImageAnalysisRequest::new(ImageInput::pasted(10).unwrap(), true);
        let analysis = demo_fallback(&flagged, &mut rng);
        assert!(analysis.overridden);
        assert_eq!(analysis.authenticity_score, 20);
        assert_eq!(analysis.label, "Low Authenticity");
    }

    #[tokio::test]
    async fn test_analyze_without_gateway_uses_demo() {
        let request = ImageAnalysisRequest::new(ImageInput::from_url("https://example.com/x.png").unwrap(), false);
        let analysis = analyze_image(None, &request, &mut StdRng::seed_from_u64(4)).await;
        assert_eq!(analysis.source, AnalysisSource::Fallback);
    }
}
