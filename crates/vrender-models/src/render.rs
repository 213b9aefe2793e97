//! Render API payloads.

use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationErrors};

use crate::{ClipSpec, ExportPreset, JobId, RenderJob};

/// Message returned when a render is submitted without clips.
pub const CLIPS_REQUIRED: &str = "clips[] required";

/// Body of `POST /api/render/start`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RenderStartRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(min = 1, message = "clips[] required"))]
    pub clips: Vec<ClipSpec>,
    /// Expected output duration in seconds (drives progress)
    #[serde(default)]
    pub duration: Option<f64>,
    /// Export preset name; unknown names use the default encode
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub burn_in_captions: bool,
    /// SRT document to burn in
    #[serde(default)]
    pub srt_content: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ClipSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ClipSpec>>::deserialize(deserializer)?.unwrap_or_default())
}

impl RenderStartRequest {
    /// Validate the request and every clip in it.
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        self.validate()?;
        for clip in &self.clips {
            clip.validate()?;
        }
        Ok(())
    }

    pub fn export_preset(&self) -> Option<ExportPreset> {
        ExportPreset::from_name(self.preset.as_deref())
    }

    /// Subtitle document to write, only when burn-in is requested and non-blank.
    pub fn subtitle_content(&self) -> Option<&str> {
        if !self.burn_in_captions {
            return None;
        }
        self.srt_content.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Response of `POST /api/render/start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderStartResponse {
    pub ok: bool,
    pub job_id: JobId,
}

/// Response of `GET /api/render/status/:jobId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub ok: bool,
    pub job: RenderJob,
}

/// Body of the synchronous `POST /api/render`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRenderRequest {
    /// Single source to render
    #[serde(default)]
    pub input_url: Option<String>,
    /// Seek position in seconds (single source only)
    #[serde(default)]
    pub start: f64,
    /// End position in seconds (single source only)
    #[serde(default)]
    pub end: f64,
    /// -100..100, mapped onto eq brightness -1..1
    #[serde(default)]
    pub brightness: f64,
    #[serde(default = "default_contrast")]
    pub contrast: f64,
    /// Degrees clockwise
    #[serde(default)]
    pub rotate: f64,
    /// Overlay text
    #[serde(default)]
    pub text: Option<String>,
    /// Multi-clip concat; takes precedence over `input_url`
    #[serde(default)]
    pub clips: Option<Vec<ClipSpec>>,
}

fn default_contrast() -> f64 {
    1.0
}

impl Default for LegacyRenderRequest {
    fn default() -> Self {
        Self {
            input_url: None,
            start: 0.0,
            end: 0.0,
            brightness: 0.0,
            contrast: default_contrast(),
            rotate: 0.0,
            text: None,
            clips: None,
        }
    }
}

impl LegacyRenderRequest {
    /// Non-empty clip list, if any.
    pub fn clip_list(&self) -> Option<&[ClipSpec]> {
        self.clips.as_deref().filter(|c| !c.is_empty())
    }

    /// Non-blank single input, if any.
    pub fn single_input(&self) -> Option<&str> {
        self.input_url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// Trimmed duration of the single input, zero when untrimmed.
    pub fn single_duration(&self) -> f64 {
        if self.end > self.start {
            self.end - self.start
        } else {
            0.0
        }
    }
}

/// Response of the synchronous `POST /api/render`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyRenderResponse {
    pub ok: bool,
    /// Output file name
    pub file: String,
    /// Public URL of the output
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_clips_fail_validation() {
        let req: RenderStartRequest = serde_json::from_str(r#"{"clips":[]}"#).unwrap();
        let err = req.validate().unwrap_err();
        let field = &err.field_errors()["clips"];
        assert_eq!(field[0].message.as_deref(), Some(CLIPS_REQUIRED));
    }

    #[test]
    fn test_missing_clips_fail_validation() {
        let req: RenderStartRequest = serde_json::from_str("{}").unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_null_clips_fail_validation() {
        let req: RenderStartRequest = serde_json::from_str(r#"{"clips":null}"#).unwrap();
        assert!(req.clips.is_empty());
        assert!(req.validate_all().is_err());
    }

    #[test]
    fn test_blank_clip_url_fails_validation() {
        let req: RenderStartRequest = serde_json::from_str(r#"{"clips":[{"url":""}]}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.validate_all().is_err());
    }

    #[test]
    fn test_valid_request() {
        let req: RenderStartRequest = serde_json::from_str(
            r#"{"clips":[{"url":"a.mp4"},{"url":"b.mp4"}],"duration":20,"preset":"youtube"}"#,
        )
        .unwrap();
        assert!(req.validate_all().is_ok());
        assert_eq!(req.export_preset(), Some(ExportPreset::Youtube));
        assert_eq!(req.duration, Some(20.0));
    }

    #[test]
    fn test_subtitle_content_requires_burn_in() {
        let mut req = RenderStartRequest {
            clips: vec![ClipSpec::new("a.mp4")],
            srt_content: Some("1\n00:00:00,000 --> 00:00:01,000\nhi\n".into()),
            ..Default::default()
        };
        assert!(req.subtitle_content().is_none());

        req.burn_in_captions = true;
        assert!(req.subtitle_content().is_some());

        req.srt_content = Some("   \n".into());
        assert!(req.subtitle_content().is_none());
    }

    #[test]
    fn test_start_response_uses_job_id_key() {
        let resp = RenderStartResponse {
            ok: true,
            job_id: JobId::from_string("job_1"),
        };
        let value = serde_json::to_value(resp).unwrap();
        assert_eq!(value["jobId"], "job_1");
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn test_legacy_defaults() {
        let req: LegacyRenderRequest = serde_json::from_str(r#"{"inputUrl":"a.mp4"}"#).unwrap();
        assert_eq!(req.contrast, 1.0);
        assert_eq!(req.single_input(), Some("a.mp4"));
        assert!(req.clip_list().is_none());
        assert_eq!(req.single_duration(), 0.0);
    }
}
