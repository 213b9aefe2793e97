//! Render argument plans.
//!
//! Pure builders turning clip lists and options into FFmpeg commands.
//! Nothing here spawns a process.

use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use vrender_models::encoding::{
    DEFAULT_AUDIO_CODEC, DEFAULT_PIX_FMT, DEFAULT_VIDEO_CODEC, DEFAULT_X264_PRESET,
    FASTSTART_MOVFLAGS, LOSSLESS_CRF, LOSSLESS_X264_PRESET,
};
use vrender_models::{ClipSpec, ExportPreset, LegacyRenderRequest};

use crate::command::{FfmpegCommand, FfmpegInput};
use crate::error::{MediaError, MediaResult};
use crate::filters::{join_filters, Filter, FilterChain, FilterGraph, Transpose};

/// Font size of the legacy text overlay.
const OVERLAY_FONT_SIZE: u32 = 36;

/// Export options for a tracked render.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub preset: Option<ExportPreset>,
    pub burn_in_captions: bool,
    /// Subtitle file to burn in (only used with `burn_in_captions`)
    pub subtitle_path: Option<PathBuf>,
}

/// Unique output file name (`render_<unix-ms>_<8 hex>.mp4`).
pub fn output_file_name() -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("render_{}_{}.mp4", Utc::now().timestamp_millis(), &salt[..8])
}

/// Input for a clip, with trim flags adjacent to the source.
fn clip_input(clip: &ClipSpec) -> FfmpegInput {
    match clip.trim_range() {
        Some((start, end)) => FfmpegInput::new(&clip.url).seek(start).until(end),
        None => FfmpegInput::new(&clip.url),
    }
}

/// Concat every clip's video+audio into `[v][a]`, then chain `post` video
/// filters into `[vout]` when there are any.
///
/// Returns the graph and the label of the final video stream.
fn concat_graph(clip_count: usize, post: Vec<Filter>) -> (FilterGraph, &'static str) {
    let mut concat = FilterChain::new();
    for i in 0..clip_count {
        concat = concat.input(format!("{}:v", i)).input(format!("{}:a", i));
    }
    let concat = concat
        .filter(Filter::Concat {
            segments: clip_count,
            video: 1,
            audio: 1,
        })
        .output("v")
        .output("a");

    let graph = FilterGraph::new().chain(concat);
    if post.is_empty() {
        return (graph, "v");
    }

    let graph = graph.chain(FilterChain::new().input("v").filters(post).output("vout"));
    (graph, "vout")
}

/// Video/audio codec arguments for a preset.
pub fn apply_encoding(cmd: FfmpegCommand, preset: Option<ExportPreset>) -> FfmpegCommand {
    let cmd = cmd.video_codec(DEFAULT_VIDEO_CODEC);
    let cmd = match preset {
        Some(ExportPreset::Lossless) => cmd.crf(LOSSLESS_CRF).preset(LOSSLESS_X264_PRESET),
        Some(p) => match p.spec().video_bitrate {
            Some(bitrate) => cmd.video_bitrate(bitrate),
            None => cmd.preset(DEFAULT_X264_PRESET),
        },
        None => cmd.preset(DEFAULT_X264_PRESET),
    };
    cmd.pix_fmt(DEFAULT_PIX_FMT)
        .audio_codec(DEFAULT_AUDIO_CODEC)
        .movflags(FASTSTART_MOVFLAGS)
}

/// Build the tracked multi-clip render command.
pub fn build_render_command(
    clips: &[ClipSpec],
    options: &RenderOptions,
    output: &Path,
) -> MediaResult<FfmpegCommand> {
    if clips.is_empty() {
        return Err(MediaError::EmptyClipList);
    }

    let mut cmd = FfmpegCommand::new(output);
    for clip in clips {
        cmd = cmd.input(clip_input(clip));
    }

    let mut post = Vec::new();
    if let Some((width, height)) = options.preset.and_then(|p| p.spec().canvas()) {
        post.extend(Filter::fit_canvas(width, height));
    }
    if options.burn_in_captions {
        if let Some(path) = &options.subtitle_path {
            post.push(Filter::subtitles(path));
        }
    }

    let (graph, video) = concat_graph(clips.len(), post);
    let cmd = cmd.filter_complex(&graph).map(video).map("a");

    Ok(apply_encoding(cmd, options.preset))
}

/// Argument vector for the tracked multi-clip render.
pub fn build_render_args(
    clips: &[ClipSpec],
    options: &RenderOptions,
    output: &Path,
) -> MediaResult<Vec<String>> {
    Ok(build_render_command(clips, options, output)?.build_args())
}

/// Filters for a clockwise rotation in degrees.
///
/// Quarter turns use lossless transposes/flips; other angles use `rotate`.
pub fn rotation_filters(degrees: f64) -> Vec<Filter> {
    let normalized = degrees.rem_euclid(360.0);
    if normalized == 0.0 {
        return Vec::new();
    }
    if normalized == 90.0 {
        vec![Filter::Transpose(Transpose::Clockwise)]
    } else if normalized == 180.0 {
        vec![Filter::HFlip, Filter::VFlip]
    } else if normalized == 270.0 {
        vec![Filter::Transpose(Transpose::CounterClockwise)]
    } else {
        vec![Filter::Rotate {
            radians: degrees.to_radians(),
        }]
    }
}

/// `eq` filter for UI brightness (-100..100) and contrast, if not neutral.
pub fn eq_filter(brightness: f64, contrast: f64) -> Option<Filter> {
    let brightness = (brightness / 100.0).clamp(-1.0, 1.0);
    let contrast = contrast.max(0.0);
    (brightness != 0.0 || contrast != 1.0).then_some(Filter::Eq {
        brightness,
        contrast,
    })
}

/// Per-request filters of the synchronous render, in application order.
pub fn legacy_video_filters(req: &LegacyRenderRequest) -> Vec<Filter> {
    let mut filters = rotation_filters(req.rotate);
    filters.extend(eq_filter(req.brightness, req.contrast));
    if let Some(text) = req.text.as_deref().filter(|t| !t.trim().is_empty()) {
        filters.push(Filter::DrawText {
            text: text.to_string(),
            font_size: OVERLAY_FONT_SIZE,
        });
    }
    filters
}

fn apply_legacy_encoding(cmd: FfmpegCommand) -> FfmpegCommand {
    cmd.video_codec(DEFAULT_VIDEO_CODEC)
        .pix_fmt(DEFAULT_PIX_FMT)
        .audio_codec(DEFAULT_AUDIO_CODEC)
        .movflags(FASTSTART_MOVFLAGS)
}

/// Build the synchronous render command.
///
/// A non-empty `clips` list is concatenated; otherwise `input_url` is
/// rendered alone with its optional `start`/`end` window.
pub fn build_legacy_command(req: &LegacyRenderRequest, output: &Path) -> MediaResult<FfmpegCommand> {
    let filters = legacy_video_filters(req);

    if let Some(clips) = req.clip_list() {
        let mut cmd = FfmpegCommand::new(output);
        for clip in clips {
            cmd = cmd.input(clip_input(clip));
        }
        let (graph, video) = concat_graph(clips.len(), filters);
        let cmd = cmd.filter_complex(&graph).map(video).map("a");
        return Ok(apply_legacy_encoding(cmd));
    }

    let source = req.single_input().ok_or(MediaError::MissingInput)?;
    let mut input = FfmpegInput::new(source);
    if req.start > 0.0 {
        input = input.seek(req.start);
    }
    let duration = req.single_duration();
    if duration > 0.0 {
        input = input.duration(duration);
    }

    let mut cmd = FfmpegCommand::new(output).input(input);
    if !filters.is_empty() {
        cmd = cmd.video_filter(join_filters(&filters));
    }
    Ok(apply_legacy_encoding(cmd))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_clips() -> Vec<ClipSpec> {
        vec![ClipSpec::new("a.mp4"), ClipSpec::new("b.mp4")]
    }

    fn arg_after<'a>(args: &'a [String], flag: &str) -> &'a str {
        let pos = args.iter().position(|a| a == flag).unwrap();
        &args[pos + 1]
    }

    #[test]
    fn test_empty_clip_list_is_rejected() {
        let err = build_render_args(&[], &RenderOptions::default(), Path::new("o.mp4")).unwrap_err();
        assert!(matches!(err, MediaError::EmptyClipList));
    }

    #[test]
    fn test_one_input_per_clip() {
        for n in 1..=5 {
            let clips: Vec<_> = (0..n).map(|i| ClipSpec::new(format!("c{}.mp4", i))).collect();
            let args = build_render_args(&clips, &RenderOptions::default(), Path::new("o.mp4")).unwrap();
            assert_eq!(args.iter().filter(|a| *a == "-i").count(), n);
        }
    }

    #[test]
    fn test_trim_flags_adjacent_to_input() {
        let clips = vec![
            ClipSpec::new("a.mp4").with_range(1.5, 4.0),
            ClipSpec::new("b.mp4"),
            ClipSpec::new("c.mp4").with_range(6.0, 2.0),
        ];
        let args = build_render_args(&clips, &RenderOptions::default(), Path::new("o.mp4")).unwrap();
        assert_eq!(
            &args[..12],
            &["-y", "-ss", "1.5", "-to", "4", "-i", "a.mp4", "-i", "b.mp4", "-i", "c.mp4", "-filter_complex"]
        );
    }

    #[test]
    fn test_default_render_args() {
        let args = build_render_args(&two_clips(), &RenderOptions::default(), Path::new("/out/o.mp4")).unwrap();
        assert_eq!(
            args,
            vec![
                "-y",
                "-i",
                "a.mp4",
                "-i",
                "b.mp4",
                "-filter_complex",
                "[0:v][0:a][1:v][1:a]concat=n=2:v=1:a=1[v][a]",
                "-map",
                "[v]",
                "-map",
                "[a]",
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-pix_fmt",
                "yuv420p",
                "-c:a",
                "aac",
                "-movflags",
                "+faststart",
                "/out/o.mp4",
            ]
        );
    }

    #[test]
    fn test_resize_presets_end_with_fixed_canvas() {
        for (preset, (w, h)) in [
            (ExportPreset::Tiktok916, (1080, 1920)),
            (ExportPreset::InstagramSquare, (1080, 1080)),
            (ExportPreset::Youtube, (1920, 1080)),
        ] {
            let options = RenderOptions {
                preset: Some(preset),
                ..Default::default()
            };
            let args = build_render_args(&two_clips(), &options, Path::new("o.mp4")).unwrap();
            let graph = arg_after(&args, "-filter_complex");
            let expected_tail = format!(
                "[v]scale=w={w}:h={h}:force_original_aspect_ratio=decrease,pad={w}:{h}:({w}-iw)/2:({h}-ih)/2:black[vout]"
            );
            assert!(graph.ends_with(&expected_tail), "{}", graph);
            assert_eq!(arg_after(&args, "-map"), "[vout]");
        }
    }

    #[test]
    fn test_instagram_square_from_landscape_source() {
        let options = RenderOptions {
            preset: Some(ExportPreset::InstagramSquare),
            ..Default::default()
        };
        let clips = vec![ClipSpec::new("landscape_1920x1080.mp4")];
        let args = build_render_args(&clips, &options, Path::new("o.mp4")).unwrap();
        let graph = arg_after(&args, "-filter_complex");
        assert!(graph.contains("scale=w=1080:h=1080:force_original_aspect_ratio=decrease"));
        assert!(graph.contains("pad=1080:1080:(1080-iw)/2:(1080-ih)/2:black"));
        assert_eq!(arg_after(&args, "-b:v"), "5000k");
    }

    #[test]
    fn test_codec_selection() {
        let lossless = build_render_args(
            &two_clips(),
            &RenderOptions {
                preset: Some(ExportPreset::Lossless),
                ..Default::default()
            },
            Path::new("o.mp4"),
        )
        .unwrap();
        assert_eq!(arg_after(&lossless, "-crf"), "0");
        assert_eq!(arg_after(&lossless, "-preset"), "veryslow");
        assert_eq!(arg_after(&lossless, "-map"), "[v]");

        let youtube = build_render_args(
            &two_clips(),
            &RenderOptions {
                preset: Some(ExportPreset::Youtube),
                ..Default::default()
            },
            Path::new("o.mp4"),
        )
        .unwrap();
        assert_eq!(arg_after(&youtube, "-b:v"), "8000k");
        assert!(!youtube.contains(&"-preset".to_string()));
        assert_eq!(arg_after(&youtube, "-c:a"), "aac");
        assert_eq!(arg_after(&youtube, "-movflags"), "+faststart");
    }

    #[test]
    fn test_subtitles_after_scaling() {
        let options = RenderOptions {
            preset: Some(ExportPreset::Tiktok916),
            burn_in_captions: true,
            subtitle_path: Some(PathBuf::from("C:\\up\\captions_1.srt")),
        };
        let args = build_render_args(&two_clips(), &options, Path::new("o.mp4")).unwrap();
        let graph = arg_after(&args, "-filter_complex");
        assert!(graph.ends_with(":black,subtitles='C\\:/up/captions_1.srt'[vout]"), "{}", graph);
    }

    #[test]
    fn test_subtitles_need_burn_in_flag_and_path() {
        let without_flag = RenderOptions {
            subtitle_path: Some(PathBuf::from("/tmp/c.srt")),
            ..Default::default()
        };
        let args = build_render_args(&two_clips(), &without_flag, Path::new("o.mp4")).unwrap();
        assert!(!arg_after(&args, "-filter_complex").contains("subtitles"));

        let without_path = RenderOptions {
            burn_in_captions: true,
            ..Default::default()
        };
        let args = build_render_args(&two_clips(), &without_path, Path::new("o.mp4")).unwrap();
        assert!(!arg_after(&args, "-filter_complex").contains("subtitles"));
        assert_eq!(arg_after(&args, "-map"), "[v]");
    }

    #[test]
    fn test_output_file_names_are_unique() {
        let a = output_file_name();
        let b = output_file_name();
        assert_ne!(a, b);
        assert!(a.starts_with("render_") && a.ends_with(".mp4"));
    }

    #[test]
    fn test_rotation_filters() {
        assert!(rotation_filters(0.0).is_empty());
        assert!(rotation_filters(360.0).is_empty());
        assert_eq!(rotation_filters(90.0), vec![Filter::Transpose(Transpose::Clockwise)]);
        assert_eq!(rotation_filters(-90.0), vec![Filter::Transpose(Transpose::CounterClockwise)]);
        assert_eq!(rotation_filters(180.0), vec![Filter::HFlip, Filter::VFlip]);
        assert!(matches!(rotation_filters(45.0).as_slice(), [Filter::Rotate { .. }]));
    }

    #[test]
    fn test_eq_filter() {
        assert!(eq_filter(0.0, 1.0).is_none());
        assert_eq!(
            eq_filter(250.0, -2.0),
            Some(Filter::Eq {
                brightness: 1.0,
                contrast: 0.0
            })
        );
        assert_eq!(
            eq_filter(-50.0, 1.0),
            Some(Filter::Eq {
                brightness: -0.5,
                contrast: 1.0
            })
        );
    }

    #[test]
    fn test_legacy_single_input() {
        let req = LegacyRenderRequest {
            input_url: Some("a.mp4".into()),
            start: 2.0,
            end: 7.0,
            rotate: 90.0,
            ..Default::default()
        };
        let args = build_legacy_command(&req, Path::new("o.mp4")).unwrap().build_args();
        assert_eq!(
            args,
            vec![
                "-y", "-ss", "2", "-i", "a.mp4", "-t", "5", "-vf", "transpose=1", "-c:v", "libx264",
                "-pix_fmt", "yuv420p", "-c:a", "aac", "-movflags", "+faststart", "o.mp4"
            ]
        );
    }

    #[test]
    fn test_legacy_clips_take_precedence() {
        let req = LegacyRenderRequest {
            input_url: Some("ignored.mp4".into()),
            clips: Some(two_clips()),
            text: Some("Hello".into()),
            ..Default::default()
        };
        let args = build_legacy_command(&req, Path::new("o.mp4")).unwrap().build_args();
        assert!(!args.contains(&"ignored.mp4".to_string()));
        let graph = arg_after(&args, "-filter_complex");
        assert!(graph.starts_with("[0:v][0:a][1:v][1:a]concat=n=2:v=1:a=1[v][a];[v]drawtext=text='Hello'"));
        assert_eq!(arg_after(&args, "-map"), "[vout]");
    }

    #[test]
    fn test_legacy_requires_input() {
        let req = LegacyRenderRequest {
            clips: Some(Vec::new()),
            ..Default::default()
        };
        let err = build_legacy_command(&req, Path::new("o.mp4")).unwrap_err();
        assert!(matches!(err, MediaError::MissingInput));
    }
}
