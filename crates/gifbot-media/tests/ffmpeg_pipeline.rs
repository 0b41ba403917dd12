//! End-to-end encoder tests against a real ffmpeg.
//!
//! Run with `cargo test -p gifbot-media -- --ignored`.

use std::path::Path;
use std::time::Duration;

use gifbot_media::{detect_crop, tools, FfmpegCommand, FfmpegRunner, GifEncoder, RenderOutcome};
use gifbot_models::{GifEncodingConfig, Segment};
use tempfile::TempDir;

fn runner() -> FfmpegRunner {
    let ffmpeg = tools::locate(tools::FFMPEG, None).expect("ffmpeg on PATH");
    FfmpegRunner::new(ffmpeg).with_timeout(Duration::from_secs(60))
}

/// 4s of test pattern, 320x180 centered in 320x240 with black bars.
async fn letterboxed_source(dir: &Path) -> std::path::PathBuf {
    let out = dir.join("letterboxed.mp4");
    let cmd = FfmpegCommand::new("testsrc=size=320x180:rate=25:duration=4", &out)
        .input_arg("-f")
        .input_arg("lavfi")
        .video_filter("pad=320:240:0:30:black")
        .output_arg("-pix_fmt")
        .output_arg("yuv420p");
    runner().run_checked(&cmd).await.unwrap();
    out
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn detects_letterbox() {
    let dir = TempDir::new().unwrap();
    let source = letterboxed_source(dir.path()).await;
    let input = source.to_string_lossy();
    let segment = Segment {
        input: &input,
        start_secs: 1,
        duration_secs: 2,
        crop: None,
    };

    let crop = detect_crop(&runner(), &segment, &GifEncodingConfig::default())
        .await
        .expect("crop detected");
    assert_eq!(crop.width(), 320);
    assert!(crop.height() <= 192 && crop.height() >= 176, "{}", crop);
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn same_request_gives_same_size() {
    let dir = TempDir::new().unwrap();
    let source = letterboxed_source(dir.path()).await;
    let input = source.to_string_lossy();
    let segment = Segment {
        input: &input,
        start_secs: 0,
        duration_secs: 3,
        crop: None,
    };
    let encoder = GifEncoder::new(runner(), GifEncodingConfig::default());

    let mut sizes = Vec::new();
    for i in 0..2 {
        let palette = dir.path().join(format!("palette{}.png", i));
        let gif = dir.path().join(format!("out{}.gif", i));
        encoder.generate_palette(&segment, &palette).await.unwrap();
        let encoded = encoder
            .render(&segment, &palette, &gif, 9_961_472)
            .await
            .unwrap();
        assert_eq!(encoded.outcome, RenderOutcome::Completed);
        sizes.push(encoded.size_bytes);
    }
    assert_eq!(sizes[0], sizes[1]);
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn tiny_ceiling_still_yields_a_file() {
    let dir = TempDir::new().unwrap();
    let source = letterboxed_source(dir.path()).await;
    let input = source.to_string_lossy();
    let segment = Segment {
        input: &input,
        start_secs: 0,
        duration_secs: 4,
        crop: None,
    };
    let encoder = GifEncoder::new(runner(), GifEncodingConfig::default());
    let palette = dir.path().join("palette.png");
    let gif = dir.path().join("out.gif");

    encoder.generate_palette(&segment, &palette).await.unwrap();
    let encoded = encoder.render(&segment, &palette, &gif, 20_000).await.unwrap();
    assert!(encoded.size_bytes > 0);
    assert!(encoded.size_bytes < 200_000);
}
