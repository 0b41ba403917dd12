//! FFmpeg filter graph definitions for the GIF passes.

use gifbot_models::{CropSpec, GifEncodingConfig};

/// Shared `[crop,]fps,scale` chain. Without a crop the segment is simply
/// omitted, leaving an uncropped but otherwise identical chain.
pub fn base_chain(crop: Option<&CropSpec>, config: &GifEncodingConfig) -> String {
    let scale = format!(
        "fps={},scale={}:-1:flags=lanczos",
        config.fps, config.width
    );
    match crop {
        Some(crop) => format!("{},{}", crop.to_filter(), scale),
        None => scale,
    }
}

/// Palette pass filter.
pub fn palette_filter(crop: Option<&CropSpec>, config: &GifEncodingConfig) -> String {
    format!("{},palettegen=stats_mode=diff", base_chain(crop, config))
}

/// Render pass filter graph. Input 0 is the source, input 1 the palette.
pub fn render_filter(crop: Option<&CropSpec>, config: &GifEncodingConfig) -> String {
    format!(
        "{} [x]; [x][1:v] paletteuse=dither=bayer:bayer_scale={}",
        base_chain(crop, config),
        config.bayer_scale
    )
}

/// Black-bar detection filter.
pub fn cropdetect_filter(config: &GifEncodingConfig) -> String {
    format!(
        "cropdetect=limit={}:round={}:reset={}",
        config.crop_limit, config.crop_round, config.crop_reset
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_without_crop() {
        let config = GifEncodingConfig::default();
        assert_eq!(base_chain(None, &config), "fps=10,scale=320:-1:flags=lanczos");
        assert!(!palette_filter(None, &config).contains("crop"));
    }

    #[test]
    fn test_chain_with_crop() {
        let config = GifEncodingConfig::default().with_fps(15).with_width(480);
        let crop = CropSpec::new(1280, 544, 0, 88).unwrap();
        assert_eq!(
            palette_filter(Some(&crop), &config),
            "crop=1280:544:0:88,fps=15,scale=480:-1:flags=lanczos,palettegen=stats_mode=diff"
        );
        assert_eq!(
            render_filter(Some(&crop), &config),
            "crop=1280:544:0:88,fps=15,scale=480:-1:flags=lanczos [x]; [x][1:v] paletteuse=dither=bayer:bayer_scale=5"
        );
    }

    #[test]
    fn test_cropdetect_filter() {
        let config = GifEncodingConfig::default();
        assert_eq!(cropdetect_filter(&config), "cropdetect=limit=24:round=16:reset=0");
    }

    #[test]
    fn test_cropdetect_filter_uses_configured_reset() {
        let config = GifEncodingConfig {
            crop_reset: 30,
            ..GifEncodingConfig::default()
        };
        assert_eq!(cropdetect_filter(&config), "cropdetect=limit=24:round=16:reset=30");
    }
}
