// ============================================================================
// IMAGE I/O — decoding source images, encoding rendered frames
// ============================================================================
//
// The effects core never touches the filesystem; these helpers sit at the
// CLI boundary. Decoding accepts anything the image crate recognizes and
// normalizes to 8-bit RGBA. Encoding covers the still-image formats.
// ============================================================================

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tga::TgaEncoder;
use image::{DynamicImage, ImageError, RgbaImage};

/// Supported export formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Webp,
    Bmp,
    Tga,
}

impl SaveFormat {
    /// Canonical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Webp => "webp",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Tga => "tga",
        }
    }

    /// Parse a format name (as given on the command line). Unknown names
    /// default to PNG.
    pub fn from_name(name: &str) -> SaveFormat {
        match name.to_lowercase().as_str() {
            "jpeg" | "jpg" => SaveFormat::Jpeg,
            "webp" => SaveFormat::Webp,
            "bmp" => SaveFormat::Bmp,
            "tga" => SaveFormat::Tga,
            _ => SaveFormat::Png,
        }
    }

    /// Infer the format from a file extension. Unknown extensions default
    /// to PNG.
    pub fn from_path(path: &Path) -> SaveFormat {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        SaveFormat::from_name(&ext)
    }
}

/// Decode an image file into an 8-bit RGBA buffer.
pub fn load_image(path: &Path) -> Result<RgbaImage, String> {
    let img = image::open(path)
        .map_err(|e| format!("could not decode '{}': {}", path.display(), e))?;
    Ok(img.into_rgba8())
}

/// Encode a rendered frame and write it to disk.
pub fn encode_and_write(
    image: &RgbaImage,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), ImageError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match format {
        SaveFormat::Png => {
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Jpeg => {
            // JPEG has no alpha channel — flatten first.
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            encoder.encode(
                rgb_image.as_raw(),
                rgb_image.width(),
                rgb_image.height(),
                image::ColorType::Rgb8,
            )?;
        }
        SaveFormat::Webp => {
            let dyn_img = DynamicImage::ImageRgba8(image.clone());
            dyn_img.save(path)?;
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Tga => {
            let encoder = TgaEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn format_names_and_extensions_round_trip() {
        for fmt in [SaveFormat::Png, SaveFormat::Jpeg, SaveFormat::Webp, SaveFormat::Bmp, SaveFormat::Tga] {
            assert_eq!(SaveFormat::from_name(fmt.extension()), fmt);
        }
        assert_eq!(SaveFormat::from_name("JPEG"), SaveFormat::Jpeg);
        assert_eq!(SaveFormat::from_name("mystery"), SaveFormat::Png);
        assert_eq!(SaveFormat::from_path(Path::new("out.BMP")), SaveFormat::Bmp);
        assert_eq!(SaveFormat::from_path(Path::new("noext")), SaveFormat::Png);
    }

    #[test]
    fn png_write_then_load_round_trips_pixels() {
        let dir = std::env::temp_dir().join("glitchlab-io-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("roundtrip.png");

        let mut img = RgbaImage::new(4, 3);
        for (i, px) in img.pixels_mut().enumerate() {
            *px = Rgba([i as u8 * 20, 255 - i as u8 * 10, i as u8, 255]);
        }
        encode_and_write(&img, &path, SaveFormat::Png, 90).unwrap();
        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded, img);
    }

    #[test]
    fn load_rejects_missing_files_with_a_message() {
        let err = load_image(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(err.contains("could not decode"));
    }
}
