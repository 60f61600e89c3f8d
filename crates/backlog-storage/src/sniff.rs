//! Image type detection from magic bytes

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// Image type derived purely from content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffedType {
    Png,
    Jpeg,
    Unrecognized,
}

impl SniffedType {
    pub fn media_type(&self) -> Option<&'static str> {
        match self {
            SniffedType::Png => Some("image/png"),
            SniffedType::Jpeg => Some("image/jpeg"),
            SniffedType::Unrecognized => None,
        }
    }

    pub fn extension(&self) -> Option<&'static str> {
        match self {
            SniffedType::Png => Some("png"),
            SniffedType::Jpeg => Some("jpg"),
            SniffedType::Unrecognized => None,
        }
    }
}

/// Classify `data` by its leading (and for JPEG, trailing) marker bytes.
///
/// A JPEG must end with the EOI marker exactly at the end of the buffer; trailing bytes
/// after EOI make the payload unrecognized.
pub fn sniff(data: &[u8]) -> SniffedType {
    if data.starts_with(&PNG_SIGNATURE) {
        return SniffedType::Png;
    }
    if data.len() >= JPEG_SOI.len() + JPEG_EOI.len()
        && data.starts_with(&JPEG_SOI)
        && data.ends_with(&JPEG_EOI)
    {
        return SniffedType::Jpeg;
    }
    SniffedType::Unrecognized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_signature() {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(b"IHDR");
        assert_eq!(sniff(&data), SniffedType::Png);
        assert_eq!(sniff(&PNG_SIGNATURE), SniffedType::Png);
        assert_eq!(sniff(&PNG_SIGNATURE[..7]), SniffedType::Unrecognized);
    }

    #[test]
    fn test_jpeg_needs_both_markers() {
        assert_eq!(sniff(&[0xFF, 0xD8, 0x00, 0xFF, 0xD9]), SniffedType::Jpeg);
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xD9]), SniffedType::Jpeg);
        assert_eq!(sniff(&[0xFF, 0xD8, 0x00, 0x00]), SniffedType::Unrecognized);
        assert_eq!(
            sniff(&[0xFF, 0xD8, 0xFF, 0xD9, 0x00]),
            SniffedType::Unrecognized
        );
        // truncated
        assert_eq!(sniff(&[0xFF, 0xD8, 0xD9]), SniffedType::Unrecognized);
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(sniff(b""), SniffedType::Unrecognized);
        assert_eq!(sniff(b"not_an_image"), SniffedType::Unrecognized);
        assert_eq!(sniff(b"GIF89a"), SniffedType::Unrecognized);
        assert_eq!(SniffedType::Unrecognized.media_type(), None);
    }

    #[test]
    fn test_media_type_and_extension() {
        assert_eq!(SniffedType::Png.media_type(), Some("image/png"));
        assert_eq!(SniffedType::Jpeg.extension(), Some("jpg"));
    }
}
