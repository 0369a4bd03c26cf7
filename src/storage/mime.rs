//! Audio content-type helpers shared by the upload policy and the
//! transcriber's provider re-upload.

const DEFAULT_AUDIO_MIME: &str = "audio/m4a";

/// Sniff an audio container from its leading bytes.
pub fn detect_audio_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x49, 0x44, 0x33, ..] => Some("audio/mpeg"),
        [0xFF, 0xFB | 0xF3 | 0xF2, ..] => Some("audio/mpeg"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x41, 0x56, 0x45, ..] => Some("audio/wav"),
        [0x4F, 0x67, 0x67, 0x53, ..] => Some("audio/ogg"),
        [0x1A, 0x45, 0xDF, 0xA3, ..] => Some("audio/webm"),
        [_, _, _, _, 0x66, 0x74, 0x79, 0x70, ..] => Some("audio/mp4"),
        _ => None,
    }
}

/// Canonical extension (without the dot) for an audio MIME type.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let essence = mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" | "audio/aac" => Some("m4a"),
        "audio/mpeg" | "audio/mp3" | "audio/mpeg3" | "audio/x-mpeg-3" => Some("mp3"),
        "audio/wav" | "audio/wave" | "audio/x-wav" | "audio/vnd.wave" => Some("wav"),
        "audio/ogg" | "audio/opus" | "application/ogg" => Some("ogg"),
        "audio/webm" | "video/webm" => Some("webm"),
        _ => None,
    }
}

pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "m4a" => Some("audio/m4a"),
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "ogg" => Some("audio/ogg"),
        "webm" => Some("audio/webm"),
        _ => None,
    }
}

/// Best-effort content type for stored audio: bytes first, then the file
/// extension, then a generic m4a fallback.
pub fn resolve_audio_mime(bytes: &[u8], file_name: &str) -> &'static str {
    if let Some(mime) = detect_audio_mime(bytes) {
        return mime;
    }
    let from_extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(mime_for_extension);
    match from_extension {
        Some(mime) => mime,
        None => {
            tracing::warn!(
                "Unrecognized audio format for {} (first 4 bytes: {:02X?}), falling back to {}",
                file_name,
                &bytes[..bytes.len().min(4)],
                DEFAULT_AUDIO_MIME
            );
            DEFAULT_AUDIO_MIME
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_mp3_with_id3() {
        assert_eq!(detect_audio_mime(b"ID3\x04\x00"), Some("audio/mpeg"));
    }

    #[test]
    fn test_detect_wav() {
        assert_eq!(detect_audio_mime(b"RIFF\x24\x00\x00\x00WAVEfmt "), Some("audio/wav"));
    }

    #[test]
    fn test_detect_ogg_and_webm() {
        assert_eq!(detect_audio_mime(b"OggS\x00\x02"), Some("audio/ogg"));
        assert_eq!(
            detect_audio_mime(&[0x1A, 0x45, 0xDF, 0xA3, 0x01]),
            Some("audio/webm")
        );
    }

    #[test]
    fn test_detect_m4a_ftyp_box() {
        assert_eq!(
            detect_audio_mime(b"\x00\x00\x00\x20ftypM4A "),
            Some("audio/mp4")
        );
    }

    #[test]
    fn test_unknown_bytes() {
        assert_eq!(detect_audio_mime(&[0x00, 0x01, 0x02, 0x03]), None);
        assert_eq!(detect_audio_mime(&[]), None);
    }

    #[test]
    fn test_extension_for_mime_ignores_parameters() {
        assert_eq!(extension_for_mime("audio/webm;codecs=opus"), Some("webm"));
        assert_eq!(extension_for_mime("Audio/X-M4A"), Some("m4a"));
        assert_eq!(extension_for_mime("text/plain"), None);
    }

    #[test]
    fn test_resolve_falls_back_to_extension_then_default() {
        assert_eq!(resolve_audio_mime(b"????", "clip.wav"), "audio/wav");
        assert_eq!(resolve_audio_mime(b"????", "clip"), "audio/m4a");
        assert_eq!(resolve_audio_mime(b"OggS", "clip.wav"), "audio/ogg");
    }
}
