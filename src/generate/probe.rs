//! Response-shape probing for generation providers.
//!
//! Providers move the artifact URL around between models and API versions.
//! Each provider gets an ordered list of locations; the first one holding a
//! non-empty string wins.

use serde_json::Value;

#[derive(Debug, Clone, Copy)]
pub struct UrlProbe {
    /// Human-readable location, used in logs.
    pub label: &'static str,
    /// JSON pointer to the candidate string.
    pub pointer: &'static str,
}

impl UrlProbe {
    pub fn extract<'a>(&self, output: &'a Value) -> Option<&'a str> {
        output
            .pointer(self.pointer)?
            .as_str()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

pub const FAL_IMAGE_PROBES: &[UrlProbe] = &[
    UrlProbe {
        label: "images[0].url",
        pointer: "/images/0/url",
    },
    UrlProbe {
        label: "data.images[0].url",
        pointer: "/data/images/0/url",
    },
    UrlProbe {
        label: "image.url",
        pointer: "/image/url",
    },
    UrlProbe {
        label: "url",
        pointer: "/url",
    },
];

pub const FAL_VIDEO_PROBES: &[UrlProbe] = &[
    UrlProbe {
        label: "video.url",
        pointer: "/video/url",
    },
    UrlProbe {
        label: "data.video.url",
        pointer: "/data/video/url",
    },
    UrlProbe {
        label: "output[0].url",
        pointer: "/output/0/url",
    },
    UrlProbe {
        label: "url",
        pointer: "/url",
    },
];

/// First URL found by `probes`, with the label of the probe that matched.
pub fn first_url<'a>(probes: &[UrlProbe], output: &'a Value) -> Option<(&'static str, &'a str)> {
    probes
        .iter()
        .find_map(|probe| probe.extract(output).map(|url| (probe.label, url)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_probe_order() {
        let output = json!({
            "url": "https://fallback",
            "images": [{ "url": "https://primary" }]
        });
        assert_eq!(
            first_url(FAL_IMAGE_PROBES, &output),
            Some(("images[0].url", "https://primary"))
        );
    }

    #[test]
    fn test_image_probe_nested_data() {
        let output = json!({ "data": { "images": [{ "url": "https://nested" }] } });
        assert_eq!(
            first_url(FAL_IMAGE_PROBES, &output).map(|(_, url)| url),
            Some("https://nested")
        );
    }

    #[test]
    fn test_empty_string_is_skipped() {
        let output = json!({ "images": [{ "url": "" }], "image": { "url": "https://single" } });
        assert_eq!(
            first_url(FAL_IMAGE_PROBES, &output),
            Some(("image.url", "https://single"))
        );
    }

    #[test]
    fn test_video_probe_output_list() {
        let output = json!({ "output": [{ "url": "https://v.mp4" }] });
        assert_eq!(
            first_url(FAL_VIDEO_PROBES, &output),
            Some(("output[0].url", "https://v.mp4"))
        );
    }

    #[test]
    fn test_shape_drift_finds_nothing() {
        let output = json!({ "result": { "media": "https://elsewhere" } });
        assert_eq!(first_url(FAL_IMAGE_PROBES, &output), None);
        assert_eq!(first_url(FAL_VIDEO_PROBES, &output), None);
    }

    #[test]
    fn test_non_string_url_is_ignored() {
        let output = json!({ "video": { "url": 42 }, "url": "https://top" });
        assert_eq!(
            first_url(FAL_VIDEO_PROBES, &output),
            Some(("url", "https://top"))
        );
    }
}
