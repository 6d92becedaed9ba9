//! Stream URLs for catalog items.

use url::Url;

use crate::catalog::ItemId;
use crate::config::ServerSettings;
use crate::error::ConfigError;

use super::SourceDescriptor;

const HLS_MIME: &str = "application/x-mpegURL";

/// Optional parameters of a video stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoRequest {
    /// Media source (version) to stream. Defaults to the item itself.
    pub media_source_id: Option<String>,
    pub play_session_id: Option<String>,
    pub audio_stream_index: Option<u32>,
    pub quality_label: Option<String>,
}

/// Builds source descriptors against one media server.
#[derive(Debug, Clone)]
pub struct StreamEndpoint {
    base: Url,
    api_key: String,
    user_id: Option<String>,
    server: ServerSettings,
}

impl StreamEndpoint {
    pub fn new(server: &ServerSettings, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = server
            .base_url
            .as_deref()
            .ok_or_else(|| ConfigError::Invalid("server.base_url is not set".to_string()))?;
        let base = Url::parse(raw)?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::Invalid(format!(
                "server.base_url cannot hold a path: {raw}"
            )));
        }

        Ok(Self {
            base,
            api_key: api_key.into(),
            user_id: None,
            server: server.clone(),
        })
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Universal audio stream: direct play for the listed containers,
    /// HLS transcoding otherwise.
    pub fn audio_source(&self, item_id: &ItemId) -> SourceDescriptor {
        let mut url = self.url(&["Audio", item_id.as_str(), "universal"]);
        {
            let server = &self.server;
            let mut query = url.query_pairs_mut();
            if let Some(user_id) = &self.user_id {
                query.append_pair("UserId", user_id);
            }
            query
                .append_pair("ApiKey", &self.api_key)
                .append_pair("AudioCodec", &server.audio_codec)
                .append_pair("Container", &server.audio_containers)
                .append_pair("TranscodingContainer", &server.transcoding_container)
                .append_pair("TranscodingProtocol", &server.transcoding_protocol)
                .append_pair("StartTimeTicks", "0")
                .append_pair(
                    "MaxStreamingBitrate",
                    &server.max_streaming_bitrate.to_string(),
                )
                .append_pair("EnableRedirection", "true")
                .append_pair("EnableRemoteMedia", "false")
                .append_pair("EnableAudioVbrEncoding", "true");
        }
        SourceDescriptor::new(url.to_string())
    }

    /// HLS master playlist for a video item.
    pub fn video_source(&self, item_id: &ItemId, request: &VideoRequest) -> SourceDescriptor {
        let mut url = self.url(&["videos", item_id.as_str(), "master.m3u8"]);
        {
            let server = &self.server;
            let media_source_id = request
                .media_source_id
                .as_deref()
                .unwrap_or(item_id.as_str());
            let mut query = url.query_pairs_mut();
            query
                .append_pair("MediaSourceId", media_source_id)
                .append_pair("ApiKey", &self.api_key)
                .append_pair("VideoCodec", &server.video_codecs)
                .append_pair("AudioCodec", &server.audio_codec)
                .append_pair("SegmentContainer", &server.segment_container)
                .append_pair("MinSegments", "2")
                .append_pair("BreakOnNonKeyFrames", "true")
                .append_pair("RequireAvc", "false");
            if let Some(session) = &request.play_session_id {
                query.append_pair("PlaySessionId", session);
            }
            if let Some(index) = request.audio_stream_index {
                query.append_pair("AudioStreamIndex", &index.to_string());
            }
        }

        let descriptor = SourceDescriptor::new(url.to_string()).with_container(HLS_MIME);
        match &request.quality_label {
            Some(label) => descriptor.with_quality(label.clone()),
            None => descriptor,
        }
    }

    /// Base URL with `segments` appended to its path.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}
