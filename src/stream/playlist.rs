use crate::media::library::VideoRecord;

/// Fixed length of every segment in seconds. The playlist and the segmenter
/// must agree on this value or players desync at segment boundaries.
pub const SEGMENT_DURATION: u32 = 4;

/// Number of segments a video of the given duration slices into.
/// A duration that is an exact multiple of the segment length yields a
/// trailing zero-length segment; players handle it and the count stays
/// consistent with the segmenter's slicing.
pub fn segment_count(duration_secs: f64) -> u32 {
    (duration_secs / SEGMENT_DURATION as f64) as u32 + 1
}

/// Render the HLS VOD playlist for a video. Pure — two calls for the same
/// record produce byte-identical output.
pub fn render(video: &VideoRecord) -> String {
    let count = segment_count(video.duration);

    let mut out = String::new();
    out.push_str("#EXTM3U\n");
    out.push_str("#EXT-X-VERSION:3\n");
    out.push_str(&format!("#EXT-X-TARGETDURATION:{SEGMENT_DURATION}\n"));
    out.push_str("#EXT-X-PLAYLIST-TYPE:VOD\n");
    out.push_str("#EXT-X-MEDIA-SEQUENCE:0\n");

    for i in 0..count {
        let seg_duration = if i == count - 1 {
            video.duration - (i * SEGMENT_DURATION) as f64
        } else {
            SEGMENT_DURATION as f64
        };
        out.push_str(&format!("#EXTINF:{seg_duration:.3},\n"));
        out.push_str(&format!("segment_{i}.ts\n"));
    }
    out.push_str("#EXT-X-ENDLIST\n");
    out
}
