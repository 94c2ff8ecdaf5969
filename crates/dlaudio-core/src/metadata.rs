//! M4A tag and cover art embedding using mp4ameta

use crate::downloader::VideoMetadata;
use crate::error::MetadataError;
use crate::output::with_extension;
use crate::source::SourceLabel;
use mp4ameta::{Img, ImgFmt, Tag};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Sidecar thumbnail extensions, probed in order
pub const THUMBNAIL_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "webp", "png"];

const UNKNOWN: &str = "Unknown";

/// Channel/author name: first non-empty of uploader, channel, uploader_name, artist
pub fn resolve_uploader(metadata: &VideoMetadata) -> &str {
    [
        &metadata.uploader,
        &metadata.channel,
        &metadata.uploader_name,
        &metadata.artist,
    ]
    .into_iter()
    .flatten()
    .map(String::as_str)
    .find(|name| !name.is_empty())
    .unwrap_or(UNKNOWN)
}

pub fn display_title(uploader: &str, title: &str) -> String {
    format!("{} - {}", uploader, title)
}

/// Year from a `YYYYMMDD` upload date
pub fn year_from_upload_date(date: &str) -> Option<String> {
    let year: String = date.chars().take(4).collect();
    (!year.is_empty()).then_some(year)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverFormat {
    Jpeg,
    Png,
}

impl CoverFormat {
    /// `.jpg`/`.jpeg` are JPEG, every other sidecar is stored as PNG
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "jpg" | "jpeg" => CoverFormat::Jpeg,
            _ => CoverFormat::Png,
        }
    }

    fn img_fmt(self) -> ImgFmt {
        match self {
            CoverFormat::Jpeg => ImgFmt::Jpeg,
            CoverFormat::Png => ImgFmt::Png,
        }
    }
}

impl std::fmt::Display for CoverFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoverFormat::Jpeg => write!(f, "JPEG"),
            CoverFormat::Png => write!(f, "PNG"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cover {
    pub format: CoverFormat,
    pub data: Vec<u8>,
    pub path: PathBuf,
}

impl Cover {
    /// Read the first sidecar image next to `audio`, if any
    pub fn find(audio: &Path) -> std::io::Result<Option<Self>> {
        let base = audio.with_extension("");
        let found = THUMBNAIL_EXTENSIONS
            .iter()
            .map(|ext| (*ext, with_extension(&base, ext)))
            .find(|(_, path)| path.exists());

        match found {
            Some((ext, path)) => {
                let data = std::fs::read(&path)?;
                debug!("Found thumbnail: {} ({} bytes)", path.display(), data.len());
                Ok(Some(Self {
                    format: CoverFormat::from_extension(ext),
                    data,
                    path,
                }))
            }
            None => Ok(None),
        }
    }
}

/// Tag values written to the finished file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTags {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub year: Option<String>,
    pub cover: Option<CoverFormat>,
}

impl TrackTags {
    pub fn new(metadata: &VideoMetadata, source: SourceLabel) -> Self {
        let uploader = resolve_uploader(metadata);
        Self {
            artist: source.to_string(),
            album: uploader.to_string(),
            title: display_title(uploader, &metadata.title),
            year: metadata
                .upload_date
                .as_deref()
                .and_then(year_from_upload_date),
            cover: None,
        }
    }

    /// Overwrite the tag's fields; applying the same values twice is a no-op
    pub fn apply(&mut self, tag: &mut Tag, cover: Option<&Cover>) {
        tag.set_artist(self.artist.clone());
        tag.set_album(self.album.clone());
        tag.set_title(self.title.clone());
        if let Some(ref year) = self.year {
            tag.set_year(year.clone());
        }
        if let Some(cover) = cover {
            tag.set_artwork(Img::new(cover.format.img_fmt(), cover.data.clone()));
            self.cover = Some(cover.format);
        }
    }
}

#[derive(Debug, Clone)]
pub struct TagWriter {
    embed_cover: bool,
}

impl TagWriter {
    pub fn new(embed_cover: bool) -> Self {
        Self { embed_cover }
    }

    /// Write tags and cover art into `audio` in place, then delete the used thumbnail
    pub fn embed(
        &self,
        audio: &Path,
        metadata: &VideoMetadata,
        source: SourceLabel,
    ) -> Result<TrackTags, MetadataError> {
        info!("Embedding metadata: {}", audio.display());

        let mut tag = Tag::read_from_path(audio)?;
        let mut tags = TrackTags::new(metadata, source);

        let cover = if self.embed_cover {
            Cover::find(audio)?
        } else {
            None
        };

        tags.apply(&mut tag, cover.as_ref());
        tag.write_to_path(audio)?;

        // Tags are already on disk; a leftover thumbnail is not a tagging failure
        if let Some(cover) = cover {
            remove_thumbnail(&cover.path);
        }

        Ok(tags)
    }
}

/// Delete an embedded thumbnail, returning whether it was removed
fn remove_thumbnail(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed embedded thumbnail: {}", path.display());
            true
        }
        Err(e) => {
            warn!("Could not remove thumbnail {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            title: "Song".to_string(),
            uploader: Some("Acme".to_string()),
            upload_date: Some("20230615".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_uploader_order() {
        let mut m = VideoMetadata {
            channel: Some("Channel".to_string()),
            artist: Some("Artist".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_uploader(&m), "Channel");

        m.uploader = Some(String::new());
        assert_eq!(resolve_uploader(&m), "Channel");

        m.uploader = Some("Uploader".to_string());
        assert_eq!(resolve_uploader(&m), "Uploader");
    }

    #[test]
    fn test_resolve_uploader_artist_only() {
        let m = VideoMetadata {
            artist: Some("Solo".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_uploader(&m), "Solo");
    }

    #[test]
    fn test_resolve_uploader_unknown() {
        assert_eq!(resolve_uploader(&VideoMetadata::default()), "Unknown");
    }

    #[test]
    fn test_display_title() {
        assert_eq!(display_title("Acme", "Song"), "Acme - Song");
    }

    #[test]
    fn test_year_from_upload_date() {
        assert_eq!(year_from_upload_date("20230615").as_deref(), Some("2023"));
        assert_eq!(year_from_upload_date("19"), Some("19".to_string()));
        assert_eq!(year_from_upload_date(""), None);
    }

    #[test]
    fn test_track_tags() {
        let tags = TrackTags::new(&metadata(), SourceLabel::Youtube);
        assert_eq!(tags.artist, "youtube");
        assert_eq!(tags.album, "Acme");
        assert_eq!(tags.title, "Acme - Song");
        assert_eq!(tags.year.as_deref(), Some("2023"));
        assert_eq!(tags.cover, None);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let cover = Cover {
            format: CoverFormat::Jpeg,
            data: vec![0xFF, 0xD8, 0xFF, 0xE0],
            path: PathBuf::from("unused.jpg"),
        };
        let mut tag = Tag::default();

        let mut first = TrackTags::new(&metadata(), SourceLabel::Rutube);
        first.apply(&mut tag, Some(&cover));
        let mut second = TrackTags::new(&metadata(), SourceLabel::Rutube);
        second.apply(&mut tag, Some(&cover));

        assert_eq!(first, second);
        assert_eq!(tag.artists().count(), 1);
        assert_eq!(tag.artist(), Some("rutube"));
        assert_eq!(tag.album(), Some("Acme"));
        assert_eq!(tag.title(), Some("Acme - Song"));
        assert_eq!(tag.year(), Some("2023"));
        assert_eq!(tag.artworks().count(), 1);
    }

    #[test]
    fn test_apply_without_cover() {
        let mut tag = Tag::default();
        let mut tags = TrackTags::new(&metadata(), SourceLabel::Audio);
        tags.apply(&mut tag, None);

        assert!(tag.artwork().is_none());
        assert_eq!(tags.cover, None);
    }

    #[test]
    fn test_find_cover_missing() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("youtube Song.m4a");
        assert!(Cover::find(&audio).unwrap().is_none());
    }

    #[test]
    fn test_find_cover_order_and_format() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("youtube Song.m4a");
        fs::write(dir.path().join("youtube Song.png"), b"png").unwrap();
        fs::write(dir.path().join("youtube Song.webp"), b"webp").unwrap();

        let cover = Cover::find(&audio).unwrap().unwrap();
        assert_eq!(cover.data, b"webp");
        assert_eq!(cover.format, CoverFormat::Png);

        fs::write(dir.path().join("youtube Song.jpg"), b"jpg").unwrap();
        let cover = Cover::find(&audio).unwrap().unwrap();
        assert_eq!(cover.data, b"jpg");
        assert_eq!(cover.format, CoverFormat::Jpeg);
    }

    #[test]
    fn test_embed_into_invalid_file_fails_and_keeps_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("audio Broken.m4a");
        let thumb = dir.path().join("audio Broken.jpg");
        fs::write(&audio, b"not an mp4 file").unwrap();
        fs::write(&thumb, b"jpg").unwrap();

        let result = TagWriter::new(true).embed(&audio, &metadata(), SourceLabel::Audio);
        assert!(result.is_err());
        assert!(audio.exists());
        assert!(thumb.exists());
    }

    fn atom(name: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(name);
        out.extend_from_slice(body);
        out
    }

    /// Smallest M4A mp4ameta accepts: ftyp, moov with a version 0 mvhd, mdat
    fn write_m4a(path: &Path) {
        let mut ftyp = b"M4A ".to_vec();
        ftyp.extend_from_slice(&0u32.to_be_bytes());
        ftyp.extend_from_slice(b"M4A isom");

        let mut mvhd = vec![0u8; 4]; // version + flags
        mvhd.extend_from_slice(&0u32.to_be_bytes()); // creation time
        mvhd.extend_from_slice(&0u32.to_be_bytes()); // modification time
        mvhd.extend_from_slice(&1000u32.to_be_bytes()); // timescale
        mvhd.extend_from_slice(&0u32.to_be_bytes()); // duration
        mvhd.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // rate
        mvhd.extend_from_slice(&0x0100u16.to_be_bytes()); // volume
        mvhd.extend_from_slice(&[0u8; 10]);
        for v in [0x0001_0000u32, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000] {
            mvhd.extend_from_slice(&v.to_be_bytes());
        }
        mvhd.extend_from_slice(&[0u8; 24]);
        mvhd.extend_from_slice(&2u32.to_be_bytes()); // next track id

        let mut file = atom(b"ftyp", &ftyp);
        file.extend(atom(b"moov", &atom(b"mvhd", &mvhd)));
        file.extend(atom(b"mdat", &[0u8; 16]));
        fs::write(path, file).unwrap();
    }

    #[test]
    fn test_embed_writes_tags_and_consumes_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("youtube Song.m4a");
        let thumb = dir.path().join("youtube Song.jpg");
        write_m4a(&audio);
        fs::write(&thumb, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

        let writer = TagWriter::new(true);
        let first = writer.embed(&audio, &metadata(), SourceLabel::Youtube).unwrap();
        assert_eq!(first.cover, Some(CoverFormat::Jpeg));
        assert!(!thumb.exists());

        let second = writer.embed(&audio, &metadata(), SourceLabel::Youtube).unwrap();
        assert_eq!(second.cover, None);
        assert_eq!(second.title, first.title);

        let tag = Tag::read_from_path(&audio).unwrap();
        assert_eq!(tag.artists().collect::<Vec<_>>(), vec!["youtube"]);
        assert_eq!(tag.album(), Some("Acme"));
        assert_eq!(tag.title(), Some("Acme - Song"));
        assert_eq!(tag.year(), Some("2023"));
        assert_eq!(tag.artworks().count(), 1);
    }

    #[test]
    fn test_embed_without_thumbnail_sets_no_cover() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("rutube Clip.m4a");
        write_m4a(&audio);

        let tags = TagWriter::new(true)
            .embed(&audio, &metadata(), SourceLabel::Rutube)
            .unwrap();
        assert_eq!(tags.cover, None);

        let tag = Tag::read_from_path(&audio).unwrap();
        assert_eq!(tag.artist(), Some("rutube"));
        assert_eq!(tag.title(), Some("Acme - Song"));
        assert!(tag.artwork().is_none());
    }

    #[test]
    fn test_remove_thumbnail_failure_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let thumb = dir.path().join("gone.jpg");
        assert!(!remove_thumbnail(&thumb));

        fs::write(&thumb, b"jpg").unwrap();
        assert!(remove_thumbnail(&thumb));
        assert!(!thumb.exists());
    }
}
