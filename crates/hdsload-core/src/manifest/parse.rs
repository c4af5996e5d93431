//! Parse `.f4m` documents: the live multi-level manifest (one `baseURL` and a
//! `media` element per stream) and the inline `bootstrapInfo` of a stream manifest.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ManifestError;
use crate::services::StreamEntry;

fn malformed(e: impl std::fmt::Display) -> ManifestError {
    ManifestError::Malformed(e.to_string())
}

/// Stream name from a media `href`: everything before the first `.`.
fn stream_name(href: &str) -> &str {
    href.split('.').next().unwrap_or(href)
}

pub fn parse_live_manifest(xml: &str) -> Result<Vec<StreamEntry>, ManifestError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut base_url: Option<String> = None;
    let mut in_base_url = false;
    let mut media: Vec<(String, Option<u32>)> = Vec::new();

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) if e.local_name().as_ref() == b"baseURL" => in_base_url = true,
            Event::End(e) if e.local_name().as_ref() == b"baseURL" => in_base_url = false,
            Event::Text(t) if in_base_url => {
                base_url = Some(t.unescape().map_err(malformed)?.trim().to_string());
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"media" => {
                let mut href = None;
                let mut bitrate = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(malformed)?;
                    match attr.key.local_name().as_ref() {
                        b"href" => href = Some(attr.unescape_value().map_err(malformed)?.into_owned()),
                        b"bitrate" => {
                            bitrate = attr.unescape_value().map_err(malformed)?.trim().parse().ok()
                        }
                        _ => {}
                    }
                }
                match href {
                    Some(h) => media.push((h, bitrate)),
                    None => return Err(malformed("media element without href")),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let base_url = base_url.ok_or_else(|| malformed("missing baseURL"))?;
    Ok(media
        .into_iter()
        .map(|(href, bitrate)| StreamEntry {
            name: stream_name(&href).to_string(),
            base_url: base_url.clone(),
            bitrate,
        })
        .collect())
}

/// Decode the first `<bootstrapInfo>` element of a stream manifest into the
/// raw bootstrap box. Whitespace inside the base64 text is ignored.
pub fn parse_bootstrap_info(xml: &str) -> Result<Vec<u8>, ManifestError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut in_bootstrap = false;
    let mut payload: Option<String> = None;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) if e.local_name().as_ref() == b"bootstrapInfo" => {
                in_bootstrap = true;
                payload = Some(String::new());
            }
            Event::Empty(e) if e.local_name().as_ref() == b"bootstrapInfo" => {
                return Err(malformed("bootstrapInfo has no inline data"));
            }
            Event::Text(t) if in_bootstrap => {
                if let Some(p) = payload.as_mut() {
                    p.push_str(&t.unescape().map_err(malformed)?);
                }
            }
            Event::CData(c) if in_bootstrap => {
                if let Some(p) = payload.as_mut() {
                    p.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) if in_bootstrap && e.local_name().as_ref() == b"bootstrapInfo" => break,
            Event::Eof => break,
            _ => {}
        }
    }

    let payload = payload.ok_or_else(|| malformed("missing bootstrapInfo"))?;
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(malformed("bootstrapInfo has no inline data"));
    }
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| malformed(format!("bootstrapInfo is not base64: {}", e)))
}
