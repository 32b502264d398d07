//! Share link and QR payload derivation.
//!
//! Pure and idempotent: no network, no clock, no state. Deriving twice for
//! the same identity yields byte-identical output, and the derived URL
//! round-trips: decoding its query parameter recovers the identity exactly.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use qrcode::{Color, EcLevel, QrCode};

use crate::rendering::paint::PaintCommand;
use crate::rendering::raster;
use crate::{CardConfig, Error, GreetingRecord, Result};

/// Error-correction level carried by a derived QR payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCorrection {
    Medium,
    High,
}

/// A derived share link: canonical URL plus the scannable-code payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub url: String,
    pub qr: QrDescriptor,
}

/// Encodable payload for a scannable code representing a share URL.
///
/// Module matrix plus the optional embedded center mark. When a mark is
/// requested the code is derived at the high error-correction level so the
/// overlay cannot break scan reliability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrDescriptor {
    pub data: String,
    pub ec_level: ErrorCorrection,
    width: usize,
    modules: Vec<bool>,
    mark: bool,
}

impl QrDescriptor {
    fn derive(data: &str, embed_mark: bool) -> Result<Self> {
        let level = if embed_mark { EcLevel::H } else { EcLevel::M };
        let code = QrCode::with_error_correction_level(data.as_bytes(), level)
            .map_err(|e| Error::Share(format!("QR derivation failed: {}", e)))?;
        let width = code.width();
        let modules = code.to_colors().iter().map(|c| *c == Color::Dark).collect();
        Ok(Self {
            data: data.to_string(),
            ec_level: if embed_mark { ErrorCorrection::High } else { ErrorCorrection::Medium },
            width,
            modules,
            mark: embed_mark,
        })
    }

    /// Side length of the module matrix.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the module at (x, y) is dark.
    pub fn module(&self, x: usize, y: usize) -> bool {
        self.modules.get(y * self.width + x).copied().unwrap_or(false)
    }

    /// The centered mark square in module coordinates, `(start, side)`,
    /// when a mark is embedded. Clamped well under the damage budget the
    /// high error-correction level tolerates.
    pub fn mark_span(&self) -> Option<(usize, usize)> {
        if !self.mark {
            return None;
        }
        // ~1/5 of the side, odd so it centers on the module grid
        let side = (self.width / 5).max(3) | 1;
        Some(((self.width - side) / 2, side))
    }

    /// Render the code (and mark, if any) as a PNG with a 4-module quiet
    /// zone, at `module_px` pixels per module.
    pub fn to_png(&self, module_px: u32) -> Result<Vec<u8>> {
        let module_px = module_px.max(1);
        const QUIET: u32 = 4;
        let side_px = (self.width as u32 + 2 * QUIET) * module_px;

        let mut commands = Vec::new();
        for y in 0..self.width {
            for x in 0..self.width {
                if self.module(x, y) {
                    commands.push(PaintCommand::SolidRect {
                        x: ((x as u32 + QUIET) * module_px) as i32,
                        y: ((y as u32 + QUIET) * module_px) as i32,
                        width: module_px,
                        height: module_px,
                        rgba: (0, 0, 0, 255),
                    });
                }
            }
        }
        if let Some((start, side)) = self.mark_span() {
            // White backing one module wider than the mark, then the mark
            let backing = (side as u32 + 2) * module_px;
            let backing_xy = ((start as u32 + QUIET - 1) * module_px) as i32;
            commands.push(PaintCommand::SolidRect {
                x: backing_xy,
                y: backing_xy,
                width: backing,
                height: backing,
                rgba: (255, 255, 255, 255),
            });
            let mark_xy = ((start as u32 + QUIET) * module_px) as i32;
            commands.push(PaintCommand::SolidRect {
                x: mark_xy,
                y: mark_xy,
                width: side as u32 * module_px,
                height: side as u32 * module_px,
                rgba: (240, 192, 48, 255),
            });
        }

        let buf = raster::rasterize(&commands, side_px, side_px, Some((255, 255, 255)));
        raster::encode_png(side_px, side_px, buf)
    }
}

/// The identity-bearing field used in share links: the store-assigned `id`
/// when the record has one, otherwise the display name. Links distributed
/// before a record was persisted keep resolving because decoding never needs
/// to know which kind it was handed.
pub fn identity_for(record: &GreetingRecord) -> &str {
    if record.id.trim().is_empty() {
        &record.name
    } else {
        &record.id
    }
}

/// Derive the canonical share URL and QR payload for an identity.
pub fn derive_share_link(config: &CardConfig, identity: &str, embed_mark: bool) -> Result<ShareLink> {
    let mut url = url::Url::parse(&config.share_origin)
        .map_err(|e| Error::Config(format!("invalid share origin: {}", e)))?;
    let encoded = utf8_percent_encode(identity, NON_ALPHANUMERIC).to_string();
    url.set_query(Some(&format!("greeting={}", encoded)));
    let url = url.to_string();
    let qr = QrDescriptor::derive(&url, embed_mark)?;
    Ok(ShareLink { url, qr })
}

/// Recover the identity from a share URL. Inverse of `derive_share_link`
/// for any identity.
pub fn decode_share_identity(share_url: &str) -> Result<String> {
    let url = url::Url::parse(share_url)
        .map_err(|e| Error::Share(format!("invalid share URL: {}", e)))?;
    for (key, value) in url.query_pairs() {
        if key == "greeting" {
            return Ok(value.into_owned());
        }
    }
    Err(Error::Share("share URL carries no greeting identity".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic_and_idempotent() {
        let config = CardConfig::default();
        let a = derive_share_link(&config, "Asha Rao", true).unwrap();
        let b = derive_share_link(&config, "Asha Rao", true).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn url_round_trips_spaces() {
        let config = CardConfig::default();
        let link = derive_share_link(&config, "Asha Rao", false).unwrap();
        assert!(link.url.contains("greeting=Asha%20Rao"), "url: {}", link.url);
        assert_eq!(decode_share_identity(&link.url).unwrap(), "Asha Rao");
    }

    #[test]
    fn url_round_trips_reserved_characters() {
        let config = CardConfig::default();
        let identity = "a&b=c #d/e?f+g%h";
        let link = derive_share_link(&config, identity, false).unwrap();
        assert_eq!(decode_share_identity(&link.url).unwrap(), identity);
    }

    #[test]
    fn identity_prefers_store_id() {
        let mut r = GreetingRecord::new("Asha Rao", "CSE", "2", "t", "b", "q");
        assert_eq!(identity_for(&r), "Asha Rao");
        r.id = "rec-42".to_string();
        assert_eq!(identity_for(&r), "rec-42");
    }

    #[test]
    fn mark_forces_high_error_correction() {
        let config = CardConfig::default();
        let plain = derive_share_link(&config, "x", false).unwrap();
        let marked = derive_share_link(&config, "x", true).unwrap();
        assert_eq!(plain.qr.ec_level, ErrorCorrection::Medium);
        assert_eq!(marked.qr.ec_level, ErrorCorrection::High);
        assert!(plain.qr.mark_span().is_none());
        assert!(marked.qr.mark_span().is_some());
    }

    #[test]
    fn mark_stays_inside_the_code_and_small() {
        let config = CardConfig::default();
        let link = derive_share_link(&config, "Asha Rao", true).unwrap();
        let (start, side) = link.qr.mark_span().unwrap();
        let width = link.qr.width();
        assert!(start + side <= width);
        // area well under what EC level H can absorb
        assert!(side * side * 4 <= width * width);
    }

    #[test]
    fn qr_png_renders() {
        let config = CardConfig::default();
        let link = derive_share_link(&config, "Asha Rao", true).unwrap();
        let png = link.qr.to_png(4).unwrap();
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn invalid_origin_is_a_config_error() {
        let config = CardConfig { share_origin: "not a url".to_string(), ..Default::default() };
        assert!(matches!(
            derive_share_link(&config, "x", false),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn decode_rejects_url_without_identity() {
        assert!(decode_share_identity("https://example.com/?other=1").is_err());
    }
}
