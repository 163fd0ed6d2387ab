//! Public share links and their QR codes.
//!
//! A certificate's public page lives at `<origin>/cert/<id>`. Anyone with
//! the link can verify the certificate; no session is required.

use certchain_core::CertificateId;
use qrcode::render::svg;
use qrcode::QrCode;
use url::Url;

use crate::error::RegistryError;

/// Minimum rendered QR size in pixels, both axes.
pub const QR_DIMENSION: u32 = 256;

/// Public verification link for `id` under `origin`.
pub fn share_link(origin: &str, id: &CertificateId) -> Result<Url, RegistryError> {
    let base = Url::parse(origin.trim())
        .map_err(|e| RegistryError::Input(format!("invalid origin {origin:?}: {e}")))?;
    if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
        return Err(RegistryError::Input(format!(
            "invalid origin {origin:?}: expected an http(s) URL"
        )));
    }
    let link = format!("{}/cert/{id}", base.as_str().trim_end_matches('/'));
    Url::parse(&link).map_err(|e| RegistryError::Input(format!("invalid share link: {e}")))
}

/// Render `link` as a black-on-white SVG QR code.
pub fn qr_svg(link: &Url) -> Result<String, RegistryError> {
    let code = QrCode::new(link.as_str().as_bytes())
        .map_err(|e| RegistryError::Input(format!("QR generation failed: {e}")))?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(QR_DIMENSION, QR_DIMENSION)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#FFFFFF"))
        .build())
}
