//! CDN URL builder and modifier parser
//!
//! Delivery URLs have the shape `{cdn_base}/{uuid}/{modifiers}` where the
//! modifier string is a chain of `-/{operation}/{arg}/.../` segments, for
//! example `-/crop/640x480/10,20/-/resize/320x240/`.

use std::fmt;

use uuid::Uuid;

use crate::error::CoreError;

/// A parsed delivery URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnUrl {
    base: String,
    uuid: Uuid,
    modifiers: Option<String>,
}

impl CdnUrl {
    pub fn new(base: &str, uuid: Uuid) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            uuid,
            modifiers: None,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Option<String>) -> Self {
        self.modifiers = modifiers.filter(|m| !m.is_empty());
        self
    }

    /// Parse a full delivery URL
    ///
    /// # Example
    ///
    /// ```rust
    /// use uploadkit_core::transform_url::CdnUrl;
    ///
    /// let url = "https://ucarecdn.com/8e3c0b2a-4d1f-4a57-9b5e-6f0c1d2e3f40/-/crop/10x10/0,0/";
    /// let parsed = CdnUrl::parse(url).unwrap();
    /// assert_eq!(parsed.base(), "https://ucarecdn.com");
    /// assert_eq!(parsed.modifiers(), Some("-/crop/10x10/0,0/"));
    /// ```
    pub fn parse(url: &str) -> Result<Self, CoreError> {
        let url = url.trim();
        let without_query = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url);

        let scheme_end = if without_query.starts_with("https://") {
            "https://".len()
        } else if without_query.starts_with("http://") {
            "http://".len()
        } else {
            return Err(CoreError::InvalidCdnUrl(format!(
                "URL must use http or https: {}",
                url
            )));
        };

        let after_scheme = &without_query[scheme_end..];
        let mut offset = scheme_end;
        for segment in after_scheme.split('/') {
            if let Ok(uuid) = Uuid::parse_str(segment) {
                if offset == scheme_end {
                    // The host itself can never be the file id
                    break;
                }
                let base = &without_query[..offset - 1];
                let rest = &without_query[offset + segment.len()..];
                let modifiers = Self::normalize_modifiers(rest)?;
                return Ok(Self {
                    base: base.to_string(),
                    uuid,
                    modifiers,
                });
            }
            offset += segment.len() + 1;
        }

        Err(CoreError::InvalidCdnUrl(format!(
            "No file UUID found in URL: {}",
            url
        )))
    }

    fn normalize_modifiers(rest: &str) -> Result<Option<String>, CoreError> {
        let rest = rest.trim_start_matches('/');
        if rest.is_empty() {
            return Ok(None);
        }
        if !rest.starts_with("-/") {
            return Err(CoreError::InvalidCdnUrl(format!(
                "Unexpected path after file UUID: {}",
                rest
            )));
        }
        // Round-trip through the parser so the stored form is canonical
        let ops = parse_modifiers(rest)?;
        Ok(Some(build_modifiers(&ops)).filter(|m| !m.is_empty()))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn modifiers(&self) -> Option<&str> {
        self.modifiers.as_deref()
    }
}

impl fmt::Display for CdnUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.base,
            self.uuid,
            self.modifiers.as_deref().unwrap_or("")
        )
    }
}

/// One `-/{name}/{args}/` segment of a modifier string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierOp {
    pub name: String,
    pub args: Vec<String>,
}

impl ModifierOp {
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Parse a modifier string into its operations, in order
pub fn parse_modifiers(modifiers: &str) -> Result<Vec<ModifierOp>, CoreError> {
    let trimmed = modifiers.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let body = trimmed.strip_prefix("-/").ok_or_else(|| {
        CoreError::InvalidModifiers(format!(
            "Modifiers must start with -/ separators: {}",
            modifiers
        ))
    })?;

    let body = body.trim_end_matches('/');
    if body.is_empty() {
        return Ok(Vec::new());
    }

    body.split("/-/")
        .map(|segment| -> Result<ModifierOp, CoreError> {
            let mut parts = segment.split('/').filter(|s| !s.is_empty());
            let name = parts.next().ok_or_else(|| {
                CoreError::InvalidModifiers(format!("Empty operation in: {}", modifiers))
            })?;
            Ok(ModifierOp::new(name, parts))
        })
        .collect()
}

/// Serialize operations back into a modifier string
pub fn build_modifiers(ops: &[ModifierOp]) -> String {
    let mut out = String::new();
    for op in ops {
        out.push_str("-/");
        out.push_str(&op.name);
        out.push('/');
        for arg in &op.args {
            out.push_str(arg);
            out.push('/');
        }
    }
    out
}

/// Parse `WIDTHxHEIGHT`
pub fn parse_dimensions(s: &str) -> Result<(u32, u32), CoreError> {
    let (width, height) = s
        .split_once('x')
        .ok_or_else(|| CoreError::InvalidModifiers(format!("Invalid dimensions: {}", s)))?;
    let width = width
        .parse::<u32>()
        .map_err(|_| CoreError::InvalidModifiers(format!("Invalid width: {}", s)))?;
    let height = height
        .parse::<u32>()
        .map_err(|_| CoreError::InvalidModifiers(format!("Invalid height: {}", s)))?;
    Ok((width, height))
}

/// Parse `X,Y`
pub fn parse_point(s: &str) -> Result<(u32, u32), CoreError> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| CoreError::InvalidModifiers(format!("Invalid position: {}", s)))?;
    let x = x
        .trim()
        .parse::<u32>()
        .map_err(|_| CoreError::InvalidModifiers(format!("Invalid x offset: {}", s)))?;
    let y = y
        .trim()
        .parse::<u32>()
        .map_err(|_| CoreError::InvalidModifiers(format!("Invalid y offset: {}", s)))?;
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID: &str = "8e3c0b2a-4d1f-4a57-9b5e-6f0c1d2e3f40";

    #[test]
    fn test_parse_plain_url() {
        let parsed = CdnUrl::parse(&format!("https://ucarecdn.com/{}/", UUID)).unwrap();
        assert_eq!(parsed.uuid().to_string(), UUID);
        assert_eq!(parsed.base(), "https://ucarecdn.com");
        assert_eq!(parsed.modifiers(), None);
    }

    #[test]
    fn test_parse_url_with_modifiers_and_query() {
        let url = format!(
            "https://cdn.example.com/media/{}/-/crop/100x50/10,20/-/resize/50x25/?v=2",
            UUID
        );
        let parsed = CdnUrl::parse(&url).unwrap();
        assert_eq!(parsed.base(), "https://cdn.example.com/media");
        assert_eq!(
            parsed.modifiers(),
            Some("-/crop/100x50/10,20/-/resize/50x25/")
        );
        assert_eq!(
            parsed.to_string(),
            format!(
                "https://cdn.example.com/media/{}/-/crop/100x50/10,20/-/resize/50x25/",
                UUID
            )
        );
    }

    #[test]
    fn test_parse_rejects_missing_uuid_and_scheme() {
        assert!(CdnUrl::parse("https://ucarecdn.com/not-a-file/").is_err());
        assert!(CdnUrl::parse(&format!("ftp://host/{}/", UUID)).is_err());
        assert!(CdnUrl::parse(&format!("https://host/{}/image.png", UUID)).is_err());
    }

    #[test]
    fn test_parse_modifiers() {
        let ops = parse_modifiers("-/crop/100x50/10,20/-/preview/").unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0], ModifierOp::new("crop", ["100x50", "10,20"]));
        assert_eq!(ops[1].name, "preview");
        assert!(ops[1].args.is_empty());
        assert_eq!(build_modifiers(&ops), "-/crop/100x50/10,20/-/preview/");

        assert!(parse_modifiers("").unwrap().is_empty());
        assert!(parse_modifiers("crop/1x1/").is_err());
    }

    #[test]
    fn test_parse_dimensions_and_point() {
        assert_eq!(parse_dimensions("320x240").unwrap(), (320, 240));
        assert!(parse_dimensions("320").is_err());
        assert!(parse_dimensions("axb").is_err());
        assert_eq!(parse_point("10,20").unwrap(), (10, 20));
        assert!(parse_point("10").is_err());
    }
}
