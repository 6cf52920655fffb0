//! SVG upload validation
//!
//! Every upload passes through [`validate_svg`] before the converter is
//! invoked: size cap, XML well-formedness, and an `svg` root element
//! (namespace prefix ignored). Validation never touches the filesystem.

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

use crate::core::config;

/// Reasons an upload is rejected before conversion
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("not well-formed XML: {0}")]
    NotXml(String),

    #[error("root element is not <svg> (found <{0}>)")]
    NotSvg(String),
}

impl ValidationError {
    /// User-facing rejection text sent back with the failing filename
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::TooLarge { size, limit } => format!(
                "❌ File too large ({:.1}MB). Maximum allowed: {}MB",
                *size as f64 / (1024.0 * 1024.0),
                limit / (1024 * 1024)
            ),
            ValidationError::NotXml(_) => "❌ Invalid SVG format".to_string(),
            ValidationError::NotSvg(_) => "❌ Not a valid SVG file".to_string(),
        }
    }
}

/// Validate an SVG payload against the default size cap
pub fn validate_svg(declared_size: u64, data: &[u8]) -> Result<(), ValidationError> {
    validate_svg_with_limit(declared_size, data, config::validation::MAX_FILE_SIZE_BYTES)
}

/// Validate an SVG payload against an explicit size cap
///
/// Both the size Telegram declared and the actual payload length are checked;
/// a lying client does not get a larger budget.
pub fn validate_svg_with_limit(declared_size: u64, data: &[u8], limit: u64) -> Result<(), ValidationError> {
    let size = declared_size.max(data.len() as u64);
    if size > limit {
        return Err(ValidationError::TooLarge { size, limit });
    }

    check_svg_root(data)
}

/// Parse the payload as XML and require an `svg` root element
fn check_svg_root(data: &[u8]) -> Result<(), ValidationError> {
    let mut reader = Reader::from_reader(data);
    let mut root_seen = false;
    let mut depth: usize = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if !root_seen {
                    check_root_name(e.local_name().as_ref())?;
                    root_seen = true;
                } else if depth == 0 {
                    return Err(ValidationError::NotXml("multiple root elements".to_string()));
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                if !root_seen {
                    check_root_name(e.local_name().as_ref())?;
                    root_seen = true;
                } else if depth == 0 {
                    return Err(ValidationError::NotXml("multiple root elements".to_string()));
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ValidationError::NotXml(e.to_string())),
        }
    }

    if !root_seen {
        return Err(ValidationError::NotXml("no root element".to_string()));
    }
    if depth != 0 {
        return Err(ValidationError::NotXml("unexpected end of file".to_string()));
    }

    Ok(())
}

fn check_root_name(local_name: &[u8]) -> Result<(), ValidationError> {
    if local_name.eq_ignore_ascii_case(b"svg") {
        Ok(())
    } else {
        Err(ValidationError::NotSvg(
            String::from_utf8_lossy(local_name).into_owned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: u64 = 5 * 1024 * 1024;

    // ==================== Accepted Payload Tests ====================

    #[test]
    fn test_minimal_svg_is_valid() {
        let data = b"<svg xmlns=\"http://www.w3.org/2000/svg\"><rect/></svg>";
        assert_eq!(validate_svg_with_limit(data.len() as u64, data, LIMIT), Ok(()));
    }

    #[test]
    fn test_svg_with_xml_declaration_is_valid() {
        let data = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg width=\"512\" height=\"512\"></svg>";
        assert_eq!(validate_svg_with_limit(data.len() as u64, data, LIMIT), Ok(()));
    }

    #[test]
    fn test_self_closing_svg_root_is_valid() {
        let data = b"<svg/>";
        assert_eq!(validate_svg_with_limit(data.len() as u64, data, LIMIT), Ok(()));
    }

    #[test]
    fn test_namespace_prefixed_root_is_valid() {
        let data = b"<svg:svg xmlns:svg=\"http://www.w3.org/2000/svg\"></svg:svg>";
        assert_eq!(validate_svg_with_limit(data.len() as u64, data, LIMIT), Ok(()));
    }

    #[test]
    fn test_uppercase_root_is_valid() {
        let data = b"<SVG></SVG>";
        assert_eq!(validate_svg_with_limit(data.len() as u64, data, LIMIT), Ok(()));
    }

    // ==================== Size Tests ====================

    #[test]
    fn test_declared_size_over_limit_is_rejected() {
        let data = b"<svg/>";
        let result = validate_svg_with_limit(LIMIT + 1, data, LIMIT);
        assert_eq!(
            result,
            Err(ValidationError::TooLarge {
                size: LIMIT + 1,
                limit: LIMIT
            })
        );
    }

    #[test]
    fn test_actual_size_over_limit_is_rejected() {
        let mut data = b"<svg>".to_vec();
        data.resize(32, b' ');
        // Declared size lies; the actual payload length wins
        let result = validate_svg_with_limit(1, &data, 16);
        assert_eq!(result, Err(ValidationError::TooLarge { size: 32, limit: 16 }));
    }

    #[test]
    fn test_size_at_limit_is_accepted() {
        let data = b"<svg/>";
        assert_eq!(validate_svg_with_limit(data.len() as u64, data, data.len() as u64), Ok(()));
    }

    // ==================== Format Tests ====================

    #[test]
    fn test_wrong_root_element_is_rejected() {
        let data = b"<html><body/></html>";
        assert_eq!(
            validate_svg_with_limit(data.len() as u64, data, LIMIT),
            Err(ValidationError::NotSvg("html".to_string()))
        );
    }

    #[test]
    fn test_plain_text_is_rejected() {
        let data = b"definitely not markup";
        assert!(matches!(
            validate_svg_with_limit(data.len() as u64, data, LIMIT),
            Err(ValidationError::NotXml(_))
        ));
    }

    #[test]
    fn test_empty_payload_is_rejected() {
        assert!(matches!(
            validate_svg_with_limit(0, b"", LIMIT),
            Err(ValidationError::NotXml(_))
        ));
    }

    #[test]
    fn test_truncated_document_is_rejected() {
        let data = b"<svg><rect>";
        assert!(matches!(
            validate_svg_with_limit(data.len() as u64, data, LIMIT),
            Err(ValidationError::NotXml(_))
        ));
    }

    #[test]
    fn test_trailing_sibling_root_is_rejected() {
        let data = b"<svg/><b></b>";
        assert_eq!(
            validate_svg_with_limit(data.len() as u64, data, LIMIT),
            Err(ValidationError::NotXml("multiple root elements".to_string()))
        );
    }

    #[test]
    fn test_second_svg_root_is_rejected() {
        let data = b"<svg></svg><svg/>";
        assert_eq!(
            validate_svg_with_limit(data.len() as u64, data, LIMIT),
            Err(ValidationError::NotXml("multiple root elements".to_string()))
        );
    }

    #[test]
    fn test_mismatched_tags_are_rejected() {
        let data = b"<svg><g></svg></g>";
        assert!(matches!(
            validate_svg_with_limit(data.len() as u64, data, LIMIT),
            Err(ValidationError::NotXml(_))
        ));
    }

    #[test]
    fn test_size_check_runs_before_parse() {
        // Oversized garbage reports TooLarge, not NotXml
        let data = b"garbage";
        let result = validate_svg_with_limit(100, data, 10);
        assert!(matches!(result, Err(ValidationError::TooLarge { .. })));
    }

    // ==================== User Message Tests ====================

    #[test]
    fn test_too_large_user_message_reports_megabytes() {
        let err = ValidationError::TooLarge {
            size: 6 * 1024 * 1024,
            limit: 5 * 1024 * 1024,
        };
        assert_eq!(err.user_message(), "❌ File too large (6.0MB). Maximum allowed: 5MB");
    }

    #[test]
    fn test_not_xml_user_message() {
        let err = ValidationError::NotXml("whatever".to_string());
        assert_eq!(err.user_message(), "❌ Invalid SVG format");
    }
}
