//! Utility modules shared by the normalizer and the view projectors
//!
//! - Field extraction: tolerant column lookup across inconsistent headers
//! - Format: 2-decimal display rounding and placeholders

pub mod field_extractor;
pub mod format;

// Re-export commonly used helpers
pub use field_extractor::{extract_numeric, extract_text, scalar_to_number, parse_leading_float};
pub use format::{round2, fmt_fixed2, fmt_smart, fmt_optional, PLACEHOLDER, NOT_AVAILABLE};
