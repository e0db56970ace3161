//! URL handling module for Fleet-Sounding
//!
//! This module provides website-hint parsing, link resolution, same-site
//! checks, and the candidate URL generation used by website resolution.

mod domain;
mod normalize;
mod variations;

// Re-export main functions
pub use domain::{extract_domain, netloc, same_site};
pub use normalize::{parse_hint, resolve_link};
pub use variations::{clean_company_name, hint_variations, name_domain_guesses};
