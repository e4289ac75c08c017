//! Shared helpers: hex digests, wildcard driver selection and file-name tests.

pub mod validation;
