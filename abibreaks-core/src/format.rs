//! Supported ABI representations and the comparer options each one needs.

use crate::error::AbiBreaksError;
use camino::Utf8Path;

/// Categories ignored for every format: pure additions are compatible.
const COMMON_IGNORES: &[&str] = &["interface_addition", "type_definition_addition"];

/// Extra noise the libabigail XML representation produces and STG does not.
const XML_IGNORES: &[&str] = &["symbol_type_presence", "type_declaration_status"];

/// Output sink passed to the comparer; the report is read from its stdout.
pub const COMPARER_OUTPUT: &str = "/dev/stdout";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiFormat {
    /// Textual libabigail XML (`.xml`).
    Xml,
    /// Compact STG representation (`.stg`).
    Stg,
}

impl AbiFormat {
    /// Infer the format from the ABI file name.
    pub fn from_path(path: &Utf8Path) -> Result<Self, AbiBreaksError> {
        let name = path.as_str();
        if name.ends_with(".xml") {
            Ok(AbiFormat::Xml)
        } else if name.ends_with(".stg") {
            Ok(AbiFormat::Stg)
        } else {
            Err(AbiBreaksError::Format {
                message: format!("Unsupported ABI format: {path}"),
            })
        }
    }

    /// Input-format flag understood by stgdiff (without the leading dashes).
    pub fn flag(self) -> &'static str {
        match self {
            AbiFormat::Xml => "abi",
            AbiFormat::Stg => "stg",
        }
    }

    pub fn ignored_categories(self) -> Vec<&'static str> {
        match self {
            AbiFormat::Xml => COMMON_IGNORES.iter().chain(XML_IGNORES).copied().collect(),
            AbiFormat::Stg => COMMON_IGNORES.to_vec(),
        }
    }

    /// Full argument vector for comparing `old` against `new`.
    pub fn comparer_args(self, old: &Utf8Path, new: &Utf8Path) -> Vec<String> {
        let mut args = Vec::new();
        for category in self.ignored_categories() {
            args.push("--ignore".to_string());
            args.push(category.to_string());
        }
        args.extend([
            "--format".to_string(),
            "short".to_string(),
            format!("--{}", self.flag()),
            old.to_string(),
            new.to_string(),
            "--output".to_string(),
            COMPARER_OUTPUT.to_string(),
        ]);
        args
    }
}
