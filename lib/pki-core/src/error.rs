use serde::Serialize;
use strum::Display;

/// Client-facing error codes, one per error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[allow(non_camel_case_types)]
pub enum ErrorCode {
    BR_0000,
    BR_0001,
    BR_0002,
    BR_0003,

    BR_0010,
    BR_0011,
    BR_0012,
    BR_0013,
    BR_0014,
    BR_0015,
    BR_0016,
    BR_0017,
    BR_0018,
    BR_0019,
    BR_0020,
    BR_0021,
    BR_0022,
    BR_0023,

    BR_0030,
    BR_0031,

    BR_0040,
    BR_0041,

    BR_0050,
    BR_0051,
    BR_0052,
    BR_0053,
    BR_0054,
    BR_0055,

    BR_0060,
    BR_0061,
    BR_0062,
    BR_0063,
    BR_0064,
}

impl ErrorCode {
    pub const fn msg(&self) -> &'static str {
        match self {
            ErrorCode::BR_0000 => "Unmapped error code",
            ErrorCode::BR_0001 => "Certificate not found",
            ErrorCode::BR_0002 => "Certificate template not found",
            ErrorCode::BR_0003 => "Database error",

            ErrorCode::BR_0010 => "Issuer not found",
            ErrorCode::BR_0011 => "Issuer is not a CA",
            ErrorCode::BR_0012 => "Issuer is revoked or expired",
            ErrorCode::BR_0013 => "Issuer is not currently valid",
            ErrorCode::BR_0014 => "Validity outside of issuer window",
            ErrorCode::BR_0015 => "Certificate chain too deep",
            ErrorCode::BR_0016 => "Circular certificate chain",
            ErrorCode::BR_0017 => "Certificate chain does not terminate at a root",
            ErrorCode::BR_0018 => "Invalid certificate chain member",
            ErrorCode::BR_0019 => "Invalid certificate signature",
            ErrorCode::BR_0020 => "Invalid root self-signature",
            ErrorCode::BR_0021 => "Path length constraint violated",
            ErrorCode::BR_0022 => "Issuer path length exhausted",
            ErrorCode::BR_0023 => "Certificate parsing failed",

            ErrorCode::BR_0030 => "Invalid CSR format",
            ErrorCode::BR_0031 => "Invalid CSR signature",

            ErrorCode::BR_0040 => "Template policy violation",
            ErrorCode::BR_0041 => "Invalid template",

            ErrorCode::BR_0050 => "Master key unavailable",
            ErrorCode::BR_0051 => "No private key stored",
            ErrorCode::BR_0052 => "Private key decryption failed",
            ErrorCode::BR_0053 => "Private key re-encryption failed",
            ErrorCode::BR_0054 => "Master key storage error",
            ErrorCode::BR_0055 => "Encryption error",

            ErrorCode::BR_0060 => "Serial number collision",
            ErrorCode::BR_0061 => "Certificate already revoked",
            ErrorCode::BR_0062 => "Invalid revocation reason",
            ErrorCode::BR_0063 => "Certificate generation failed",
            ErrorCode::BR_0064 => "Invalid request",
        }
    }
}

pub trait ErrorCodeMixin {
    fn error_code(&self) -> ErrorCode;
}
