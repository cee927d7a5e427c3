//! Subject, SAN and TTL rules of a certificate template

use regex::Regex;
use strum::Display;
use thiserror::Error;

use crate::error::{ErrorCode, ErrorCodeMixin};
use crate::model::csr::{AppliedTemplate, CertificateSigningRequest, ParsedCsr};
use crate::model::template::CertificateTemplate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PolicyViolation {
    #[strum(serialize = "common name")]
    Cn,
    #[strum(serialize = "subject alternative names")]
    San,
    #[strum(serialize = "TTL")]
    Ttl,
}

#[derive(Debug, Error)]
pub enum TemplatePolicyError {
    #[error("Template policy violated: {0}")]
    PolicyViolation(PolicyViolation),
    #[error("Invalid template pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl ErrorCodeMixin for TemplatePolicyError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::PolicyViolation(_) => ErrorCode::BR_0040,
            Self::InvalidPattern { .. } => ErrorCode::BR_0041,
        }
    }
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait TemplatePolicy: Send + Sync {
    /// Fails closed on the first violated rule
    fn check(
        &self,
        csr: &ParsedCsr,
        template: &CertificateTemplate,
        requested_ttl_days: Option<u32>,
    ) -> Result<(), TemplatePolicyError>;

    fn validate_against_template(
        &self,
        csr: &ParsedCsr,
        template: &CertificateTemplate,
        requested_ttl_days: Option<u32>,
    ) -> bool {
        self.check(csr, template, requested_ttl_days).is_ok()
    }

    /// Records the governing template on the request, key material untouched
    fn apply_template(&self, request: &mut CertificateSigningRequest, template: &CertificateTemplate);
}

/// Anchored form of a template pattern, the whole input must match
pub fn compile_pattern(pattern: &str) -> Result<Regex, TemplatePolicyError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|err| TemplatePolicyError::InvalidPattern {
        pattern: pattern.to_owned(),
        reason: err.to_string(),
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TemplatePolicyImpl;

impl TemplatePolicy for TemplatePolicyImpl {
    fn check(
        &self,
        csr: &ParsedCsr,
        template: &CertificateTemplate,
        requested_ttl_days: Option<u32>,
    ) -> Result<(), TemplatePolicyError> {
        if let Some(pattern) = &template.cn_regex {
            let regex = compile_pattern(pattern)?;
            let matches = csr.common_name.as_ref().is_some_and(|cn| {
                regex.is_match(cn) || regex.is_match(&format!("CN={cn}"))
            });
            if !matches {
                return Err(TemplatePolicyError::PolicyViolation(PolicyViolation::Cn));
            }
        }

        if let Some(pattern) = &template.san_regex {
            let regex = compile_pattern(pattern)?;
            if csr.subject_alt_names.is_empty()
                || !regex.is_match(&csr.subject_alt_names.join(","))
            {
                return Err(TemplatePolicyError::PolicyViolation(PolicyViolation::San));
            }
        }

        if let Some(max_ttl_days) = template.max_ttl_days {
            if !requested_ttl_days.is_some_and(|ttl| ttl <= max_ttl_days) {
                return Err(TemplatePolicyError::PolicyViolation(PolicyViolation::Ttl));
            }
        }

        Ok(())
    }

    fn apply_template(&self, request: &mut CertificateSigningRequest, template: &CertificateTemplate) {
        request.applied_template = Some(AppliedTemplate {
            template_id: template.id,
            key_usage: template.key_usage.clone(),
            extended_key_usage: template.extended_key_usage.clone(),
        });
    }
}

#[cfg(test)]
mod test;
