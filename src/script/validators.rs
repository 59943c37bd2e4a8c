//! Per-step input validators.
//!
//! A validator either writes the parsed value into the [`SessionRecord`] and
//! reports what it accepted, or rejects the input leaving the record
//! untouched so the step can be re-asked.

use std::sync::LazyLock;

use regex::Regex;

use crate::session::SessionRecord;

// Deliberately loose — not RFC 5322, just local@domain.tld.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

// Digits, spaces, hyphens, parentheses, plus; at least 10 characters.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\s+()-]{10,}$").expect("phone regex"));

/// Which tri-state boolean a yes/no step writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YesNoField {
    FirstTimeBuyer,
    PreApproval,
}

impl YesNoField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FirstTimeBuyer => "first_time_buyer",
            Self::PreApproval => "pre_approval",
        }
    }
}

/// Which free-text field a non-empty step writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Timeline,
    FullName,
}

impl TextField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Timeline => "timeline",
            Self::FullName => "full_name",
        }
    }
}

/// What an accepted email address means for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailCapture {
    /// Ordinary contact capture partway through the flow.
    Contact,
    /// Capture on the inserted decline step; also converts the session to a
    /// lead.
    Lead,
}

/// A step's validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    YesNo(YesNoField),
    NonEmpty(TextField),
    Email(EmailCapture),
    Phone,
    ConsultationOffer,
}

/// What a successful validation did, for event emission and branching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// A field was written.
    Recorded {
        field: &'static str,
        value: String,
    },
    /// The optional field was explicitly skipped (stored unset).
    Skipped { field: &'static str },
    /// The inserted decline step captured an email and converted the lead.
    LeadCaptured { email: String },
    /// Consultation offer accepted; the caller surfaces the scheduling link.
    Scheduled,
    /// Consultation offer passed on. Still a success — the flow moves on.
    Passed,
}

/// Validation failure. The record is guaranteed untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected;

impl Validator {
    /// Apply this validator to raw input. On success the parsed value has
    /// already been written into `record`.
    pub fn apply(&self, input: &str, record: &mut SessionRecord) -> Result<Answer, Rejected> {
        match self {
            Self::YesNo(field) => {
                let lowered = input.to_lowercase();
                // "yes" is checked first, so it wins when both appear.
                let value = if lowered.contains("yes") {
                    true
                } else if lowered.contains("no") {
                    false
                } else {
                    return Err(Rejected);
                };
                match field {
                    YesNoField::FirstTimeBuyer => record.is_first_time_buyer = Some(value),
                    YesNoField::PreApproval => record.has_pre_approval = Some(value),
                }
                Ok(Answer::Recorded {
                    field: field.name(),
                    value: value.to_string(),
                })
            }
            Self::NonEmpty(field) => {
                let trimmed = input.trim();
                if trimmed.is_empty() {
                    return Err(Rejected);
                }
                match field {
                    TextField::Timeline => record.timeline = Some(trimmed.to_string()),
                    TextField::FullName => record.full_name = Some(trimmed.to_string()),
                }
                Ok(Answer::Recorded {
                    field: field.name(),
                    value: trimmed.to_string(),
                })
            }
            Self::Email(capture) => {
                let trimmed = input.trim();
                if !EMAIL_RE.is_match(trimmed) {
                    return Err(Rejected);
                }
                record.email = Some(trimmed.to_string());
                match capture {
                    EmailCapture::Contact => Ok(Answer::Recorded {
                        field: "email",
                        value: trimmed.to_string(),
                    }),
                    EmailCapture::Lead => {
                        record.convert_to_lead();
                        Ok(Answer::LeadCaptured {
                            email: trimmed.to_string(),
                        })
                    }
                }
            }
            Self::Phone => {
                let trimmed = input.trim();
                if trimmed.is_empty() {
                    // Explicit skip: the field stays unset and the step passes.
                    record.phone = None;
                    return Ok(Answer::Skipped { field: "phone" });
                }
                if !PHONE_RE.is_match(trimmed) {
                    return Err(Rejected);
                }
                record.phone = Some(trimmed.to_string());
                Ok(Answer::Recorded {
                    field: "phone",
                    value: trimmed.to_string(),
                })
            }
            Self::ConsultationOffer => {
                // Always succeeds; only the branch differs.
                if input.to_lowercase().contains("yes") {
                    Ok(Answer::Scheduled)
                } else {
                    Ok(Answer::Passed)
                }
            }
        }
    }
}
